use std::collections::HashSet;

use crate::domain::UserId;

pub const PERMISSION_DENIED: &str = "❌ You don't have permission to use this command.";

// ============== Authorization ==============

/// Administrator set, fixed at startup.
#[derive(Clone, Debug, Default)]
pub struct AdminGate {
    admins: HashSet<i64>,
}

impl AdminGate {
    pub fn new(admin_ids: &[i64]) -> Self {
        Self {
            admins: admin_ids.iter().copied().collect(),
        }
    }

    pub fn is_admin(&self, user_id: UserId) -> bool {
        self.admins.contains(&user_id.0)
    }

    pub fn len(&self) -> usize {
        self.admins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.admins.is_empty()
    }
}
