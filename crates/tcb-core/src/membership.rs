//! Chat membership transition classification (join / leave detection).

/// Telegram chat member status.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemberStatus {
    Owner,
    Administrator,
    Member,
    Restricted,
    Left,
    Banned,
}

/// One side (before or after) of a membership update.
///
/// `is_member` is only meaningful for `Restricted`, where the status alone
/// does not say whether the user is still in the chat.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemberSide {
    pub status: MemberStatus,
    pub is_member: Option<bool>,
}

impl MemberSide {
    pub fn new(status: MemberStatus) -> Self {
        Self {
            status,
            is_member: None,
        }
    }

    pub fn restricted(is_member: bool) -> Self {
        Self {
            status: MemberStatus::Restricted,
            is_member: Some(is_member),
        }
    }

    fn counts_as_member(&self) -> bool {
        match self.status {
            MemberStatus::Owner | MemberStatus::Administrator | MemberStatus::Member => true,
            MemberStatus::Restricted => self.is_member == Some(true),
            MemberStatus::Left | MemberStatus::Banned => false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MembershipTransition {
    pub was_member: bool,
    pub is_member: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransitionKind {
    Joined,
    Left,
    Unchanged,
}

impl MembershipTransition {
    pub fn kind(&self) -> TransitionKind {
        match (self.was_member, self.is_member) {
            (false, true) => TransitionKind::Joined,
            (true, false) => TransitionKind::Left,
            _ => TransitionKind::Unchanged,
        }
    }
}

/// Classify a before/after pair.
///
/// `None` means the update carries no status change at all and must be skipped
/// silently.
pub fn classify(old: MemberSide, new: MemberSide) -> Option<MembershipTransition> {
    if old.status == new.status {
        return None;
    }
    Some(MembershipTransition {
        was_member: old.counts_as_member(),
        is_member: new.counts_as_member(),
    })
}
