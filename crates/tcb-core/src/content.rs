//! Broadcast templates: an ordered, admin-editable list shared with the scheduler.
//!
//! Templates are stored as the Markdown the admins typed and rendered to HTML
//! only when sent.

use rand::seq::IndexedRandom;
use tokio::sync::Mutex;

use crate::{errors::Error, formatting::truncate_chars, Result};

pub const DEFAULT_TEMPLATES: [&str; 5] = [
    "🚀 **TrustCoin Update!** 🚀\n\n💎 Don't forget to claim your daily mining rewards!\n⛏️ Start your 24-hour mining session now!\n\n📱 Download the app: https://www.trust-coin.site",
    "🎁 **Daily Reminder!** 🎁\n\n🌟 Complete your missions for extra points!\n🎰 Spin the Lucky Wheel for bonus rewards!\n\n💰 1,000 points = 1 TBN token!",
    "👥 **Community Update!** 👥\n\n🔗 Invite friends and earn 1,000 points per referral!\n🏆 Climb the leaderboards and win prizes!\n\n✨ Join our growing TrustCoin family!",
    "📈 **TrustCoin News!** 📈\n\n🔥 Deflationary tokenomics in action!\n🏛️ Governance features coming soon!\n\n🌐 Follow us on all social platforms!",
    "⚡ **Mining Tip!** ⚡\n\n💡 Keep your mining sessions active for maximum rewards!\n📊 Track your progress in the app!\n\n🎯 Complete missions for bonus points!",
];

pub struct ContentStore {
    templates: Mutex<Vec<String>>,
}

impl Default for ContentStore {
    fn default() -> Self {
        Self::with_templates(DEFAULT_TEMPLATES.iter().map(|s| s.to_string()).collect())
    }
}

impl ContentStore {
    pub fn with_templates(templates: Vec<String>) -> Self {
        Self {
            templates: Mutex::new(templates),
        }
    }

    /// Append a template; duplicates are fine. Returns the new length.
    pub async fn add(&self, text: impl Into<String>) -> usize {
        let mut templates = self.templates.lock().await;
        templates.push(text.into());
        templates.len()
    }

    pub async fn list(&self) -> Vec<String> {
        self.templates.lock().await.clone()
    }

    /// Display copy with long entries cut to `max_chars` (stored text is untouched).
    pub async fn list_preview(&self, max_chars: usize) -> Vec<String> {
        self.templates
            .lock()
            .await
            .iter()
            .map(|t| truncate_chars(t, max_chars))
            .collect()
    }

    /// Remove by 1-based display index.
    pub async fn remove_at(&self, index_one_based: usize) -> Result<String> {
        let mut templates = self.templates.lock().await;
        let len = templates.len();
        match index_one_based.checked_sub(1) {
            Some(i) if i < len => Ok(templates.remove(i)),
            _ => Err(Error::IndexOutOfRange {
                index: index_one_based,
                len,
            }),
        }
    }

    pub async fn pick_random(&self) -> Result<String> {
        let templates = self.templates.lock().await;
        let mut rng = rand::rng();
        templates.choose(&mut rng).cloned().ok_or(Error::EmptyStore)
    }

    pub async fn len(&self) -> usize {
        self.templates.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
