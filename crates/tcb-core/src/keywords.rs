//! Canned replies to group chatter.
//!
//! Three independent reply sources per message:
//! 1. at most one of greeting / mining info / download info (checked in that order),
//! 2. a mention reply when the bot's `@username` appears,
//! 3. a probabilistic keyword reply; the first keyword that both matches and
//!    wins its coin flip is sent, the rest are skipped.
//!
//! Matching is case-insensitive substring search. Replies are Markdown.

use std::sync::Mutex;

use rand::{rngs::StdRng, seq::IndexedRandom, Rng, SeedableRng};

const GREETING_WORDS: &[&str] = &[
    "hello",
    "hi",
    "مرحبا",
    "السلام عليكم",
    "hallo",
    "привет",
    "здравствуйте",
    "bonjour",
    "नमस्ते",
    "merhaba",
    "selam",
];

const GREETING_REPLIES: &[&str] = &[
    "🚀 Welcome to TrustCoin community! Ready to start mining? Type /start for full info!",
    "💎 Hello! Join thousands of miners earning TBN tokens daily! /start to begin",
    "🎁 Hi there! Get your 1,000 points welcome bonus - download our app now!",
    "⛏️ Greetings, future miner! Start your 24-hour mining session today!",
];

const MINING_WORDS: &[&str] = &["mining", "mine", "تعدين", "نقاط", "points", "earn", "كسب"];

pub const MINING_INFO: &str = "⛏️ **Mining Info:** Earn up to 1,000 points every 24 hours! 💰 1,000 points = 1 TBN token. Download the app and start mining now! 📱";

const DOWNLOAD_WORDS: &[&str] = &["app", "download", "تحميل", "تطبيق", "link", "رابط"];

pub const DOWNLOAD_INFO: &str = "📱 **Download TrustCoin App:**\n🤖 Android: https://play.google.com/store/apps/details?id=com.jawad06_dev.trustcoinmobile.v3\n🌐 Website: https://www.trust-coin.site";

const MENTION_REPLIES: &[&str] = &[
    "🚀 Hello! I'm here to help with TrustCoin! Type /start to see all features!",
    "💎 Need help with mining? Download our app and start earning points!",
    "🎯 Want to learn about missions and rewards? Use /start to explore!",
    "👥 Looking to join our community? Check out our social links with /start!",
    "📱 Ready to start mining? Get the app at https://www.trust-coin.site",
];

/// Probabilistic replies, checked in this order.
pub const KEYWORD_REPLIES: &[(&str, &str)] = &[
    (
        "mining",
        "⛏️ Start your 24-hour mining session in the TrustCoin app! Earn up to 1,000 points daily!",
    ),
    (
        "points",
        "💰 Earn points through mining, missions, and referrals! 1,000 points = 1 TBN token!",
    ),
    (
        "app",
        "📱 Download the TrustCoin app: https://www.trust-coin.site",
    ),
    (
        "referral",
        "🔗 Invite friends and earn 1,000 points per successful referral!",
    ),
    (
        "token",
        "💎 TBN tokens will be available after mainnet launch on Binance Smart Chain!",
    ),
    (
        "help",
        "❓ Type /start to see all available information and features!",
    ),
];

pub struct KeywordResponder {
    probability: f64,
    rng: Mutex<StdRng>,
}

impl KeywordResponder {
    pub fn new(probability: f64) -> Self {
        Self::with_rng(probability, StdRng::from_os_rng())
    }

    /// Deterministic responder for tests.
    pub fn with_rng(probability: f64, rng: StdRng) -> Self {
        Self {
            probability: probability.clamp(0.0, 1.0),
            rng: Mutex::new(rng),
        }
    }

    /// Replies for one group message, in send order.
    pub fn replies_for(&self, text: &str, bot_username: Option<&str>) -> Vec<String> {
        let lowered = text.to_lowercase();
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        let mut out = Vec::new();

        if contains_any(&lowered, GREETING_WORDS) {
            if let Some(reply) = GREETING_REPLIES.choose(&mut *rng) {
                out.push(reply.to_string());
            }
        } else if contains_any(&lowered, MINING_WORDS) {
            out.push(MINING_INFO.to_string());
        } else if contains_any(&lowered, DOWNLOAD_WORDS) {
            out.push(DOWNLOAD_INFO.to_string());
        }

        if let Some(name) = bot_username.filter(|n| !n.is_empty()) {
            let handle = format!("@{}", name.trim_start_matches('@').to_lowercase());
            if lowered.contains(&handle) {
                if let Some(reply) = MENTION_REPLIES.choose(&mut *rng) {
                    out.push(reply.to_string());
                }
            }
        }

        for (keyword, reply) in KEYWORD_REPLIES {
            if lowered.contains(keyword) && rng.random::<f64>() < self.probability {
                out.push(reply.to_string());
                break;
            }
        }

        out
    }
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}
