//! Static informational content: the main menu, its pages, and welcome texts.
//!
//! Page bodies are Markdown and go through `formatting::markdown_to_html`
//! before they reach the messenger.

use crate::messaging::types::{InlineButton, InlineKeyboard};

pub const WEBSITE_URL: &str = "https://www.trust-coin.site";
pub const ANDROID_URL: &str =
    "https://play.google.com/store/apps/details?id=com.jawad06_dev.trustcoinmobile.v3";
pub const IOS_URL: &str = "https://apps.apple.com/app/trustcoin";

pub const START_FALLBACK: &str = "Welcome to TrustCoin Bot! ✅";
pub const INVALID_OPTION: &str = "Invalid option. Returning to main menu.";

pub const START_TEXT: &str = "🚀 **Welcome to TrustCoin (TBN)!** 🚀\n\n\
💎 **Revolutionary Mobile Mining on BSC**\n\n\
🎁 **Welcome Bonus:** 1,000 points\n\
⛏️ **Mining:** Up to 1,000 points/24h\n\
💰 **Conversion:** 1,000 points = 1 TBN\n\n\
📱 **Download:** https://www.trust-coin.site";

const MAIN_MENU: &[(&str, &str)] = &[
    ("📋 Overview & Getting Started", "overview"),
    ("⛏️ Mining & Points", "points"),
    ("🎯 Missions & Rewards", "missions"),
    ("👥 Referral & Community", "referral"),
    ("📈 Tokenomics & Roadmap", "roadmap"),
    ("📱 Download App", "download"),
    ("🔒 Security & Anti-Cheat", "security"),
    ("❓ FAQ", "faq"),
    ("🌐 Social Links", "social"),
    ("🌍 Language Groups", "language_groups"),
];

pub fn main_menu() -> InlineKeyboard {
    InlineKeyboard::one_per_row(
        MAIN_MENU
            .iter()
            .map(|(label, data)| InlineButton::callback(*label, *data))
            .collect(),
    )
}

/// A page shown in response to a menu button.
#[derive(Clone, Debug, PartialEq)]
pub struct MenuPage {
    pub markdown: String,
    pub keyboard: InlineKeyboard,
}

impl MenuPage {
    fn with_main_menu(markdown: &str) -> Self {
        Self {
            markdown: markdown.to_string(),
            keyboard: main_menu(),
        }
    }
}

/// Page for a callback payload. Unknown payloads fall back to the main menu
/// with an "invalid option" notice.
pub fn page_for(payload: &str) -> MenuPage {
    match payload {
        "overview" => MenuPage::with_main_menu(OVERVIEW),
        "points" => MenuPage::with_main_menu(POINTS),
        "missions" => MenuPage::with_main_menu(MISSIONS),
        "referral" => MenuPage::with_main_menu(REFERRAL),
        "roadmap" => MenuPage::with_main_menu(ROADMAP),
        "security" => MenuPage::with_main_menu(SECURITY),
        "faq" => MenuPage::with_main_menu(FAQ),
        "download" => MenuPage {
            markdown: DOWNLOAD.to_string(),
            keyboard: InlineKeyboard::one_per_row(vec![
                InlineButton::url("📱 Download for iOS", IOS_URL),
                InlineButton::url("🤖 Download for Android", ANDROID_URL),
                InlineButton::url("🌐 Visit Official Website", WEBSITE_URL),
                InlineButton::callback("⬅️ Back to Main Menu", "back"),
            ]),
        },
        "social" => MenuPage {
            markdown: "Choose a link to open:".to_string(),
            keyboard: InlineKeyboard::one_per_row(vec![
                InlineButton::url("🌐 Website", WEBSITE_URL),
                InlineButton::url(
                    "📘 Facebook ➡️",
                    "https://www.facebook.com/people/TrustCoin/61579302546502/",
                ),
                InlineButton::url("✈️ Telegram Group ➡️", "https://t.me/+7A9zYR8BCU03ODA0"),
                InlineButton::url("🐦 X/Twitter ➡️", "https://x.com/TBNTrustCoin"),
                InlineButton::callback("Back to Main Menu", "back"),
            ]),
        },
        "language_groups" => MenuPage {
            markdown: "Join our TrustCoin community:".to_string(),
            keyboard: InlineKeyboard::one_per_row(vec![
                InlineButton::url("🇺🇸 English Group", "https://t.me/tructcoin_bot"),
                InlineButton::callback("⬅️ Back to Main Menu", "back"),
            ]),
        },
        "back" => MenuPage::with_main_menu("Main menu:"),
        _ => MenuPage::with_main_menu(INVALID_OPTION),
    }
}

/// Greeting posted when someone joins a group.
pub fn welcome_text(chat_title: Option<&str>, first_name: &str) -> String {
    let title = chat_title.filter(|t| !t.trim().is_empty()).unwrap_or("this group");
    format!(
        "🎉 Welcome to {title}, {first_name}!\n\n\
         🚀 **TrustCoin Community** welcomes you!\n\n\
         💎 Ready to start mining? Type /start to explore all features!\n\
         📱 Download our app: {WEBSITE_URL}\n\n\
         🎁 **New users get 1,000 points bonus!**"
    )
}

const OVERVIEW: &str = "📋 **Overview & Getting Started**\n\n\
🌟 TrustCoin (TBN) is a revolutionary blockchain-based rewards ecosystem on Binance Smart Chain.\n\n\
🚀 **How to Get Started:**\n\
1️⃣ **Download the TrustCoin app** for iOS or Android and create your account\n\
🎁 Receive a **1,000-point welcome bonus** instantly!\n\n\
2️⃣ **Start 24-hour mining sessions** that continue even when the app is closed\n\
💾 Progress saves automatically every hour\n\n\
3️⃣ **Complete missions & spin the Lucky Wheel** for extra points\n\
🎯 Multiple ways to earn rewards daily\n\n\
4️⃣ **Convert your points to real TBN tokens** via automated smart contract\n\
💰 **1,000 points = 1 TBN token**\n\n\
📱 The mobile app is cross-platform (React Native) with chat and team features\n\
🔒 TrustCoin emphasizes transparency, community-driven development, and long-term value";

const POINTS: &str = "⛏️ **Mining & Points System**\n\n\
🕐 **24-Hour Mining Sessions:**\n\
• Earn up to **1,000 points per cycle**\n\
• Progress saves every hour automatically\n\
• Sessions resume after app restart\n\n\
📊 **Reward Formula:**\n\
`(session duration ÷ 86,400) × 1,000 points`\n\n\
📺 **Advertisement Rewards:**\n\
• Watch ads to unlock bonus strikes\n\
• Get multipliers for extra rewards\n\n\
💎 **Point-to-TBN Conversion:**\n\
• **Rate:** 1 TBN per 1,000 points\n\
• **Minimum:** 1,000 points redemption\n\
• **Daily Limit:** 100,000 points maximum\n\
• **Example:** 10,000 points = 10 TBN tokens\n\n\
🔗 **Smart Contract Features:**\n\
• Automated conversion on BSC\n\
• Gas fees initially covered by project\n\
• **Burn Rates:** 1% transfers, 0.5% conversions, 2% premium features";

const MISSIONS: &str = "🎯 **Missions & Rewards System**\n\n\
🏆 **Trophy Missions (1-500 points):**\n\
• First mining session completion\n\
• Consecutive collection days\n\
• Referring new users\n\
• Daily login streaks\n\n\
💎 **Gem Missions (1,000-5,000 points):**\n\
• 30-day mining streaks\n\
• Top efficiency achievements\n\
• Completing all trophy missions\n\n\
🎁 **Chest Missions (2,000-10,000 points):**\n\
• 90-day consecutive streaks\n\
• Building a team of 20+ referrals\n\
• Collecting 100,000+ total points\n\n\
🪙 **Coin Missions (100-1,000 points):**\n\
• Daily tasks like sharing the app\n\
• Updating your profile\n\
• Joining community events\n\n\
🎰 **Lucky Wheel System:**\n\
• Spin for **1-1,500 points**\n\
• **3 strikes per cycle**\n\
• **6-hour cooldown** between cycles\n\
• **Probabilities:** 50% (1-100), 30% (101-200), 15% (201-300), 5% (301-500)\n\
• Watch ads for additional spins and multipliers!";

const REFERRAL: &str = "👥 **Referral Program & Community**\n\n\
🔗 **Two-Tier Referral System:**\n\
• **Public codes** for everyone\n\
• **Exclusive codes** for top referrers\n\n\
🎁 **New User Benefits:**\n\
• **1,000-point welcome bonus** upon registration\n\
• **500 extra points** when using invitation code\n\
• Instant access to all features\n\n\
💰 **Referrer Rewards:**\n\
• **1,000 points per successful referral**\n\
• Share of referee's mining rewards\n\
• Recognition badges and bonuses\n\
• Leaderboard rankings\n\n\
👨‍👩‍👧‍👦 **Community Features:**\n\
• Team up with other miners\n\
• Chat in group conversations\n\
• Share mining strategies\n\
• Compete on global leaderboards\n\
• Participate in community events";

const ROADMAP: &str = "📈 **Tokenomics & Roadmap**\n\n\
💰 **Supply Distribution (20B TBN Total):**\n\
• 🏆 **12B** - Mining Rewards Pool (60%)\n\
• 💧 **3B** - Liquidity Reserve (15%)\n\
• 🛠️ **3B** - Development Fund (15%)\n\
• 👥 **2B** - Team Allocation (10%)\n\n\
🔥 **Deflationary Mechanics:**\n\
• **1%** burn on all token transfers\n\
• **0.5%** burn on point conversions\n\
• **2%** burn on premium features\n\
• **Variable burns** for milestone achievements\n\n\
🏛️ **Governance & Staking:**\n\
• Stake TBN tokens for additional rewards\n\
• Token-weighted voting system\n\
• Variable APY based on staking duration\n\
• Premium app features unlock\n\n\
🗺️ **Development Roadmap:**\n\
**2025:** Foundation & Enhancement\n\
✅ Mining, missions, lucky wheel systems\n\
✅ Referral and advertisement integration\n\n\
**2025-2026:** Testing & Launch\n\
🔄 Security audits and optimization\n\
🚀 Mainnet launch on BSC\n\
🆔 KYC/AI verification systems\n\n\
**2026-2027:** Expansion & Innovation\n\
📈 Major exchange listings\n\
🏦 DeFi protocol integration\n\
🌐 Trust blockchain development\n\
🏛️ DAO governance implementation\n\
🎨 NFT marketplace launch\n\
🌍 Metaverse partnerships\n\
🌉 Cross-chain bridge development\n\
💳 Global payment system integration";

const DOWNLOAD: &str = "📱 **Download TrustCoin App**\n\n\
🚀 **Get started with TrustCoin today!**\n\n\
📲 **Available on both platforms:**\n\
• iOS App Store\n\
• Google Play Store\n\n\
🎁 **What you get:**\n\
• **1,000 points welcome bonus**\n\
• **24/7 mining capability**\n\
• **Cross-platform compatibility**\n\
• **Real-time chat & team features**\n\
• **Secure blockchain integration**\n\n\
💡 **System Requirements:**\n\
• iOS 12.0+ or Android 6.0+\n\
• Internet connection\n\
• 50MB storage space\n\n\
🔗 Click the buttons below to download:";

const SECURITY: &str = "🔒 **Security & Anti-Cheat System**\n\n\
🛡️ **Multi-Layer Security:**\n\
• **Device fingerprinting** to prevent multi-account abuse\n\
• **Real-time session validation** with time-based authentication\n\
• **AI-powered pattern analysis** to detect automation and cheating\n\
• **Geographic consistency checks** for authentic user behavior\n\n\
⚖️ **Fair Play Enforcement:**\n\
• **One account per person** policy\n\
• **Real device requirement** - no emulators\n\
• **No automation tools** allowed\n\
• **Permanent bans** for violations\n\n\
🔐 **Blockchain Security:**\n\
• **Smart contract audits** by leading security firms\n\
• **Deflationary mechanics** for real value\n\
• **Anti-whale protection** mechanisms\n\
• **Transparent on-chain operations**\n\n\
🚨 **Fraud Prevention:**\n\
• **Advanced encryption** for all data\n\
• **Behavioral analysis** algorithms\n\
• **Community reporting** system\n\
• **24/7 monitoring** infrastructure\n\n\
✅ **Your safety is our priority!**";

const FAQ: &str = "❓ **Frequently Asked Questions**\n\n\
**Q1: How do I start mining?**\n\
A: Download the app, register, and tap the mining button. Sessions run for 24 hours automatically.\n\n\
**Q2: When can I withdraw my TBN tokens?**\n\
A: Token conversion will be available after mainnet launch on BSC (2025-2026).\n\n\
**Q3: Is TrustCoin free to use?**\n\
A: Yes! The app is completely free. You only need internet connection.\n\n\
**Q4: How many accounts can I have?**\n\
A: Only ONE account per person. Multiple accounts will result in permanent ban.\n\n\
**Q5: What's the minimum withdrawal?**\n\
A: Minimum conversion is 1,000 points = 1 TBN token.\n\n\
**Q6: Can I use emulators or bots?**\n\
A: No! Only real devices are allowed. Automation tools are strictly prohibited.\n\n\
**Q7: How do referrals work?**\n\
A: Share your referral code. You get 1,000 points per successful referral.\n\n\
**Q8: Is my data safe?**\n\
A: Yes! We use advanced encryption and security measures to protect your data.\n\n\
**Q9: When will TBN be listed on exchanges?**\n\
A: Major exchange listings are planned for 2026-2027 after mainnet launch.\n\n\
**Q10: How can I contact support?**\n\
A: Join our Telegram group or visit our website for support.";
