//! Emoji constants used by `proxyflare`.
//!
//! Each constant falls back to an empty string on terminals that can't
//! render emoji (see `console::Emoji`).

#![allow(missing_docs)]

use console::Emoji;

pub static CHECK: Emoji = Emoji("✅ ", "");
pub static GLOBE: Emoji = Emoji("🌐 ", "");
pub static INFO: Emoji = Emoji("💁 ", "");
pub static SPARKLES: Emoji = Emoji("✨ ", "");
pub static SWIRL: Emoji = Emoji("🌀 ", "");
pub static WARN: Emoji = Emoji("⚠️ ", "");
pub static WASTEBASKET: Emoji = Emoji("🗑️ ", "");
pub static WORKER: Emoji = Emoji("👷 ", "");
