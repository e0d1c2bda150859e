//! # Pages
//!
//! Controllers behind the three rewards screens. A page fetches snapshots
//! from its collaborators, runs the engine over them, and turns mutating
//! calls into notices followed by a fresh fetch.
//!
//! Side effects a screen would perform (toasts, clipboard) are injected as
//! [`Notifier`] and [`ClipboardWriter`] capabilities.

mod battle_pass;
mod loyalty;
mod referrals;

pub use battle_pass::{BattlePassPage, ClaimOutcome};
pub use loyalty::LoyaltyPage;
pub use referrals::{ApplyOutcome, ReferralsPage, ReferralsView};

use base64::Engine;
use serde::{Deserialize, Serialize};
use std::io::Write;

// =============================================================================
// NOTICES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Success,
    Error,
}

/// A short user-facing message, the equivalent of a toast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub description: String,
}

impl Notice {
    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            title: title.into(),
            description: description.into(),
        }
    }

    pub fn error(description: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            title: "Error".to_string(),
            description: description.into(),
        }
    }
}

// =============================================================================
// CAPABILITIES
// =============================================================================

/// Delivers notices to the user.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Places text on the user's clipboard.
pub trait ClipboardWriter: Send + Sync {
    fn write_text(&self, text: &str) -> std::io::Result<()>;
}

/// Prints notices to the terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Success => println!("✔ {}: {}", notice.title, notice.description),
            NoticeLevel::Error => eprintln!("✘ {}: {}", notice.title, notice.description),
        }
    }
}

/// Records notices in the log; used where there is no user to show them to.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Success => tracing::info!(
                event = "notice",
                title = %notice.title,
                "{}",
                notice.description
            ),
            NoticeLevel::Error => tracing::warn!(
                event = "notice",
                title = %notice.title,
                "{}",
                notice.description
            ),
        }
    }
}

/// Sets the terminal clipboard with an OSC 52 escape sequence.
///
/// Supported by most modern terminal emulators and passed through by tmux
/// with `set-clipboard on`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Osc52Clipboard;

impl Osc52Clipboard {
    /// The escape sequence that puts `text` on the system clipboard.
    #[must_use]
    pub fn sequence(text: &str) -> String {
        let payload = base64::engine::general_purpose::STANDARD.encode(text.as_bytes());
        format!("\x1b]52;c;{}\x07", payload)
    }
}

impl ClipboardWriter for Osc52Clipboard {
    fn write_text(&self, text: &str) -> std::io::Result<()> {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(Self::sequence(text).as_bytes())?;
        stdout.flush()
    }
}
