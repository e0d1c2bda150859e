//! # Referrals Page
//!
//! Shows the caller's code and referral history, copies the code, and
//! applies codes from other users.

use super::{ClipboardWriter, Notice, Notifier};
use crate::sources::{ApplyReceipt, ReferralApplyService, ReferralSource, SourceError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tierline_core::{NormalizedCode, Referral, ReferralCode, ReferralSummary, summarize};

/// Everything the referrals screen displays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferralsView {
    pub code: Option<ReferralCode>,
    pub share_message: Option<String>,
    pub referrals: Vec<Referral>,
    pub summary: ReferralSummary,
}

/// Result of applying a typed-in code.
#[derive(Debug)]
pub enum ApplyOutcome {
    /// Blank input; nothing was sent.
    Skipped,
    Applied(ApplyReceipt),
    /// Refused. `error` is `None` when the code never left this process.
    Failed {
        error: Option<SourceError>,
        message: String,
    },
}

/// Controller for the referrals screen.
pub struct ReferralsPage {
    source: Arc<dyn ReferralSource>,
    apply: Arc<dyn ReferralApplyService>,
    notifier: Arc<dyn Notifier>,
}

impl ReferralsPage {
    pub fn new(
        source: Arc<dyn ReferralSource>,
        apply: Arc<dyn ReferralApplyService>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            source,
            apply,
            notifier,
        }
    }

    /// Fetch code and referrals concurrently.
    ///
    /// The two halves are independent: a failed half is logged and shown as
    /// absent or empty while the other half still renders.
    pub async fn load(&self) -> ReferralsView {
        let (code, referrals) = tokio::join!(self.source.my_code(), self.source.my_referrals());

        let code = code.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to fetch referral code");
            None
        });
        let referrals = referrals.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to fetch referrals");
            Vec::new()
        });

        ReferralsView {
            share_message: code.as_ref().map(ReferralCode::share_message),
            summary: summarize(&referrals),
            code,
            referrals,
        }
    }

    /// Copy the stored code, display casing intact. False when there is none.
    pub fn copy_code(&self, view: &ReferralsView, clipboard: &dyn ClipboardWriter) -> bool {
        let Some(code) = &view.code else {
            return false;
        };
        match clipboard.write_text(&code.code) {
            Ok(()) => {
                self.notifier.notify(Notice::success(
                    "Copied!",
                    "Referral code copied to clipboard",
                ));
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "clipboard write failed");
                self.notifier
                    .notify(Notice::error("Failed to copy referral code"));
                false
            }
        }
    }

    /// Normalize `input` and submit it.
    pub async fn apply(&self, input: &str) -> ApplyOutcome {
        let code = match NormalizedCode::parse(input) {
            Ok(code) => code,
            Err(_) if input.trim().is_empty() => return ApplyOutcome::Skipped,
            Err(e) => return self.fail(None, e.to_string()),
        };

        match self.apply.apply_code(&code).await {
            Ok(receipt) => {
                tracing::info!(code = %code, coins = receipt.coins_earned, "referral code applied");
                self.notifier.notify(Notice::success(
                    "Referral Applied!",
                    format!("You received {} coins!", receipt.coins_earned),
                ));
                ApplyOutcome::Applied(receipt)
            }
            Err(error) => {
                tracing::warn!(code = %code, error = %error, "referral code rejected");
                let message = error.user_message("Failed to apply referral code");
                self.fail(Some(error), message)
            }
        }
    }

    fn fail(&self, error: Option<SourceError>, message: String) -> ApplyOutcome {
        self.notifier.notify(Notice::error(message.clone()));
        ApplyOutcome::Failed { error, message }
    }
}
