//! # Battle Pass Page
//!
//! Loads the season view and claims tier rewards.

use super::{Notice, Notifier};
use crate::error::AppError;
use crate::sources::{ClaimReceipt, ProgressSource, RewardClaimService, SourceError};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tierline_core::{BattlePassView, compute_battle_pass_view};

/// Result of a claim attempt.
#[derive(Debug)]
pub enum ClaimOutcome {
    /// The claim went through; `view` is the refetched season view, `None`
    /// when the season ended or the refetch failed.
    Claimed {
        receipt: ClaimReceipt,
        view: Option<BattlePassView>,
    },
    /// The claim failed. No snapshot was touched.
    Failed { error: SourceError, message: String },
}

/// Controller for the battle pass screen.
pub struct BattlePassPage {
    progress: Arc<dyn ProgressSource>,
    claims: Arc<dyn RewardClaimService>,
    notifier: Arc<dyn Notifier>,
    tier_cap: u32,
}

impl BattlePassPage {
    pub fn new(
        progress: Arc<dyn ProgressSource>,
        claims: Arc<dyn RewardClaimService>,
        notifier: Arc<dyn Notifier>,
        tier_cap: u32,
    ) -> Self {
        Self {
            progress,
            claims,
            notifier,
            tier_cap,
        }
    }

    /// Fetch progress and compute the view. `None` means no active season.
    pub async fn load(&self, now: DateTime<Utc>) -> Result<Option<BattlePassView>, AppError> {
        let Some(progress) = self.progress.battle_pass_progress().await? else {
            tracing::debug!("no active battle pass season");
            return Ok(None);
        };
        let view = compute_battle_pass_view(&progress, now, self.tier_cap)?;
        Ok(Some(view))
    }

    /// Claim the reward for `tier`, then refetch on success.
    ///
    /// Eligibility is left to the claim service. A failed refetch is logged
    /// and never turns an accepted claim into an error.
    pub async fn claim(&self, tier: u32, now: DateTime<Utc>) -> Result<ClaimOutcome, AppError> {
        match self.claims.claim_reward(tier).await {
            Ok(receipt) => {
                tracing::info!(tier, "battle pass reward claimed");
                self.notifier.notify(Notice::success(
                    "Reward Claimed!",
                    format!("You received your tier {} reward!", tier),
                ));
                let view = self.load(now).await.unwrap_or_else(|e| {
                    tracing::warn!(tier, error = %e, "refetch after claim failed");
                    None
                });
                Ok(ClaimOutcome::Claimed { receipt, view })
            }
            Err(error) => {
                tracing::warn!(tier, error = %error, "battle pass claim failed");
                let message = error.user_message("Failed to claim reward");
                self.notifier.notify(Notice::error(message.clone()));
                Ok(ClaimOutcome::Failed { error, message })
            }
        }
    }
}
