//! # Collaborators
//!
//! The data API the pages consume. Each trait is one upstream capability:
//!
//! - [`ProgressSource`]: battle pass snapshot
//! - [`RewardClaimService`]: claim a tier reward
//! - [`LoyaltySource`]: loyalty status and the ordered tier list
//! - [`ReferralSource`]: own referral code and generated referrals
//! - [`ReferralApplyService`]: apply somebody else's code
//!
//! Implementations:
//!
//! - [`HttpRewardsClient`]: the production rewards API over HTTP
//! - [`InMemoryRewards`]: a self-contained service for tests and demos
//!
//! Mutating calls never patch a snapshot. Callers fetch a fresh one.

mod http;
mod memory;

pub use http::HttpRewardsClient;
pub use memory::{AccountSeed, InMemoryRewards, InMemorySession};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tierline_core::{
    BattlePassProgress, LoyaltyTier, NormalizedCode, ProgressionError, Referral, ReferralCode,
    UserLoyalty,
};

// =============================================================================
// ERRORS
// =============================================================================

/// Failures reported by a collaborator.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The service could not be reached.
    #[error("Cannot reach rewards service at {0}")]
    Unavailable(String),

    /// 401 - session missing or expired.
    #[error("Unauthorized: session missing or expired")]
    Unauthorized,

    /// 429 - too many requests.
    #[error("Rate limited: too many requests")]
    RateLimited,

    /// The service refused the request and said why.
    #[error("Rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The service answered with a payload the engine cannot accept.
    #[error(transparent)]
    Decode(#[from] ProgressionError),
}

impl SourceError {
    /// The message to show a user, or `fallback` when the service gave none.
    #[must_use]
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Rejected { message, .. } if !message.is_empty() => message.clone(),
            _ => fallback.to_string(),
        }
    }
}

// =============================================================================
// RECEIPTS
// =============================================================================

/// Acknowledgement of a successful claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimReceipt {
    pub tier: u32,
}

/// Acknowledgement of a successfully applied referral code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyReceipt {
    pub coins_earned: u64,
}

// =============================================================================
// COLLABORATOR TRAITS
// =============================================================================

/// Supplies battle pass snapshots.
#[async_trait]
pub trait ProgressSource: Send + Sync {
    /// `None` when no season is active.
    async fn battle_pass_progress(&self) -> Result<Option<BattlePassProgress>, SourceError>;
}

/// Accepts reward claims. The service decides eligibility.
#[async_trait]
pub trait RewardClaimService: Send + Sync {
    async fn claim_reward(&self, tier: u32) -> Result<ClaimReceipt, SourceError>;
}

/// Supplies loyalty status and the ordered tier list.
///
/// Both halves must come from the same logical snapshot; callers fetch them
/// together and fail together.
#[async_trait]
pub trait LoyaltySource: Send + Sync {
    /// `None` when the user has no loyalty record yet.
    async fn loyalty_status(&self) -> Result<Option<UserLoyalty>, SourceError>;

    async fn loyalty_tiers(&self) -> Result<Vec<LoyaltyTier>, SourceError>;
}

/// Supplies the caller's referral code and the referrals it produced.
#[async_trait]
pub trait ReferralSource: Send + Sync {
    async fn my_code(&self) -> Result<Option<ReferralCode>, SourceError>;

    async fn my_referrals(&self) -> Result<Vec<Referral>, SourceError>;
}

/// Applies a referral code on behalf of the caller.
#[async_trait]
pub trait ReferralApplyService: Send + Sync {
    async fn apply_code(&self, code: &NormalizedCode) -> Result<ApplyReceipt, SourceError>;
}

// =============================================================================
// BACKEND BUNDLE
// =============================================================================

/// All collaborators a page set needs.
#[derive(Clone)]
pub struct Backend {
    pub progress: Arc<dyn ProgressSource>,
    pub claims: Arc<dyn RewardClaimService>,
    pub loyalty: Arc<dyn LoyaltySource>,
    pub referrals: Arc<dyn ReferralSource>,
    pub apply: Arc<dyn ReferralApplyService>,
}

impl Backend {
    /// Use one service for every collaborator role.
    pub fn from_service<S>(service: S) -> Self
    where
        S: ProgressSource
            + RewardClaimService
            + LoyaltySource
            + ReferralSource
            + ReferralApplyService
            + 'static,
    {
        let service = Arc::new(service);
        Self {
            progress: service.clone(),
            claims: service.clone(),
            loyalty: service.clone(),
            referrals: service.clone(),
            apply: service,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_message_is_shown_verbatim() {
        let err = SourceError::Rejected {
            status: 409,
            message: "Reward already claimed".to_string(),
        };
        assert_eq!(err.user_message("Failed"), "Reward already claimed");
    }

    #[test]
    fn transport_errors_use_fallback() {
        let err = SourceError::Unavailable("http://localhost:5000".to_string());
        assert_eq!(
            err.user_message("Failed to claim reward"),
            "Failed to claim reward"
        );
        let empty = SourceError::Rejected {
            status: 500,
            message: String::new(),
        };
        assert_eq!(empty.user_message("Failed"), "Failed");
    }
}
