//! # API Request/Response Types

use serde::{Deserialize, Serialize};
use tierline_core::{BattlePassView, ClaimState, TierReward};

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// BATTLE PASS
// =============================================================================

/// One ladder row with its display state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierRewardJson {
    #[serde(flatten)]
    pub reward: TierReward,
    pub claim_state: ClaimState,
}

impl From<TierReward> for TierRewardJson {
    fn from(reward: TierReward) -> Self {
        Self {
            claim_state: reward.claim_state(),
            reward,
        }
    }
}

/// Season view plus its derived ladder. `active` is false outside a season.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BattlePassResponse {
    pub active: bool,
    pub view: Option<BattlePassView>,
    pub tiers: Vec<TierRewardJson>,
}

impl BattlePassResponse {
    #[must_use]
    pub fn from_view(view: Option<BattlePassView>) -> Self {
        let tiers = view
            .as_ref()
            .map(|v| v.tiers().map(TierRewardJson::from).collect())
            .unwrap_or_default();
        Self {
            active: view.is_some(),
            view,
            tiers,
        }
    }
}

/// Claim result. On success `view` is the refetched season view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimResponse {
    pub claimed: bool,
    pub tier: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<BattlePassView>,
}

// =============================================================================
// REFERRALS
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyRequest {
    pub code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyResponse {
    pub applied: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coins_earned: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ApplyResponse {
    #[must_use]
    pub fn applied(coins_earned: u64) -> Self {
        Self {
            applied: true,
            coins_earned: Some(coins_earned),
            message: None,
        }
    }

    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            applied: false,
            coins_earned: None,
            message: Some(message.into()),
        }
    }
}

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
