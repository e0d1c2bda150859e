//! # Core Type Definitions
//!
//! This module contains the read-only snapshot types the engine computes over:
//! - Battle pass entities (`Season`, `BattlePassProgress`)
//! - Loyalty entities (`LoyaltyTier`, `TierIcon`, `Benefits`, `UserLoyalty`)
//! - Referral entities (`Referral`, `ReferralStatus`, `ReferralCode`)
//! - Error types (`ProgressionError`)
//!
//! ## Snapshot Guarantees
//!
//! All entities in this module:
//! - Are produced once per view load by the boundary decoders in `formats`
//! - Are never mutated by the engine; a claim or apply yields a fresh snapshot
//! - Carry only non-negative integer quantities (enforced by unsigned types)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Identifier of a loyalty tier. Tier identity is matched on this value only.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TierId(pub String);

impl TierId {
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Identifier of a referral record.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ReferralId(pub String);

/// Identifier of a user account.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }
}

// =============================================================================
// BATTLE PASS
// =============================================================================

/// A battle pass season. Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Season {
    pub name: String,
    pub description: String,
    /// Highest reachable tier. Must be positive for any computation.
    pub max_tier: u32,
    pub end_date: DateTime<Utc>,
}

/// A user's progress through the active season.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattlePassProgress {
    /// Tiers reached so far, `0..=season.max_tier`.
    pub current_tier: u32,
    pub experience: u64,
    pub is_premium: bool,
    pub season: Season,
}

// =============================================================================
// LOYALTY
// =============================================================================

/// Icon vocabulary for loyalty tiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierIcon {
    Bronze,
    Silver,
    Gold,
    Platinum,
    Diamond,
    Other(String),
}

impl TierIcon {
    /// Decode an icon name. Unknown names are kept verbatim under `Other`.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "bronze" => Self::Bronze,
            "silver" => Self::Silver,
            "gold" => Self::Gold,
            "platinum" => Self::Platinum,
            "diamond" => Self::Diamond,
            other => Self::Other(other.to_string()),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Bronze => "bronze",
            Self::Silver => "silver",
            Self::Gold => "gold",
            Self::Platinum => "platinum",
            Self::Diamond => "diamond",
            Self::Other(name) => name,
        }
    }
}

/// Decoded tier benefits. Both fields are percentages.
///
/// Values are kept as JSON numbers so fractional percentages survive
/// without any float arithmetic in the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Benefits {
    pub coin_bonus: Option<serde_json::Number>,
    pub discount_percent: Option<serde_json::Number>,
}

impl Benefits {
    /// True when no benefit would produce a description line.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptions().is_empty()
    }

    /// Human-readable benefit lines, coin bonus first.
    ///
    /// Whole values print without a fraction (`5.0` reads as `5%`).
    #[must_use]
    pub fn descriptions(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(bonus) = self.coin_bonus.as_ref().and_then(percent_text) {
            lines.push(format!("{}% coin bonus on purchases", bonus));
        }
        if let Some(discount) = self.discount_percent.as_ref().and_then(percent_text) {
            lines.push(format!("{}% discount on all purchases", discount));
        }
        lines
    }
}

/// Decimal text of a percentage, or `None` for zero.
///
/// Works on the number's textual form so no float comparison is needed.
fn percent_text(n: &serde_json::Number) -> Option<String> {
    let text = n.to_string();
    let (mantissa, exponent) = match text.find(['e', 'E']) {
        Some(at) => text.split_at(at),
        None => (text.as_str(), ""),
    };
    if mantissa.bytes().all(|b| matches!(b, b'0' | b'.' | b'-' | b'+')) {
        return None;
    }
    let mantissa = match mantissa.split_once('.') {
        Some((whole, fraction)) => {
            let fraction = fraction.trim_end_matches('0');
            if fraction.is_empty() {
                whole.to_string()
            } else {
                format!("{whole}.{fraction}")
            }
        }
        None => mantissa.to_string(),
    };
    Some(format!("{mantissa}{exponent}"))
}

/// A loyalty program tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoyaltyTier {
    pub id: TierId,
    pub name: String,
    /// Points needed to unlock. Strictly increasing across an ordered list.
    pub required_points: u64,
    pub benefits: Benefits,
    pub icon: TierIcon,
    pub display_order: u32,
}

/// A user's loyalty standing as stored upstream.
///
/// `points` and `lifetime_points` track different things; neither bounds the
/// other. `tier` is the stored back-reference and may be stale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserLoyalty {
    pub points: u64,
    pub lifetime_points: u64,
    pub tier: Option<LoyaltyTier>,
}

// =============================================================================
// REFERRALS
// =============================================================================

/// Lifecycle status of a referral as reported upstream.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferralStatus {
    Pending,
    Completed,
    Cancelled,
    Other(String),
}

impl ReferralStatus {
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "pending" => Self::Pending,
            "completed" => Self::Completed,
            "cancelled" => Self::Cancelled,
            other => Self::Other(other.to_string()),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Other(name) => name,
        }
    }
}

/// A referral generated by the caller's code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Referral {
    pub id: ReferralId,
    pub referred_id: UserId,
    pub created_at: DateTime<Utc>,
    /// Coins credited to the referrer for this referral.
    pub referrer_reward_amount: u64,
    pub status: ReferralStatus,
}

/// The caller's own shareable referral code record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferralCode {
    /// Canonical stored code; its casing is preserved for display.
    pub code: String,
    pub uses: u64,
    pub coin_reward_referrer: u64,
    pub coin_reward_referred: u64,
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors produced by the progression engine.
///
/// - `InvalidDomain` is fatal to a computation and is never clamped away
/// - `NotFound` marks a missing referenced entity; callers apply fallbacks
/// - `DecodeFailure` marks an unparseable boundary payload
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProgressionError {
    /// Inputs violate a domain invariant.
    #[error("Invalid domain: {0}")]
    InvalidDomain(String),

    /// A referenced tier, season or code does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A boundary payload could not be decoded.
    #[error("Decode failure: {0}")]
    DecodeFailure(String),
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_valued_fractions_print_as_integers() {
        let benefits = Benefits {
            coin_bonus: serde_json::Number::from_f64(5.0),
            discount_percent: serde_json::Number::from_f64(0.0),
        };
        assert_eq!(
            benefits.descriptions(),
            vec!["5% coin bonus on purchases".to_string()]
        );
    }

    #[test]
    fn fractional_percentages_keep_their_digits() {
        let benefits = Benefits {
            coin_bonus: Some(serde_json::Number::from(10u64)),
            discount_percent: serde_json::Number::from_f64(12.5),
        };
        assert_eq!(
            benefits.descriptions(),
            vec![
                "10% coin bonus on purchases".to_string(),
                "12.5% discount on all purchases".to_string(),
            ]
        );
        assert!(Benefits::default().is_empty());
    }

    #[test]
    fn icon_vocabulary_round_trips_names() {
        for name in ["bronze", "silver", "gold", "platinum", "diamond"] {
            assert_eq!(TierIcon::from_name(name).name(), name);
        }
        assert_eq!(
            TierIcon::from_name("obsidian"),
            TierIcon::Other("obsidian".to_string())
        );
    }

    #[test]
    fn benefits_skip_zero_and_absent_fields() {
        let benefits = Benefits {
            coin_bonus: Some(0u64.into()),
            discount_percent: None,
        };
        assert!(benefits.descriptions().is_empty());
        assert!(benefits.is_empty());
    }

    #[test]
    fn benefits_describe_both_fields_in_order() {
        let benefits = Benefits {
            coin_bonus: Some(10u64.into()),
            discount_percent: Some(15u64.into()),
        };
        assert_eq!(
            benefits.descriptions(),
            vec![
                "10% coin bonus on purchases".to_string(),
                "15% discount on all purchases".to_string()
            ]
        );
    }

    #[test]
    fn referral_status_keeps_unknown_names() {
        assert_eq!(ReferralStatus::from_name("pending"), ReferralStatus::Pending);
        assert_eq!(ReferralStatus::from_name("expired").name(), "expired");
    }
}
