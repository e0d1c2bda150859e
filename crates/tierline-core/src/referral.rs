//! # Referral Summary
//!
//! Aggregates the caller's referral records and normalizes codes typed in by
//! users before they are submitted.

use crate::primitives::MAX_REFERRAL_CODE_LENGTH;
use crate::types::{ProgressionError, Referral, ReferralCode};
use serde::{Deserialize, Serialize};

/// Totals over a referral list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferralSummary {
    pub count: u64,
    /// Sum of referrer rewards in coins. Integer accumulation, saturating.
    pub total_earned: u64,
}

/// Count the referrals and sum what they earned the referrer.
#[must_use]
pub fn summarize(referrals: &[Referral]) -> ReferralSummary {
    referrals
        .iter()
        .fold(ReferralSummary::default(), |acc, referral| ReferralSummary {
            count: acc.count.saturating_add(1),
            total_earned: acc
                .total_earned
                .saturating_add(referral.referrer_reward_amount),
        })
}

// =============================================================================
// CODE NORMALIZATION
// =============================================================================

/// A referral code ready for submission: trimmed and uppercased.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NormalizedCode(String);

impl NormalizedCode {
    /// Normalize user input. Blank or oversized input is `InvalidDomain`.
    pub fn parse(input: &str) -> Result<Self, ProgressionError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ProgressionError::InvalidDomain(
                "referral code is empty".to_string(),
            ));
        }
        if trimmed.len() > MAX_REFERRAL_CODE_LENGTH {
            return Err(ProgressionError::InvalidDomain(format!(
                "referral code length {} exceeds maximum {}",
                trimmed.len(),
                MAX_REFERRAL_CODE_LENGTH
            )));
        }
        Ok(Self(trimmed.to_uppercase()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NormalizedCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl ReferralCode {
    /// Case-insensitive comparison against a normalized code.
    #[must_use]
    pub fn matches(&self, code: &NormalizedCode) -> bool {
        self.code.trim().to_uppercase() == code.as_str()
    }

    /// The share line shown next to the code.
    #[must_use]
    pub fn share_message(&self) -> String {
        format!(
            "Share this code with friends. They get {} coins and you get {} coins!",
            self.coin_reward_referred, self.coin_reward_referrer
        )
    }
}

// =============================================================================
// TESTS
// =============================================================================
