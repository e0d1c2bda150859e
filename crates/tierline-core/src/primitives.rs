//! # Fixed Policy Primitives
//!
//! Hardcoded reward policy and bounds for the Tierline engine.
//!
//! These values are compiled into the binary and are immutable at runtime.
//! A surrounding system that wants a different reward schedule overrides it
//! upstream; the engine always displays this one.

/// Every Nth battle pass tier is a premium reward.
pub const PREMIUM_TIER_INTERVAL: u32 = 10;

/// Coins per tier level for premium reward tiers (`tier * 20`).
pub const PREMIUM_COINS_PER_TIER: u64 = 20;

/// Coins per tier level for standard reward tiers (`tier * 5`).
pub const STANDARD_COINS_PER_TIER: u64 = 5;

/// Default number of battle pass tiers rendered in a view.
///
/// Bounds render cost; tiers beyond the cap are simply not listed.
pub const DEFAULT_TIER_CAP: u32 = 20;

/// Milliseconds in one day, used for the season countdown.
pub const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum length of a referral code accepted for submission.
pub const MAX_REFERRAL_CODE_LENGTH: usize = 64;

/// Maximum length of a benefits payload that will be decoded.
///
/// Longer payloads are treated as a decode failure.
pub const MAX_BENEFITS_PAYLOAD_LENGTH: usize = 4096;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn premium_interval_is_ten() {
        assert_eq!(PREMIUM_TIER_INTERVAL, 10);
    }

    #[test]
    fn one_day_in_millis() {
        assert_eq!(MILLIS_PER_DAY, 86_400_000);
    }
}
