//! # tierline-core
//!
//! The progression engine for Tierline - THE ENGINE.
//!
//! This crate computes what is true about a user's rewards standing given a
//! set of read-only snapshots:
//! - `battle_pass` → season progress, days left, per-tier claimability
//! - `loyalty` → current and next tier, points to next, per-tier unlock state
//! - `referral` → referral totals and code normalization
//! - `formats` → typed decoding of upstream payloads at the boundary
//!
//! ## Architectural Constraints
//!
//! The engine:
//! - Has NO async, NO network, NO clock reads (`now` is always passed in)
//! - Never mutates its inputs; a claim or apply is followed by a fresh snapshot
//! - Uses integer arithmetic only
//! - Is safe to call concurrently from any number of callers

// =============================================================================
// MODULES
// =============================================================================

pub mod battle_pass;
pub mod formats;
pub mod loyalty;
pub mod primitives;
pub mod referral;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types
// =============================================================================

pub use types::{
    BattlePassProgress, Benefits, LoyaltyTier, ProgressionError, Referral, ReferralCode,
    ReferralId, ReferralStatus, Season, TierIcon, TierId, UserId, UserLoyalty,
};

// =============================================================================
// RE-EXPORTS: Calculators
// =============================================================================

pub use battle_pass::{
    BattlePassView, ClaimState, TierReward, TierRewards, compute_battle_pass_view,
};
pub use loyalty::{
    CurrentTier, LoyaltyStanding, LoyaltyView, TierStanding, compute_loyalty_view,
    parse_benefits,
};
pub use referral::{NormalizedCode, ReferralSummary, summarize};
