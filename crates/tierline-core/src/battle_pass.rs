//! # Battle Pass Calculator
//!
//! Computes the season view for a [`BattlePassProgress`] snapshot:
//! progress percentage, days remaining, and the per-tier reward ladder.
//!
//! The ladder is derived, never stored. For each tier `t`:
//!
//! | Field | Rule |
//! |-------|------|
//! | `is_unlocked` | `t <= current_tier` |
//! | `is_premium_reward` | `t % 10 == 0` |
//! | `reward_coins` | premium ? `t * 20` : `t * 5` |
//! | `is_claimable` | unlocked and (standard or user is premium) |
//!
//! Claimability here is a display predicate. The claim service holds the
//! authority and rejects ineligible claims on its own.

use crate::primitives::{
    MILLIS_PER_DAY, PREMIUM_COINS_PER_TIER, PREMIUM_TIER_INTERVAL, STANDARD_COINS_PER_TIER,
};
use crate::types::{BattlePassProgress, ProgressionError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// TIER REWARD
// =============================================================================

/// What the claim control for a tier should offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimState {
    /// Tier not reached yet.
    Locked,
    /// Tier reached, but the reward needs a premium pass.
    PremiumOnly,
    /// Tier reached and the reward may be claimed.
    Claimable,
}

/// Derived reward state of a single battle pass tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierReward {
    pub tier: u32,
    pub is_unlocked: bool,
    pub is_premium_reward: bool,
    pub reward_coins: u64,
    pub is_claimable: bool,
}

impl TierReward {
    /// Derive the reward state of `tier` for a user at `current_tier`.
    #[must_use]
    pub fn derive(tier: u32, current_tier: u32, is_premium: bool) -> Self {
        let is_unlocked = tier <= current_tier;
        let is_premium_reward = is_premium_reward(tier);
        Self {
            tier,
            is_unlocked,
            is_premium_reward,
            reward_coins: reward_coins(tier),
            is_claimable: is_unlocked && (!is_premium_reward || is_premium),
        }
    }

    #[must_use]
    pub fn claim_state(&self) -> ClaimState {
        if !self.is_unlocked {
            ClaimState::Locked
        } else if self.is_claimable {
            ClaimState::Claimable
        } else {
            ClaimState::PremiumOnly
        }
    }
}

/// Premium rewards sit on every tenth tier.
#[must_use]
pub fn is_premium_reward(tier: u32) -> bool {
    tier % PREMIUM_TIER_INTERVAL == 0
}

/// Coins granted by a tier under the fixed reward schedule.
#[must_use]
pub fn reward_coins(tier: u32) -> u64 {
    if is_premium_reward(tier) {
        (tier as u64).saturating_mul(PREMIUM_COINS_PER_TIER)
    } else {
        (tier as u64).saturating_mul(STANDARD_COINS_PER_TIER)
    }
}

// =============================================================================
// TIER LADDER ITERATOR
// =============================================================================

/// Lazy, finite iterator over the displayed tiers `1..=count`.
///
/// Cloning yields an independent iterator from the same position, and
/// [`BattlePassView::tiers`] always starts a fresh one.
#[derive(Debug, Clone)]
pub struct TierRewards {
    next: u32,
    last: u32,
    current_tier: u32,
    is_premium: bool,
}

impl Iterator for TierRewards {
    type Item = TierReward;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next > self.last {
            return None;
        }
        let reward = TierReward::derive(self.next, self.current_tier, self.is_premium);
        self.next = self.next.saturating_add(1);
        if reward.tier == u32::MAX {
            // saturated: close the range
            self.last = 0;
        }
        Some(reward)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = if self.next > self.last {
            0
        } else {
            (self.last - self.next) as usize + 1
        };
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for TierRewards {}

impl std::iter::FusedIterator for TierRewards {}

// =============================================================================
// BATTLE PASS VIEW
// =============================================================================

/// Everything the battle pass page displays, computed from one snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattlePassView {
    pub season_name: String,
    pub season_description: String,
    pub current_tier: u32,
    pub max_tier: u32,
    pub is_premium: bool,
    /// Offer the premium upgrade when the user does not hold it.
    pub show_upgrade_offer: bool,
    /// `100 * current_tier / max_tier`, floored, in `0..=100`.
    pub tier_progress_percent: u8,
    /// Whole days until the season ends, rounded up. Negative once ended.
    pub days_left: i64,
    /// `min(tier_cap, max_tier)`.
    pub display_tier_count: u32,
}

impl BattlePassView {
    /// Iterate the displayed tier ladder from tier 1.
    #[must_use]
    pub fn tiers(&self) -> TierRewards {
        TierRewards {
            next: 1,
            last: self.display_tier_count,
            current_tier: self.current_tier,
            is_premium: self.is_premium,
        }
    }

    /// Reward state of a displayed tier, `None` outside `1..=display_tier_count`.
    #[must_use]
    pub fn tier(&self, tier: u32) -> Option<TierReward> {
        (1..=self.display_tier_count)
            .contains(&tier)
            .then(|| TierReward::derive(tier, self.current_tier, self.is_premium))
    }

    /// Number of displayed tiers that can be claimed right now.
    #[must_use]
    pub fn claimable_count(&self) -> usize {
        self.tiers().filter(|t| t.is_claimable).count()
    }
}

/// Compute the battle pass view.
///
/// Fails with `InvalidDomain` when the season has no tiers or when the
/// snapshot places the user beyond the last tier. Neither is clamped.
pub fn compute_battle_pass_view(
    progress: &BattlePassProgress,
    now: DateTime<Utc>,
    tier_cap: u32,
) -> Result<BattlePassView, ProgressionError> {
    let season = &progress.season;
    let tier_progress_percent = tier_progress_percent(progress.current_tier, season.max_tier)?;

    Ok(BattlePassView {
        season_name: season.name.clone(),
        season_description: season.description.clone(),
        current_tier: progress.current_tier,
        max_tier: season.max_tier,
        is_premium: progress.is_premium,
        show_upgrade_offer: !progress.is_premium,
        tier_progress_percent,
        days_left: days_left(season.end_date, now),
        display_tier_count: tier_cap.min(season.max_tier),
    })
}

/// Season completion as a whole percentage.
pub fn tier_progress_percent(current_tier: u32, max_tier: u32) -> Result<u8, ProgressionError> {
    if max_tier == 0 {
        return Err(ProgressionError::InvalidDomain(
            "season max tier must be positive".to_string(),
        ));
    }
    if current_tier > max_tier {
        return Err(ProgressionError::InvalidDomain(format!(
            "current tier {} exceeds season max tier {}",
            current_tier, max_tier
        )));
    }

    let percent = (current_tier as u64).saturating_mul(100) / (max_tier as u64);
    Ok(percent.min(100) as u8)
}

/// Days until `end`, rounded toward positive infinity.
#[must_use]
pub fn days_left(end: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let remaining_ms = end.signed_duration_since(now).num_milliseconds();
    let whole = remaining_ms / MILLIS_PER_DAY;
    if remaining_ms % MILLIS_PER_DAY > 0 {
        whole + 1
    } else {
        whole
    }
}

// =============================================================================
// TESTS
// =============================================================================
