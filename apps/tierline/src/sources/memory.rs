//! # In-Memory Rewards Service
//!
//! A self-contained rewards service holding every account in one ledger.
//! It enforces the same rules the production service does, so pages can be
//! exercised end to end without a network:
//!
//! - a tier reward is claimable once, and only when the display predicate
//!   says it is claimable
//! - a referral code matches case-insensitively, cannot be self-applied, and
//!   each account may apply one code
//! - applying a code appends a referral to the code owner's list, paying the
//!   owner the code's configured referrer reward
//!
//! [`InMemoryRewards::session`] returns the collaborator handle for one user.

use super::{
    ApplyReceipt, ClaimReceipt, LoyaltySource, ProgressSource, ReferralApplyService,
    ReferralSource, RewardClaimService, SourceError,
};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tierline_core::battle_pass::TierReward;
use tierline_core::{
    BattlePassProgress, Benefits, LoyaltyTier, NormalizedCode, Referral, ReferralCode,
    ReferralId, ReferralStatus, Season, TierIcon, TierId, UserId, UserLoyalty,
};
use tokio::sync::Mutex;

// =============================================================================
// ACCOUNTS
// =============================================================================

/// Initial state of an account.
#[derive(Debug, Clone, Default)]
pub struct AccountSeed {
    pub current_tier: u32,
    pub experience: u64,
    pub is_premium: bool,
    pub points: u64,
    pub lifetime_points: u64,
    /// Stored loyalty back-reference; may name a tier absent from the list.
    pub loyalty_tier: Option<LoyaltyTier>,
    /// Has a loyalty record at all.
    pub enrolled: bool,
    pub code: Option<ReferralCode>,
}

#[derive(Debug, Clone)]
struct Account {
    seed: AccountSeed,
    coins: u64,
    claimed: BTreeSet<u32>,
    referrals: Vec<Referral>,
    referred_by: Option<UserId>,
}

#[derive(Debug, Default)]
struct Ledger {
    season: Option<Season>,
    tiers: Vec<LoyaltyTier>,
    accounts: BTreeMap<UserId, Account>,
    next_referral: u64,
}

fn rejected(status: u16, message: &str) -> SourceError {
    SourceError::Rejected {
        status,
        message: message.to_string(),
    }
}

impl Ledger {
    fn account(&self, user: &UserId) -> Result<&Account, SourceError> {
        self.accounts.get(user).ok_or(SourceError::Unauthorized)
    }

    fn account_mut(&mut self, user: &UserId) -> Result<&mut Account, SourceError> {
        self.accounts.get_mut(user).ok_or(SourceError::Unauthorized)
    }

    fn claim(&mut self, user: &UserId, tier: u32) -> Result<ClaimReceipt, SourceError> {
        let Some(max_tier) = self.season.as_ref().map(|s| s.max_tier) else {
            return Err(rejected(404, "No active battle pass season"));
        };
        if tier == 0 || tier > max_tier {
            return Err(rejected(400, "Invalid tier"));
        }

        let account = self.account_mut(user)?;
        let reward = TierReward::derive(tier, account.seed.current_tier, account.seed.is_premium);
        if !reward.is_unlocked {
            return Err(rejected(400, "Tier not unlocked yet"));
        }
        if !reward.is_claimable {
            return Err(rejected(403, "Premium battle pass required"));
        }
        if !account.claimed.insert(tier) {
            return Err(rejected(409, "Reward already claimed"));
        }
        account.coins = account.coins.saturating_add(reward.reward_coins);
        Ok(ClaimReceipt { tier })
    }

    fn apply(&mut self, user: &UserId, code: &NormalizedCode) -> Result<ApplyReceipt, SourceError> {
        let owner = self
            .accounts
            .iter()
            .find(|(_, account)| account.seed.code.as_ref().is_some_and(|c| c.matches(code)))
            .map(|(id, _)| id.clone())
            .ok_or_else(|| rejected(404, "Invalid referral code"))?;

        if &owner == user {
            return Err(rejected(400, "You cannot use your own referral code"));
        }
        if self.account(user)?.referred_by.is_some() {
            return Err(rejected(409, "You have already used a referral code"));
        }

        self.next_referral = self.next_referral.saturating_add(1);
        let referral_id = ReferralId(format!("ref-{}", self.next_referral));

        let owner_account = self.account_mut(&owner)?;
        let Some(owner_code) = owner_account.seed.code.as_mut() else {
            return Err(rejected(404, "Invalid referral code"));
        };
        owner_code.uses = owner_code.uses.saturating_add(1);
        let referrer_reward = owner_code.coin_reward_referrer;
        let referred_reward = owner_code.coin_reward_referred;

        owner_account.coins = owner_account.coins.saturating_add(referrer_reward);
        owner_account.referrals.push(Referral {
            id: referral_id,
            referred_id: user.clone(),
            created_at: Utc::now(),
            referrer_reward_amount: referrer_reward,
            status: ReferralStatus::Completed,
        });

        let account = self.account_mut(user)?;
        account.referred_by = Some(owner);
        account.coins = account.coins.saturating_add(referred_reward);

        Ok(ApplyReceipt {
            coins_earned: referred_reward,
        })
    }
}

// =============================================================================
// SERVICE
// =============================================================================

/// Shared in-memory ledger of every account.
#[derive(Clone, Default)]
pub struct InMemoryRewards {
    ledger: Arc<Mutex<Ledger>>,
}

impl InMemoryRewards {
    /// Create a service with an optional active season and a tier list.
    pub fn new(season: Option<Season>, tiers: Vec<LoyaltyTier>) -> Self {
        Self {
            ledger: Arc::new(Mutex::new(Ledger {
                season,
                tiers,
                ..Ledger::default()
            })),
        }
    }

    /// Register (or replace) an account.
    pub async fn add_account(&self, user: UserId, seed: AccountSeed) {
        let mut ledger = self.ledger.lock().await;
        ledger.accounts.insert(
            user,
            Account {
                seed,
                coins: 0,
                claimed: BTreeSet::new(),
                referrals: Vec::new(),
                referred_by: None,
            },
        );
    }

    /// Coin balance of an account, `None` if unknown.
    pub async fn coins(&self, user: &UserId) -> Option<u64> {
        let ledger = self.ledger.lock().await;
        ledger.accounts.get(user).map(|a| a.coins)
    }

    /// Collaborator handle acting as `user`.
    #[must_use]
    pub fn session(&self, user: UserId) -> InMemorySession {
        InMemorySession {
            ledger: self.ledger.clone(),
            user,
        }
    }

    /// A populated service for local demos: user `demo` and user `friend`.
    pub async fn demo() -> Self {
        let season = Season {
            name: "Season of Embers".to_string(),
            description: "Earn experience from every match to climb 50 tiers.".to_string(),
            max_tier: 50,
            end_date: Utc::now() + Duration::days(21),
        };
        let tiers = demo_tiers();
        let service = Self::new(Some(season), tiers.clone());

        service
            .add_account(
                UserId::new("demo"),
                AccountSeed {
                    current_tier: 12,
                    experience: 2_450,
                    is_premium: false,
                    points: 3_200,
                    lifetime_points: 7_800,
                    loyalty_tier: tiers.get(1).cloned(),
                    enrolled: true,
                    code: Some(ReferralCode {
                        code: "Demo2026".to_string(),
                        uses: 0,
                        coin_reward_referrer: 100,
                        coin_reward_referred: 50,
                    }),
                },
            )
            .await;
        service
            .add_account(
                UserId::new("friend"),
                AccountSeed {
                    current_tier: 3,
                    enrolled: true,
                    code: Some(ReferralCode {
                        code: "FRIEND7".to_string(),
                        uses: 0,
                        coin_reward_referrer: 100,
                        coin_reward_referred: 50,
                    }),
                    ..AccountSeed::default()
                },
            )
            .await;
        service
    }
}

fn demo_tier(id: &str, name: &str, required_points: u64, benefits: Benefits, order: u32) -> LoyaltyTier {
    LoyaltyTier {
        id: TierId::new(id),
        name: name.to_string(),
        required_points,
        benefits,
        icon: TierIcon::from_name(id),
        display_order: order,
    }
}

fn demo_tiers() -> Vec<LoyaltyTier> {
    vec![
        demo_tier("bronze", "Bronze", 0, Benefits::default(), 1),
        demo_tier(
            "silver",
            "Silver",
            1_000,
            Benefits {
                coin_bonus: Some(5u64.into()),
                discount_percent: None,
            },
            2,
        ),
        demo_tier(
            "gold",
            "Gold",
            5_000,
            Benefits {
                coin_bonus: Some(10u64.into()),
                discount_percent: Some(5u64.into()),
            },
            3,
        ),
        demo_tier(
            "platinum",
            "Platinum",
            15_000,
            Benefits {
                coin_bonus: Some(15u64.into()),
                discount_percent: Some(10u64.into()),
            },
            4,
        ),
        demo_tier(
            "diamond",
            "Diamond",
            40_000,
            Benefits {
                coin_bonus: Some(25u64.into()),
                discount_percent: Some(15u64.into()),
            },
            5,
        ),
    ]
}

// =============================================================================
// PER-USER SESSION
// =============================================================================

/// The in-memory service as seen by one user.
#[derive(Clone)]
pub struct InMemorySession {
    ledger: Arc<Mutex<Ledger>>,
    user: UserId,
}

#[async_trait]
impl ProgressSource for InMemorySession {
    async fn battle_pass_progress(&self) -> Result<Option<BattlePassProgress>, SourceError> {
        let ledger = self.ledger.lock().await;
        let account = ledger.account(&self.user)?;
        Ok(ledger.season.as_ref().map(|season| BattlePassProgress {
            current_tier: account.seed.current_tier,
            experience: account.seed.experience,
            is_premium: account.seed.is_premium,
            season: season.clone(),
        }))
    }
}

#[async_trait]
impl RewardClaimService for InMemorySession {
    async fn claim_reward(&self, tier: u32) -> Result<ClaimReceipt, SourceError> {
        let mut ledger = self.ledger.lock().await;
        ledger.claim(&self.user, tier)
    }
}

#[async_trait]
impl LoyaltySource for InMemorySession {
    async fn loyalty_status(&self) -> Result<Option<UserLoyalty>, SourceError> {
        let ledger = self.ledger.lock().await;
        let seed = &ledger.account(&self.user)?.seed;
        Ok(seed.enrolled.then(|| UserLoyalty {
            points: seed.points,
            lifetime_points: seed.lifetime_points,
            tier: seed.loyalty_tier.clone(),
        }))
    }

    async fn loyalty_tiers(&self) -> Result<Vec<LoyaltyTier>, SourceError> {
        let ledger = self.ledger.lock().await;
        Ok(ledger.tiers.clone())
    }
}

#[async_trait]
impl ReferralSource for InMemorySession {
    async fn my_code(&self) -> Result<Option<ReferralCode>, SourceError> {
        let ledger = self.ledger.lock().await;
        Ok(ledger.account(&self.user)?.seed.code.clone())
    }

    async fn my_referrals(&self) -> Result<Vec<Referral>, SourceError> {
        let ledger = self.ledger.lock().await;
        Ok(ledger.account(&self.user)?.referrals.clone())
    }
}

#[async_trait]
impl ReferralApplyService for InMemorySession {
    async fn apply_code(&self, code: &NormalizedCode) -> Result<ApplyReceipt, SourceError> {
        let mut ledger = self.ledger.lock().await;
        ledger.apply(&self.user, code)
    }
}

// =============================================================================
// TESTS
// =============================================================================
