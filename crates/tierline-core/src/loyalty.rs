//! # Loyalty Calculator
//!
//! Computes the loyalty program view from a [`UserLoyalty`] snapshot and the
//! ordered tier list it was fetched with.
//!
//! ## Two notions of "current"
//!
//! The stored `UserLoyalty::tier` back-reference decides which tier is shown
//! as current and which tier is next. Independently, every tier reports
//! `is_unlocked = points >= required_points`. The two may disagree when the
//! back-reference is stale; both are exposed and neither is reconciled here.

use crate::formats::decode_benefits;
use crate::types::{LoyaltyTier, ProgressionError, TierId, UserLoyalty};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// =============================================================================
// CURRENT TIER RESOLUTION
// =============================================================================

/// How the current tier was resolved against the tier list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurrentTier {
    /// The back-referenced tier sits at this index of the list.
    Assigned(usize),
    /// No back-reference; the lowest tier is current.
    DefaultLowest,
    /// The back-referenced tier is missing from the list. Next-tier numbers
    /// are computed as if the user held the lowest tier.
    Unlisted(TierId),
}

impl CurrentTier {
    /// Index used for next-tier computations.
    #[must_use]
    pub fn effective_index(&self) -> usize {
        match self {
            Self::Assigned(index) => *index,
            Self::DefaultLowest | Self::Unlisted(_) => 0,
        }
    }

    /// The resolution as a lookup error when the back-reference is dangling.
    #[must_use]
    pub fn not_found(&self) -> Option<ProgressionError> {
        match self {
            Self::Unlisted(id) => Some(ProgressionError::NotFound(format!(
                "loyalty tier '{}' is not in the tier list",
                id.as_str()
            ))),
            _ => None,
        }
    }
}

// =============================================================================
// VIEW TYPES
// =============================================================================

/// One row of the "All Tiers" listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierStanding {
    pub tier: LoyaltyTier,
    pub is_unlocked: bool,
    pub is_current: bool,
    pub benefit_lines: Vec<String>,
}

/// The computed loyalty numbers for a configured program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoyaltyStanding {
    pub current_tier: LoyaltyTier,
    pub resolution: CurrentTier,
    pub next_tier: Option<LoyaltyTier>,
    pub points: u64,
    pub lifetime_points: u64,
    pub points_to_next_tier: u64,
    /// `100 * points / next.required_points`, floored and clamped to `0..=100`.
    /// Always 100 at the top tier.
    pub tier_progress_percent: u8,
    pub current_benefits: Vec<String>,
    pub tiers: Vec<TierStanding>,
}

/// The loyalty page view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LoyaltyView {
    /// The tier list is empty: there is no program to show.
    NotConfigured,
    Active(LoyaltyStanding),
}

impl LoyaltyView {
    #[must_use]
    pub fn standing(&self) -> Option<&LoyaltyStanding> {
        match self {
            Self::NotConfigured => None,
            Self::Active(standing) => Some(standing),
        }
    }
}

// =============================================================================
// COMPUTATION
// =============================================================================

/// A tier is unlocked once the spendable balance reaches its threshold.
#[must_use]
pub fn is_unlocked(points: u64, tier: &LoyaltyTier) -> bool {
    points >= tier.required_points
}

/// Position of the tier with `id`, matched by identity.
#[must_use]
pub fn find_tier_index(tiers: &[LoyaltyTier], id: &TierId) -> Option<usize> {
    tiers.iter().position(|t| &t.id == id)
}

/// Check that ids are unique and thresholds strictly increase.
pub fn validate_tier_list(tiers: &[LoyaltyTier]) -> Result<(), ProgressionError> {
    let mut seen = BTreeSet::new();
    for tier in tiers {
        if !seen.insert(&tier.id) {
            return Err(ProgressionError::InvalidDomain(format!(
                "duplicate loyalty tier id '{}'",
                tier.id.as_str()
            )));
        }
    }

    for pair in tiers.windows(2) {
        if pair[1].required_points <= pair[0].required_points {
            return Err(ProgressionError::InvalidDomain(format!(
                "tier '{}' requires {} points, not above '{}' at {}",
                pair[1].name, pair[1].required_points, pair[0].name, pair[0].required_points
            )));
        }
    }
    Ok(())
}

/// Describe a raw benefits payload. Undecodable payloads describe nothing.
#[must_use]
pub fn parse_benefits(raw: &str) -> Vec<String> {
    decode_benefits(raw)
        .map(|benefits| benefits.descriptions())
        .unwrap_or_default()
}

/// Compute the loyalty view.
///
/// A missing loyalty record reads as zero points with no assigned tier.
pub fn compute_loyalty_view(
    loyalty: Option<&UserLoyalty>,
    tiers: &[LoyaltyTier],
) -> Result<LoyaltyView, ProgressionError> {
    validate_tier_list(tiers)?;

    let Some(lowest) = tiers.first() else {
        return Ok(LoyaltyView::NotConfigured);
    };

    let points = loyalty.map_or(0, |l| l.points);
    let lifetime_points = loyalty.map_or(0, |l| l.lifetime_points);

    let (current_tier, resolution) = match loyalty.and_then(|l| l.tier.as_ref()) {
        Some(assigned) => match find_tier_index(tiers, &assigned.id) {
            Some(index) => (tiers[index].clone(), CurrentTier::Assigned(index)),
            None => (assigned.clone(), CurrentTier::Unlisted(assigned.id.clone())),
        },
        None => (lowest.clone(), CurrentTier::DefaultLowest),
    };

    let next_tier = tiers.get(resolution.effective_index() + 1).cloned();

    let (points_to_next_tier, tier_progress_percent) = match &next_tier {
        Some(next) => (
            next.required_points.saturating_sub(points),
            progress_percent(points, next.required_points),
        ),
        None => (0, 100),
    };

    let standings = tiers
        .iter()
        .map(|tier| TierStanding {
            tier: tier.clone(),
            is_unlocked: is_unlocked(points, tier),
            is_current: tier.id == current_tier.id,
            benefit_lines: tier.benefits.descriptions(),
        })
        .collect();

    Ok(LoyaltyView::Active(LoyaltyStanding {
        current_benefits: current_tier.benefits.descriptions(),
        current_tier,
        resolution,
        next_tier,
        points,
        lifetime_points,
        points_to_next_tier,
        tier_progress_percent,
        tiers: standings,
    }))
}

fn progress_percent(points: u64, required: u64) -> u8 {
    if required == 0 {
        return 100;
    }
    let percent = (points as u128).saturating_mul(100) / (required as u128);
    percent.min(100) as u8
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Benefits, TierIcon};

    fn tier(id: &str, required_points: u64, coin_bonus: Option<u64>) -> LoyaltyTier {
        LoyaltyTier {
            id: TierId::new(id),
            name: id.to_uppercase(),
            required_points,
            benefits: Benefits {
                coin_bonus: coin_bonus.map(Into::into),
                discount_percent: None,
            },
            icon: TierIcon::from_name(id),
            display_order: 0,
        }
    }

    fn ladder() -> Vec<LoyaltyTier> {
        vec![
            tier("bronze", 0, None),
            tier("silver", 1000, Some(5)),
            tier("gold", 5000, Some(10)),
        ]
    }

    fn loyalty(points: u64, assigned: Option<LoyaltyTier>) -> UserLoyalty {
        UserLoyalty {
            points,
            lifetime_points: points.saturating_add(250),
            tier: assigned,
        }
    }

    #[test]
    fn empty_tier_list_is_not_configured() {
        let view = compute_loyalty_view(Some(&loyalty(10, None)), &[]).expect("view");
        assert_eq!(view, LoyaltyView::NotConfigured);
        assert!(view.standing().is_none());
    }

    #[test]
    fn missing_record_defaults_to_lowest_tier() {
        let tiers = ladder();
        let view = compute_loyalty_view(None, &tiers).expect("view");
        let standing = view.standing().expect("active");
        assert_eq!(standing.resolution, CurrentTier::DefaultLowest);
        assert_eq!(standing.current_tier.id, TierId::new("bronze"));
        assert_eq!(standing.points, 0);
        assert_eq!(standing.points_to_next_tier, 1000);
        assert_eq!(standing.tier_progress_percent, 0);
    }

    #[test]
    fn assigned_tier_drives_next_tier() {
        let tiers = ladder();
        let record = loyalty(2500, Some(tiers[1].clone()));
        let standing = compute_loyalty_view(Some(&record), &tiers)
            .expect("view")
            .standing()
            .cloned()
            .expect("active");
        assert_eq!(standing.resolution, CurrentTier::Assigned(1));
        assert_eq!(standing.next_tier.map(|t| t.id), Some(TierId::new("gold")));
        assert_eq!(standing.points_to_next_tier, 2500);
        assert_eq!(standing.tier_progress_percent, 50);
        assert_eq!(
            standing.current_benefits,
            vec!["5% coin bonus on purchases".to_string()]
        );
    }

    #[test]
    fn top_tier_is_complete() {
        let tiers = ladder();
        let record = loyalty(7000, Some(tiers[2].clone()));
        let standing = compute_loyalty_view(Some(&record), &tiers)
            .expect("view")
            .standing()
            .cloned()
            .expect("active");
        assert!(standing.next_tier.is_none());
        assert_eq!(standing.tier_progress_percent, 100);
        assert_eq!(standing.points_to_next_tier, 0);
    }

    #[test]
    fn stale_back_reference_is_exposed_not_reconciled() {
        let tiers = ladder();
        // Stored as bronze but holds enough points for silver.
        let record = loyalty(1200, Some(tiers[0].clone()));
        let standing = compute_loyalty_view(Some(&record), &tiers)
            .expect("view")
            .standing()
            .cloned()
            .expect("active");
        assert_eq!(standing.current_tier.id, TierId::new("bronze"));
        assert!(standing.tiers[1].is_unlocked);
        assert!(!standing.tiers[1].is_current);
        assert_eq!(standing.points_to_next_tier, 0);
        assert_eq!(standing.tier_progress_percent, 100);
    }

    #[test]
    fn unlisted_back_reference_falls_back_to_lowest_index() {
        let tiers = ladder();
        let record = loyalty(300, Some(tier("legacy", 200, None)));
        let standing = compute_loyalty_view(Some(&record), &tiers)
            .expect("view")
            .standing()
            .cloned()
            .expect("active");
        assert_eq!(
            standing.resolution,
            CurrentTier::Unlisted(TierId::new("legacy"))
        );
        assert!(matches!(
            standing.resolution.not_found(),
            Some(ProgressionError::NotFound(_))
        ));
        assert_eq!(standing.current_tier.id, TierId::new("legacy"));
        assert_eq!(standing.next_tier.map(|t| t.id), Some(TierId::new("silver")));
        assert!(standing.tiers.iter().all(|t| !t.is_current));
    }

    #[test]
    fn unordered_tiers_are_invalid() {
        let tiers = vec![tier("silver", 1000, None), tier("bronze", 0, None)];
        let result = compute_loyalty_view(None, &tiers);
        assert!(matches!(result, Err(ProgressionError::InvalidDomain(_))));
    }

    #[test]
    fn duplicate_thresholds_are_invalid() {
        let tiers = vec![tier("bronze", 0, None), tier("silver", 0, None)];
        assert!(validate_tier_list(&tiers).is_err());
    }

    #[test]
    fn duplicate_ids_are_invalid() {
        let tiers = vec![tier("bronze", 0, None), tier("bronze", 10, None)];
        assert!(matches!(
            validate_tier_list(&tiers),
            Err(ProgressionError::InvalidDomain(_))
        ));
    }

    #[test]
    fn parse_benefits_recovers_from_garbage() {
        assert_eq!(
            parse_benefits(r#"{"coinBonus":5}"#),
            vec!["5% coin bonus on purchases".to_string()]
        );
        assert!(parse_benefits("not json").is_empty());
    }
}
