//! # Wire Types
//!
//! JSON shapes of the upstream rewards API and their conversion into
//! domain snapshots.
//!
//! ## Validation
//!
//! - Quantities arrive as signed JSON integers; a negative value is
//!   `InvalidDomain`, never clamped to zero.
//! - Instants are RFC 3339, or a naive ISO-8601 date-time read as UTC.
//! - `isPremium` is `"true"`/`"false"` (any ASCII case) or a JSON boolean.
//! - `benefits` failures recover to empty [`Benefits`]; every other
//!   malformed field fails the whole snapshot with `DecodeFailure`.

use crate::primitives::MAX_BENEFITS_PAYLOAD_LENGTH;
use crate::types::{
    BattlePassProgress, Benefits, LoyaltyTier, ProgressionError, Referral, ReferralCode,
    ReferralId, ReferralStatus, Season, TierIcon, TierId, UserId, UserLoyalty,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// =============================================================================
// FIELD DECODERS
// =============================================================================

fn non_negative(field: &str, value: i64) -> Result<u64, ProgressionError> {
    u64::try_from(value).map_err(|_| {
        ProgressionError::InvalidDomain(format!("{} must be non-negative, got {}", field, value))
    })
}

fn tier_number(field: &str, value: i64) -> Result<u32, ProgressionError> {
    let value = non_negative(field, value)?;
    u32::try_from(value).map_err(|_| {
        ProgressionError::InvalidDomain(format!("{} is out of range: {}", field, value))
    })
}

/// Parse an upstream instant.
pub fn parse_instant(field: &str, raw: &str) -> Result<DateTime<Utc>, ProgressionError> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Ok(instant.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| ProgressionError::DecodeFailure(format!("{} '{}': {}", field, raw, e)))
}

/// Decode a benefits payload (JSON object serialized into a string).
///
/// Recognized keys are `coinBonus` and `discountPercent`; other keys are
/// ignored, and a recognized key holding a non-number is treated as absent.
pub fn decode_benefits(raw: &str) -> Result<Benefits, ProgressionError> {
    if raw.len() > MAX_BENEFITS_PAYLOAD_LENGTH {
        return Err(ProgressionError::DecodeFailure(format!(
            "benefits payload of {} bytes exceeds maximum {}",
            raw.len(),
            MAX_BENEFITS_PAYLOAD_LENGTH
        )));
    }
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| ProgressionError::DecodeFailure(format!("benefits: {}", e)))?;
    benefits_from_value(&value)
}

fn benefits_from_value(value: &Value) -> Result<Benefits, ProgressionError> {
    let Some(object) = value.as_object() else {
        return Err(ProgressionError::DecodeFailure(
            "benefits must be a JSON object".to_string(),
        ));
    };
    let number = |key: &str| match object.get(key) {
        Some(Value::Number(n)) => Some(n.clone()),
        _ => None,
    };
    Ok(Benefits {
        coin_bonus: number("coinBonus"),
        discount_percent: number("discountPercent"),
    })
}

// =============================================================================
// BATTLE PASS
// =============================================================================

/// A boolean flag that some endpoints send as a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireFlag {
    Bool(bool),
    Text(String),
}

impl WireFlag {
    pub fn decode(&self, field: &str) -> Result<bool, ProgressionError> {
        match self {
            Self::Bool(flag) => Ok(*flag),
            Self::Text(text) if text.eq_ignore_ascii_case("true") => Ok(true),
            Self::Text(text) if text.eq_ignore_ascii_case("false") => Ok(false),
            Self::Text(text) => Err(ProgressionError::DecodeFailure(format!(
                "{} must be \"true\" or \"false\", got {:?}",
                field, text
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireSeason {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub max_tier: i64,
    pub end_date: String,
}

impl TryFrom<WireSeason> for Season {
    type Error = ProgressionError;

    fn try_from(wire: WireSeason) -> Result<Self, Self::Error> {
        Ok(Self {
            max_tier: tier_number("season.maxTier", wire.max_tier)?,
            end_date: parse_instant("season.endDate", &wire.end_date)?,
            name: wire.name,
            description: wire.description,
        })
    }
}

/// `GET /api/battle-pass/progress`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireBattlePassProgress {
    pub current_tier: i64,
    #[serde(default)]
    pub experience: i64,
    pub is_premium: WireFlag,
    pub season: WireSeason,
}

impl TryFrom<WireBattlePassProgress> for BattlePassProgress {
    type Error = ProgressionError;

    fn try_from(wire: WireBattlePassProgress) -> Result<Self, Self::Error> {
        Ok(Self {
            current_tier: tier_number("currentTier", wire.current_tier)?,
            experience: non_negative("experience", wire.experience)?,
            is_premium: wire.is_premium.decode("isPremium")?,
            season: Season::try_from(wire.season)?,
        })
    }
}

// =============================================================================
// LOYALTY
// =============================================================================

/// `GET /api/loyalty/tiers` element, also embedded in the status payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireLoyaltyTier {
    pub id: String,
    pub name: String,
    pub required_points: i64,
    /// Usually a JSON object serialized into a string; a bare object is
    /// accepted as well.
    #[serde(default)]
    pub benefits: Value,
    #[serde(default)]
    pub icon_name: String,
    #[serde(default)]
    pub display_order: i64,
}

impl WireLoyaltyTier {
    fn benefits(&self) -> Benefits {
        let decoded = match &self.benefits {
            Value::String(raw) => decode_benefits(raw),
            Value::Null => Ok(Benefits::default()),
            other => benefits_from_value(other),
        };
        decoded.unwrap_or_default()
    }
}

impl TryFrom<WireLoyaltyTier> for LoyaltyTier {
    type Error = ProgressionError;

    fn try_from(wire: WireLoyaltyTier) -> Result<Self, Self::Error> {
        let benefits = wire.benefits();
        Ok(Self {
            required_points: non_negative("requiredPoints", wire.required_points)?,
            display_order: tier_number("displayOrder", wire.display_order)?,
            icon: TierIcon::from_name(&wire.icon_name),
            id: TierId(wire.id),
            name: wire.name,
            benefits,
        })
    }
}

/// `GET /api/loyalty/status`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireUserLoyalty {
    pub points: i64,
    pub lifetime_points: i64,
    #[serde(default)]
    pub tier: Option<WireLoyaltyTier>,
}

impl TryFrom<WireUserLoyalty> for UserLoyalty {
    type Error = ProgressionError;

    fn try_from(wire: WireUserLoyalty) -> Result<Self, Self::Error> {
        Ok(Self {
            points: non_negative("points", wire.points)?,
            lifetime_points: non_negative("lifetimePoints", wire.lifetime_points)?,
            tier: wire.tier.map(LoyaltyTier::try_from).transpose()?,
        })
    }
}

/// Decode a tier list, preserving upstream order.
pub fn decode_tier_list(wire: Vec<WireLoyaltyTier>) -> Result<Vec<LoyaltyTier>, ProgressionError> {
    wire.into_iter().map(LoyaltyTier::try_from).collect()
}

// =============================================================================
// REFERRALS
// =============================================================================

/// `GET /api/referrals/my-referrals` element.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireReferral {
    pub id: String,
    pub referred_id: String,
    pub created_at: String,
    pub referrer_reward_amount: i64,
    #[serde(default)]
    pub status: String,
}

impl TryFrom<WireReferral> for Referral {
    type Error = ProgressionError;

    fn try_from(wire: WireReferral) -> Result<Self, Self::Error> {
        Ok(Self {
            created_at: parse_instant("createdAt", &wire.created_at)?,
            referrer_reward_amount: non_negative(
                "referrerRewardAmount",
                wire.referrer_reward_amount,
            )?,
            status: ReferralStatus::from_name(&wire.status),
            id: ReferralId(wire.id),
            referred_id: UserId(wire.referred_id),
        })
    }
}

/// `GET /api/referrals/my-code`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireReferralCode {
    pub code: String,
    #[serde(default)]
    pub uses: i64,
    pub coin_reward_referrer: i64,
    pub coin_reward_referred: i64,
}

impl TryFrom<WireReferralCode> for ReferralCode {
    type Error = ProgressionError;

    fn try_from(wire: WireReferralCode) -> Result<Self, Self::Error> {
        Ok(Self {
            uses: non_negative("uses", wire.uses)?,
            coin_reward_referrer: non_negative("coinRewardReferrer", wire.coin_reward_referrer)?,
            coin_reward_referred: non_negative("coinRewardReferred", wire.coin_reward_referred)?,
            code: wire.code,
        })
    }
}

/// `POST /api/referrals/apply` success body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireApplyResponse {
    pub coins_earned: i64,
}

impl WireApplyResponse {
    pub fn coins_earned(&self) -> Result<u64, ProgressionError> {
        non_negative("coinsEarned", self.coins_earned)
    }
}

/// Error body returned by any failing endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WireErrorBody {
    #[serde(default)]
    pub message: String,
}

/// Decode a JSON document into a wire type, mapping parse errors.
pub fn decode_json<T: serde::de::DeserializeOwned>(raw: &str) -> Result<T, ProgressionError> {
    serde_json::from_str(raw).map_err(|e| ProgressionError::DecodeFailure(e.to_string()))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_premium_flag_is_normalized() {
        let raw = r#"{
            "currentTier": 12,
            "experience": 340,
            "isPremium": "true",
            "season": {
                "name": "Season 3",
                "description": "Frostfall",
                "maxTier": 50,
                "endDate": "2026-04-01T00:00:00.000Z"
            }
        }"#;
        let wire: WireBattlePassProgress = decode_json(raw).expect("wire");
        let progress = BattlePassProgress::try_from(wire).expect("progress");
        assert!(progress.is_premium);
        assert_eq!(progress.current_tier, 12);
        assert_eq!(progress.season.max_tier, 50);
    }

    #[test]
    fn boolean_premium_flag_is_accepted() {
        assert_eq!(WireFlag::Bool(false).decode("isPremium"), Ok(false));
        assert_eq!(
            WireFlag::Text("FALSE".to_string()).decode("isPremium"),
            Ok(false)
        );
    }

    #[test]
    fn unknown_premium_text_is_decode_failure() {
        assert!(matches!(
            WireFlag::Text("yes".to_string()).decode("isPremium"),
            Err(ProgressionError::DecodeFailure(_))
        ));
    }

    #[test]
    fn negative_points_are_invalid_domain() {
        let wire = WireUserLoyalty {
            points: -5,
            lifetime_points: 10,
            tier: None,
        };
        assert!(matches!(
            UserLoyalty::try_from(wire),
            Err(ProgressionError::InvalidDomain(_))
        ));
    }

    #[test]
    fn naive_instant_reads_as_utc() {
        let instant = parse_instant("endDate", "2026-04-01T10:30:00").expect("instant");
        assert_eq!(instant.to_rfc3339(), "2026-04-01T10:30:00+00:00");
        assert!(parse_instant("endDate", "next tuesday").is_err());
    }

    #[test]
    fn benefits_string_is_decoded_at_the_boundary() {
        let wire = WireLoyaltyTier {
            id: "t-gold".to_string(),
            name: "Gold".to_string(),
            required_points: 5000,
            benefits: Value::String(r#"{"coinBonus":10,"discountPercent":5,"vip":true}"#.into()),
            icon_name: "gold".to_string(),
            display_order: 3,
        };
        let tier = LoyaltyTier::try_from(wire).expect("tier");
        assert_eq!(tier.icon, TierIcon::Gold);
        assert_eq!(
            tier.benefits.descriptions(),
            vec![
                "10% coin bonus on purchases".to_string(),
                "5% discount on all purchases".to_string()
            ]
        );
    }

    #[test]
    fn broken_benefits_recover_to_empty() {
        let wire = WireLoyaltyTier {
            id: "t-bronze".to_string(),
            name: "Bronze".to_string(),
            required_points: 0,
            benefits: Value::String("{coinBonus:".into()),
            icon_name: "bronze".to_string(),
            display_order: 1,
        };
        let tier = LoyaltyTier::try_from(wire).expect("tier");
        assert!(tier.benefits.is_empty());
    }

    #[test]
    fn benefits_must_be_an_object() {
        assert!(decode_benefits("[5]").is_err());
        assert!(decode_benefits("null").is_err());
        assert!(decode_benefits("5").is_err());
        let ignored = decode_benefits(r#"{"coinBonus":"lots"}"#).expect("object");
        assert!(ignored.is_empty());
    }

    #[test]
    fn whole_valued_float_benefit_reads_as_integer() {
        let benefits = decode_benefits(r#"{"coinBonus":5.0,"discountPercent":0.0}"#).expect("benefits");
        assert_eq!(
            benefits.descriptions(),
            vec!["5% coin bonus on purchases".to_string()]
        );
    }

    #[test]
    fn fractional_benefit_keeps_its_digits() {
        let benefits = decode_benefits(r#"{"discountPercent":2.5}"#).expect("benefits");
        assert_eq!(
            benefits.descriptions(),
            vec!["2.5% discount on all purchases".to_string()]
        );
    }

    #[test]
    fn referral_decodes_status_and_instant() {
        let raw = r#"{
            "id": "r1",
            "referredId": "u9",
            "createdAt": "2026-02-14T08:00:00Z",
            "referrerRewardAmount": 50,
            "status": "completed"
        }"#;
        let referral = Referral::try_from(decode_json::<WireReferral>(raw).expect("wire"))
            .expect("referral");
        assert_eq!(referral.status, ReferralStatus::Completed);
        assert_eq!(referral.referrer_reward_amount, 50);
    }
}
