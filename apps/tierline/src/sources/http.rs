//! # Rewards HTTP Client
//!
//! [`HttpRewardsClient`] talks to the upstream rewards API and decodes every
//! payload through `tierline_core::formats` before handing it on.

use super::{
    ApplyReceipt, ClaimReceipt, LoyaltySource, ProgressSource, ReferralApplyService,
    ReferralSource, RewardClaimService, SourceError,
};
use async_trait::async_trait;
use reqwest::{Method, StatusCode, header};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tierline_core::formats::{
    WireApplyResponse, WireBattlePassProgress, WireErrorBody, WireLoyaltyTier, WireReferral,
    WireReferralCode, WireUserLoyalty, decode_tier_list,
};
use tierline_core::{
    BattlePassProgress, LoyaltyTier, NormalizedCode, ProgressionError, Referral, ReferralCode,
    UserLoyalty,
};

/// HTTP client for the upstream rewards API.
#[derive(Clone)]
pub struct HttpRewardsClient {
    http: reqwest::Client,
    base_url: String,
    session: Option<String>,
}

impl HttpRewardsClient {
    /// Create a client for `base_url`, forwarding `session` as the cookie.
    pub fn new(
        base_url: impl Into<String>,
        session: Option<String>,
        timeout: Duration,
    ) -> Result<Self, SourceError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        reqwest::Url::parse(&base_url)
            .map_err(|e| SourceError::Unavailable(format!("invalid base URL {base_url:?}: {e}")))?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SourceError::Unavailable(format!("{}: {e}", base_url)))?;
        Ok(Self {
            http,
            base_url,
            session,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a request carrying the session cookie, if any.
    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.http.request(method, &url);
        if let Some(ref session) = self.session {
            req = req.header(header::COOKIE, session);
        }
        req
    }

    /// Send a request and map connection errors.
    async fn send(&self, req: reqwest::RequestBuilder) -> Result<reqwest::Response, SourceError> {
        req.send()
            .await
            .map_err(|e| SourceError::Unavailable(format!("{}: {e}", self.base_url)))
    }

    /// Map non-success statuses to errors, surfacing the body's `message`.
    async fn check(&self, resp: reqwest::Response) -> Result<reqwest::Response, SourceError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        if status == StatusCode::UNAUTHORIZED {
            return Err(SourceError::Unauthorized);
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(SourceError::RateLimited);
        }
        let body = resp.json::<WireErrorBody>().await.unwrap_or_default();
        tracing::debug!(status = status.as_u16(), message = %body.message, "upstream rejected request");
        Err(SourceError::Rejected {
            status: status.as_u16(),
            message: body.message,
        })
    }

    async fn decode<T: DeserializeOwned>(&self, resp: reqwest::Response) -> Result<T, SourceError> {
        resp.json::<T>()
            .await
            .map_err(|e| SourceError::Decode(ProgressionError::DecodeFailure(e.to_string())))
    }

    /// GET `path`, returning `None` on 404.
    async fn get_optional<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, SourceError> {
        let resp = self.send(self.request(Method::GET, path)).await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let resp = self.check(resp).await?;
        self.decode(resp).await.map(Some)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, SourceError> {
        let resp = self.send(self.request(Method::GET, path)).await?;
        let resp = self.check(resp).await?;
        self.decode(resp).await
    }
}

#[async_trait]
impl ProgressSource for HttpRewardsClient {
    /// GET /api/battle-pass/progress
    async fn battle_pass_progress(&self) -> Result<Option<BattlePassProgress>, SourceError> {
        let wire: Option<WireBattlePassProgress> =
            self.get_optional("/api/battle-pass/progress").await?;
        Ok(wire.map(BattlePassProgress::try_from).transpose()?)
    }
}

#[async_trait]
impl RewardClaimService for HttpRewardsClient {
    /// POST /api/battle-pass/claim/{tier}
    async fn claim_reward(&self, tier: u32) -> Result<ClaimReceipt, SourceError> {
        let path = format!("/api/battle-pass/claim/{}", tier);
        let resp = self.send(self.request(Method::POST, &path)).await?;
        self.check(resp).await?;
        Ok(ClaimReceipt { tier })
    }
}

#[async_trait]
impl LoyaltySource for HttpRewardsClient {
    /// GET /api/loyalty/status
    async fn loyalty_status(&self) -> Result<Option<UserLoyalty>, SourceError> {
        let wire: Option<WireUserLoyalty> = self.get_optional("/api/loyalty/status").await?;
        Ok(wire.map(UserLoyalty::try_from).transpose()?)
    }

    /// GET /api/loyalty/tiers
    async fn loyalty_tiers(&self) -> Result<Vec<LoyaltyTier>, SourceError> {
        let wire: Vec<WireLoyaltyTier> = self.get("/api/loyalty/tiers").await?;
        Ok(decode_tier_list(wire)?)
    }
}

#[async_trait]
impl ReferralSource for HttpRewardsClient {
    /// GET /api/referrals/my-code
    async fn my_code(&self) -> Result<Option<ReferralCode>, SourceError> {
        let wire: Option<WireReferralCode> = self.get_optional("/api/referrals/my-code").await?;
        Ok(wire.map(ReferralCode::try_from).transpose()?)
    }

    /// GET /api/referrals/my-referrals
    async fn my_referrals(&self) -> Result<Vec<Referral>, SourceError> {
        let wire: Vec<WireReferral> = self.get("/api/referrals/my-referrals").await?;
        wire.into_iter()
            .map(|r| Referral::try_from(r).map_err(SourceError::from))
            .collect()
    }
}

#[async_trait]
impl ReferralApplyService for HttpRewardsClient {
    /// POST /api/referrals/apply
    async fn apply_code(&self, code: &NormalizedCode) -> Result<ApplyReceipt, SourceError> {
        let body = serde_json::json!({ "code": code.as_str() });
        let req = self.request(Method::POST, "/api/referrals/apply").json(&body);
        let resp = self.send(req).await?;
        let resp = self.check(resp).await?;
        let wire: WireApplyResponse = self.decode(resp).await?;
        Ok(ApplyReceipt {
            coins_earned: wire.coins_earned()?,
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Json, Router,
        extract::Path,
        http::{HeaderMap, StatusCode as AxumStatus, header::COOKIE},
        response::{IntoResponse, Response},
        routing::{get, post},
    };
    use serde_json::{Value, json};

    const SESSION: &str = "sid=abc";

    async fn stub_claim(Path(tier): Path<u32>) -> Response {
        match tier {
            3 => AxumStatus::OK.into_response(),
            7 => (
                AxumStatus::CONFLICT,
                Json(json!({ "message": "Reward already claimed" })),
            )
                .into_response(),
            _ => (AxumStatus::INTERNAL_SERVER_ERROR, "boom").into_response(),
        }
    }

    async fn stub_apply(headers: HeaderMap, Json(body): Json<Value>) -> Response {
        let cookie = headers.get(COOKIE).and_then(|v| v.to_str().ok());
        if cookie != Some(SESSION) {
            return AxumStatus::UNAUTHORIZED.into_response();
        }
        match body["code"].as_str() {
            Some("FRIEND7") => Json(json!({ "coinsEarned": 50 })).into_response(),
            Some("BROKEN") => Json(json!({ "coinsEarned": -5 })).into_response(),
            _ => (
                AxumStatus::NOT_FOUND,
                Json(json!({ "message": "Invalid referral code" })),
            )
                .into_response(),
        }
    }

    /// Serve a stand-in rewards API on an ephemeral loopback port.
    async fn stub_service() -> String {
        let app = Router::new()
            .route("/api/battle-pass/progress", get(|| async { AxumStatus::NOT_FOUND }))
            .route("/api/battle-pass/claim/{tier}", post(stub_claim))
            .route("/api/loyalty/status", get(|| async { AxumStatus::NOT_FOUND }))
            .route("/api/loyalty/tiers", get(|| async { AxumStatus::UNAUTHORIZED }))
            .route("/api/referrals/my-code", get(|| async { AxumStatus::NOT_FOUND }))
            .route(
                "/api/referrals/my-referrals",
                get(|| async { AxumStatus::TOO_MANY_REQUESTS }),
            )
            .route("/api/referrals/apply", post(stub_apply));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });
        format!("http://{addr}")
    }

    async fn client(session: Option<&str>) -> HttpRewardsClient {
        HttpRewardsClient::new(
            stub_service().await,
            session.map(str::to_string),
            Duration::from_secs(5),
        )
        .expect("client")
    }

    fn code(raw: &str) -> NormalizedCode {
        NormalizedCode::parse(raw).expect("code")
    }

    #[test]
    fn base_url_drops_trailing_slash() {
        let client = HttpRewardsClient::new("http://rewards.local/", None, Duration::from_secs(5))
            .expect("client");
        assert_eq!(client.base_url(), "http://rewards.local");
    }

    #[tokio::test]
    async fn unreachable_service_is_unavailable() {
        // Port 9 (discard) on loopback is not served in test environments.
        let client = HttpRewardsClient::new("http://127.0.0.1:9", None, Duration::from_secs(2))
            .expect("client");
        let result = client.battle_pass_progress().await;
        assert!(matches!(result, Err(SourceError::Unavailable(_))));
    }

    #[tokio::test]
    async fn not_found_means_absent() {
        let client = client(None).await;
        assert_eq!(client.battle_pass_progress().await.expect("progress"), None);
        assert_eq!(client.loyalty_status().await.expect("status"), None);
        assert_eq!(client.my_code().await.expect("code"), None);
    }

    #[tokio::test]
    async fn auth_and_rate_limit_statuses_map_to_variants() {
        let client = client(None).await;
        assert!(matches!(
            client.loyalty_tiers().await,
            Err(SourceError::Unauthorized)
        ));
        assert!(matches!(
            client.my_referrals().await,
            Err(SourceError::RateLimited)
        ));
    }

    #[tokio::test]
    async fn rejection_carries_status_and_body_message() {
        let client = client(None).await;
        assert_eq!(
            client.claim_reward(3).await.expect("claim"),
            ClaimReceipt { tier: 3 }
        );

        let err = client.claim_reward(7).await.expect_err("duplicate claim");
        assert!(matches!(
            err,
            SourceError::Rejected { status: 409, ref message } if message == "Reward already claimed"
        ));

        // a body without a JSON message still keeps the status
        let err = client.claim_reward(99).await.expect_err("server error");
        assert!(matches!(
            err,
            SourceError::Rejected { status: 500, ref message } if message.is_empty()
        ));
    }

    #[tokio::test]
    async fn apply_forwards_session_cookie_and_decodes_coins() {
        let client = client(Some(SESSION)).await;
        let receipt = client.apply_code(&code(" friend7 ")).await.expect("apply");
        assert_eq!(receipt.coins_earned, 50);

        let err = client.apply_code(&code("nobody")).await.expect_err("unknown");
        assert!(matches!(err, SourceError::Rejected { status: 404, .. }));

        let err = client.apply_code(&code("broken")).await.expect_err("negative");
        assert!(matches!(err, SourceError::Decode(_)));
    }

    #[tokio::test]
    async fn missing_session_is_unauthorized() {
        let client = client(None).await;
        let err = client.apply_code(&code("FRIEND7")).await.expect_err("no cookie");
        assert!(matches!(err, SourceError::Unauthorized));
    }
}
