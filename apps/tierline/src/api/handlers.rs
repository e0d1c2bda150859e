//! # API Endpoint Handlers
//!
//! Each handler builds the matching page over the shared backend, runs it,
//! and returns the computed view.

use super::{
    AppState,
    types::{ApplyRequest, ApplyResponse, BattlePassResponse, ClaimResponse, ErrorResponse, HealthResponse},
};
use crate::error::AppError;
use crate::pages::{ApplyOutcome, BattlePassPage, ClaimOutcome, LoyaltyPage, ReferralsPage};
use crate::sources::SourceError;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;

// =============================================================================
// ERROR MAPPING
// =============================================================================

/// HTTP status for a collaborator failure.
fn source_status(error: &SourceError) -> StatusCode {
    match error {
        SourceError::Unauthorized => StatusCode::UNAUTHORIZED,
        SourceError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        SourceError::Rejected { status, .. } => {
            StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
        }
        SourceError::Unavailable(_) | SourceError::Decode(_) => StatusCode::BAD_GATEWAY,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Source(e) => source_status(e),
            // Upstream data the engine refused to compute a view from.
            AppError::Progression(_) => StatusCode::BAD_GATEWAY,
            AppError::Rejected(_) => StatusCode::BAD_REQUEST,
            AppError::Config(_) | AppError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "view request failed");
        }
        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// BATTLE PASS HANDLERS
// =============================================================================

fn battle_pass_page(state: &AppState) -> BattlePassPage {
    BattlePassPage::new(
        state.backend.progress.clone(),
        state.backend.claims.clone(),
        state.notifier.clone(),
        state.tier_cap,
    )
}

/// Current season view and ladder.
pub async fn battle_pass_handler(
    State(state): State<AppState>,
) -> Result<Json<BattlePassResponse>, AppError> {
    let view = battle_pass_page(&state).load(Utc::now()).await?;
    Ok(Json(BattlePassResponse::from_view(view)))
}

/// Claim the reward for `tier`.
pub async fn claim_handler(
    State(state): State<AppState>,
    Path(tier): Path<u32>,
) -> Result<Response, AppError> {
    let outcome = battle_pass_page(&state).claim(tier, Utc::now()).await?;
    let response = match outcome {
        ClaimOutcome::Claimed { receipt, view } => (
            StatusCode::OK,
            Json(ClaimResponse {
                claimed: true,
                tier: receipt.tier,
                message: None,
                view,
            }),
        ),
        ClaimOutcome::Failed { error, message } => (
            source_status(&error),
            Json(ClaimResponse {
                claimed: false,
                tier,
                message: Some(message),
                view: None,
            }),
        ),
    };
    Ok(response.into_response())
}

// =============================================================================
// LOYALTY HANDLER
// =============================================================================

/// Loyalty standing.
pub async fn loyalty_handler(State(state): State<AppState>) -> Result<Response, AppError> {
    let view = LoyaltyPage::new(state.backend.loyalty.clone()).load().await?;
    Ok(Json(view).into_response())
}

// =============================================================================
// REFERRAL HANDLERS
// =============================================================================

fn referrals_page(state: &AppState) -> ReferralsPage {
    ReferralsPage::new(
        state.backend.referrals.clone(),
        state.backend.apply.clone(),
        state.notifier.clone(),
    )
}

/// Own code, share line and referral history.
pub async fn referrals_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(referrals_page(&state).load().await)
}

/// Apply a referral code.
pub async fn apply_handler(
    State(state): State<AppState>,
    Json(request): Json<ApplyRequest>,
) -> impl IntoResponse {
    match referrals_page(&state).apply(&request.code).await {
        ApplyOutcome::Applied(receipt) => {
            (StatusCode::OK, Json(ApplyResponse::applied(receipt.coins_earned)))
        }
        ApplyOutcome::Skipped => (
            StatusCode::BAD_REQUEST,
            Json(ApplyResponse::failed("Referral code is required")),
        ),
        ApplyOutcome::Failed { error, message } => (
            error.as_ref().map_or(StatusCode::BAD_REQUEST, source_status),
            Json(ApplyResponse::failed(message)),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tierline_core::ProgressionError;

    #[test]
    fn rejected_status_passes_through() {
        let err = SourceError::Rejected {
            status: 409,
            message: "Reward already claimed".to_string(),
        };
        assert_eq!(source_status(&err), StatusCode::CONFLICT);
    }

    #[test]
    fn out_of_range_status_is_bad_gateway() {
        let err = SourceError::Rejected {
            status: 42,
            message: String::new(),
        };
        assert_eq!(source_status(&err), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn bad_upstream_data_is_bad_gateway() {
        let response =
            AppError::Progression(ProgressionError::InvalidDomain("maxTier 0".to_string()))
                .into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
