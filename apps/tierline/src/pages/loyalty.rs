//! # Loyalty Page

use crate::error::AppError;
use crate::sources::LoyaltySource;
use std::sync::Arc;
use tierline_core::{LoyaltyView, compute_loyalty_view};

/// Controller for the loyalty screen.
pub struct LoyaltyPage {
    source: Arc<dyn LoyaltySource>,
}

impl LoyaltyPage {
    pub fn new(source: Arc<dyn LoyaltySource>) -> Self {
        Self { source }
    }

    /// Fetch status and tiers concurrently, then compute the view.
    ///
    /// Both fetches must succeed; a view is never built from half a snapshot.
    pub async fn load(&self) -> Result<LoyaltyView, AppError> {
        let (status, tiers) =
            tokio::try_join!(self.source.loyalty_status(), self.source.loyalty_tiers())?;

        let view = compute_loyalty_view(status.as_ref(), &tiers)?;
        if let Some(standing) = view.standing()
            && let Some(stale) = standing.resolution.not_found()
        {
            tracing::warn!(
                event = "data_quality",
                error = %stale,
                "loyalty back-reference missing from tier list, using lowest tier"
            );
        }
        Ok(view)
    }
}
