//! # CLI Command Implementations

use super::BackendKind;
use crate::api::{self, AppState};
use crate::config::Config;
use crate::error::AppError;
use crate::pages::{
    ApplyOutcome, BattlePassPage, ClaimOutcome, ConsoleNotifier, LoyaltyPage, Notifier,
    Osc52Clipboard, ReferralsPage, ReferralsView, TracingNotifier,
};
use crate::sources::{Backend, HttpRewardsClient, InMemoryRewards};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tierline_core::{BattlePassView, ClaimState, LoyaltyStanding, LoyaltyView, UserId};

/// The account the built-in demo service acts for.
const DEMO_USER: &str = "demo";

/// Rendering switches shared by every command.
#[derive(Debug, Clone, Copy)]
pub struct Output {
    pub json: bool,
    pub verbose: bool,
}

impl Output {
    fn notifier(self) -> Arc<dyn Notifier> {
        if self.json {
            Arc::new(TracingNotifier)
        } else {
            Arc::new(ConsoleNotifier)
        }
    }
}

fn print_json<T: Serialize>(value: &T) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

// =============================================================================
// BACKEND SELECTION
// =============================================================================

/// Build the collaborator bundle for `kind`.
pub async fn build_backend(kind: BackendKind, config: &Config) -> Result<Backend, AppError> {
    match kind {
        BackendKind::Http => {
            let client = HttpRewardsClient::new(
                &config.api_url,
                config.session.clone(),
                config.request_timeout(),
            )?;
            if config.session.is_none() {
                tracing::warn!("TIERLINE_SESSION is not set; the rewards API will likely answer 401");
            }
            tracing::debug!(api_url = %client.base_url(), "using rewards API");
            Ok(Backend::from_service(client))
        }
        BackendKind::Memory => {
            tracing::info!(user = DEMO_USER, "using built-in demo rewards service");
            let service = InMemoryRewards::demo().await;
            Ok(Backend::from_service(service.session(UserId::new(DEMO_USER))))
        }
    }
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Serve computed views over HTTP.
pub async fn cmd_server(
    backend: Backend,
    config: &Config,
    kind: BackendKind,
    host: &str,
    port: u16,
) -> Result<(), AppError> {
    println!("Tierline View Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:     {}", host);
    println!("  Port:     {}", port);
    println!("  Backend:  {:?}", kind);
    if kind == BackendKind::Http {
        println!("  Upstream: {}", config.api_url);
    }
    println!("  Tier cap: {}", config.tier_cap);
    println!();
    println!("Endpoints:");
    println!("  GET  /health                          - Health check");
    println!("  GET  /views/battle-pass               - Season view");
    println!("  POST /views/battle-pass/claim/{{tier}}  - Claim a tier reward");
    println!("  GET  /views/loyalty                   - Loyalty view");
    println!("  GET  /views/referrals                 - Referral view");
    println!("  POST /views/referrals/apply           - Apply a referral code");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let addr = format!("{}:{}", host, port);
    api::run_server(&addr, AppState::new(backend, config.tier_cap)).await
}

// =============================================================================
// BATTLE PASS COMMANDS
// =============================================================================

/// Show the season view.
pub async fn cmd_battle_pass(
    backend: &Backend,
    config: &Config,
    out: Output,
) -> Result<(), AppError> {
    let page = battle_pass_page(backend, config, out);
    let view = page.load(Utc::now()).await?;

    if out.json {
        print_json(&serde_json::json!({
            "active": view.is_some(),
            "view": view,
            "tiers": view.as_ref().map(|v| v.tiers().collect::<Vec<_>>()),
        }));
        return Ok(());
    }

    match view {
        Some(view) => print_battle_pass(&view, out.verbose),
        None => println!("No active battle pass season."),
    }
    Ok(())
}

/// Claim the reward for `tier`.
pub async fn cmd_claim(
    backend: &Backend,
    config: &Config,
    out: Output,
    tier: u32,
) -> Result<(), AppError> {
    let page = battle_pass_page(backend, config, out);

    match page.claim(tier, Utc::now()).await? {
        ClaimOutcome::Claimed { receipt, view } => {
            if out.json {
                print_json(&serde_json::json!({
                    "claimed": true,
                    "tier": receipt.tier,
                    "view": view,
                }));
            } else if let Some(view) = view {
                println!();
                print_battle_pass(&view, out.verbose);
            }
            Ok(())
        }
        ClaimOutcome::Failed { error, message } => {
            if out.json {
                print_json(&serde_json::json!({
                    "claimed": false,
                    "tier": tier,
                    "message": message,
                }));
            }
            Err(error.into())
        }
    }
}

fn battle_pass_page(backend: &Backend, config: &Config, out: Output) -> BattlePassPage {
    BattlePassPage::new(
        backend.progress.clone(),
        backend.claims.clone(),
        out.notifier(),
        config.tier_cap,
    )
}

fn print_battle_pass(view: &BattlePassView, verbose: bool) {
    println!("{}", view.season_name);
    println!("{}", "=".repeat(view.season_name.chars().count()));
    if !view.season_description.is_empty() {
        println!("{}", view.season_description);
    }
    println!();
    println!(
        "Tier:      {} / {} ({}%)",
        view.current_tier, view.max_tier, view.tier_progress_percent
    );
    match view.days_left {
        d if d > 0 => println!("Ends in:   {} days", d),
        _ => println!("Ends in:   season has ended"),
    }
    println!(
        "Pass:      {}",
        if view.is_premium { "Premium" } else { "Free" }
    );
    println!("Claimable: {}", view.claimable_count());
    if view.show_upgrade_offer {
        println!();
        println!("Upgrade to Premium to unlock premium tier rewards.");
    }

    println!();
    for reward in view.tiers() {
        let state = reward.claim_state();
        if !verbose && state == ClaimState::Locked {
            continue;
        }
        let label = match state {
            ClaimState::Claimable => "claimable",
            ClaimState::PremiumOnly => "premium only",
            ClaimState::Locked => "locked",
        };
        let marker = if reward.is_premium_reward { "★" } else { " " };
        println!(
            "  {} Tier {:>3}  {:>4} coins  {}",
            marker, reward.tier, reward.reward_coins, label
        );
    }
}

// =============================================================================
// LOYALTY COMMAND
// =============================================================================

/// Show loyalty standing.
pub async fn cmd_loyalty(backend: &Backend, out: Output) -> Result<(), AppError> {
    let view = LoyaltyPage::new(backend.loyalty.clone()).load().await?;

    if out.json {
        print_json(&view);
        return Ok(());
    }

    match &view {
        LoyaltyView::NotConfigured => println!("The loyalty program has no tiers yet."),
        LoyaltyView::Active(standing) => print_loyalty(standing, out.verbose),
    }
    Ok(())
}

fn print_loyalty(standing: &LoyaltyStanding, verbose: bool) {
    println!("Loyalty Status");
    println!("==============");
    println!("Tier:     {}", standing.current_tier.name);
    println!("Points:   {}", standing.points);
    println!("Lifetime: {}", standing.lifetime_points);

    match &standing.next_tier {
        Some(next) => println!(
            "Next:     {} in {} points ({}%)",
            next.name, standing.points_to_next_tier, standing.tier_progress_percent
        ),
        None => println!("Next:     top tier reached"),
    }

    if !standing.current_benefits.is_empty() {
        println!();
        println!("Benefits:");
        for line in &standing.current_benefits {
            println!("  - {}", line);
        }
    }

    println!();
    for entry in &standing.tiers {
        let marker = match (entry.is_current, entry.is_unlocked) {
            (true, _) => "▸",
            (false, true) => "✔",
            (false, false) => "·",
        };
        println!(
            "  {} {:<10} {:>7} pts",
            marker, entry.tier.name, entry.tier.required_points
        );
        if verbose {
            for line in &entry.benefit_lines {
                println!("      {}", line);
            }
        }
    }
}

// =============================================================================
// REFERRAL COMMANDS
// =============================================================================

fn referrals_page(backend: &Backend, out: Output) -> ReferralsPage {
    ReferralsPage::new(backend.referrals.clone(), backend.apply.clone(), out.notifier())
}

/// Show own code and referral history.
pub async fn cmd_referrals(backend: &Backend, out: Output) -> Result<(), AppError> {
    let view = referrals_page(backend, out).load().await;

    if out.json {
        print_json(&view);
        return Ok(());
    }

    print_referrals(&view);
    Ok(())
}

fn print_referrals(view: &ReferralsView) {
    println!("Referrals");
    println!("=========");
    match &view.code {
        Some(code) => {
            println!("Your code: {}  (used {} times)", code.code, code.uses);
            if let Some(message) = &view.share_message {
                println!("{}", message);
            }
        }
        None => println!("You have no referral code yet."),
    }
    println!();
    println!(
        "Total referrals: {}   Coins earned: {}",
        view.summary.count, view.summary.total_earned
    );

    if view.referrals.is_empty() {
        return;
    }
    println!();
    for referral in &view.referrals {
        println!(
            "  {}  {:<16} +{:<5} {}",
            referral.created_at.format("%Y-%m-%d"),
            referral.referred_id.0,
            referral.referrer_reward_amount,
            referral.status.name()
        );
    }
}

/// Apply somebody else's code.
pub async fn cmd_apply(backend: &Backend, out: Output, input: &str) -> Result<(), AppError> {
    match referrals_page(backend, out).apply(input).await {
        ApplyOutcome::Skipped => {
            if out.json {
                print_json(&serde_json::json!({ "applied": false }));
            } else {
                println!("No referral code given.");
            }
            Ok(())
        }
        ApplyOutcome::Applied(receipt) => {
            if out.json {
                print_json(&serde_json::json!({
                    "applied": true,
                    "coins_earned": receipt.coins_earned,
                }));
            }
            Ok(())
        }
        ApplyOutcome::Failed { message, .. } => {
            if out.json {
                print_json(&serde_json::json!({
                    "applied": false,
                    "message": message,
                }));
            }
            Err(AppError::Rejected(message))
        }
    }
}

/// Copy own code to the terminal clipboard.
pub async fn cmd_copy_code(backend: &Backend, out: Output) -> Result<(), AppError> {
    let page = referrals_page(backend, out);
    let view = page.load().await;
    let copied = page.copy_code(&view, &Osc52Clipboard);

    if out.json {
        print_json(&serde_json::json!({
            "copied": copied,
            "code": view.code.as_ref().map(|c| c.code.as_str()),
        }));
    } else if view.code.is_none() {
        println!("You have no referral code yet.");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_config() -> Config {
        Config::default()
    }

    #[tokio::test]
    async fn memory_backend_serves_demo_account() {
        let backend = build_backend(BackendKind::Memory, &memory_config())
            .await
            .expect("backend");
        let progress = backend
            .progress
            .battle_pass_progress()
            .await
            .expect("progress")
            .expect("active season");
        assert_eq!(progress.current_tier, 12);
        assert!(!progress.is_premium);
    }

    #[tokio::test]
    async fn http_backend_rejects_malformed_url() {
        let config = Config {
            api_url: "not a url".to_string(),
            ..Config::default()
        };
        assert!(build_backend(BackendKind::Http, &config).await.is_err());
    }

    #[tokio::test]
    async fn apply_failure_is_an_error() {
        let backend = build_backend(BackendKind::Memory, &memory_config())
            .await
            .expect("backend");
        let out = Output {
            json: true,
            verbose: false,
        };
        // the demo user cannot apply their own code
        let result = cmd_apply(&backend, out, "demo2026").await;
        assert!(matches!(result, Err(AppError::Rejected(_))));
    }
}
