//! `GET /health` and `GET /account-limits`.
//!
//! Both fan out one task per account, bounded by a per-account deadline, and
//! reduce into per-account rows plus a summary. A single account's failure
//! becomes an `error` row, never a failed request.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use tokio::time::timeout;

use crate::account::{Account, AccountStatus};
use crate::server::state::AppState;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountRow {
    pub email: String,
    pub provider: String,
    pub status: AccountStatus,
    pub last_used: Option<u64>,
    pub rate_limit_cooldown_remaining: Option<u64>,
    pub is_soft_limited: bool,
    pub models: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Summary {
    pub total: usize,
    pub available: usize,
    pub rate_limited: usize,
    pub soft_limited: usize,
    pub invalid: usize,
    pub error: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub accounts: Vec<AccountRow>,
    pub summary: Summary,
}

/// Stand-in for a live per-account quota probe: the concrete upstream call
/// is a provider capability out of scope here, so liveness is taken from
/// the account's own provider's [`get_status`](crate::providers::Provider::get_status).
async fn fetch_row(state: &AppState, account: Account, now_ms: u64) -> AccountRow {
    let deadline = state.config.quota_fetch_timeout;
    let models: Vec<String> = account.rate_limits.keys().cloned().collect();

    let probe = async {
        match state.registry.get_by_name(&account.provider) {
            Some(provider) => provider.get_status().await,
            None => crate::providers::ProviderStatus::Unavailable {
                reason: "provider not registered".to_string(),
            },
        }
    };

    let status = match timeout(deadline, probe).await {
        Ok(crate::providers::ProviderStatus::Available) => account.overall_status(now_ms),
        Ok(crate::providers::ProviderStatus::Unavailable { .. }) => AccountStatus::Error,
        Err(_) => AccountStatus::Error,
    };

    AccountRow {
        email: account.email.clone(),
        provider: account.provider.clone(),
        status,
        last_used: account.last_used_ms,
        rate_limit_cooldown_remaining: account.rate_limit_cooldown_remaining_ms(now_ms),
        is_soft_limited: account.rate_limits.values().any(|l| l.is_soft_limited),
        models,
    }
}

async fn build_report(state: &AppState) -> HealthReport {
    let now_ms = crate::account::manager::now_ms();
    let accounts = state.accounts.get_all_accounts();

    let rows = futures_util::future::join_all(
        accounts.into_iter().map(|a| fetch_row(state, a, now_ms)),
    )
    .await;

    let mut summary = Summary { total: rows.len(), ..Default::default() };
    for row in &rows {
        match row.status {
            AccountStatus::Ok => summary.available += 1,
            AccountStatus::RateLimited => summary.rate_limited += 1,
            AccountStatus::SoftLimited => summary.soft_limited += 1,
            AccountStatus::Invalid => summary.invalid += 1,
            AccountStatus::Error => summary.error += 1,
        }
    }

    HealthReport { accounts: rows, summary }
}

pub async fn health(State(state): State<Arc<AppState>>) -> Response {
    axum::Json(build_report(&state).await).into_response()
}

#[derive(Debug, Deserialize)]
pub struct FormatQuery {
    pub format: Option<String>,
}

pub async fn account_limits(State(state): State<Arc<AppState>>, Query(query): Query<FormatQuery>) -> Response {
    let report = build_report(&state).await;
    match query.format.as_deref() {
        Some("table") => (
            [("content-type", "text/plain; charset=utf-8")],
            render_table(&report),
        )
            .into_response(),
        _ => axum::Json(report).into_response(),
    }
}

fn render_table(report: &HealthReport) -> String {
    let mut out = String::new();
    out.push_str("ACCOUNT STATUS\n");
    out.push_str("email\tprovider\tstatus\tisSoftLimited\trateLimitCooldownRemaining\n");
    for row in &report.accounts {
        out.push_str(&format!(
            "{}\t{}\t{:?}\t{}\t{}\n",
            row.email,
            row.provider,
            row.status,
            row.is_soft_limited,
            row.rate_limit_cooldown_remaining.map(|v| v.to_string()).unwrap_or_default(),
        ));
    }

    out.push_str("\nPER-MODEL QUOTA\n");
    out.push_str("email\tmodels\n");
    for row in &report.accounts {
        out.push_str(&format!("{}\t{}\n", row.email, row.models.join(", ")));
    }

    out.push_str(&format!(
        "\nSUMMARY total={} available={} rate_limited={} soft_limited={} invalid={} error={}\n",
        report.summary.total,
        report.summary.available,
        report.summary.rate_limited,
        report.summary.soft_limited,
        report.summary.invalid,
        report.summary.error,
    ));
    out
}
