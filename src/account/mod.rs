//! The account pool: credentials, per-model rate-limit state, and the
//! manager that owns all mutation of both.

pub mod manager;
pub mod token_source;

pub use manager::{AccountManager, OauthRefreshOutcome};
pub use token_source::TokenSource;

use serde::Serialize;

/// How an account's credential was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountSource {
    Oauth,
    Manual,
}

/// The credential an account holds. OAuth accounts refresh through a
/// [`TokenSource`]; manual accounts carry a static key.
#[derive(Debug, Clone)]
pub enum Credential {
    ApiKey(String),
    Oauth { refresh_token: String },
}

/// Per-account, per-model rate-limit record.
#[derive(Debug, Clone, Default)]
pub struct ModelRateLimit {
    pub is_rate_limited: bool,
    pub reset_time_ms: u64,
    pub is_soft_limited: bool,
}

impl ModelRateLimit {
    /// A record with `is_rate_limited == true` and `reset_time_ms <= now`
    /// is treated as expired — i.e. no longer actually rate-limited.
    pub fn is_active(&self, now_ms: u64) -> bool {
        self.is_rate_limited && self.reset_time_ms > now_ms
    }
}

/// Process-wide soft-limit configuration, set at startup.
#[derive(Debug, Clone, Copy)]
pub struct SoftLimitPolicy {
    pub enabled: bool,
    pub threshold_fraction: f64,
}

impl SoftLimitPolicy {
    pub fn new(enabled: bool, threshold_fraction: f64) -> Self {
        Self {
            enabled,
            threshold_fraction: threshold_fraction.clamp(0.0, 1.0),
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            threshold_fraction: 0.0,
        }
    }

    /// Whether `remaining_fraction` should flip the soft-limit flag on,
    /// per §4.3: `remainingFraction <= 0 || remainingFraction < threshold`.
    pub fn is_soft_limited(&self, remaining_fraction: f64) -> bool {
        self.enabled && (remaining_fraction <= 0.0 || remaining_fraction < self.threshold_fraction)
    }
}

/// An upstream account: a single credential usable with one provider.
#[derive(Debug, Clone)]
pub struct Account {
    /// Unique within the pool.
    pub email: String,
    pub provider: String,
    pub source: AccountSource,
    pub credential: Credential,
    pub last_used_ms: Option<u64>,
    /// `None` when valid; `Some(reason)` when invalidated. An invalid
    /// account is never selected.
    pub invalid: Option<String>,
    pub rate_limits: std::collections::HashMap<String, ModelRateLimit>,
}

impl Account {
    pub fn new_manual(email: impl Into<String>, provider: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            provider: provider.into(),
            source: AccountSource::Manual,
            credential: Credential::ApiKey(api_key.into()),
            last_used_ms: None,
            invalid: None,
            rate_limits: std::collections::HashMap::new(),
        }
    }

    pub fn new_oauth(email: impl Into<String>, provider: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            provider: provider.into(),
            source: AccountSource::Oauth,
            credential: Credential::Oauth {
                refresh_token: refresh_token.into(),
            },
            last_used_ms: None,
            invalid: None,
            rate_limits: std::collections::HashMap::new(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.invalid.is_none()
    }
}

/// Reportable status for an account against a specific model, surfaced by
/// `/health` and `/account-limits`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccountStatus {
    Ok,
    RateLimited,
    SoftLimited,
    Invalid,
    /// The quota fetch for this account failed during a health/limits
    /// report. Never causes the whole report to fail.
    Error,
}

impl Account {
    /// Status for a specific model, or the account-wide invalid status if
    /// the account itself is invalid.
    pub fn status_for_model(&self, raw_model: &str, now_ms: u64) -> AccountStatus {
        if self.invalid.is_some() {
            return AccountStatus::Invalid;
        }
        match self.rate_limits.get(raw_model) {
            Some(limit) if limit.is_active(now_ms) => AccountStatus::RateLimited,
            Some(limit) if limit.is_soft_limited => AccountStatus::SoftLimited,
            _ => AccountStatus::Ok,
        }
    }

    /// Account-wide status for `/health` and `/account-limits`, worst-case
    /// across every model the account carries rate-limit state for.
    pub fn overall_status(&self, now_ms: u64) -> AccountStatus {
        if self.invalid.is_some() {
            return AccountStatus::Invalid;
        }
        if self.rate_limits.values().any(|l| l.is_active(now_ms)) {
            return AccountStatus::RateLimited;
        }
        if self.rate_limits.values().any(|l| l.is_soft_limited) {
            return AccountStatus::SoftLimited;
        }
        AccountStatus::Ok
    }

    /// Soonest active reset time across all of this account's rate limits,
    /// in milliseconds remaining from `now_ms`. `None` if nothing is active.
    pub fn rate_limit_cooldown_remaining_ms(&self, now_ms: u64) -> Option<u64> {
        self.rate_limits
            .values()
            .filter(|l| l.is_active(now_ms))
            .map(|l| l.reset_time_ms.saturating_sub(now_ms))
            .min()
    }
}
