//! Owns the account pool and all mutation of it.
//!
//! External callers only ever see [`Account`] snapshots (by value); the
//! manager is the sole writer, using a [`DashMap`] keyed by email so
//! concurrent requests touching different accounts don't contend on one
//! global lock.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use dashmap::DashMap;
use moka::sync::Cache;

use crate::error::{GatewayError, Result};

use super::{Account, AccountSource, Credential, ModelRateLimit, SoftLimitPolicy};
use super::token_source::TokenSource;

const DEFAULT_CACHE_MAX: u64 = 10_000;

pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

pub struct AccountManager {
    accounts: DashMap<String, Account>,
    soft_limit_policy: SoftLimitPolicy,
    token_source: Arc<dyn TokenSource>,
    token_cache: Cache<String, String>,
    project_cache: Cache<String, String>,
}

impl AccountManager {
    pub fn new(
        accounts: Vec<Account>,
        soft_limit_policy: SoftLimitPolicy,
        token_source: Arc<dyn TokenSource>,
    ) -> Self {
        let pool = DashMap::new();
        for account in accounts {
            pool.insert(account.email.clone(), account);
        }
        Self {
            accounts: pool,
            soft_limit_policy,
            token_source,
            token_cache: Cache::new(DEFAULT_CACHE_MAX),
            project_cache: Cache::new(DEFAULT_CACHE_MAX),
        }
    }

    /// Consistent shallow copy of the whole pool at the moment of the call.
    pub fn get_all_accounts(&self) -> Vec<Account> {
        self.accounts.iter().map(|e| e.value().clone()).collect()
    }

    pub fn get_account(&self, email: &str) -> Option<Account> {
        self.accounts.get(email).map(|e| e.value().clone())
    }

    /// All non-invalid accounts for `provider`.
    fn valid_accounts_for_provider(&self, provider: &str) -> Vec<Account> {
        self.accounts
            .iter()
            .filter(|e| e.value().provider == provider && e.value().is_valid())
            .map(|e| e.value().clone())
            .collect()
    }

    /// True iff every non-invalid account for `provider` has an active
    /// rate-limit record for `raw_model`. An empty account set is
    /// vacuously `false` — there is nothing to retry.
    pub fn is_all_rate_limited_by_provider(&self, provider: &str, raw_model: &str) -> bool {
        let now = now_ms();
        let accounts = self.valid_accounts_for_provider(provider);
        if accounts.is_empty() {
            return false;
        }
        accounts.iter().all(|a| {
            a.rate_limits
                .get(raw_model)
                .is_some_and(|limit| limit.is_active(now))
        })
    }

    /// Clears `is_rate_limited` on every account of `provider`. Used by the
    /// optimistic-retry policy to force a fresh upstream probe.
    pub fn reset_all_rate_limits_by_provider(&self, provider: &str) {
        metrics::counter!(crate::telemetry::OPTIMISTIC_RETRIES_TOTAL, "provider" => provider.to_string())
            .increment(1);
        for mut entry in self.accounts.iter_mut() {
            if entry.value().provider != provider {
                continue;
            }
            for limit in entry.value_mut().rate_limits.values_mut() {
                limit.is_rate_limited = false;
            }
        }
    }

    /// Records an upstream 429 on `(email, raw_model)`. `reset_ms` is the
    /// provider-reported reset time; callers fall back to "now + a few
    /// minutes" when the provider didn't give one.
    pub fn mark_rate_limited(&self, email: &str, raw_model: &str, reset_ms: u64) {
        if let Some(mut entry) = self.accounts.get_mut(email) {
            let limit = entry.value_mut().rate_limits.entry(raw_model.to_string()).or_default();
            limit.is_rate_limited = true;
            limit.reset_time_ms = reset_ms;
        }
    }

    /// Sets `is_soft_limited` when `remaining_fraction` has crossed the
    /// configured threshold and the policy is enabled. Does not persist
    /// anything beyond process memory, matching the "NoPersist" naming in
    /// the upstream contract.
    pub fn update_soft_limit_status_no_persist(&self, email: &str, raw_model: &str, remaining_fraction: f64) {
        if let Some(mut entry) = self.accounts.get_mut(email) {
            let limit = entry.value_mut().rate_limits.entry(raw_model.to_string()).or_default();
            limit.is_soft_limited = self.soft_limit_policy.is_soft_limited(remaining_fraction);
        }
    }

    pub fn mark_invalid(&self, email: &str, reason: impl Into<String>) {
        if let Some(mut entry) = self.accounts.get_mut(email) {
            entry.value_mut().invalid = Some(reason.into());
        }
    }

    pub fn mark_valid(&self, email: &str) {
        if let Some(mut entry) = self.accounts.get_mut(email) {
            entry.value_mut().invalid = None;
        }
    }

    pub fn touch_last_used(&self, email: &str) {
        if let Some(mut entry) = self.accounts.get_mut(email) {
            entry.value_mut().last_used_ms = Some(now_ms());
        }
    }

    /// Drops all cached derived state. The key argument is accepted for
    /// interface parity with the upstream contract (`ClearTokenCache("")`)
    /// but the cache is always invalidated wholesale — no partial
    /// reconciliation.
    pub fn clear_token_cache(&self, _key: &str) {
        metrics::counter!(crate::telemetry::CACHE_INVALIDATIONS_TOTAL).increment(1);
        self.token_cache.invalidate_all();
    }

    pub fn clear_project_cache(&self, _key: &str) {
        metrics::counter!(crate::telemetry::CACHE_INVALIDATIONS_TOTAL).increment(1);
        self.project_cache.invalidate_all();
    }

    /// A token usable for `email`'s next upstream call. OAuth accounts are
    /// refreshed through the configured [`TokenSource`] (and cached);
    /// manual accounts return their stored key directly. Errors surface as
    /// authentication failures.
    pub async fn get_token_for_account(&self, email: &str) -> Result<String> {
        let account = self
            .get_account(email)
            .ok_or_else(|| GatewayError::Upstream(format!("authentication failed: unknown account '{email}'")))?;

        if !account.is_valid() {
            return Err(GatewayError::Upstream(format!(
                "authentication failed: account '{email}' is invalid"
            )));
        }

        match &account.credential {
            Credential::ApiKey(key) => Ok(key.clone()),
            Credential::Oauth { refresh_token } => {
                if let Some(cached) = self.token_cache.get(email) {
                    return Ok(cached);
                }
                match self.token_source.refresh(refresh_token).await {
                    Ok(token) => {
                        self.token_cache.insert(email.to_string(), token.clone());
                        Ok(token)
                    }
                    Err(err) => {
                        self.mark_invalid(email, "oauth refresh failed");
                        Err(err)
                    }
                }
            }
        }
    }

    /// Refreshes every OAuth account's token, clearing both caches first.
    /// Returns how many accounts were attempted and how many refreshed
    /// successfully; a single account's failure never aborts the sweep.
    pub async fn refresh_all_oauth(&self) -> OauthRefreshOutcome {
        self.clear_token_cache("");
        self.clear_project_cache("");

        let oauth_emails: Vec<String> = self
            .accounts
            .iter()
            .filter(|e| e.value().source == AccountSource::Oauth)
            .map(|e| e.key().clone())
            .collect();

        let attempted = oauth_emails.len();
        let mut refreshed = 0;
        for email in oauth_emails {
            if self.get_token_for_account(&email).await.is_ok() {
                refreshed += 1;
            }
        }
        OauthRefreshOutcome { attempted, refreshed }
    }
}

/// Result of [`AccountManager::refresh_all_oauth`]. With no OAuth accounts
/// registered, `attempted == 0` and the sweep is considered successful; with
/// at least one attempt, the sweep only succeeds if at least one refreshed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OauthRefreshOutcome {
    pub attempted: usize,
    pub refreshed: usize,
}

impl OauthRefreshOutcome {
    pub fn succeeded(&self) -> bool {
        self.attempted == 0 || self.refreshed > 0
    }
}
