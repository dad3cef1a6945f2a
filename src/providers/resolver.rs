//! Resolves a client-supplied public model id to a `(Provider, rawModel)` pair.
//!
//! Kept permissive toward clients that don't know the `<provider>/<model>`
//! convention, while giving clients an explicit override by prefixing.

use std::sync::Arc;

use crate::error::{GatewayError, Result};

use super::registry::ProviderRegistry;
use super::traits::Provider;

/// Default provider name consulted by resolution steps 2 and 4.
pub const DEFAULT_PROVIDER: &str = "antigravity";

/// A resolved model reference: the provider to dispatch to, and the raw
/// model id understood by that provider's native API.
pub struct Resolved {
    pub provider: Arc<dyn Provider>,
    pub raw_model: String,
}

impl std::fmt::Debug for Resolved {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolved")
            .field("provider", &self.provider.name())
            .field("raw_model", &self.raw_model)
            .finish()
    }
}

/// Resolve `input` against `registry` following, in order:
///
/// 1. If `input` splits on the first `/` into `(prefix, rest)`, both
///    non-empty, and `prefix` names a registered provider, resolve to
///    `(that provider, rest)`.
/// 2. Otherwise, if the registry has `antigravity/<input>`, resolve to
///    `(antigravity, input)`.
/// 3. Otherwise, scan all providers; if exactly one reports
///    `supports_model(input) == true`, resolve to `(that provider, input)`.
/// 4. Otherwise, fall back to the `antigravity` provider if present, else
///    the first registered provider (by name, for determinism), using
///    `input` as the raw model. If no providers are registered, fail with
///    `invalid_request`.
pub fn resolve(registry: &ProviderRegistry, input: &str) -> Result<Resolved> {
    if let Some((prefix, rest)) = input.split_once('/') {
        if !prefix.is_empty() && !rest.is_empty() {
            if let Some(provider) = registry.get_by_name(prefix) {
                return Ok(Resolved {
                    provider,
                    raw_model: rest.to_string(),
                });
            }
        }
    }

    if let Some(provider) = registry.get_by_model(&format!("{DEFAULT_PROVIDER}/{input}")) {
        return Ok(Resolved {
            provider,
            raw_model: input.to_string(),
        });
    }

    let mut supporting = registry
        .all()
        .into_iter()
        .filter(|p| p.supports_model(input));
    let first = supporting.next();
    let second = supporting.next();
    if let (Some(provider), None) = (&first, &second) {
        return Ok(Resolved {
            provider: provider.clone(),
            raw_model: input.to_string(),
        });
    }

    if let Some(provider) = registry.get_by_name(DEFAULT_PROVIDER) {
        return Ok(Resolved {
            provider,
            raw_model: input.to_string(),
        });
    }

    let mut all = registry.all();
    all.sort_by(|a, b| a.name().cmp(b.name()));
    if let Some(provider) = all.into_iter().next() {
        return Ok(Resolved {
            provider,
            raw_model: input.to_string(),
        });
    }

    Err(GatewayError::InvalidRequest(
        "no providers are registered".to_string(),
    ))
}
