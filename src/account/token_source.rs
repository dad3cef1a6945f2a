//! OAuth token acquisition, treated as an opaque capability the account
//! manager depends on but does not implement.

use async_trait::async_trait;

use crate::error::Result;

/// Refreshes an OAuth refresh token into a short-lived access token.
///
/// Concrete implementations (talking to a specific identity provider) are
/// out of scope; the manager only needs this seam to exist so it can be
/// exercised with a fake in tests.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn refresh(&self, refresh_token: &str) -> Result<String>;
}

#[cfg(test)]
pub(crate) struct FakeTokenSource {
    pub should_fail: bool,
}

#[cfg(test)]
#[async_trait]
impl TokenSource for FakeTokenSource {
    async fn refresh(&self, refresh_token: &str) -> Result<String> {
        if self.should_fail {
            Err(crate::error::GatewayError::Upstream(
                "authentication failed: refresh rejected".to_string(),
            ))
        } else {
            Ok(format!("access-token-for-{refresh_token}"))
        }
    }
}
