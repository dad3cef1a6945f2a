//! Shared, read-only-after-construction state handed to every handler.

use std::sync::Arc;

use crate::account::AccountManager;
use crate::config::Config;
use crate::providers::ProviderRegistry;

pub struct AppState {
    pub registry: ProviderRegistry,
    pub accounts: AccountManager,
    pub config: Config,
}

impl AppState {
    pub fn new(registry: ProviderRegistry, accounts: AccountManager, config: Config) -> Arc<Self> {
        Arc::new(Self {
            registry,
            accounts,
            config,
        })
    }
}
