//! Concurrent provider registry: name → Provider and `<provider>/<model>` → Provider.
//!
//! Writes only happen at startup; `all()` and `all_models()` return copied
//! snapshots so no handler ever holds the lock during I/O.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::error::{GatewayError, Result};

use super::traits::Provider;

#[derive(Default)]
pub struct ProviderRegistry {
    by_name: RwLock<HashMap<String, Arc<dyn Provider>>>,
    by_model: RwLock<HashMap<String, Arc<dyn Provider>>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider. Fails if the provider name collides with a
    /// prior registration, or if any `<name>/<model>` key it would
    /// introduce collides with one already present. On failure, nothing is
    /// inserted.
    pub fn register(&self, provider: Arc<dyn Provider>) -> Result<()> {
        let name = provider.name().to_string();
        let raw_models = provider.models();
        let model_keys: Vec<String> = raw_models.iter().map(|m| format!("{name}/{m}")).collect();

        let mut by_name = self.by_name.write().expect("registry lock poisoned");
        let mut by_model = self.by_model.write().expect("registry lock poisoned");

        if by_name.contains_key(&name) {
            return Err(GatewayError::Configuration(format!(
                "provider '{name}' is already registered"
            )));
        }
        if let Some(dup) = model_keys.iter().find(|k| by_model.contains_key(*k)) {
            return Err(GatewayError::Configuration(format!(
                "model id '{dup}' is already registered"
            )));
        }

        for key in model_keys {
            by_model.insert(key, provider.clone());
        }
        by_name.insert(name, provider);
        Ok(())
    }

    pub fn get_by_name(&self, name: &str) -> Option<Arc<dyn Provider>> {
        self.by_name.read().expect("registry lock poisoned").get(name).cloned()
    }

    /// `public_model_id` has the form `<providerName>/<rawModel>`.
    pub fn get_by_model(&self, public_model_id: &str) -> Option<Arc<dyn Provider>> {
        self.by_model
            .read()
            .expect("registry lock poisoned")
            .get(public_model_id)
            .cloned()
    }

    /// Snapshot of every registered provider.
    pub fn all(&self) -> Vec<Arc<dyn Provider>> {
        self.by_name.read().expect("registry lock poisoned").values().cloned().collect()
    }

    /// Snapshot of every registered public model id.
    pub fn all_models(&self) -> Vec<String> {
        self.by_model.read().expect("registry lock poisoned").keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.read().expect("registry lock poisoned").is_empty()
    }
}
