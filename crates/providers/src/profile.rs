//! Config-backed profile store.
//!
//! Owner personas live in the application config and are loaded once at
//! startup. A miss surfaces as `ProfileLookup`; the orchestrator treats any
//! lookup failure as "use the baseline persona".

use std::collections::HashMap;

use async_trait::async_trait;
use plume_core::error::ProviderError;
use plume_core::provider::ProfileStore;

pub struct StaticProfileStore {
    prompts: HashMap<String, String>,
}

impl StaticProfileStore {
    pub fn new(prompts: HashMap<String, String>) -> Self {
        Self { prompts }
    }
}

#[async_trait]
impl ProfileStore for StaticProfileStore {
    async fn system_prompt(&self, owner_id: &str) -> Result<String, ProviderError> {
        self.prompts
            .get(owner_id)
            .cloned()
            .ok_or_else(|| ProviderError::ProfileLookup(format!("no profile for {owner_id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn known_owner_resolves() {
        let mut prompts = HashMap::new();
        prompts.insert("owner_1".to_string(), "Answer tersely.".to_string());
        let store = StaticProfileStore::new(prompts);

        assert_eq!(
            store.system_prompt("owner_1").await.unwrap(),
            "Answer tersely."
        );
    }

    #[tokio::test]
    async fn unknown_owner_is_lookup_error() {
        let store = StaticProfileStore::new(HashMap::new());
        let err = store.system_prompt("nobody").await.unwrap_err();
        assert!(matches!(err, ProviderError::ProfileLookup(_)));
    }
}
