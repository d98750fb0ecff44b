//! Provider registry
//!
//! Maps a participant's provider tag to a concrete adapter. Adding a
//! provider is one adapter plus one `register` call at startup.

use std::collections::HashMap;
use std::sync::Arc;

use crate::client::ModelClient;

#[derive(Default)]
pub struct ModelRegistry {
    clients: HashMap<String, Arc<dyn ModelClient>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, tag: impl Into<String>, client: Arc<dyn ModelClient>) -> Self {
        self.clients.insert(tag.into(), client);
        self
    }

    pub fn get(&self, tag: &str) -> Option<Arc<dyn ModelClient>> {
        self.clients.get(tag).cloned()
    }

    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.clients.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockClient;

    #[test]
    fn test_register_and_get() {
        let registry = ModelRegistry::new()
            .register("mock", Arc::new(MockClient::always_hold()))
            .register("anthropic", Arc::new(MockClient::always_hold()));

        assert!(registry.get("mock").is_some());
        assert!(registry.get("unknown").is_none());
        assert_eq!(registry.tags(), vec!["anthropic", "mock"]);
    }
}
