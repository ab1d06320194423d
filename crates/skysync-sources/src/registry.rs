use std::collections::HashMap;
use std::sync::Arc;

use crate::source::WeatherSource;

/// Registry mapping source ids to client implementations.
///
/// Resolved once at batch start; an unknown source id is a configuration
/// problem for that location's group, never a crash.
#[derive(Default, Clone)]
pub struct SourceRegistry {
    sources: HashMap<String, Arc<dyn WeatherSource>>,
}

impl SourceRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `source` under its own id, replacing any previous client
    /// with the same id.
    pub fn register(&mut self, source: Arc<dyn WeatherSource>) {
        self.sources.insert(source.id().to_string(), source);
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<Arc<dyn WeatherSource>> {
        self.sources.get(id).cloned()
    }

    /// Registered source ids, sorted for stable output.
    #[must_use]
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.sources.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl std::fmt::Debug for SourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceRegistry")
            .field("sources", &self.ids())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use skysync_core::{Location, Weather, WeatherFeature};

    use super::*;
    use crate::error::SourceError;

    struct StubSource(&'static str);

    #[async_trait]
    impl WeatherSource for StubSource {
        fn id(&self) -> &str {
            self.0
        }

        fn name(&self) -> &str {
            self.0
        }

        async fn fetch(
            &self,
            _location: &Location,
            _features: &[WeatherFeature],
        ) -> Result<Weather, SourceError> {
            Err(SourceError::Unexpected("stub".to_string()))
        }
    }

    #[test]
    fn lookup_returns_registered_source() {
        let mut registry = SourceRegistry::new();
        registry.register(Arc::new(StubSource("openmeteo")));
        assert!(registry.get("openmeteo").is_some());
        assert!(registry.get("china").is_none());
    }

    #[test]
    fn ids_are_sorted() {
        let mut registry = SourceRegistry::new();
        registry.register(Arc::new(StubSource("dwd")));
        registry.register(Arc::new(StubSource("accu")));
        assert_eq!(registry.ids(), vec!["accu", "dwd"]);
    }

    #[test]
    fn register_replaces_same_id() {
        let mut registry = SourceRegistry::new();
        registry.register(Arc::new(StubSource("openmeteo")));
        registry.register(Arc::new(StubSource("openmeteo")));
        assert_eq!(registry.ids().len(), 1);
    }
}
