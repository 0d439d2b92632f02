// ABOUTME: Registry of the surfaces a butler can deliver messages through
// ABOUTME: Surfaces are keyed by surface_id; registering an existing id replaces it

use std::collections::HashMap;
use std::sync::Arc;

use crate::surface::Surface;

/// Surfaces keyed by their id.
///
/// Shared between the send_message gear and whoever needs to look a surface
/// up by name, hence the `Arc`s.
pub struct SurfaceRegistry {
    surfaces: HashMap<String, Arc<dyn Surface>>,
}

impl SurfaceRegistry {
    pub fn new() -> Self {
        Self {
            surfaces: HashMap::new(),
        }
    }

    /// Register a surface, replacing any previous one with the same id.
    pub fn register(&mut self, surface: Arc<dyn Surface>) {
        let id = surface.surface_id().to_string();
        if self.surfaces.insert(id.clone(), surface).is_some() {
            tracing::warn!(surface_id = %id, "Replaced an already registered surface");
        }
    }

    pub fn get(&self, surface_id: &str) -> Option<Arc<dyn Surface>> {
        self.surfaces.get(surface_id).cloned()
    }

    /// Registered ids, sorted so logs and listings are stable.
    pub fn surface_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.surfaces.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }
}

impl Default for SurfaceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::SurfaceMessage;
    use async_trait::async_trait;

    struct Named(&'static str, &'static str);

    #[async_trait]
    impl Surface for Named {
        fn surface_id(&self) -> &str {
            self.0
        }

        async fn send_message(&self, _message: &SurfaceMessage) -> anyhow::Result<Option<String>> {
            Ok(Some(self.1.to_string()))
        }
    }

    #[tokio::test]
    async fn test_register_replaces_same_id() {
        let mut registry = SurfaceRegistry::new();
        assert!(registry.is_empty());

        registry.register(Arc::new(Named("tg", "first")));
        registry.register(Arc::new(Named("admin", "admin")));
        registry.register(Arc::new(Named("tg", "second")));

        assert_eq!(registry.surface_ids(), vec!["admin", "tg"]);
        let ack = registry
            .get("tg")
            .unwrap()
            .send_message(&SurfaceMessage::new(Some("tg"), Some("1"), Some("hi")))
            .await
            .unwrap();
        assert_eq!(ack.as_deref(), Some("second"));
        assert!(registry.get("missing").is_none());
    }
}
