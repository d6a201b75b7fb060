//! Handler registry
//!
//! Static intent-to-handler wiring, built once at startup. The mapping is
//! keyed on the closed `Intent` enum; resolution fails closed with
//! `UnregisteredIntent` rather than silently defaulting. Chat being the
//! default for unclassified input is an explicit registry entry made by
//! the composition root, not a catch-all here.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use pocket_core::{Handler, Intent};

/// Registry errors
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("No handler registered for intent '{0}'")]
    UnregisteredIntent(Intent),
}

/// Maps each intent to its handler
pub struct HandlerRegistry {
    handlers: HashMap<Intent, Arc<dyn Handler>>,
}

impl HandlerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a handler for an intent, replacing any previous entry
    pub fn register(&mut self, intent: Intent, handler: Arc<dyn Handler>) {
        tracing::debug!(intent = %intent, handler = handler.name(), "Handler registered");
        self.handlers.insert(intent, handler);
    }

    /// Resolve the handler for an intent.
    ///
    /// Unreachable for a fully validated registry, but guards intent
    /// variants added without a handler.
    pub fn resolve(&self, intent: Intent) -> Result<Arc<dyn Handler>, RegistryError> {
        self.handlers
            .get(&intent)
            .cloned()
            .ok_or(RegistryError::UnregisteredIntent(intent))
    }

    /// Check that every intent variant has a handler. Run at startup.
    pub fn validate(&self) -> Result<(), RegistryError> {
        for intent in Intent::ALL {
            if !self.handlers.contains_key(&intent) {
                return Err(RegistryError::UnregisteredIntent(intent));
            }
        }
        Ok(())
    }

    /// Number of registered handlers
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pocket_core::{ChunkStream, ExecutionRequest, StreamChunk};

    struct NoopHandler(&'static str);

    impl Handler for NoopHandler {
        fn name(&self) -> &'static str {
            self.0
        }

        fn run(&self, _request: ExecutionRequest) -> ChunkStream {
            Box::pin(futures::stream::iter(vec![StreamChunk::Done]))
        }
    }

    #[test]
    fn test_resolve_registered() {
        let mut registry = HandlerRegistry::new();
        registry.register(Intent::Chat, Arc::new(NoopHandler("chat")));

        let handler = registry.resolve(Intent::Chat).unwrap();
        assert_eq!(handler.name(), "chat");
    }

    #[test]
    fn test_resolve_unregistered_fails_closed() {
        let registry = HandlerRegistry::new();
        let err = registry.resolve(Intent::Home).unwrap_err();
        assert!(matches!(err, RegistryError::UnregisteredIntent(Intent::Home)));
    }

    #[test]
    fn test_validate_requires_every_intent() {
        let mut registry = HandlerRegistry::new();
        for intent in Intent::ALL {
            if intent != Intent::Web {
                registry.register(intent, Arc::new(NoopHandler("x")));
            }
        }

        let err = registry.validate().unwrap_err();
        assert!(matches!(err, RegistryError::UnregisteredIntent(Intent::Web)));

        registry.register(Intent::Web, Arc::new(NoopHandler("web")));
        assert!(registry.validate().is_ok());
        assert_eq!(registry.len(), Intent::ALL.len());
    }
}
