use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use {
    dashmap::DashMap,
    tracing::{debug, warn},
};

use crate::{
    error::{Error, Result},
    handler::Handler,
};

/// Builds one handler instance; run at most once per routing key.
pub type HandlerFactory = Box<dyn Fn() -> anyhow::Result<Arc<dyn Handler>> + Send + Sync>;

/// Startup-time set of routing key → handler factory bindings.
#[derive(Default)]
pub struct HandlerRegistry {
    factories: HashMap<String, HandlerFactory>,
}

impl HandlerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, key: impl Into<String>, factory: HandlerFactory) {
        self.factories.insert(key.into(), factory);
    }

    /// Bind an already-built handler.
    pub fn register_handler(&mut self, key: impl Into<String>, handler: Arc<dyn Handler>) {
        self.register(key, Box::new(move || Ok(Arc::clone(&handler))));
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.factories.contains_key(key)
    }

    #[must_use]
    pub fn keys(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }
}

/// Maps routing keys to handlers with lazy-load-and-cache semantics.
///
/// Negative outcomes are cached too: repeated lookups of a missing or
/// broken key return the original error without re-running any load logic.
pub struct Resolver {
    registry: HandlerRegistry,
    cache: DashMap<String, Result<Arc<dyn Handler>>>,
    load_attempts: AtomicU64,
}

impl Resolver {
    #[must_use]
    pub fn new(registry: HandlerRegistry) -> Self {
        Self {
            registry,
            cache: DashMap::new(),
            load_attempts: AtomicU64::new(0),
        }
    }

    /// Locate the handler for a routing key without invoking it.
    pub fn resolve(&self, key: &str) -> Result<Arc<dyn Handler>> {
        self.cache
            .entry(key.to_string())
            .or_insert_with(|| self.load(key))
            .clone()
    }

    fn load(&self, key: &str) -> Result<Arc<dyn Handler>> {
        self.load_attempts.fetch_add(1, Ordering::Relaxed);
        match self.registry.factories.get(key) {
            None => {
                debug!(key, "no handler registered");
                Err(Error::not_found(key))
            },
            Some(factory) => factory().map_err(|e| {
                warn!(key, error = %e, "handler failed to load");
                Error::load_failed(key, e)
            }),
        }
    }

    /// Cache-miss loads performed so far (registry probes and factory runs).
    #[must_use]
    pub fn load_attempts(&self) -> u64 {
        self.load_attempts.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use async_trait::async_trait;

    use super::*;
    use crate::handler::HandlerContext;
    use parley_protocol::HandlerReply;

    struct Echo;

    #[async_trait]
    impl Handler for Echo {
        async fn handle(&self, ctx: HandlerContext) -> anyhow::Result<HandlerReply> {
            let text = ctx
                .arguments
                .get("text")
                .map(|a| a.value.clone())
                .unwrap_or_default();
            Ok(HandlerReply::text(format!("echo: {text}")))
        }
    }

    #[test]
    fn registered_key_resolves_once_and_caches() {
        let runs = Arc::new(AtomicUsize::new(0));
        let mut registry = HandlerRegistry::new();
        let counter = Arc::clone(&runs);
        registry.register(
            "echo",
            Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Arc::new(Echo) as Arc<dyn Handler>)
            }),
        );

        let resolver = Resolver::new(registry);
        assert!(resolver.resolve("echo").is_ok());
        assert!(resolver.resolve("echo").is_ok());
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(resolver.load_attempts(), 1);
    }

    #[test]
    fn unregistered_key_caches_not_found() {
        let resolver = Resolver::new(HandlerRegistry::new());
        let first = resolver.resolve("missing").err();
        let second = resolver.resolve("missing").err();
        assert_eq!(first, Some(Error::not_found("missing")));
        assert_eq!(first, second);
        assert_eq!(resolver.load_attempts(), 1);
    }

    #[test]
    fn failing_factory_caches_load_error_distinct_from_not_found() {
        let runs = Arc::new(AtomicUsize::new(0));
        let mut registry = HandlerRegistry::new();
        let counter = Arc::clone(&runs);
        registry.register(
            "broken",
            Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(anyhow::anyhow!("bad definition"))
            }),
        );

        let resolver = Resolver::new(registry);
        let first = resolver.resolve("broken").err();
        let second = resolver.resolve("broken").err();
        assert!(matches!(first, Some(Error::LoadFailed { .. })));
        assert_eq!(first, second);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn resolution_does_not_invoke_the_handler() {
        let mut registry = HandlerRegistry::new();
        registry.register_handler("echo", Arc::new(Echo));
        let resolver = Resolver::new(registry);

        let handler = resolver.resolve("echo").unwrap();
        // Invocation happens only when the dispatcher calls handle().
        let reply = handler.handle(HandlerContext::default()).await.unwrap();
        assert_eq!(reply, HandlerReply::text("echo: "));
    }
}
