//! Name → handler lookup with a designated fallback.

use crate::capability::ModuleHandler;
use crate::types::InvocationPath;
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of specialized module handlers.
///
/// A lookup miss is not an error: the fallback executor runs the module.
#[derive(Clone)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn ModuleHandler>>,
    fallback: Arc<dyn ModuleHandler>,
}

impl HandlerRegistry {
    /// Create an empty registry around the generic executor.
    pub fn new(fallback: Arc<dyn ModuleHandler>) -> Self {
        Self {
            handlers: HashMap::new(),
            fallback,
        }
    }

    /// Register `handler` under `name`, returning any handler it replaced.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        handler: Arc<dyn ModuleHandler>,
    ) -> Option<Arc<dyn ModuleHandler>> {
        self.handlers.insert(name.into(), handler)
    }

    /// Builder-style registration.
    pub fn with_handler(mut self, name: impl Into<String>, handler: Arc<dyn ModuleHandler>) -> Self {
        self.register(name, handler);
        self
    }

    pub fn lookup(&self, name: &str) -> Option<&Arc<dyn ModuleHandler>> {
        self.handlers.get(name)
    }

    pub fn fallback(&self) -> &Arc<dyn ModuleHandler> {
        &self.fallback
    }

    /// Pick the handler for `name`. `skip_handler` bypasses the lookup.
    pub fn resolve(&self, name: &str, skip_handler: bool) -> (InvocationPath, &Arc<dyn ModuleHandler>) {
        if !skip_handler {
            if let Some(handler) = self.lookup(name) {
                return (InvocationPath::Handler, handler);
            }
        }
        (InvocationPath::Fallback, &self.fallback)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("handlers", &self.names())
            .finish_non_exhaustive()
    }
}
