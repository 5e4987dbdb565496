//! The driver capability contract and the driver registry.
//!
//! A [`Driver`] is the pluggable backend a session delegates to: it fetches
//! documents, resolves selectors, and performs interactions. The session
//! never shares mutable state with its driver beyond these calls.
//!
//! Drivers are constructed through a name-to-factory [`DriverRegistry`],
//! resolved once at session construction time; asking for an unregistered
//! name fails immediately with [`Error::DriverNotFound`], before any
//! navigation.

use crate::config::SessionConfig;
use crate::error::{Error, Result};
use crate::query;
use async_trait::async_trait;
use marmot_protocol::{Action, Capabilities, NodeData, NodePath, Selector};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::LazyLock;

/// The operations a concrete backend must support.
///
/// Snapshot backends get selector resolution for free via the default
/// `find_nodes`/`node_state` implementations, which re-parse the current
/// document; backends with a native query engine (or interaction state the
/// markup alone cannot express) override them.
///
/// A driver that cannot support an operation must return
/// [`Error::Unsupported`] — silently doing nothing is never acceptable.
#[async_trait]
pub trait Driver: Send {
    /// The registry name this driver was built under.
    fn name(&self) -> &str;

    /// What this backend can do. The wait engine reads `live` to decide
    /// whether each poll needs a fresh document.
    fn capabilities(&self) -> Capabilities;

    /// Navigates to a path or absolute URL. Application errors reported by
    /// the backend surface here or, for backends that defer them, from
    /// [`reset`](Self::reset).
    async fn navigate(&mut self, path: &str) -> Result<()>;

    /// The absolute URL of the current page, if any navigation happened.
    fn current_url(&self) -> Option<String>;

    /// The literal markup of the current page, byte for byte — no
    /// normalization, no entity re-encoding.
    async fn document(&mut self) -> Result<String>;

    /// Resolves a selector to node state, in document order, optionally
    /// scoped to a subtree.
    async fn find_nodes(
        &mut self,
        selector: &Selector,
        scope: Option<&NodePath>,
    ) -> Result<Vec<NodeData>> {
        let markup = self.document().await?;
        query::resolve_nodes(&markup, selector, scope)
    }

    /// Re-reads the state of a single node.
    async fn node_state(&mut self, path: &NodePath) -> Result<NodeData> {
        let markup = self.document().await?;
        query::node_at(&markup, path).ok_or_else(|| Error::Stale(path.to_string()))
    }

    /// Performs an interaction on a node.
    async fn perform(&mut self, path: &NodePath, action: Action) -> Result<()>;

    /// Discards backend-side session state: cookies, stored form state,
    /// the current page. A deferred application error propagates from here,
    /// but the driver must clear its state regardless.
    async fn reset(&mut self) -> Result<()>;

    /// Convenience constructor for capability-mismatch errors.
    fn unsupported(&self, operation: impl Into<String>) -> Error
    where
        Self: Sized,
    {
        Error::Unsupported {
            driver: self.name().to_string(),
            operation: operation.into(),
        }
    }
}

impl std::fmt::Debug for dyn Driver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Driver").field("name", &self.name()).finish()
    }
}

/// Builds a driver from a session config.
pub type DriverFactory =
    Box<dyn Fn(&SessionConfig) -> Result<Box<dyn Driver>> + Send + Sync>;

/// Name-to-factory mapping for driver construction.
///
/// Most code uses the process-wide [`global`](Self::global) registry;
/// tests can build an isolated registry and hand it to
/// `Session::with_registry`.
#[derive(Default)]
pub struct DriverRegistry {
    factories: RwLock<HashMap<String, DriverFactory>>,
}

impl DriverRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry.
    pub fn global() -> &'static DriverRegistry {
        static GLOBAL: LazyLock<DriverRegistry> = LazyLock::new(DriverRegistry::new);
        &GLOBAL
    }

    /// Registers a factory under a name, replacing any previous entry.
    pub fn register<F>(&self, name: impl Into<String>, factory: F)
    where
        F: Fn(&SessionConfig) -> Result<Box<dyn Driver>> + Send + Sync + 'static,
    {
        let name = name.into();
        tracing::debug!(driver = %name, "registering driver factory");
        self.factories.write().insert(name, Box::new(factory));
    }

    /// True when a factory is registered under `name`.
    pub fn is_registered(&self, name: &str) -> bool {
        self.factories.read().contains_key(name)
    }

    /// Builds a driver, failing with [`Error::DriverNotFound`] for unknown
    /// names.
    pub fn build(&self, name: &str, config: &SessionConfig) -> Result<Box<dyn Driver>> {
        let factories = self.factories.read();
        match factories.get(name) {
            Some(factory) => factory(config),
            None => Err(Error::DriverNotFound(name.to_string())),
        }
    }
}

impl std::fmt::Debug for DriverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<String> = self.factories.read().keys().cloned().collect();
        f.debug_struct("DriverRegistry")
            .field("registered", &names)
            .finish()
    }
}
