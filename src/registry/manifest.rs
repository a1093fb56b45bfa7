//! Static manifests of unit and handler factories.
//!
//! A manifest replaces directory scanning: each entry pairs a source key
//! (used in diagnostics, and as the default event name for handlers) with a
//! factory that builds a fresh instance for every session.

use crate::context::HostContext;
use crate::error::LoadError;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};

type Factory<T> = Box<dyn Fn(&HostContext) -> Result<T, LoadError> + Send + Sync>;

/// One named factory.
pub struct ManifestEntry<T> {
    source: &'static str,
    factory: Factory<T>,
}

impl<T> ManifestEntry<T> {
    pub fn source(&self) -> &'static str {
        self.source
    }

    /// Run the factory, turning a panic into [`LoadError::Panicked`].
    pub fn build(&self, host: &HostContext) -> Result<T, LoadError> {
        catch_unwind(AssertUnwindSafe(|| (self.factory)(host))).unwrap_or_else(|_| {
            Err(LoadError::Panicked {
                source_key: self.source.to_string(),
            })
        })
    }
}

/// Ordered list of factories; load order is entry order.
pub struct Manifest<T> {
    entries: Vec<ManifestEntry<T>>,
}

impl<T> Default for Manifest<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T> Manifest<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a factory that cannot fail.
    pub fn with<F>(self, source: &'static str, factory: F) -> Self
    where
        F: Fn(&HostContext) -> T + Send + Sync + 'static,
    {
        self.with_fallible(source, move |host| Ok(factory(host)))
    }

    /// Append a factory that may reject its configuration.
    pub fn with_fallible<F>(mut self, source: &'static str, factory: F) -> Self
    where
        F: Fn(&HostContext) -> Result<T, LoadError> + Send + Sync + 'static,
    {
        self.entries.push(ManifestEntry {
            source,
            factory: Box::new(factory),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ManifestEntry<T>> {
        self.entries.iter()
    }
}

impl<T> fmt::Debug for Manifest<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|e| e.source))
            .finish()
    }
}
