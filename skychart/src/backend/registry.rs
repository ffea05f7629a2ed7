//! Name-keyed backend construction.
//!
//! The process-wide registry starts with the built-in `svg` and `plotly`
//! surfaces. Charts look backends up by name, so a host application can
//! register its own surface before building any chart.

use log::{debug, info};
use once_cell::sync::Lazy;
use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use super::plotly::PlotlyBackend;
use super::svg::SvgBackend;
use super::PlotBackend;
use crate::error::ConfigError;

pub type BackendConstructor = fn() -> Box<dyn PlotBackend>;

#[derive(Debug, Clone, Default)]
pub struct BackendRegistry {
    constructors: BTreeMap<String, BackendConstructor>,
}

impl BackendRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("svg", || Box::new(SvgBackend::new()));
        registry.register("plotly", || Box::new(PlotlyBackend::new()));
        registry
    }

    /// Register a constructor, replacing any existing one of the same name.
    pub fn register(&mut self, name: &str, constructor: BackendConstructor) {
        if self
            .constructors
            .insert(name.to_string(), constructor)
            .is_some()
        {
            info!("backend '{name}' re-registered");
        }
    }

    pub fn create(&self, name: &str) -> Result<Box<dyn PlotBackend>, ConfigError> {
        let constructor =
            self.constructors
                .get(name)
                .ok_or_else(|| ConfigError::UnknownBackend {
                    name: name.to_string(),
                    available: self.names(),
                })?;
        debug!("creating backend '{name}'");
        Ok(constructor())
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<String> {
        self.constructors.keys().cloned().collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }
}

static REGISTRY: Lazy<RwLock<BackendRegistry>> =
    Lazy::new(|| RwLock::new(BackendRegistry::with_builtins()));

/// Create a backend from the process-wide registry.
pub fn create_backend(name: &str) -> Result<Box<dyn PlotBackend>, ConfigError> {
    REGISTRY
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .create(name)
}

pub fn register_backend(name: &str, constructor: BackendConstructor) {
    REGISTRY
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .register(name, constructor);
}

pub fn backend_names() -> Vec<String> {
    REGISTRY
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .names()
}
