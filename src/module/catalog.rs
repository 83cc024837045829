// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! The set of modules available to a build, and their selection from a
//! [`BuildConfig`].

use std::collections::BTreeSet;

use crate::{features, BuildConfig, Error, Module};

type Factory = Box<dyn Fn() -> Box<dyn Module>>;

struct CatalogEntry {
    name: String,
    feature: Option<String>,
    factory: Factory,
}

/// The modules available to a build, in canonical order.
///
/// Each module is either a core module, which is always selected, or belongs
/// to a feature group that has to be enabled in the configuration.
#[derive(Default)]
pub struct ModuleCatalog {
    entries: Vec<CatalogEntry>,
}

impl ModuleCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a catalog with the built-in modules.
    pub fn standard() -> Self {
        let mut catalog = Self::new();
        features::register_standard(&mut catalog);
        catalog
    }

    /// Adds a module to the catalog, optionally as part of a feature group.
    ///
    /// Returns an error if a module with the same name is already present.
    pub fn register(
        &mut self,
        feature: Option<&str>,
        factory: impl Fn() -> Box<dyn Module> + 'static,
    ) -> Result<(), Error> {
        let name = factory().name().to_string();
        if self.entries.iter().any(|e| e.name == name) {
            return Err(Error::invalid_config(format!(
                "Module '{name}' is already in the catalog."
            )));
        }
        self.push_named(name, feature, Box::new(factory));
        Ok(())
    }

    /// Adds a module whose name is known to be unique.
    pub(crate) fn push(
        &mut self,
        feature: Option<&str>,
        factory: impl Fn() -> Box<dyn Module> + 'static,
    ) {
        let name = factory().name().to_string();
        self.push_named(name, feature, Box::new(factory));
    }

    fn push_named(&mut self, name: String, feature: Option<&str>, factory: Factory) {
        self.entries.push(CatalogEntry {
            name,
            feature: feature.map(String::from),
            factory,
        });
    }

    /// Returns the names of the modules in the catalog, in canonical order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    /// Returns the feature groups known to the catalog.
    pub fn features(&self) -> BTreeSet<&str> {
        self.entries
            .iter()
            .filter_map(|e| e.feature.as_deref())
            .collect()
    }

    /// Instantiates the modules requested by the configuration, in catalog
    /// order.
    ///
    /// Core modules are always selected.  Feature modules are selected when
    /// their feature is enabled or when they are named explicitly.
    pub fn select(&self, config: &BuildConfig) -> Result<Vec<Box<dyn Module>>, Error> {
        let known = self.features();
        for feature in &config.features {
            if !known.contains(feature.as_str()) {
                return Err(Error::invalid_config(format!(
                    "Unknown feature '{feature}'. Known features: {}.",
                    known.iter().copied().collect::<Vec<_>>().join(", ")
                )));
            }
        }
        for module in &config.modules {
            if !self.entries.iter().any(|e| &e.name == module) {
                return Err(Error::missing_module(format!(
                    "Module '{module}' is not in the catalog."
                )));
            }
        }

        let selected = self
            .entries
            .iter()
            .filter(|e| match &e.feature {
                None => true,
                Some(feature) => {
                    config.features.contains(feature) || config.modules.contains(&e.name)
                }
            })
            .map(|e| {
                tracing::debug!("Selected module '{}'.", e.name);
                (e.factory)()
            })
            .collect();
        Ok(selected)
    }
}
