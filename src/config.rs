// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! This module contains the configuration options for a model build.

use std::path::Path;

use serde::Deserialize;

use crate::Error;

/// Configuration options for a single build.
///
/// All fields have defaults, so an empty TOML document is a valid
/// configuration that selects only the core modules of a catalog and builds
/// subproblem 1, stage 1.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Optional feature groups to enable.  Catalog modules that belong to a
    /// feature group are only selected when the group is listed here.
    pub features: Vec<String>,

    /// Modules requested explicitly, on top of the ones selected through
    /// features.
    pub modules: Vec<String>,

    /// The subproblem this build covers.
    pub subproblem: u32,

    /// The stage this build covers.
    pub stage: u32,

    /// Whether type behaviors that are registered but not carried by any
    /// resource should still get their `declare_components` hook invoked.
    pub allow_unused_types: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            features: Vec::new(),
            modules: Vec::new(),
            subproblem: 1,
            stage: 1,
            allow_unused_types: false,
        }
    }
}

impl BuildConfig {
    /// Parses a configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, Error> {
        toml::from_str(s).map_err(|e| Error::invalid_config(format!("Invalid config: {e}")))
    }

    /// Reads and parses a configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::invalid_config(format!("Can't read config {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&contents)
    }
}
