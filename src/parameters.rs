// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Named, indexed numeric inputs supplied by the input-loading collaborator.

use std::collections::BTreeMap;

use crate::{Error, Index};

/// Numeric parameters of a build, keyed by parameter name and [`Index`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Parameters {
    values: BTreeMap<String, BTreeMap<Index, f64>>,
}

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the value of a parameter member, replacing any previous value.
    pub fn insert(&mut self, name: impl Into<String>, index: Index, value: f64) -> &mut Self {
        self.values
            .entry(name.into())
            .or_default()
            .insert(index, value);
        self
    }

    /// Builder-style variant of [`insert`][Parameters::insert].
    pub fn with(mut self, name: impl Into<String>, index: Index, value: f64) -> Self {
        self.insert(name, index, value);
        self
    }

    /// Returns `true` if any member of the named parameter has been set.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Returns all members of the named parameter.
    pub fn members(&self, name: &str) -> Result<&BTreeMap<Index, f64>, Error> {
        self.values
            .get(name)
            .ok_or_else(|| Error::not_found(format!("Parameter '{name}' not found.")))
    }

    /// Returns the value of the given member.
    pub fn get(&self, name: &str, index: &Index) -> Result<f64, Error> {
        self.members(name)?.get(index).copied().ok_or_else(|| {
            Error::not_found(format!("Parameter '{name}' has no value for {index}."))
        })
    }

    /// Returns the value of the given member, or `default` if it is not set.
    pub fn get_or(&self, name: &str, index: &Index, default: f64) -> f64 {
        self.values
            .get(name)
            .and_then(|m| m.get(index))
            .copied()
            .unwrap_or(default)
    }
}
