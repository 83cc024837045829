// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! This module defines the `Resource` struct and the `TypeAxis` enum, which
//! represent the assets participating in a model and the axes along which
//! their behavior is classified.

use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;

/// The zone membership service used for load balancing.
pub const LOAD_ZONE: &str = "load_zone";

/// An orthogonal behavioral classification of a resource.
///
/// On each axis, a resource carries a type tag that the
/// [`TypeRegistry`][crate::TypeRegistry] resolves to the behavior governing
/// it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeAxis {
    Capacity,
    Operational,
    Availability,
    Compliance,
}

impl TypeAxis {
    pub const ALL: [TypeAxis; 4] = [
        TypeAxis::Capacity,
        TypeAxis::Operational,
        TypeAxis::Availability,
        TypeAxis::Compliance,
    ];
}

impl Display for TypeAxis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeAxis::Capacity => write!(f, "Capacity"),
            TypeAxis::Operational => write!(f, "Operational"),
            TypeAxis::Availability => write!(f, "Availability"),
            TypeAxis::Compliance => write!(f, "Compliance"),
        }
    }
}

/// A generation, storage, demand-response or transmission asset.
///
/// Resources are created once from scenario data and are not modified
/// during a build.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Resource {
    pub id: String,
    /// The type tag on each typing axis.
    #[serde(default)]
    pub types: BTreeMap<TypeAxis, String>,
    /// The zone the resource belongs to, for each service (load zone,
    /// reserve balancing area, policy zone, ...).
    #[serde(default)]
    pub zones: BTreeMap<String, String>,
    /// The periods in which the resource exists.  `None` means all periods.
    #[serde(default)]
    pub operational_periods: Option<BTreeSet<u64>>,
}

impl Resource {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            types: BTreeMap::new(),
            zones: BTreeMap::new(),
            operational_periods: None,
        }
    }

    pub fn with_type(mut self, axis: TypeAxis, tag: impl Into<String>) -> Self {
        self.types.insert(axis, tag.into());
        self
    }

    pub fn with_zone(mut self, service: impl Into<String>, zone: impl Into<String>) -> Self {
        self.zones.insert(service.into(), zone.into());
        self
    }

    pub fn with_operational_periods(mut self, periods: impl IntoIterator<Item = u64>) -> Self {
        self.operational_periods = Some(periods.into_iter().collect());
        self
    }

    /// Returns the type tag of the resource on the given axis.
    ///
    /// Behavior must be looked up through the
    /// [`TypeRegistry`][crate::TypeRegistry], never by comparing tags.
    pub fn type_tag(&self, axis: TypeAxis) -> Option<&str> {
        self.types.get(&axis).map(String::as_str)
    }

    /// Returns the zone of the resource for the given service.
    pub fn zone(&self, service: &str) -> Option<&str> {
        self.zones.get(service).map(String::as_str)
    }

    /// Returns `true` if the resource exists in the given period.
    pub fn is_operational_in(&self, period: u64) -> bool {
        self.operational_periods
            .as_ref()
            .map_or(true, |periods| periods.contains(&period))
    }
}
