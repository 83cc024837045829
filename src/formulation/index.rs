// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Coordinates at which indexed model elements are defined.

use std::fmt::Display;

/// The coordinate of one member of an indexed variable, expression,
/// constraint or parameter.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Index {
    Scalar,
    Period(u64),
    Timepoint(u64),
    Resource(String),
    ZoneTimepoint(String, u64),
    ZonePeriod(String, u64),
    ResourceTimepoint(String, u64),
    ResourcePeriod(String, u64),
}

impl Index {
    pub fn resource(resource: impl Into<String>) -> Self {
        Self::Resource(resource.into())
    }

    pub fn zone_timepoint(zone: impl Into<String>, timepoint: u64) -> Self {
        Self::ZoneTimepoint(zone.into(), timepoint)
    }

    pub fn zone_period(zone: impl Into<String>, period: u64) -> Self {
        Self::ZonePeriod(zone.into(), period)
    }

    pub fn resource_timepoint(resource: impl Into<String>, timepoint: u64) -> Self {
        Self::ResourceTimepoint(resource.into(), timepoint)
    }

    pub fn resource_period(resource: impl Into<String>, period: u64) -> Self {
        Self::ResourcePeriod(resource.into(), period)
    }
}

impl Display for Index {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Index::Scalar => Ok(()),
            Index::Period(p) | Index::Timepoint(p) => write!(f, "[{p}]"),
            Index::Resource(name) => write!(f, "[{name}]"),
            Index::ZoneTimepoint(name, n)
            | Index::ZonePeriod(name, n)
            | Index::ResourceTimepoint(name, n)
            | Index::ResourcePeriod(name, n) => write!(f, "[{name},{n}]"),
        }
    }
}

/// A reference to one member of an indexed variable.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarRef {
    pub name: String,
    pub index: Index,
}

impl VarRef {
    pub fn new(name: impl Into<String>, index: Index) -> Self {
        Self {
            name: name.into(),
            index,
        }
    }
}

impl Display for VarRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.name, self.index)
    }
}
