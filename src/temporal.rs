// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! The nested Period → Horizon → Timepoint structure of a build, along with
//! the weights and discount factors used to annualize per-timepoint
//! quantities.

mod creation;
mod retrieval;

pub use retrieval::TemporalScope;

use serde::Deserialize;
use std::collections::BTreeMap;

/// What the "previous timepoint" of a horizon's first timepoint is.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HorizonBoundary {
    /// The horizon wraps around: the first timepoint's predecessor is the
    /// last timepoint.  This models a representative day or week.
    #[default]
    Circular,
    /// The first timepoint has no predecessor.
    Linear,
}

/// An investment-decision epoch.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Period {
    pub id: u64,
    pub discount_factor: f64,
    /// Number of years the period represents.
    pub years_represented: f64,
}

impl Period {
    pub fn new(id: u64, discount_factor: f64, years_represented: f64) -> Self {
        Self {
            id,
            discount_factor,
            years_represented,
        }
    }
}

/// A group of consecutive timepoints linked by intra-horizon constraints.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Horizon {
    pub id: u64,
    pub period: u64,
    /// How many times the horizon is replicated within a year of its period.
    pub weight: f64,
    #[serde(default)]
    pub boundary: HorizonBoundary,
}

impl Horizon {
    pub fn new(id: u64, period: u64, weight: f64) -> Self {
        Self {
            id,
            period,
            weight,
            boundary: HorizonBoundary::Circular,
        }
    }

    pub fn with_boundary(mut self, boundary: HorizonBoundary) -> Self {
        self.boundary = boundary;
        self
    }
}

fn first_slice() -> u32 {
    1
}

/// The finest operational decision point.
///
/// Within a horizon, timepoints are ordered by ascending `id`, whatever
/// their order in the input.  That order defines `previous`, `next` and the
/// wraparound of circular horizons.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Timepoint {
    pub id: u64,
    pub horizon: u64,
    pub duration_hours: f64,
    #[serde(default = "first_slice")]
    pub subproblem: u32,
    #[serde(default = "first_slice")]
    pub stage: u32,
}

impl Timepoint {
    pub fn new(id: u64, horizon: u64, duration_hours: f64) -> Self {
        Self {
            id,
            horizon,
            duration_hours,
            subproblem: 1,
            stage: 1,
        }
    }

    /// Assigns the timepoint to the given `(subproblem, stage)` slice.
    pub fn in_slice(mut self, subproblem: u32, stage: u32) -> Self {
        self.subproblem = subproblem;
        self.stage = stage;
        self
    }
}

/// Raw temporal data, as provided by the input-loading collaborator.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct TemporalInputs {
    pub periods: Vec<Period>,
    pub horizons: Vec<Horizon>,
    pub timepoints: Vec<Timepoint>,
}

/// The validated temporal structure of a single `(subproblem, stage)` slice.
///
/// Instances are created with [`try_new`][TemporalHierarchy::try_new] and
/// never change afterwards.  Timepoints of a horizon, and horizons of a
/// period, are ordered by ascending id.
#[derive(Clone, Debug)]
pub struct TemporalHierarchy {
    subproblem: u32,
    stage: u32,
    periods: BTreeMap<u64, Period>,
    horizons: BTreeMap<u64, Horizon>,
    timepoints: BTreeMap<u64, Timepoint>,
    /// Timepoints of each horizon, in ascending id order.
    horizon_timepoints: BTreeMap<u64, Vec<u64>>,
    /// Horizons of each period, in ascending order.
    period_horizons: BTreeMap<u64, Vec<u64>>,
}
