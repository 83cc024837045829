// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Methods for creating [`TemporalHierarchy`] instances from raw temporal
//! inputs.

use std::collections::{BTreeMap, BTreeSet};

use crate::Error;

use super::{Horizon, Period, TemporalHierarchy, TemporalInputs, Timepoint};

/// `TemporalHierarchy` instantiation.
impl TemporalHierarchy {
    /// Creates a new [`TemporalHierarchy`] for the given `(subproblem, stage)`
    /// slice of the given inputs.
    ///
    /// Containment is validated over all slices: every timepoint must belong
    /// to a known horizon, every horizon to a known period, no horizon or
    /// period may be empty and no horizon may straddle slices.  Only the
    /// requested slice is kept.
    pub fn try_new(inputs: &TemporalInputs, subproblem: u32, stage: u32) -> Result<Self, Error> {
        let periods = Self::collect_periods(&inputs.periods)?;
        let horizons = Self::collect_horizons(&inputs.horizons, &periods)?;
        let timepoints = Self::collect_timepoints(&inputs.timepoints, &horizons)?;

        let mut horizon_slices: BTreeMap<u64, BTreeSet<(u32, u32)>> = BTreeMap::new();
        for tp in timepoints.values() {
            horizon_slices
                .entry(tp.horizon)
                .or_default()
                .insert((tp.subproblem, tp.stage));
        }
        for horizon in horizons.values() {
            match horizon_slices.get(&horizon.id).map(|s| s.len()) {
                None => {
                    return Err(Error::malformed_temporal_data(format!(
                        "Horizon {} has no timepoints.",
                        horizon.id
                    )))
                }
                Some(1) => {}
                Some(_) => {
                    return Err(Error::malformed_temporal_data(format!(
                        "Horizon {} has timepoints in more than one (subproblem, stage) slice.",
                        horizon.id
                    )))
                }
            }
        }
        for period in periods.values() {
            if !horizons.values().any(|h| h.period == period.id) {
                return Err(Error::malformed_temporal_data(format!(
                    "Period {} has no horizons.",
                    period.id
                )));
            }
        }

        let timepoints: BTreeMap<u64, Timepoint> = timepoints
            .into_iter()
            .filter(|(_, tp)| tp.subproblem == subproblem && tp.stage == stage)
            .collect();
        if timepoints.is_empty() {
            return Err(Error::malformed_temporal_data(format!(
                "No timepoints found for subproblem {subproblem}, stage {stage}."
            )));
        }

        let mut horizon_timepoints: BTreeMap<u64, Vec<u64>> = BTreeMap::new();
        for tp in timepoints.values() {
            horizon_timepoints.entry(tp.horizon).or_default().push(tp.id);
        }
        let horizons: BTreeMap<u64, Horizon> = horizons
            .into_iter()
            .filter(|(id, _)| horizon_timepoints.contains_key(id))
            .collect();

        let mut period_horizons: BTreeMap<u64, Vec<u64>> = BTreeMap::new();
        for horizon in horizons.values() {
            period_horizons
                .entry(horizon.period)
                .or_default()
                .push(horizon.id);
        }
        let periods: BTreeMap<u64, Period> = periods
            .into_iter()
            .filter(|(id, _)| period_horizons.contains_key(id))
            .collect();

        tracing::debug!(
            "Temporal hierarchy for subproblem {}, stage {}: {} periods, {} horizons, {} timepoints.",
            subproblem,
            stage,
            periods.len(),
            horizons.len(),
            timepoints.len()
        );

        Ok(Self {
            subproblem,
            stage,
            periods,
            horizons,
            timepoints,
            horizon_timepoints,
            period_horizons,
        })
    }

    fn collect_periods(periods: &[Period]) -> Result<BTreeMap<u64, Period>, Error> {
        let mut collected = BTreeMap::new();
        for period in periods {
            let id = period.id;
            if !(period.discount_factor.is_finite() && period.discount_factor >= 0.0) {
                return Err(Error::malformed_temporal_data(format!(
                    "Period {id} has an invalid discount factor: {}",
                    period.discount_factor
                )));
            }
            if !(period.years_represented.is_finite() && period.years_represented > 0.0) {
                return Err(Error::malformed_temporal_data(format!(
                    "Period {id} has an invalid number of years represented: {}",
                    period.years_represented
                )));
            }
            if collected.insert(id, period.clone()).is_some() {
                return Err(Error::malformed_temporal_data(format!(
                    "Duplicate period ID found: {id}"
                )));
            }
        }
        Ok(collected)
    }

    fn collect_horizons(
        horizons: &[Horizon],
        periods: &BTreeMap<u64, Period>,
    ) -> Result<BTreeMap<u64, Horizon>, Error> {
        let mut collected = BTreeMap::new();
        for horizon in horizons {
            let id = horizon.id;
            if !periods.contains_key(&horizon.period) {
                return Err(Error::malformed_temporal_data(format!(
                    "Horizon {id} references unknown period {}.",
                    horizon.period
                )));
            }
            if !(horizon.weight.is_finite() && horizon.weight > 0.0) {
                return Err(Error::malformed_temporal_data(format!(
                    "Horizon {id} has an invalid weight: {}",
                    horizon.weight
                )));
            }
            if collected.insert(id, horizon.clone()).is_some() {
                return Err(Error::malformed_temporal_data(format!(
                    "Duplicate horizon ID found: {id}"
                )));
            }
        }
        Ok(collected)
    }

    fn collect_timepoints(
        timepoints: &[Timepoint],
        horizons: &BTreeMap<u64, Horizon>,
    ) -> Result<BTreeMap<u64, Timepoint>, Error> {
        let mut collected: BTreeMap<u64, Timepoint> = BTreeMap::new();
        for tp in timepoints {
            let id = tp.id;
            if let Some(existing) = collected.get(&id) {
                return Err(Error::malformed_temporal_data(
                    if existing.horizon != tp.horizon {
                        format!(
                            "Timepoint {id} is assigned to more than one horizon: {} and {}.",
                            existing.horizon, tp.horizon
                        )
                    } else {
                        format!("Duplicate timepoint ID found: {id}")
                    },
                ));
            }
            if !horizons.contains_key(&tp.horizon) {
                return Err(Error::malformed_temporal_data(format!(
                    "Timepoint {id} is not assigned to a known horizon. Found {}.",
                    tp.horizon
                )));
            }
            if !(tp.duration_hours.is_finite() && tp.duration_hours > 0.0) {
                return Err(Error::malformed_temporal_data(format!(
                    "Timepoint {id} has an invalid duration: {}",
                    tp.duration_hours
                )));
            }
            collected.insert(id, tp.clone());
        }
        Ok(collected)
    }
}
