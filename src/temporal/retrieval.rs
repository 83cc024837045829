// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Lookups and weighting methods of a [`TemporalHierarchy`].

use crate::Error;

use super::{Horizon, HorizonBoundary, Period, TemporalHierarchy, Timepoint};

/// A temporal unit whose timepoints can be listed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TemporalScope {
    Horizon(u64),
    Period(u64),
}

/// Lookups.
impl TemporalHierarchy {
    /// Returns the subproblem this hierarchy was built for.
    pub fn subproblem(&self) -> u32 {
        self.subproblem
    }

    /// Returns the stage this hierarchy was built for.
    pub fn stage(&self) -> u32 {
        self.stage
    }

    /// Returns an iterator over the periods, in ascending order.
    pub fn periods(&self) -> impl Iterator<Item = &Period> {
        self.periods.values()
    }

    /// Returns an iterator over the horizons, in ascending order.
    pub fn horizons(&self) -> impl Iterator<Item = &Horizon> {
        self.horizons.values()
    }

    /// Returns an iterator over the timepoints, in ascending order.
    pub fn timepoints(&self) -> impl Iterator<Item = &Timepoint> {
        self.timepoints.values()
    }

    pub fn period(&self, period: u64) -> Result<&Period, Error> {
        self.periods
            .get(&period)
            .ok_or_else(|| Error::not_found(format!("Period {period} not found.")))
    }

    pub fn horizon(&self, horizon: u64) -> Result<&Horizon, Error> {
        self.horizons
            .get(&horizon)
            .ok_or_else(|| Error::not_found(format!("Horizon {horizon} not found.")))
    }

    pub fn timepoint(&self, timepoint: u64) -> Result<&Timepoint, Error> {
        self.timepoints
            .get(&timepoint)
            .ok_or_else(|| Error::not_found(format!("Timepoint {timepoint} not found.")))
    }

    /// Returns the horizon the given timepoint belongs to.
    pub fn horizon_of(&self, timepoint: u64) -> Result<u64, Error> {
        Ok(self.timepoint(timepoint)?.horizon)
    }

    /// Returns the period the given timepoint belongs to.
    pub fn period_of(&self, timepoint: u64) -> Result<u64, Error> {
        Ok(self.horizon(self.horizon_of(timepoint)?)?.period)
    }

    /// Returns the horizons of the given period, in ascending order.
    pub fn horizons_in(&self, period: u64) -> Result<&[u64], Error> {
        self.period_horizons
            .get(&period)
            .map(Vec::as_slice)
            .ok_or_else(|| Error::not_found(format!("Period {period} not found.")))
    }

    /// Returns the timepoints of the given horizon or period, in order.
    ///
    /// The result is never empty for a scope that exists.
    pub fn timepoints_in(&self, scope: TemporalScope) -> Result<Vec<u64>, Error> {
        match scope {
            TemporalScope::Horizon(horizon) => Ok(self.horizon_timepoints(horizon)?.to_vec()),
            TemporalScope::Period(period) => {
                let mut timepoints = vec![];
                for horizon in self.horizons_in(period)? {
                    timepoints.extend_from_slice(self.horizon_timepoints(*horizon)?);
                }
                Ok(timepoints)
            }
        }
    }

    fn horizon_timepoints(&self, horizon: u64) -> Result<&[u64], Error> {
        self.horizon_timepoints
            .get(&horizon)
            .map(Vec::as_slice)
            .ok_or_else(|| Error::not_found(format!("Horizon {horizon} not found.")))
    }

    /// Returns the timepoint before the given one within its horizon.
    ///
    /// For the first timepoint of a circular horizon, this is the horizon's
    /// last timepoint.  For the first timepoint of a linear horizon, it is
    /// `None`.
    pub fn previous(&self, timepoint: u64) -> Result<Option<u64>, Error> {
        self.neighbor(timepoint, false)
    }

    /// Returns the timepoint after the given one within its horizon, wrapping
    /// to the first timepoint for circular horizons.
    pub fn next(&self, timepoint: u64) -> Result<Option<u64>, Error> {
        self.neighbor(timepoint, true)
    }

    fn neighbor(&self, timepoint: u64, forward: bool) -> Result<Option<u64>, Error> {
        let horizon = self.horizon(self.horizon_of(timepoint)?)?;
        let timepoints = self.horizon_timepoints(horizon.id)?;
        let pos = timepoints
            .iter()
            .position(|t| *t == timepoint)
            .ok_or_else(|| {
                Error::internal(format!(
                    "Timepoint {timepoint} missing from horizon {}.",
                    horizon.id
                ))
            })?;
        let last = timepoints.len() - 1;
        let neighbor = match (forward, pos) {
            (false, 0) => match horizon.boundary {
                HorizonBoundary::Circular => Some(timepoints[last]),
                HorizonBoundary::Linear => None,
            },
            (false, pos) => Some(timepoints[pos - 1]),
            (true, pos) if pos == last => match horizon.boundary {
                HorizonBoundary::Circular => Some(timepoints[0]),
                HorizonBoundary::Linear => None,
            },
            (true, pos) => Some(timepoints[pos + 1]),
        };
        Ok(neighbor)
    }
}

/// Weighting.
impl TemporalHierarchy {
    /// Returns `years_represented × discount_factor` for the given period.
    ///
    /// This is the weight applied to per-period quantities such as fixed
    /// capacity costs.
    pub fn period_weight(&self, period: u64) -> Result<f64, Error> {
        let period = self.period(period)?;
        Ok(period.years_represented * period.discount_factor)
    }

    /// Returns the factor that annualizes a per-timepoint quantity:
    /// `duration × horizon_weight × years_represented × discount_factor`.
    pub fn weight(&self, timepoint: u64) -> Result<f64, Error> {
        self.annualize(1.0, timepoint)
    }

    /// Returns the annualized, discounted contribution of `quantity` at the
    /// given timepoint:
    /// `quantity × duration × horizon_weight × years_represented × discount_factor`,
    /// multiplied in exactly that order.
    pub fn annualize(&self, quantity: f64, timepoint: u64) -> Result<f64, Error> {
        let tp = self.timepoint(timepoint)?;
        let horizon = self.horizon(tp.horizon)?;
        let period = self.period(horizon.period)?;
        Ok(quantity
            * tp.duration_hours
            * horizon.weight
            * period.years_represented
            * period.discount_factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::temporal::TemporalInputs;

    fn hierarchy() -> Result<TemporalHierarchy, Error> {
        TemporalHierarchy::try_new(
            &TemporalInputs {
                periods: vec![Period::new(2030, 0.5, 10.0), Period::new(2040, 0.25, 10.0)],
                horizons: vec![
                    Horizon::new(1, 2030, 365.0),
                    Horizon::new(2, 2040, 365.0).with_boundary(HorizonBoundary::Linear),
                ],
                timepoints: vec![
                    Timepoint::new(3, 1, 8.0),
                    Timepoint::new(1, 1, 8.0),
                    Timepoint::new(2, 1, 8.0),
                    Timepoint::new(4, 2, 12.0),
                    Timepoint::new(5, 2, 12.0),
                ],
            },
            1,
            1,
        )
    }

    #[test]
    fn test_lookups() -> Result<(), Error> {
        let th = hierarchy()?;

        assert_eq!(th.horizon_of(2)?, 1);
        assert_eq!(th.period_of(2)?, 2030);
        assert_eq!(th.period_of(5)?, 2040);
        assert_eq!(th.horizons_in(2040)?, &[2]);
        assert_eq!(th.timepoints_in(TemporalScope::Horizon(1))?, vec![1, 2, 3]);
        assert_eq!(th.timepoints_in(TemporalScope::Period(2040))?, vec![4, 5]);

        assert!(th
            .period_of(9)
            .is_err_and(|e| e == Error::not_found("Timepoint 9 not found.")));
        assert!(th
            .timepoints_in(TemporalScope::Period(2050))
            .is_err_and(|e| e == Error::not_found("Period 2050 not found.")));

        Ok(())
    }

    #[test]
    fn test_previous_wraps_on_circular_horizons() -> Result<(), Error> {
        let th = hierarchy()?;

        assert_eq!(th.previous(1)?, Some(3));
        assert_eq!(th.previous(2)?, Some(1));
        assert_eq!(th.previous(3)?, Some(2));

        assert_eq!(th.next(3)?, Some(1));
        assert_eq!(th.next(1)?, Some(2));

        Ok(())
    }

    #[test]
    fn test_previous_on_linear_horizons() -> Result<(), Error> {
        let th = hierarchy()?;

        assert_eq!(th.previous(4)?, None);
        assert_eq!(th.previous(5)?, Some(4));
        assert_eq!(th.next(5)?, None);

        Ok(())
    }

    #[test]
    fn test_weights() -> Result<(), Error> {
        let th = hierarchy()?;

        assert_eq!(th.period_weight(2030)?, 10.0 * 0.5);
        assert_eq!(th.weight(1)?, 8.0 * 365.0 * 10.0 * 0.5);
        assert_eq!(th.annualize(3.0, 4)?, 3.0 * 12.0 * 365.0 * 10.0 * 0.25);

        Ok(())
    }
}
