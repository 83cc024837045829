// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! The capability interfaces implemented by type behaviors, one per typing
//! axis.
//!
//! Every rule method has a default implementation that fails with
//! `UnsupportedOperation`, so a behavior only implements the rules it lists
//! in [`rules`][TypeBehavior::rules].

use std::collections::BTreeSet;
use std::fmt::Display;

use crate::{BuildContext, Error, Expr, ModelView, Resource, TypeAxis};

/// A rule function that a type behavior may implement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Rule {
    Capacity,
    FixedCost,
    PowerProvision,
    MinPower,
    MaxPower,
    Startup,
    Shutdown,
    VariableCost,
    AvailabilityDerate,
    ComplianceContribution,
}

impl Rule {
    /// Returns the typing axis whose behaviors may implement this rule.
    pub fn axis(&self) -> TypeAxis {
        match self {
            Rule::Capacity | Rule::FixedCost => TypeAxis::Capacity,
            Rule::PowerProvision
            | Rule::MinPower
            | Rule::MaxPower
            | Rule::Startup
            | Rule::Shutdown
            | Rule::VariableCost => TypeAxis::Operational,
            Rule::AvailabilityDerate => TypeAxis::Availability,
            Rule::ComplianceContribution => TypeAxis::Compliance,
        }
    }
}

impl Display for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Rule::Capacity => "capacity",
            Rule::FixedCost => "fixed_cost",
            Rule::PowerProvision => "power_provision",
            Rule::MinPower => "min_power",
            Rule::MaxPower => "max_power",
            Rule::Startup => "startup",
            Rule::Shutdown => "shutdown",
            Rule::VariableCost => "variable_cost",
            Rule::AvailabilityDerate => "availability_derate",
            Rule::ComplianceContribution => "compliance_contribution",
        };
        write!(f, "{name}")
    }
}

pub(crate) fn unsupported(tag: &str, rule: Rule) -> Error {
    Error::unsupported_operation(format!(
        "{} type '{tag}' does not implement rule '{rule}'.",
        rule.axis()
    ))
}

/// Functionality shared by the behaviors of all typing axes.
pub trait TypeBehavior: Send + Sync {
    /// The type tag this behavior governs.
    fn tag(&self) -> &str;

    /// The rule functions this behavior implements.
    fn rules(&self) -> BTreeSet<Rule>;

    /// Adds the variables and constraints of this behavior for the given
    /// resources, all of which carry this behavior's tag.
    ///
    /// Only invoked when at least one resource carries the tag.
    fn declare_components(
        &self,
        _ctx: &mut BuildContext<'_>,
        _resources: &[&Resource],
    ) -> Result<(), Error> {
        Ok(())
    }
}

/// Rules governing how much capacity a resource has and what it costs.
pub trait CapacityType: TypeBehavior {
    /// Installed capacity of the resource in the given period.
    fn capacity(
        &self,
        _view: &ModelView<'_>,
        _resource: &Resource,
        _period: u64,
    ) -> Result<Expr, Error> {
        Err(unsupported(self.tag(), Rule::Capacity))
    }

    /// Fixed cost of the resource's capacity in the given period, not yet
    /// weighted by the period.
    fn fixed_cost(
        &self,
        _view: &ModelView<'_>,
        _resource: &Resource,
        _period: u64,
    ) -> Result<Expr, Error> {
        Err(unsupported(self.tag(), Rule::FixedCost))
    }
}

/// Rules governing how a resource is operated.
pub trait OperationalType: TypeBehavior {
    fn power_provision(
        &self,
        _view: &ModelView<'_>,
        _resource: &Resource,
        _timepoint: u64,
    ) -> Result<Expr, Error> {
        Err(unsupported(self.tag(), Rule::PowerProvision))
    }

    fn min_power(
        &self,
        _view: &ModelView<'_>,
        _resource: &Resource,
        _timepoint: u64,
    ) -> Result<Expr, Error> {
        Err(unsupported(self.tag(), Rule::MinPower))
    }

    fn max_power(
        &self,
        _view: &ModelView<'_>,
        _resource: &Resource,
        _timepoint: u64,
    ) -> Result<Expr, Error> {
        Err(unsupported(self.tag(), Rule::MaxPower))
    }

    fn startup(
        &self,
        _view: &ModelView<'_>,
        _resource: &Resource,
        _timepoint: u64,
    ) -> Result<Expr, Error> {
        Err(unsupported(self.tag(), Rule::Startup))
    }

    fn shutdown(
        &self,
        _view: &ModelView<'_>,
        _resource: &Resource,
        _timepoint: u64,
    ) -> Result<Expr, Error> {
        Err(unsupported(self.tag(), Rule::Shutdown))
    }

    /// Variable operating cost at the given timepoint, not yet weighted.
    fn variable_cost(
        &self,
        _view: &ModelView<'_>,
        _resource: &Resource,
        _timepoint: u64,
    ) -> Result<Expr, Error> {
        Err(unsupported(self.tag(), Rule::VariableCost))
    }
}

/// Rules governing how much of a resource's capacity is available.
pub trait AvailabilityType: TypeBehavior {
    /// Fraction of capacity available at the given timepoint.
    fn availability_derate(
        &self,
        _view: &ModelView<'_>,
        _resource: &Resource,
        _timepoint: u64,
    ) -> Result<f64, Error> {
        Err(unsupported(self.tag(), Rule::AvailabilityDerate))
    }
}

/// Rules governing a resource's contribution to policy targets.
pub trait ComplianceType: TypeBehavior {
    fn compliance_contribution(
        &self,
        _view: &ModelView<'_>,
        _resource: &Resource,
        _timepoint: u64,
    ) -> Result<Expr, Error> {
        Err(unsupported(self.tag(), Rule::ComplianceContribution))
    }
}
