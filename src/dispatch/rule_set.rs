// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! The rules of the behavior governing one resource on one axis.

use std::collections::BTreeSet;

use super::{behaviors::unsupported, Rule, TypeModule};
use crate::{Error, Expr, ModelView, Resource, TypeAxis};

/// The rule functions available for a resource on one typing axis.
///
/// Invoking a rule the resolved behavior does not implement fails with
/// `UnsupportedOperation`.
pub struct RuleSet<'a> {
    resource: &'a Resource,
    module: &'a TypeModule,
}

impl<'a> RuleSet<'a> {
    pub(crate) fn new(resource: &'a Resource, module: &'a TypeModule) -> Self {
        Self { resource, module }
    }

    pub fn axis(&self) -> TypeAxis {
        self.module.axis()
    }

    /// The tag of the behavior governing the resource.
    pub fn tag(&self) -> &str {
        self.module.tag()
    }

    pub fn rules(&self) -> BTreeSet<Rule> {
        self.module.rules()
    }

    pub fn supports(&self, rule: Rule) -> bool {
        rule.axis() == self.axis() && self.module.rules().contains(&rule)
    }

    fn ensure(&self, rule: Rule) -> Result<(), Error> {
        if rule.axis() != self.axis() {
            return Err(Error::unsupported_operation(format!(
                "Rule '{rule}' belongs to the {} axis; resource '{}' was resolved on the {} axis.",
                rule.axis(),
                self.resource.id,
                self.axis()
            )));
        }
        if !self.module.rules().contains(&rule) {
            return Err(Error::unsupported_operation(format!(
                "{} type '{}' of resource '{}' does not implement rule '{rule}'.",
                self.axis(),
                self.tag(),
                self.resource.id
            )));
        }
        Ok(())
    }

    fn mismatch(&self, rule: Rule) -> Error {
        unsupported(self.tag(), rule)
    }
}

/// Capacity rules.
impl RuleSet<'_> {
    pub fn capacity(&self, view: &ModelView<'_>, period: u64) -> Result<Expr, Error> {
        self.ensure(Rule::Capacity)?;
        match self.module {
            TypeModule::Capacity(b) => b.capacity(view, self.resource, period),
            _ => Err(self.mismatch(Rule::Capacity)),
        }
    }

    pub fn fixed_cost(&self, view: &ModelView<'_>, period: u64) -> Result<Expr, Error> {
        self.ensure(Rule::FixedCost)?;
        match self.module {
            TypeModule::Capacity(b) => b.fixed_cost(view, self.resource, period),
            _ => Err(self.mismatch(Rule::FixedCost)),
        }
    }
}

/// Operational rules.
impl RuleSet<'_> {
    fn operational(
        &self,
        rule: Rule,
        view: &ModelView<'_>,
        timepoint: u64,
    ) -> Result<Expr, Error> {
        self.ensure(rule)?;
        let TypeModule::Operational(b) = self.module else {
            return Err(self.mismatch(rule));
        };
        match rule {
            Rule::PowerProvision => b.power_provision(view, self.resource, timepoint),
            Rule::MinPower => b.min_power(view, self.resource, timepoint),
            Rule::MaxPower => b.max_power(view, self.resource, timepoint),
            Rule::Startup => b.startup(view, self.resource, timepoint),
            Rule::Shutdown => b.shutdown(view, self.resource, timepoint),
            Rule::VariableCost => b.variable_cost(view, self.resource, timepoint),
            _ => Err(self.mismatch(rule)),
        }
    }

    pub fn power_provision(&self, view: &ModelView<'_>, timepoint: u64) -> Result<Expr, Error> {
        self.operational(Rule::PowerProvision, view, timepoint)
    }

    pub fn min_power(&self, view: &ModelView<'_>, timepoint: u64) -> Result<Expr, Error> {
        self.operational(Rule::MinPower, view, timepoint)
    }

    pub fn max_power(&self, view: &ModelView<'_>, timepoint: u64) -> Result<Expr, Error> {
        self.operational(Rule::MaxPower, view, timepoint)
    }

    pub fn startup(&self, view: &ModelView<'_>, timepoint: u64) -> Result<Expr, Error> {
        self.operational(Rule::Startup, view, timepoint)
    }

    pub fn shutdown(&self, view: &ModelView<'_>, timepoint: u64) -> Result<Expr, Error> {
        self.operational(Rule::Shutdown, view, timepoint)
    }

    pub fn variable_cost(&self, view: &ModelView<'_>, timepoint: u64) -> Result<Expr, Error> {
        self.operational(Rule::VariableCost, view, timepoint)
    }
}

/// Availability and compliance rules.
impl RuleSet<'_> {
    pub fn availability_derate(&self, view: &ModelView<'_>, timepoint: u64) -> Result<f64, Error> {
        self.ensure(Rule::AvailabilityDerate)?;
        match self.module {
            TypeModule::Availability(b) => b.availability_derate(view, self.resource, timepoint),
            _ => Err(self.mismatch(Rule::AvailabilityDerate)),
        }
    }

    pub fn compliance_contribution(
        &self,
        view: &ModelView<'_>,
        timepoint: u64,
    ) -> Result<Expr, Error> {
        self.ensure(Rule::ComplianceContribution)?;
        match self.module {
            TypeModule::Compliance(b) => b.compliance_contribution(view, self.resource, timepoint),
            _ => Err(self.mismatch(Rule::ComplianceContribution)),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::test_utils::ScenarioBuilder;
    use crate::{Error, Rule, TypeAxis};

    #[test]
    fn test_rule_set() -> Result<(), Error> {
        let scenario = ScenarioBuilder::single_timepoint(1.0, 1.0, 1.0, 1.0)
            .resource_with("coal", "specified", "must_run")
            .build_parts()?;
        let view = scenario.view();
        let coal = scenario.types.resource("coal")?;

        let rules = scenario.types.rule_set(coal, TypeAxis::Operational)?;
        assert_eq!(rules.tag(), "must_run");
        assert!(rules.supports(Rule::PowerProvision));
        assert!(!rules.supports(Rule::Startup));
        assert!(!rules.supports(Rule::Capacity));

        assert_eq!(rules.power_provision(&view, 1)?.to_string(), "100.0");
        assert!(rules.startup(&view, 1).is_err_and(|e| e
            == Error::unsupported_operation(
                "Operational type 'must_run' of resource 'coal' does not implement rule 'startup'."
            )));

        let rules = scenario.types.rule_set(coal, TypeAxis::Capacity)?;
        assert_eq!(rules.capacity(&view, 2030)?.to_string(), "100.0");
        assert!(rules.power_provision(&view, 1).is_err_and(|e| e
            == Error::unsupported_operation(
                "Rule 'power_provision' belongs to the Operational axis; resource 'coal' was \
                 resolved on the Capacity axis."
            )));

        Ok(())
    }
}
