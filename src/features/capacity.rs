// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Resource capacity, and the capacity types `specified` and `new_build`.

use std::collections::BTreeSet;

use super::COST_COMPONENTS;
use crate::{
    BuildContext, CapacityType, Constraint, Domain, Error, Expr, Index, ModelView, Module,
    Resource, ResultRecord, ResultsExporter, Rule, Solution, TypeAxis, TypeBehavior, TypeModule,
    Variable,
};

/// Installed capacity, per `[resource, period]`.
pub const CAPACITY: &str = "capacity_mw";

const SPECIFIED_CAPACITY: &str = "specified_capacity_mw";
const FIXED_COST: &str = "fixed_cost_per_mw_yr";
const NEW_BUILD_COST: &str = "new_build_cost_per_mw_yr";
const MAX_NEW_BUILD: &str = "max_new_build_mw";
const BUILD: &str = "build_mw";

/// Declares the capacity of every resource in every period it is
/// operational in, and the period-weighted fixed costs.
pub struct CapacityModule;

impl Module for CapacityModule {
    fn name(&self) -> &str {
        "project.capacity"
    }

    fn produces(&self) -> Vec<&str> {
        vec![COST_COMPONENTS]
    }

    fn type_behaviors(&self) -> Vec<TypeModule> {
        vec![TypeModule::capacity(Specified), TypeModule::capacity(NewBuild)]
    }

    fn required_axes(&self) -> Vec<TypeAxis> {
        vec![TypeAxis::Capacity]
    }

    fn declare_components(&self, ctx: &mut BuildContext<'_>) -> Result<(), Error> {
        ctx.declare_type_components(TypeAxis::Capacity)?;
        ctx.declare_list(COST_COMPONENTS)?;

        let temporal = ctx.temporal();
        let types = ctx.types();
        let mut capacity = vec![];
        let mut costs = vec![];
        {
            let view = ctx.view();
            for resource in types.resources() {
                let rules = types.rule_set(resource, TypeAxis::Capacity)?;
                for period in temporal.periods().filter(|p| resource.is_operational_in(p.id)) {
                    let index = Index::resource_period(&resource.id, period.id);
                    capacity.push((index, rules.capacity(&view, period.id)?));
                    if rules.supports(Rule::FixedCost) {
                        costs.push(
                            rules.fixed_cost(&view, period.id)?
                                * temporal.period_weight(period.id)?,
                        );
                    }
                }
            }
        }
        ctx.add_expression(CAPACITY, capacity)?;
        ctx.add_expression("capacity_costs", [(Index::Scalar, Expr::sum(costs))])?;
        ctx.append(COST_COMPONENTS, "capacity_costs")
    }

    fn results_exporter(&self) -> Option<&dyn ResultsExporter> {
        Some(self)
    }
}

impl ResultsExporter for CapacityModule {
    fn export_results(
        &self,
        view: &ModelView<'_>,
        solution: &Solution,
    ) -> Result<Vec<ResultRecord>, Error> {
        view.formulation()
            .expression_members(CAPACITY)?
            .iter()
            .map(|(index, expr)| {
                Ok(ResultRecord::new(
                    "project_capacity",
                    index.clone(),
                    "capacity_mw",
                    expr.evaluate(solution.primal())?,
                ))
            })
            .collect()
    }
}

/// Capacity given as an input, per period.
pub struct Specified;

impl TypeBehavior for Specified {
    fn tag(&self) -> &str {
        "specified"
    }

    fn rules(&self) -> BTreeSet<Rule> {
        BTreeSet::from([Rule::Capacity, Rule::FixedCost])
    }
}

impl CapacityType for Specified {
    fn capacity(
        &self,
        view: &ModelView<'_>,
        resource: &Resource,
        period: u64,
    ) -> Result<Expr, Error> {
        let index = Index::resource_period(&resource.id, period);
        Ok(Expr::number(view.parameters().get(SPECIFIED_CAPACITY, &index)?))
    }

    fn fixed_cost(
        &self,
        view: &ModelView<'_>,
        resource: &Resource,
        period: u64,
    ) -> Result<Expr, Error> {
        let index = Index::resource_period(&resource.id, period);
        let cost = view.parameters().get_or(FIXED_COST, &index, 0.0);
        Ok(self.capacity(view, resource, period)? * cost)
    }
}

/// Capacity built by the model.  Capacity built in a period stays
/// available in every later period the resource is operational in.
pub struct NewBuild;

impl TypeBehavior for NewBuild {
    fn tag(&self) -> &str {
        "new_build"
    }

    fn rules(&self) -> BTreeSet<Rule> {
        BTreeSet::from([Rule::Capacity, Rule::FixedCost])
    }

    fn declare_components(
        &self,
        ctx: &mut BuildContext<'_>,
        resources: &[&Resource],
    ) -> Result<(), Error> {
        let temporal = ctx.temporal();
        let parameters = ctx.parameters();
        let indices = resources
            .iter()
            .flat_map(|r| {
                temporal
                    .periods()
                    .filter(|p| r.is_operational_in(p.id))
                    .map(|p| Index::resource_period(&r.id, p.id))
            })
            .collect::<Vec<_>>();
        ctx.add_variable(Variable::new(BUILD, Domain::NonNegativeReals, indices.clone()))?;

        let mut limits = vec![];
        for index in indices {
            if let Ok(limit) = parameters.get(MAX_NEW_BUILD, &index) {
                let build = ctx.variable(BUILD, index.clone())?;
                limits.push((index, Constraint::less_equal(build, Expr::number(limit))));
            }
        }
        ctx.add_constraint("max_build_mw", limits)
    }
}

impl CapacityType for NewBuild {
    fn capacity(
        &self,
        view: &ModelView<'_>,
        resource: &Resource,
        period: u64,
    ) -> Result<Expr, Error> {
        let vintages = view
            .temporal()
            .periods()
            .filter(|p| p.id <= period && resource.is_operational_in(p.id))
            .map(|p| view.variable(BUILD, Index::resource_period(&resource.id, p.id)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Expr::sum(vintages))
    }

    fn fixed_cost(
        &self,
        view: &ModelView<'_>,
        resource: &Resource,
        period: u64,
    ) -> Result<Expr, Error> {
        let index = Index::resource_period(&resource.id, period);
        let cost = view.parameters().get_or(NEW_BUILD_COST, &index, 0.0);
        Ok(self.capacity(view, resource, period)? * cost)
    }
}
