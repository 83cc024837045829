// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Resource operations, and the operational types `must_run` and
//! `dispatchable`.

use std::collections::{BTreeMap, BTreeSet};

use super::{
    operational_timepoints, AVAILABLE_CAPACITY, COST_COMPONENTS, LOAD_BALANCE_PRODUCTION,
};
use crate::{
    BuildContext, Constraint, Domain, Error, Expr, Index, ModelView, Module, OperationalType,
    Resource, ResultRecord, ResultsExporter, Rule, Solution, TypeAxis, TypeBehavior, TypeModule,
    Variable, LOAD_ZONE,
};

/// Power provided by each resource, per `[resource, timepoint]`.
pub const POWER_PROVISION: &str = "power_provision_mw";

const PRODUCTION_IN_ZONE: &str = "power_production_in_zone";
const VARIABLE_COSTS: &str = "variable_om_costs";
const VARIABLE_OM: &str = "variable_om_cost_per_mwh";
const RAMP_LIMIT: &str = "ramp_limit_mw";
const DISPATCH: &str = "dispatch_power_mw";

/// Declares the power provision of every resource, its contribution to the
/// load balance of its zone, and the weighted variable costs.
pub struct OperationsModule;

impl Module for OperationsModule {
    fn name(&self) -> &str {
        "project.operations"
    }

    fn requires(&self) -> Vec<&str> {
        vec!["project.capacity", "project.availability"]
    }

    fn produces(&self) -> Vec<&str> {
        vec![LOAD_BALANCE_PRODUCTION, COST_COMPONENTS]
    }

    fn type_behaviors(&self) -> Vec<TypeModule> {
        vec![
            TypeModule::operational(MustRun),
            TypeModule::operational(Dispatchable),
        ]
    }

    fn required_axes(&self) -> Vec<TypeAxis> {
        vec![TypeAxis::Operational]
    }

    fn declare_components(&self, ctx: &mut BuildContext<'_>) -> Result<(), Error> {
        ctx.declare_type_components(TypeAxis::Operational)?;
        for list in self.produces() {
            ctx.declare_list(list)?;
        }

        let temporal = ctx.temporal();
        let types = ctx.types();
        let mut provision = BTreeMap::new();
        let mut costs = vec![];
        {
            let view = ctx.view();
            for resource in types.resources() {
                let rules = types.rule_set(resource, TypeAxis::Operational)?;
                for tp in operational_timepoints(temporal, resource)? {
                    let power = rules.power_provision(&view, tp)?;
                    if rules.supports(Rule::VariableCost) {
                        costs.push(rules.variable_cost(&view, tp)? * temporal.weight(tp)?);
                    }
                    provision.insert(Index::resource_timepoint(&resource.id, tp), power);
                }
            }
        }

        let mut in_zone = vec![];
        for zone in types.zones(LOAD_ZONE) {
            for tp in temporal.timepoints() {
                let power = types
                    .resources_in_zone(LOAD_ZONE, zone)
                    .filter_map(|r| provision.get(&Index::resource_timepoint(&r.id, tp.id)))
                    .cloned();
                in_zone.push((Index::zone_timepoint(zone, tp.id), Expr::sum(power)));
            }
        }

        ctx.add_expression(POWER_PROVISION, provision)?;
        ctx.add_expression(PRODUCTION_IN_ZONE, in_zone)?;
        ctx.append(LOAD_BALANCE_PRODUCTION, PRODUCTION_IN_ZONE)?;
        ctx.add_expression(VARIABLE_COSTS, [(Index::Scalar, Expr::sum(costs))])?;
        ctx.append(COST_COMPONENTS, VARIABLE_COSTS)
    }

    fn results_exporter(&self) -> Option<&dyn ResultsExporter> {
        Some(self)
    }
}

impl ResultsExporter for OperationsModule {
    fn export_results(
        &self,
        view: &ModelView<'_>,
        solution: &Solution,
    ) -> Result<Vec<ResultRecord>, Error> {
        view.formulation()
            .expression_members(POWER_PROVISION)?
            .iter()
            .map(|(index, expr)| {
                Ok(ResultRecord::new(
                    "project_operations",
                    index.clone(),
                    "power_mw",
                    expr.evaluate(solution.primal())?,
                ))
            })
            .collect()
    }
}

fn available_capacity(view: &ModelView<'_>, resource: &Resource, tp: u64) -> Result<Expr, Error> {
    Ok(view
        .formulation()
        .expression(AVAILABLE_CAPACITY, &Index::resource_timepoint(&resource.id, tp))?
        .clone())
}

fn variable_om(view: &ModelView<'_>, resource: &Resource) -> f64 {
    view.parameters()
        .get_or(VARIABLE_OM, &Index::resource(&resource.id), 0.0)
}

/// Always produces all of its available capacity.
pub struct MustRun;

impl TypeBehavior for MustRun {
    fn tag(&self) -> &str {
        "must_run"
    }

    fn rules(&self) -> BTreeSet<Rule> {
        BTreeSet::from([
            Rule::PowerProvision,
            Rule::MinPower,
            Rule::MaxPower,
            Rule::VariableCost,
        ])
    }
}

impl OperationalType for MustRun {
    fn power_provision(
        &self,
        view: &ModelView<'_>,
        resource: &Resource,
        timepoint: u64,
    ) -> Result<Expr, Error> {
        available_capacity(view, resource, timepoint)
    }

    fn min_power(
        &self,
        view: &ModelView<'_>,
        resource: &Resource,
        timepoint: u64,
    ) -> Result<Expr, Error> {
        available_capacity(view, resource, timepoint)
    }

    fn max_power(
        &self,
        view: &ModelView<'_>,
        resource: &Resource,
        timepoint: u64,
    ) -> Result<Expr, Error> {
        available_capacity(view, resource, timepoint)
    }

    fn variable_cost(
        &self,
        view: &ModelView<'_>,
        resource: &Resource,
        timepoint: u64,
    ) -> Result<Expr, Error> {
        Ok(self.power_provision(view, resource, timepoint)? * variable_om(view, resource))
    }
}

/// Dispatched between zero and its available capacity, with optional ramp
/// limits between consecutive timepoints of a horizon.
pub struct Dispatchable;

impl TypeBehavior for Dispatchable {
    fn tag(&self) -> &str {
        "dispatchable"
    }

    fn rules(&self) -> BTreeSet<Rule> {
        BTreeSet::from([
            Rule::PowerProvision,
            Rule::MinPower,
            Rule::MaxPower,
            Rule::VariableCost,
        ])
    }

    fn declare_components(
        &self,
        ctx: &mut BuildContext<'_>,
        resources: &[&Resource],
    ) -> Result<(), Error> {
        let temporal = ctx.temporal();
        let mut indices = BTreeSet::new();
        for resource in resources {
            for tp in operational_timepoints(temporal, resource)? {
                indices.insert(Index::resource_timepoint(&resource.id, tp));
            }
        }
        ctx.add_variable(Variable::new(
            DISPATCH,
            Domain::NonNegativeReals,
            indices.iter().cloned(),
        ))?;

        let mut max_power = vec![];
        let mut ramp_up = vec![];
        let mut ramp_down = vec![];
        {
            let view = ctx.view();
            for index in &indices {
                let Index::ResourceTimepoint(id, tp) = index else {
                    continue;
                };
                let power = view.variable(DISPATCH, index.clone())?;
                let resource = view.types().resource(id)?;
                max_power.push((
                    index.clone(),
                    Constraint::less_equal(
                        power.clone(),
                        self.max_power(&view, resource, *tp)?,
                    ),
                ));

                let Ok(limit) = view.parameters().get(RAMP_LIMIT, &Index::resource(id)) else {
                    continue;
                };
                let Some(previous) = temporal.previous(*tp)? else {
                    continue;
                };
                let previous_index = Index::resource_timepoint(id, previous);
                if !indices.contains(&previous_index) {
                    continue;
                }
                let previous_power = view.variable(DISPATCH, previous_index)?;
                ramp_up.push((
                    index.clone(),
                    Constraint::less_equal(
                        power.clone() - previous_power.clone(),
                        Expr::number(limit),
                    ),
                ));
                ramp_down.push((
                    index.clone(),
                    Constraint::less_equal(previous_power - power, Expr::number(limit)),
                ));
            }
        }
        ctx.add_constraint("dispatch_max_power", max_power)?;
        ctx.add_constraint("dispatch_ramp_up", ramp_up)?;
        ctx.add_constraint("dispatch_ramp_down", ramp_down)
    }
}

impl OperationalType for Dispatchable {
    fn power_provision(
        &self,
        view: &ModelView<'_>,
        resource: &Resource,
        timepoint: u64,
    ) -> Result<Expr, Error> {
        view.variable(DISPATCH, Index::resource_timepoint(&resource.id, timepoint))
    }

    fn min_power(
        &self,
        _view: &ModelView<'_>,
        _resource: &Resource,
        _timepoint: u64,
    ) -> Result<Expr, Error> {
        Ok(Expr::number(0.0))
    }

    fn max_power(
        &self,
        view: &ModelView<'_>,
        resource: &Resource,
        timepoint: u64,
    ) -> Result<Expr, Error> {
        available_capacity(view, resource, timepoint)
    }

    fn variable_cost(
        &self,
        view: &ModelView<'_>,
        resource: &Resource,
        timepoint: u64,
    ) -> Result<Expr, Error> {
        Ok(self.power_provision(view, resource, timepoint)? * variable_om(view, resource))
    }
}
