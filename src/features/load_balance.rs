// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Balances production and consumption in every load zone and timepoint.

use std::collections::BTreeSet;

use super::{COST_COMPONENTS, LOAD_BALANCE_CONSUMPTION, LOAD_BALANCE_PRODUCTION};
use crate::{
    BuildContext, Constraint, Domain, DualsExporter, Error, Expr, Index, ModelView, Module,
    Parameters, ResultRecord, Solution, Variable, LOAD_ZONE,
};

/// The load balance constraint, per `[zone, timepoint]`.
pub const MEET_LOAD: &str = "meet_load";

const LOAD: &str = "load_mw";
const UNSERVED_ENERGY_PENALTY: &str = "unserved_energy_penalty_per_mwh";
const OVERGENERATION_PENALTY: &str = "overgeneration_penalty_per_mwh";
const MAX_UNSERVED_ENERGY: &str = "max_unserved_energy_mw";
const DEFAULT_PENALTY: f64 = 99_999.0;

/// Declares the load balance lists, the static load, slack variables for
/// unserved energy and overgeneration, and the `meet_load` constraint.
///
/// Unserved energy is unbounded unless a scalar `max_unserved_energy_mw`
/// parameter caps it.
pub struct LoadBalanceModule {
    unserved_energy_penalty: f64,
    overgeneration_penalty: f64,
    max_unserved_energy: Option<f64>,
}

impl Default for LoadBalanceModule {
    fn default() -> Self {
        Self {
            unserved_energy_penalty: DEFAULT_PENALTY,
            overgeneration_penalty: DEFAULT_PENALTY,
            max_unserved_energy: None,
        }
    }
}

impl LoadBalanceModule {
    fn non_negative(name: &str, value: f64) -> Result<f64, Error> {
        if !value.is_finite() || value < 0.0 {
            return Err(Error::invalid_config(format!(
                "Parameter '{name}' must be non-negative, got {value}."
            )));
        }
        Ok(value)
    }

    fn penalty(parameters: &Parameters, name: &str) -> Result<f64, Error> {
        Self::non_negative(name, parameters.get_or(name, &Index::Scalar, DEFAULT_PENALTY))
    }

    /// The zones of the resources, and the zones with a load.
    fn zones(ctx: &BuildContext<'_>) -> BTreeSet<String> {
        let mut zones = ctx
            .types()
            .zones(LOAD_ZONE)
            .into_iter()
            .map(String::from)
            .collect::<BTreeSet<_>>();
        if let Ok(load) = ctx.parameters().members(LOAD) {
            zones.extend(load.keys().filter_map(|index| match index {
                Index::ZoneTimepoint(zone, _) => Some(zone.clone()),
                _ => None,
            }));
        }
        zones
    }
}

impl Module for LoadBalanceModule {
    fn name(&self) -> &str {
        "load_balance"
    }

    fn produces(&self) -> Vec<&str> {
        vec![LOAD_BALANCE_PRODUCTION, LOAD_BALANCE_CONSUMPTION, COST_COMPONENTS]
    }

    fn consumes(&self) -> Vec<&str> {
        vec![LOAD_BALANCE_PRODUCTION, LOAD_BALANCE_CONSUMPTION]
    }

    fn load_inputs(&mut self, parameters: &Parameters) -> Result<(), Error> {
        self.unserved_energy_penalty = Self::penalty(parameters, UNSERVED_ENERGY_PENALTY)?;
        self.overgeneration_penalty = Self::penalty(parameters, OVERGENERATION_PENALTY)?;
        self.max_unserved_energy = parameters
            .get(MAX_UNSERVED_ENERGY, &Index::Scalar)
            .ok()
            .map(|value| Self::non_negative(MAX_UNSERVED_ENERGY, value))
            .transpose()?;
        Ok(())
    }

    fn declare_components(&self, ctx: &mut BuildContext<'_>) -> Result<(), Error> {
        for list in self.produces() {
            ctx.declare_list(list)?;
        }

        let indices = Self::zones(ctx)
            .into_iter()
            .flat_map(|zone| {
                ctx.temporal()
                    .timepoints()
                    .map(move |tp| Index::zone_timepoint(zone.clone(), tp.id))
            })
            .collect::<Vec<_>>();

        let parameters = ctx.parameters();
        ctx.add_expression(
            "static_load_mw",
            indices
                .iter()
                .map(|i| (i.clone(), Expr::number(parameters.get_or(LOAD, i, 0.0)))),
        )?;
        ctx.add_variable(
            Variable::new(
                "unserved_energy_mw",
                Domain::NonNegativeReals,
                indices.iter().cloned(),
            )
            .with_bounds(None, self.max_unserved_energy),
        )?;
        ctx.add_variable(Variable::new(
            "overgeneration_mw",
            Domain::NonNegativeReals,
            indices.iter().cloned(),
        ))?;
        ctx.append(LOAD_BALANCE_PRODUCTION, "unserved_energy_mw")?;
        ctx.append(LOAD_BALANCE_CONSUMPTION, "static_load_mw")?;
        ctx.append(LOAD_BALANCE_CONSUMPTION, "overgeneration_mw")?;

        let mut meet_load = vec![];
        let mut penalties = vec![];
        for index in &indices {
            let production = ctx.sum_over(LOAD_BALANCE_PRODUCTION, index)?;
            let consumption = ctx.sum_over(LOAD_BALANCE_CONSUMPTION, index)?;
            meet_load.push((index.clone(), Constraint::equal(production, consumption)));

            if let Index::ZoneTimepoint(_, tp) = index {
                let weight = ctx.temporal().weight(*tp)?;
                penalties.push(
                    ctx.variable("unserved_energy_mw", index.clone())?
                        * (weight * self.unserved_energy_penalty),
                );
                penalties.push(
                    ctx.variable("overgeneration_mw", index.clone())?
                        * (weight * self.overgeneration_penalty),
                );
            }
        }
        ctx.add_constraint(MEET_LOAD, meet_load)?;
        ctx.add_expression(
            "load_balance_penalty_costs",
            [(Index::Scalar, Expr::sum(penalties))],
        )?;
        ctx.append(COST_COMPONENTS, "load_balance_penalty_costs")
    }

    fn duals_exporter(&self) -> Option<&dyn DualsExporter> {
        Some(self)
    }
}

/// Exports the marginal price of energy, as the dual of `meet_load`
/// divided by the weight of the timepoint.
impl DualsExporter for LoadBalanceModule {
    fn export_duals(
        &self,
        view: &ModelView<'_>,
        solution: &Solution,
    ) -> Result<Vec<ResultRecord>, Error> {
        let mut records = vec![];
        for index in view.formulation().constraint(MEET_LOAD)?.keys() {
            let (Some(dual), Index::ZoneTimepoint(_, tp)) = (solution.dual(MEET_LOAD, index), index)
            else {
                continue;
            };
            records.push(ResultRecord::new(
                "load_balance",
                index.clone(),
                "marginal_price_per_mwh",
                dual / view.temporal().weight(*tp)?,
            ));
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_penalty_validation() {
        let mut module = LoadBalanceModule::default();
        assert!(module.load_inputs(&Parameters::new()).is_ok());
        assert_eq!(module.unserved_energy_penalty, DEFAULT_PENALTY);

        let parameters = Parameters::new()
            .with(UNSERVED_ENERGY_PENALTY, Index::Scalar, 500.0)
            .with(OVERGENERATION_PENALTY, Index::Scalar, -1.0);
        assert!(module.load_inputs(&parameters).is_err_and(|e| e
            == Error::invalid_config(
                "Parameter 'overgeneration_penalty_per_mwh' must be non-negative, got -1."
            )));
        assert_eq!(module.unserved_energy_penalty, 500.0);
    }

    #[test]
    fn test_max_unserved_energy() -> Result<(), Error> {
        let mut module = LoadBalanceModule::default();
        module.load_inputs(&Parameters::new())?;
        assert_eq!(module.max_unserved_energy, None);

        module.load_inputs(&Parameters::new().with(MAX_UNSERVED_ENERGY, Index::Scalar, 5.0))?;
        assert_eq!(module.max_unserved_energy, Some(5.0));

        let parameters = Parameters::new().with(MAX_UNSERVED_ENERGY, Index::Scalar, -5.0);
        assert!(module.load_inputs(&parameters).is_err_and(|e| e
            == Error::invalid_config(
                "Parameter 'max_unserved_energy_mw' must be non-negative, got -5."
            )));

        Ok(())
    }
}
