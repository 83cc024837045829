// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Built-in feature modules and the type behaviors they supply.

mod availability;
mod capacity;
mod carbon_cap;
mod load_balance;
mod objective;
mod operations;

pub use availability::{AvailabilityModule, Exogenous, AVAILABLE_CAPACITY};
pub use capacity::{CapacityModule, NewBuild, Specified, CAPACITY};
pub use carbon_cap::{CarbonCapModule, EmissionsIntensity, CARBON_CAP_ZONE};
pub use load_balance::{LoadBalanceModule, MEET_LOAD};
pub use objective::ObjectiveModule;
pub use operations::{Dispatchable, MustRun, OperationsModule, POWER_PROVISION};

use crate::{Error, ModuleCatalog, Resource, TemporalHierarchy};

/// Contributors to the production side of the load balance, per
/// `[zone, timepoint]`.
pub const LOAD_BALANCE_PRODUCTION: &str = "load_balance_production_components";

/// Contributors to the consumption side of the load balance, per
/// `[zone, timepoint]`.
pub const LOAD_BALANCE_CONSUMPTION: &str = "load_balance_consumption_components";

/// Scalar cost terms, summed into the objective.
pub const COST_COMPONENTS: &str = "total_cost_components";

/// Adds the built-in modules to a catalog, in canonical order.
pub(crate) fn register_standard(catalog: &mut ModuleCatalog) {
    catalog.push(None, || Box::new(LoadBalanceModule::default()));
    catalog.push(None, || Box::new(CapacityModule));
    catalog.push(None, || Box::new(AvailabilityModule));
    catalog.push(None, || Box::new(OperationsModule));
    catalog.push(Some("carbon_cap"), || Box::new(CarbonCapModule));
    catalog.push(None, || Box::new(ObjectiveModule));
}

/// Returns the timepoints of the build that fall in a period the resource
/// is operational in.
pub(crate) fn operational_timepoints(
    temporal: &TemporalHierarchy,
    resource: &Resource,
) -> Result<Vec<u64>, Error> {
    let mut timepoints = vec![];
    for timepoint in temporal.timepoints() {
        if resource.is_operational_in(temporal.period_of(timepoint.id)?) {
            timepoints.push(timepoint.id);
        }
    }
    Ok(timepoints)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::ScenarioBuilder;
    use crate::{
        BuildConfig, Index, ModelBuilder, Resource, ResultRecord, Solution, TypeAxis, VarRef,
        LOAD_ZONE,
    };

    fn single_coal_plant() -> ScenarioBuilder {
        ScenarioBuilder::single_timepoint(2.0, 365.0, 10.0, 0.5)
            .resource_with("coal", "specified", "must_run")
            .parameter(
                "specified_capacity_mw",
                Index::resource_period("coal", 2030),
                1.0,
            )
            .parameter("variable_om_cost_per_mwh", Index::resource("coal"), 3.0)
            .parameter("load_mw", Index::zone_timepoint("north", 1), 1.0)
    }

    fn build(
        scenario: &ScenarioBuilder,
        config: BuildConfig,
    ) -> Result<crate::AssembledModel, Error> {
        ModelBuilder::from_catalog(&ModuleCatalog::standard(), config)?
            .with_parameters(scenario.parameters())
            .build(&scenario.temporal_inputs(), scenario.resources())
    }

    #[test]
    fn test_standard_build() -> Result<(), Error> {
        let model = build(&single_coal_plant(), BuildConfig::default())?;
        assert_eq!(
            model.load_order().names(),
            [
                "project.capacity",
                "project.availability",
                "project.operations",
                "load_balance",
                "objective"
            ]
        );
        assert_eq!(
            model.dynamic().contributors(LOAD_BALANCE_PRODUCTION)?,
            ["power_production_in_zone", "unserved_energy_mw"]
        );
        assert_eq!(
            model.dynamic().contributors(COST_COMPONENTS)?,
            ["capacity_costs", "variable_om_costs", "load_balance_penalty_costs"]
        );

        let at = Index::zone_timepoint("north", 1);
        assert_eq!(
            model.formulation().constraint(MEET_LOAD)?[&at].to_string(),
            "1.0 + unserved_energy_mw[north,1] == 1.0 + overgeneration_mw[north,1]"
        );

        let mut solution = Solution::new();
        solution
            .set_primal(VarRef::new("unserved_energy_mw", at.clone()), 0.0)
            .set_primal(VarRef::new("overgeneration_mw", at.clone()), 0.0)
            .set_dual(MEET_LOAD, at.clone(), 7300.0);

        // 3 $/MWh * 1 MW, weighted by 2 h * 365 * 10 years * 0.5.
        assert_eq!(model.objective_value(&solution)?, 10950.0);

        assert_eq!(
            model.export_results(&solution)?,
            [
                ResultRecord::new(
                    "project_capacity",
                    Index::resource_period("coal", 2030),
                    "capacity_mw",
                    1.0
                ),
                ResultRecord::new(
                    "project_operations",
                    Index::resource_timepoint("coal", 1),
                    "power_mw",
                    1.0
                ),
                ResultRecord::new("objective", Index::Scalar, "total_cost", 10950.0),
            ]
        );
        assert_eq!(
            model.export_duals(&solution)?,
            [ResultRecord::new(
                "load_balance",
                at,
                "marginal_price_per_mwh",
                2.0
            )]
        );

        Ok(())
    }

    #[test]
    fn test_unserved_energy_bound() -> Result<(), Error> {
        let scenario =
            single_coal_plant().parameter("max_unserved_energy_mw", Index::Scalar, 5.0);
        let model = build(&scenario, BuildConfig::default())?;
        let unserved = model
            .formulation()
            .variables()
            .find(|v| v.name == "unserved_energy_mw")
            .map(|v| (v.lower, v.upper));
        assert_eq!(unserved, Some((None, Some(5.0))));

        Ok(())
    }

    #[test]
    fn test_same_config_same_model() -> Result<(), Error> {
        let scenario = single_coal_plant();
        let first = build(&scenario, BuildConfig::default())?;
        let second = build(&scenario, BuildConfig::default())?;
        assert_eq!(first.load_order(), second.load_order());
        assert_eq!(
            format!("{:?}", first.formulation()),
            format!("{:?}", second.formulation())
        );
        Ok(())
    }

    #[test]
    fn test_dispatchable_ramp() -> Result<(), Error> {
        let scenario = ScenarioBuilder::single_horizon(3)
            .resource_with("gas", "specified", "dispatchable")
            .parameter(
                "specified_capacity_mw",
                Index::resource_period("gas", 2030),
                10.0,
            )
            .parameter("ramp_limit_mw", Index::resource("gas"), 2.0);
        let model = build(&scenario, BuildConfig::default())?;
        let formulation = model.formulation();

        assert_eq!(
            formulation.constraint("dispatch_max_power")?[&Index::resource_timepoint("gas", 2)]
                .to_string(),
            "dispatch_power_mw[gas,2] <= 10.0"
        );
        let ramp_up = formulation.constraint("dispatch_ramp_up")?;
        assert_eq!(ramp_up.len(), 3);
        // The horizon is circular.
        assert_eq!(
            ramp_up[&Index::resource_timepoint("gas", 1)].to_string(),
            "dispatch_power_mw[gas,1] - dispatch_power_mw[gas,3] <= 2.0"
        );
        assert_eq!(
            formulation.constraint("dispatch_ramp_down")?[&Index::resource_timepoint("gas", 3)]
                .to_string(),
            "dispatch_power_mw[gas,2] - dispatch_power_mw[gas,3] <= 2.0"
        );
        assert_eq!(
            formulation
                .expression(POWER_PROVISION, &Index::resource_timepoint("gas", 1))?
                .to_string(),
            "dispatch_power_mw[gas,1]"
        );

        Ok(())
    }

    #[test]
    fn test_carbon_cap() -> Result<(), Error> {
        let scenario = single_coal_plant()
            .resource(
                Resource::new("lignite")
                    .with_type(TypeAxis::Capacity, "specified")
                    .with_type(TypeAxis::Operational, "must_run")
                    .with_type(TypeAxis::Availability, "exogenous")
                    .with_type(TypeAxis::Compliance, "emissions_intensity")
                    .with_zone(LOAD_ZONE, "north")
                    .with_zone(CARBON_CAP_ZONE, "ca"),
            )
            .parameter(
                "specified_capacity_mw",
                Index::resource_period("lignite", 2030),
                1.0,
            )
            .parameter("carbon_intensity_t_per_mwh", Index::resource("lignite"), 0.5)
            .parameter("carbon_cap_target_tonnes", Index::zone_period("ca", 2030), 1000.0);

        let model = build(&scenario, BuildConfig::default())?;
        assert!(!model.formulation().contains("carbon_cap"));

        let config = BuildConfig {
            features: vec!["carbon_cap".into()],
            ..Default::default()
        };
        let model = build(&scenario, config)?;
        assert_eq!(
            model.load_order().names(),
            [
                "project.capacity",
                "project.availability",
                "project.operations",
                "load_balance",
                "policy.carbon_cap",
                "objective"
            ]
        );
        // 1 MW * 0.5 t/MWh, over 2 h * 365.
        assert_eq!(
            model.formulation().constraint("carbon_cap")?[&Index::zone_period("ca", 2030)]
                .to_string(),
            "365.0 <= 1000.0"
        );

        Ok(())
    }

    #[test]
    fn test_missing_capacity_input() {
        let scenario = ScenarioBuilder::single_timepoint(1.0, 1.0, 1.0, 1.0)
            .resource_with("coal", "specified", "must_run");
        assert!(build(&scenario, BuildConfig::default()).is_err_and(|e| e
            == Error::not_found("Parameter 'specified_capacity_mw' not found.")));
    }
}
