// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Caps the carbon emissions of each carbon cap zone in each period.

use std::collections::BTreeSet;

use super::POWER_PROVISION;
use crate::{
    BuildContext, ComplianceType, Constraint, DualsExporter, Error, Expr, Index, ModelView,
    Module, Resource, ResultRecord, Rule, Solution, TemporalScope, TypeAxis, TypeBehavior,
    TypeModule,
};

/// The zone membership service for carbon caps.
pub const CARBON_CAP_ZONE: &str = "carbon_cap_zone";

const CARBON_CAP: &str = "carbon_cap";
const TARGET: &str = "carbon_cap_target_tonnes";
const INTENSITY: &str = "carbon_intensity_t_per_mwh";

/// Limits the emissions of the resources in each carbon cap zone, in every
/// period with a target.
///
/// Resources without a compliance type, or without a carbon cap zone, don't
/// count towards any cap.
pub struct CarbonCapModule;

impl Module for CarbonCapModule {
    fn name(&self) -> &str {
        "policy.carbon_cap"
    }

    fn requires(&self) -> Vec<&str> {
        vec!["project.operations"]
    }

    fn type_behaviors(&self) -> Vec<TypeModule> {
        vec![TypeModule::compliance(EmissionsIntensity)]
    }

    fn declare_components(&self, ctx: &mut BuildContext<'_>) -> Result<(), Error> {
        ctx.declare_type_components(TypeAxis::Compliance)?;

        let temporal = ctx.temporal();
        let types = ctx.types();
        let Ok(targets) = ctx.parameters().members(TARGET) else {
            tracing::warn!("Carbon cap module loaded without any '{}' parameter.", TARGET);
            return Ok(());
        };

        let mut emissions = vec![];
        let mut caps = vec![];
        {
            let view = ctx.view();
            for zone in types.zones(CARBON_CAP_ZONE) {
                for period in temporal.periods() {
                    let index = Index::zone_period(zone, period.id);
                    let Some(target) = targets.get(&index) else {
                        continue;
                    };
                    let mut terms = vec![];
                    for resource in types
                        .resources_in_zone(CARBON_CAP_ZONE, zone)
                        .filter(|r| r.type_tag(TypeAxis::Compliance).is_some())
                        .filter(|r| r.is_operational_in(period.id))
                    {
                        let rules = types.rule_set(resource, TypeAxis::Compliance)?;
                        for tp in temporal.timepoints_in(TemporalScope::Period(period.id))? {
                            let timepoint = temporal.timepoint(tp)?;
                            let horizon = temporal.horizon(timepoint.horizon)?;
                            terms.push(
                                rules.compliance_contribution(&view, tp)?
                                    * (timepoint.duration_hours * horizon.weight),
                            );
                        }
                    }
                    let total = Expr::sum(terms);
                    caps.push((
                        index.clone(),
                        Constraint::less_equal(total.clone(), Expr::number(*target)),
                    ));
                    emissions.push((index, total));
                }
            }
        }
        ctx.add_expression("carbon_emissions_tonnes", emissions)?;
        ctx.add_constraint(CARBON_CAP, caps)
    }

    fn duals_exporter(&self) -> Option<&dyn DualsExporter> {
        Some(self)
    }
}

impl DualsExporter for CarbonCapModule {
    fn export_duals(
        &self,
        view: &ModelView<'_>,
        solution: &Solution,
    ) -> Result<Vec<ResultRecord>, Error> {
        Ok(view
            .formulation()
            .constraint(CARBON_CAP)?
            .keys()
            .filter_map(|index| {
                solution.dual(CARBON_CAP, index).map(|dual| {
                    ResultRecord::new("carbon_cap", index.clone(), "carbon_price_per_tonne", dual)
                })
            })
            .collect())
    }
}

/// Emits a fixed amount of carbon per MWh of power provided.
pub struct EmissionsIntensity;

impl TypeBehavior for EmissionsIntensity {
    fn tag(&self) -> &str {
        "emissions_intensity"
    }

    fn rules(&self) -> BTreeSet<Rule> {
        BTreeSet::from([Rule::ComplianceContribution])
    }
}

impl ComplianceType for EmissionsIntensity {
    fn compliance_contribution(
        &self,
        view: &ModelView<'_>,
        resource: &Resource,
        timepoint: u64,
    ) -> Result<Expr, Error> {
        let intensity = view
            .parameters()
            .get(INTENSITY, &Index::resource(&resource.id))?;
        let power = view
            .formulation()
            .expression(POWER_PROVISION, &Index::resource_timepoint(&resource.id, timepoint))?;
        Ok(power.clone() * intensity)
    }
}
