// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Available capacity, and the availability type `exogenous`.

use std::collections::BTreeSet;

use super::{operational_timepoints, CAPACITY};
use crate::{
    AvailabilityType, BuildContext, Error, Index, ModelView, Module, Parameters, Resource, Rule,
    TypeAxis, TypeBehavior, TypeModule,
};

/// Capacity available for operations, per `[resource, timepoint]`.
pub const AVAILABLE_CAPACITY: &str = "available_capacity_mw";

const DERATE: &str = "availability_derate";

/// Declares the capacity of every resource that is available in each
/// timepoint, after derating.
pub struct AvailabilityModule;

impl Module for AvailabilityModule {
    fn name(&self) -> &str {
        "project.availability"
    }

    fn requires(&self) -> Vec<&str> {
        vec!["project.capacity"]
    }

    fn type_behaviors(&self) -> Vec<TypeModule> {
        vec![TypeModule::availability(Exogenous)]
    }

    fn required_axes(&self) -> Vec<TypeAxis> {
        vec![TypeAxis::Availability]
    }

    fn load_inputs(&mut self, parameters: &Parameters) -> Result<(), Error> {
        let Ok(derates) = parameters.members(DERATE) else {
            return Ok(());
        };
        for (index, derate) in derates {
            if !(0.0..=1.0).contains(derate) {
                return Err(Error::invalid_config(format!(
                    "Availability derate {derate} for {index} is outside [0, 1]."
                )));
            }
        }
        Ok(())
    }

    fn declare_components(&self, ctx: &mut BuildContext<'_>) -> Result<(), Error> {
        ctx.declare_type_components(TypeAxis::Availability)?;

        let temporal = ctx.temporal();
        let types = ctx.types();
        let mut available = vec![];
        {
            let view = ctx.view();
            for resource in types.resources() {
                let rules = types.rule_set(resource, TypeAxis::Availability)?;
                for tp in operational_timepoints(temporal, resource)? {
                    let period = temporal.period_of(tp)?;
                    let capacity = view
                        .formulation()
                        .expression(CAPACITY, &Index::resource_period(&resource.id, period))?
                        .clone();
                    available.push((
                        Index::resource_timepoint(&resource.id, tp),
                        capacity * rules.availability_derate(&view, tp)?,
                    ));
                }
            }
        }
        ctx.add_expression(AVAILABLE_CAPACITY, available)
    }
}

/// Availability given as an input derate per timepoint, defaulting to fully
/// available.
pub struct Exogenous;

impl TypeBehavior for Exogenous {
    fn tag(&self) -> &str {
        "exogenous"
    }

    fn rules(&self) -> BTreeSet<Rule> {
        BTreeSet::from([Rule::AvailabilityDerate])
    }
}

impl AvailabilityType for Exogenous {
    fn availability_derate(
        &self,
        view: &ModelView<'_>,
        resource: &Resource,
        timepoint: u64,
    ) -> Result<f64, Error> {
        let index = Index::resource_timepoint(&resource.id, timepoint);
        Ok(view.parameters().get_or(DERATE, &index, 1.0))
    }
}
