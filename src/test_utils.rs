// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! This module is only compiled when running unit tests and contains features
//! that are shared by the tests of all modules.
//!
//! - the `TestCapacity`, `TestOperational` and `TestAvailability` type
//!   behaviors, with configurable values and call counting.
//! - the `TestModule` type, a `Module` with configurable requirements, list
//!   wiring and declaration hook.
//! - the `ScenarioBuilder`, which can declaratively build temporal data,
//!   resources and parameters for use in tests.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::{
    AvailabilityType, BuildContext, CapacityType, Error, Expr, Formulation, Horizon, ModelView,
    Module, OperationalType, Parameters, Period, Resource, Rule, TemporalHierarchy,
    TemporalInputs, Timepoint, TypeAxis, TypeBehavior, TypeModule, TypeRegistry, LOAD_ZONE,
};

/// A capacity type with a fixed capacity.
pub(crate) struct TestCapacity {
    tag: String,
    capacity: f64,
}

impl TestCapacity {
    pub(crate) fn new(tag: &str, capacity: f64) -> Self {
        Self {
            tag: tag.to_string(),
            capacity,
        }
    }
}

impl TypeBehavior for TestCapacity {
    fn tag(&self) -> &str {
        &self.tag
    }

    fn rules(&self) -> BTreeSet<Rule> {
        BTreeSet::from([Rule::Capacity])
    }
}

impl CapacityType for TestCapacity {
    fn capacity(&self, _: &ModelView<'_>, _: &Resource, _: u64) -> Result<Expr, Error> {
        Ok(Expr::number(self.capacity))
    }
}

/// An operational type providing its derated capacity, and counting how
/// often any of its hooks or rules is invoked.
pub(crate) struct TestOperational {
    tag: String,
    calls: Arc<AtomicUsize>,
}

impl TestOperational {
    pub(crate) fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Returns a handle to the invocation counter.
    pub(crate) fn calls(&self) -> Arc<AtomicUsize> {
        self.calls.clone()
    }

    fn count(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

impl TypeBehavior for TestOperational {
    fn tag(&self) -> &str {
        &self.tag
    }

    fn rules(&self) -> BTreeSet<Rule> {
        BTreeSet::from([Rule::PowerProvision, Rule::VariableCost])
    }

    fn declare_components(
        &self,
        _ctx: &mut BuildContext<'_>,
        _resources: &[&Resource],
    ) -> Result<(), Error> {
        self.count();
        Ok(())
    }
}

impl OperationalType for TestOperational {
    fn power_provision(
        &self,
        view: &ModelView<'_>,
        resource: &Resource,
        timepoint: u64,
    ) -> Result<Expr, Error> {
        self.count();
        let period = view.temporal().period_of(timepoint)?;
        let capacity = view
            .rule_set(resource, TypeAxis::Capacity)?
            .capacity(view, period)?;
        let derate = match resource.type_tag(TypeAxis::Availability) {
            Some(_) => view
                .rule_set(resource, TypeAxis::Availability)?
                .availability_derate(view, timepoint)?,
            None => 1.0,
        };
        Ok(capacity * derate)
    }

    fn variable_cost(
        &self,
        view: &ModelView<'_>,
        resource: &Resource,
        timepoint: u64,
    ) -> Result<Expr, Error> {
        Ok(self.power_provision(view, resource, timepoint)?
            * view.parameters().get_or("variable_cost", &crate::Index::Scalar, 0.0))
    }
}

/// An availability type with a fixed derate.
pub(crate) struct TestAvailability {
    tag: String,
    derate: f64,
}

impl TestAvailability {
    pub(crate) fn new(tag: &str, derate: f64) -> Self {
        Self {
            tag: tag.to_string(),
            derate,
        }
    }
}

impl TypeBehavior for TestAvailability {
    fn tag(&self) -> &str {
        &self.tag
    }

    fn rules(&self) -> BTreeSet<Rule> {
        BTreeSet::from([Rule::AvailabilityDerate])
    }
}

impl AvailabilityType for TestAvailability {
    fn availability_derate(&self, _: &ModelView<'_>, _: &Resource, _: u64) -> Result<f64, Error> {
        Ok(self.derate)
    }
}

type DeclareHook = Box<dyn Fn(&mut BuildContext<'_>) -> Result<(), Error>>;

/// A module whose requirements, list wiring and declaration hook are set
/// by the test.
pub(crate) struct TestModule {
    name: String,
    requires: Vec<String>,
    produces: Vec<String>,
    consumes: Vec<String>,
    behaviors: Vec<TypeModule>,
    axes: Vec<TypeAxis>,
    declare: Option<DeclareHook>,
}

impl TestModule {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            requires: vec![],
            produces: vec![],
            consumes: vec![],
            behaviors: vec![],
            axes: vec![],
            declare: None,
        }
    }

    pub(crate) fn requires<const N: usize>(mut self, names: [&str; N]) -> Self {
        self.requires.extend(names.map(String::from));
        self
    }

    pub(crate) fn produces<const N: usize>(mut self, lists: [&str; N]) -> Self {
        self.produces.extend(lists.map(String::from));
        self
    }

    pub(crate) fn consumes<const N: usize>(mut self, lists: [&str; N]) -> Self {
        self.consumes.extend(lists.map(String::from));
        self
    }

    pub(crate) fn with_behavior(mut self, behavior: TypeModule) -> Self {
        self.behaviors.push(behavior);
        self
    }

    pub(crate) fn with_axes<const N: usize>(mut self, axes: [TypeAxis; N]) -> Self {
        self.axes.extend(axes);
        self
    }

    pub(crate) fn on_declare(
        mut self,
        hook: impl Fn(&mut BuildContext<'_>) -> Result<(), Error> + 'static,
    ) -> Self {
        self.declare = Some(Box::new(hook));
        self
    }
}

impl Module for TestModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn requires(&self) -> Vec<&str> {
        self.requires.iter().map(String::as_str).collect()
    }

    fn produces(&self) -> Vec<&str> {
        self.produces.iter().map(String::as_str).collect()
    }

    fn consumes(&self) -> Vec<&str> {
        self.consumes.iter().map(String::as_str).collect()
    }

    fn type_behaviors(&self) -> Vec<TypeModule> {
        self.behaviors.clone()
    }

    fn required_axes(&self) -> Vec<TypeAxis> {
        self.axes.clone()
    }

    fn declare_components(&self, ctx: &mut BuildContext<'_>) -> Result<(), Error> {
        match &self.declare {
            Some(hook) => hook(ctx),
            None => Ok(()),
        }
    }
}

/// The parts of a model under construction, for testing rules and hooks
/// without a builder.
pub(crate) struct ScenarioParts {
    pub(crate) temporal: TemporalHierarchy,
    pub(crate) types: TypeRegistry,
    pub(crate) parameters: Parameters,
    pub(crate) formulation: Formulation,
}

impl ScenarioParts {
    pub(crate) fn view(&self) -> ModelView<'_> {
        ModelView::new(
            &self.temporal,
            &self.types,
            &self.parameters,
            &self.formulation,
        )
    }
}

/// A builder for creating scenario data easily, for use in tests.
///
/// Resources added with [`resource_with`][ScenarioBuilder::resource_with]
/// are in load zone `north` and have availability type `exogenous`.
pub(crate) struct ScenarioBuilder {
    inputs: TemporalInputs,
    resources: Vec<Resource>,
    parameters: Parameters,
}

impl ScenarioBuilder {
    pub(crate) fn new() -> Self {
        Self {
            inputs: TemporalInputs::default(),
            resources: vec![],
            parameters: Parameters::new(),
        }
    }

    /// A scenario with period 2030, horizon 1 and timepoint 1.
    pub(crate) fn single_timepoint(
        duration_hours: f64,
        horizon_weight: f64,
        years_represented: f64,
        discount_factor: f64,
    ) -> Self {
        Self::new()
            .period(Period::new(2030, discount_factor, years_represented))
            .horizon(Horizon::new(1, 2030, horizon_weight))
            .timepoint(Timepoint::new(1, 1, duration_hours))
    }

    /// A scenario with one single-timepoint horizon per period.  Horizons
    /// and timepoints are numbered from 1, in period order, and all weights
    /// are 1.
    pub(crate) fn periods<const N: usize>(periods: [u64; N]) -> Self {
        let mut builder = Self::new();
        for (i, period) in periods.into_iter().enumerate() {
            let id = i as u64 + 1;
            builder = builder
                .period(Period::new(period, 1.0, 1.0))
                .horizon(Horizon::new(id, period, 1.0))
                .timepoint(Timepoint::new(id, id, 1.0));
        }
        builder
    }

    /// A scenario with period 2030 and a single horizon with the given
    /// number of one-hour timepoints, numbered from 1.
    pub(crate) fn single_horizon(timepoints: u64) -> Self {
        let mut builder = Self::new()
            .period(Period::new(2030, 1.0, 1.0))
            .horizon(Horizon::new(1, 2030, 1.0));
        for id in 1..=timepoints {
            builder = builder.timepoint(Timepoint::new(id, 1, 1.0));
        }
        builder
    }

    pub(crate) fn period(mut self, period: Period) -> Self {
        self.inputs.periods.push(period);
        self
    }

    pub(crate) fn horizon(mut self, horizon: Horizon) -> Self {
        self.inputs.horizons.push(horizon);
        self
    }

    pub(crate) fn timepoint(mut self, timepoint: Timepoint) -> Self {
        self.inputs.timepoints.push(timepoint);
        self
    }

    pub(crate) fn resource(mut self, resource: Resource) -> Self {
        self.resources.push(resource);
        self
    }

    /// Adds a resource in zone `north` with the given capacity and
    /// operational types, and availability type `exogenous`.
    pub(crate) fn resource_with(self, id: &str, capacity: &str, operational: &str) -> Self {
        self.resource(
            Resource::new(id)
                .with_type(TypeAxis::Capacity, capacity)
                .with_type(TypeAxis::Operational, operational)
                .with_type(TypeAxis::Availability, "exogenous")
                .with_zone(LOAD_ZONE, "north"),
        )
    }

    pub(crate) fn parameter(mut self, name: &str, index: crate::Index, value: f64) -> Self {
        self.parameters.insert(name, index, value);
        self
    }

    pub(crate) fn temporal_inputs(&self) -> TemporalInputs {
        self.inputs.clone()
    }

    pub(crate) fn resources(&self) -> Vec<Resource> {
        self.resources.clone()
    }

    pub(crate) fn parameters(&self) -> Parameters {
        self.parameters.clone()
    }

    /// Builds the parts of a model, with the resources registered against
    /// capacity type `specified` (100 MW), operational type `must_run` and
    /// availability type `exogenous` (no derate).
    pub(crate) fn build_parts(self) -> Result<ScenarioParts, Error> {
        let mut types = TypeRegistry::new();
        types.register_type(TypeModule::capacity(TestCapacity::new("specified", 100.0)))?;
        types.register_type(TypeModule::operational(TestOperational::new("must_run")))?;
        types.register_type(TypeModule::availability(TestAvailability::new(
            "exogenous",
            1.0,
        )))?;
        types.add_resources(self.resources)?;
        Ok(ScenarioParts {
            temporal: TemporalHierarchy::try_new(&self.inputs, 1, 1)?,
            types,
            parameters: self.parameters,
            formulation: Formulation::new(),
        })
    }
}
