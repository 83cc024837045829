// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! The model builder, which drives a build through its states, from
//! temporal data to a finished model.

mod assembled;
mod context;

pub use assembled::{AssembledModel, Solution, Solver, SolverStatus};
pub use context::{BuildContext, ModelView};

use std::collections::BTreeSet;

use crate::{
    resolve_order, BuildConfig, DynamicComponents, Error, Formulation, LoadOrder, Module,
    ModuleCatalog, Parameters, Resource, TemporalHierarchy, TemporalInputs, TypeAxis, TypeModule,
    TypeRegistry,
};

/// The state of a build.
///
/// A build only moves forward.  `Finalized` and `Failed` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuildState {
    Empty,
    TemporalLoaded,
    TypesResolved,
    ModulesOrdered,
    Declaring,
    Finalized,
    Failed,
}

/// Assembles a model from a set of modules, one step at a time.
///
/// Each step must be invoked in the state the previous step left the
/// builder in.  Any error moves the builder to [`BuildState::Failed`] and
/// discards everything built so far.
pub struct ModelBuilder {
    state: BuildState,
    config: BuildConfig,
    modules: Vec<Box<dyn Module>>,
    parameters: Parameters,
    temporal: Option<TemporalHierarchy>,
    types: TypeRegistry,
    load_order: Option<LoadOrder>,
    dynamic: DynamicComponents,
    formulation: Formulation,
}

/// Creation.
impl ModelBuilder {
    pub fn new(modules: Vec<Box<dyn Module>>, config: BuildConfig) -> Self {
        Self {
            state: BuildState::Empty,
            config,
            modules,
            parameters: Parameters::new(),
            temporal: None,
            types: TypeRegistry::new(),
            load_order: None,
            dynamic: DynamicComponents::new(),
            formulation: Formulation::new(),
        }
    }

    /// Creates a builder for the modules the configuration selects from the
    /// catalog.
    pub fn from_catalog(catalog: &ModuleCatalog, config: BuildConfig) -> Result<Self, Error> {
        let modules = catalog.select(&config)?;
        Ok(Self::new(modules, config))
    }

    /// Sets the numeric parameters handed to the modules' input hooks.
    pub fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn state(&self) -> BuildState {
        self.state
    }
}

/// Build steps.
impl ModelBuilder {
    /// Constructs the temporal hierarchy for the configured slice.
    pub fn load_temporal(&mut self, inputs: &TemporalInputs) -> Result<(), Error> {
        self.step(BuildState::Empty, BuildState::TemporalLoaded, |b| {
            let temporal =
                TemporalHierarchy::try_new(inputs, b.config.subproblem, b.config.stage)?;
            b.temporal = Some(temporal);
            Ok(())
        })
    }

    /// Registers the type behaviors of every module and checks that every
    /// resource resolves on every axis the modules require.
    pub fn resolve_types(
        &mut self,
        resources: impl IntoIterator<Item = Resource>,
    ) -> Result<(), Error> {
        self.step(BuildState::TemporalLoaded, BuildState::TypesResolved, |b| {
            for module in &b.modules {
                for behavior in module.type_behaviors() {
                    b.types.register_type(behavior)?;
                }
            }
            for axis in TypeAxis::ALL {
                let tags = b
                    .types
                    .behaviors()
                    .filter(|m| m.axis() == axis)
                    .map(TypeModule::tag)
                    .collect::<Vec<_>>();
                if !tags.is_empty() {
                    tracing::debug!("{} types: {}.", axis, tags.join(", "));
                }
            }
            b.types.add_resources(resources)?;
            let axes = b
                .modules
                .iter()
                .flat_map(|m| m.required_axes())
                .collect::<BTreeSet<_>>();
            b.types.validate(&axes)
        })
    }

    /// Computes the load order of the modules.
    pub fn order_modules(&mut self) -> Result<(), Error> {
        self.step(BuildState::TypesResolved, BuildState::ModulesOrdered, |b| {
            let load_order = resolve_order(&b.modules)?;
            let mut slots = std::mem::take(&mut b.modules)
                .into_iter()
                .map(Some)
                .collect::<Vec<_>>();
            b.modules = load_order
                .indices()
                .iter()
                .filter_map(|i| slots.get_mut(*i).and_then(Option::take))
                .collect();
            b.dynamic.set_schedule(load_order.schedule());
            b.load_order = Some(load_order);
            Ok(())
        })
    }

    /// Loads the inputs of every module, then invokes the declaration hook of
    /// every module, in load order.
    pub fn declare(&mut self) -> Result<(), Error> {
        self.step(BuildState::ModulesOrdered, BuildState::Declaring, |b| {
            b.state = BuildState::Declaring;
            for module in b.modules.iter_mut() {
                tracing::debug!("Loading inputs of module '{}'.", module.name());
                module.load_inputs(&b.parameters)?;
            }

            let temporal = b
                .temporal
                .as_ref()
                .ok_or_else(|| Error::internal("Temporal hierarchy missing while declaring."))?;
            for module in &b.modules {
                tracing::debug!("Declaring components of module '{}'.", module.name());
                let mut ctx = BuildContext::new(
                    module.name(),
                    temporal,
                    &b.types,
                    &b.parameters,
                    &mut b.dynamic,
                    &mut b.formulation,
                    b.config.allow_unused_types,
                );
                module.declare_components(&mut ctx)?;
            }
            Ok(())
        })
    }

    /// Freezes the dynamic lists and returns the finished model.
    pub fn finalize(&mut self) -> Result<AssembledModel, Error> {
        self.step(BuildState::Declaring, BuildState::Finalized, |b| {
            b.dynamic.freeze();
            let (temporal, load_order) = match (b.temporal.take(), b.load_order.take()) {
                (Some(temporal), Some(load_order)) => (temporal, load_order),
                _ => return Err(Error::internal("Build finalized without a load order.")),
            };
            if b.formulation.objective().is_none() {
                tracing::warn!("Model finalized without an objective.");
            }
            tracing::info!(
                "Model finalized: {} variables, {} expressions, {} constraints.",
                b.formulation.num_variables(),
                b.formulation.expressions().count(),
                b.formulation.num_constraints()
            );
            Ok(AssembledModel {
                formulation: std::mem::take(&mut b.formulation),
                dynamic: std::mem::take(&mut b.dynamic),
                load_order,
                temporal,
                types: std::mem::take(&mut b.types),
                parameters: std::mem::take(&mut b.parameters),
                modules: std::mem::take(&mut b.modules),
            })
        })
    }

    /// Runs every step of the build.
    pub fn build(
        mut self,
        inputs: &TemporalInputs,
        resources: impl IntoIterator<Item = Resource>,
    ) -> Result<AssembledModel, Error> {
        self.load_temporal(inputs)?;
        self.resolve_types(resources)?;
        self.order_modules()?;
        self.declare()?;
        self.finalize()
    }

    fn step<T>(
        &mut self,
        expected: BuildState,
        next: BuildState,
        f: impl FnOnce(&mut Self) -> Result<T, Error>,
    ) -> Result<T, Error> {
        if self.state != expected {
            let err = Error::invalid_state(format!(
                "Can't move to {next:?} from {:?}; expected {expected:?}.",
                self.state
            ));
            self.fail(&err);
            return Err(err);
        }
        match f(self) {
            Ok(value) => {
                tracing::info!("Build state: {:?} -> {:?}.", expected, next);
                self.state = next;
                Ok(value)
            }
            Err(err) => {
                self.fail(&err);
                Err(err)
            }
        }
    }

    fn fail(&mut self, err: &Error) {
        tracing::warn!("Build failed in state {:?}: {}", self.state, err);
        self.state = BuildState::Failed;
        self.formulation = Formulation::new();
        self.dynamic = DynamicComponents::new();
        self.load_order = None;
    }
}
