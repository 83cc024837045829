// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

/*!
# Power Model Builder

This is a library for assembling a single optimization model of an electric
power system from independently authored feature modules.

Each feature module contributes decision variables, expressions and
constraints, and registers entries in shared, named lists (for example "all
cost terms" or "all load-serving production terms") that other modules sum
over.  The modules don't know about each other; the builder runs them in an
order derived from what they require, produce and consume.

## The `Module` trait

Feature modules implement the [`Module`] trait.  A module names the modules
or dynamic lists it requires, the dynamic lists it produces and consumes, the
type behaviors it supplies, and the typing axes every resource has to
resolve on.  All of its hooks are optional.

Modules are usually selected from a [`ModuleCatalog`] according to a
[`BuildConfig`].  [`ModuleCatalog::standard`] contains the built-in modules
of the [`features`] module.

## Building a model

[`ModelBuilder`] drives a build through its states:

- [`load_temporal`][ModelBuilder::load_temporal] constructs the
  [`TemporalHierarchy`] of periods, horizons and timepoints for one
  `(subproblem, stage)` slice.
- [`resolve_types`][ModelBuilder::resolve_types] registers the type behaviors
  of the modules in a [`TypeRegistry`] and checks that every resource
  resolves on every required axis.
- [`order_modules`][ModelBuilder::order_modules] computes a deterministic
  load order with [`resolve_order`].
- [`declare`][ModelBuilder::declare] loads the inputs of every module and
  invokes the declaration hooks in load order, each with a [`BuildContext`].
- [`finalize`][ModelBuilder::finalize] freezes the dynamic lists and returns
  the [`AssembledModel`], ready to be handed to a [`Solver`].

Any error moves the builder to [`BuildState::Failed`] and discards the
partially built model.  [`build`][ModelBuilder::build] runs all steps.

## Type dispatch

A [`Resource`] carries one type tag per [`TypeAxis`].  Modules never branch
on a tag.  They resolve the resource through the [`TypeRegistry`] and invoke
rules on the returned [`RuleSet`], which fails with
[`ErrorKind::UnsupportedOperation`] for rules the behavior doesn't implement.

## Dynamic lists

[`DynamicComponents`] holds the append-only lists.  Summing over a list
whose producer runs later in the load order fails with
[`ErrorKind::PrematureAggregation`], and so does appending to a list that
was already summed over, by any module.  Appending to a list after the model
was finalized fails with [`ErrorKind::RegistryFrozen`].
*/

mod builder;
pub use builder::{
    AssembledModel, BuildContext, BuildState, ModelBuilder, ModelView, Solution, Solver,
    SolverStatus,
};

mod config;
pub use config::BuildConfig;

mod dispatch;
pub use dispatch::{
    AvailabilityType, CapacityType, ComplianceType, OperationalType, Rule, RuleSet,
    TypeBehavior, TypeModule, TypeRegistry,
};

mod dynamic;
pub use dynamic::DynamicComponents;

mod error;
pub use error::{Error, ErrorKind};

pub mod features;

mod formulation;
pub use formulation::{
    Constraint, Domain, Expr, Formulation, Index, LinearTerms, Objective, ObjectiveSense, Sense,
    VarRef, Variable,
};

mod module;
pub use module::{
    Capabilities, DualsExporter, Module, ModuleCatalog, ResultRecord, ResultsExporter,
};

mod parameters;
pub use parameters::Parameters;

mod resolver;
pub use resolver::{resolve_order, LoadOrder};

mod resource;
pub use resource::{Resource, TypeAxis, LOAD_ZONE};

mod temporal;
pub use temporal::{
    Horizon, HorizonBoundary, Period, TemporalHierarchy, TemporalInputs, TemporalScope, Timepoint,
};

#[cfg(test)]
mod test_utils;
