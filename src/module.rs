// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! This module defines the `Module` trait, which feature modules implement
//! to take part in a build, and the optional capabilities they may expose.

mod catalog;

pub use catalog::ModuleCatalog;

use crate::{BuildContext, Error, Index, ModelView, Parameters, Solution, TypeAxis, TypeModule};

/// A feature module contributing variables, constraints and dynamic list
/// entries to the model.
///
/// Only [`name`][Module::name] is mandatory; every hook defaults to a no-op.
pub trait Module {
    /// The unique name of the module.
    fn name(&self) -> &str;

    /// Names of modules, or of dynamic lists, that must have run before this
    /// module.  A list name stands for every module that produces it.
    fn requires(&self) -> Vec<&str> {
        vec![]
    }

    /// Names of the dynamic lists this module appends to.
    fn produces(&self) -> Vec<&str> {
        vec![]
    }

    /// Names of the dynamic lists this module sums over.
    fn consumes(&self) -> Vec<&str> {
        vec![]
    }

    /// The type behaviors this module supplies.
    fn type_behaviors(&self) -> Vec<TypeModule> {
        vec![]
    }

    /// Typing axes on which every resource of the build must resolve.
    fn required_axes(&self) -> Vec<TypeAxis> {
        vec![]
    }

    /// Reads and validates the module's numeric inputs.  Invoked for every
    /// module before any module declares components.
    fn load_inputs(&mut self, _parameters: &Parameters) -> Result<(), Error> {
        Ok(())
    }

    /// Adds the module's variables, expressions and constraints to the model,
    /// and its contributions to dynamic lists.
    fn declare_components(&self, _ctx: &mut BuildContext<'_>) -> Result<(), Error> {
        Ok(())
    }

    fn results_exporter(&self) -> Option<&dyn ResultsExporter> {
        None
    }

    fn duals_exporter(&self) -> Option<&dyn DualsExporter> {
        None
    }

    /// Summarizes the optional capabilities of the module.
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            exports_results: self.results_exporter().is_some(),
            exports_duals: self.duals_exporter().is_some(),
        }
    }
}

/// The optional capabilities a module exposes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub exports_results: bool,
    pub exports_duals: bool,
}

/// A single exported value, keyed by the coordinates used during assembly.
#[derive(Clone, Debug, PartialEq)]
pub struct ResultRecord {
    pub table: String,
    pub index: Index,
    pub column: String,
    pub value: f64,
}

impl ResultRecord {
    pub fn new(
        table: impl Into<String>,
        index: Index,
        column: impl Into<String>,
        value: f64,
    ) -> Self {
        Self {
            table: table.into(),
            index,
            column: column.into(),
            value,
        }
    }
}

/// Extracts primal results from a solved model.
pub trait ResultsExporter {
    fn export_results(
        &self,
        view: &ModelView<'_>,
        solution: &Solution,
    ) -> Result<Vec<ResultRecord>, Error>;
}

/// Extracts dual values of the module's constraints from a solved model.
pub trait DualsExporter {
    fn export_duals(
        &self,
        view: &ModelView<'_>,
        solution: &Solution,
    ) -> Result<Vec<ResultRecord>, Error>;
}
