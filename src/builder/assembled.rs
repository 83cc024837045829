// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! The finished model, and its hand-off to an external solver.

use std::collections::BTreeMap;
use std::fmt::Display;

use crate::{
    DynamicComponents, Error, Formulation, Index, LoadOrder, Module, ModelView, Parameters,
    ResultRecord, TemporalHierarchy, TypeRegistry, VarRef,
};

/// The terminal status of a solver run that didn't produce a solution.
#[derive(Clone, Debug, PartialEq)]
pub enum SolverStatus {
    Infeasible,
    Unbounded,
    Error(String),
}

impl Display for SolverStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SolverStatus::Infeasible => write!(f, "infeasible"),
            SolverStatus::Unbounded => write!(f, "unbounded"),
            SolverStatus::Error(msg) => write!(f, "solver error: {msg}"),
        }
    }
}

/// An external solver.
pub trait Solver {
    fn solve(&self, formulation: &Formulation) -> Result<Solution, SolverStatus>;
}

/// Primal values of the variables and, optionally, dual values of the
/// constraints of a solved model.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Solution {
    primal: BTreeMap<VarRef, f64>,
    duals: BTreeMap<(String, Index), f64>,
}

impl Solution {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_primal(&mut self, var: VarRef, value: f64) -> &mut Self {
        self.primal.insert(var, value);
        self
    }

    pub fn set_dual(
        &mut self,
        constraint: impl Into<String>,
        index: Index,
        value: f64,
    ) -> &mut Self {
        self.duals.insert((constraint.into(), index), value);
        self
    }

    pub fn primal(&self) -> &BTreeMap<VarRef, f64> {
        &self.primal
    }

    /// Returns the dual value of a constraint member, if the solver reported
    /// one.
    pub fn dual(&self, constraint: &str, index: &Index) -> Option<f64> {
        self.duals.get(&(constraint.to_string(), index.clone())).copied()
    }
}

/// A model whose every module has declared its components.
///
/// The dynamic lists are frozen.
pub struct AssembledModel {
    pub(crate) formulation: Formulation,
    pub(crate) dynamic: DynamicComponents,
    pub(crate) load_order: LoadOrder,
    pub(crate) temporal: TemporalHierarchy,
    pub(crate) types: TypeRegistry,
    pub(crate) parameters: Parameters,
    pub(crate) modules: Vec<Box<dyn Module>>,
}

impl AssembledModel {
    pub fn formulation(&self) -> &Formulation {
        &self.formulation
    }

    pub fn dynamic(&self) -> &DynamicComponents {
        &self.dynamic
    }

    pub fn load_order(&self) -> &LoadOrder {
        &self.load_order
    }

    pub fn temporal(&self) -> &TemporalHierarchy {
        &self.temporal
    }

    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    pub fn view(&self) -> ModelView<'_> {
        ModelView::new(&self.temporal, &self.types, &self.parameters, &self.formulation)
    }

    /// Hands the model to a solver.
    ///
    /// Any status other than a solution is reported as a single
    /// `SolverFailure`.
    pub fn solve(&self, solver: &dyn Solver) -> Result<Solution, Error> {
        tracing::info!(
            "Solving model with {} variables and {} constraints.",
            self.formulation.num_variables(),
            self.formulation.num_constraints()
        );
        solver
            .solve(&self.formulation)
            .map_err(|status| Error::solver_failure(format!("The model is {status}.")))
    }

    /// Returns the value of the objective for the given solution.
    pub fn objective_value(&self, solution: &Solution) -> Result<f64, Error> {
        self.formulation
            .objective()
            .ok_or_else(|| Error::not_found("The model has no objective."))?
            .expr
            .evaluate(solution.primal())
    }

    /// Collects the results of every module that exports results, in load
    /// order.
    pub fn export_results(&self, solution: &Solution) -> Result<Vec<ResultRecord>, Error> {
        let view = self.view();
        let mut records = vec![];
        for module in &self.modules {
            if let Some(exporter) = module.results_exporter() {
                tracing::debug!("Exporting results of module '{}'.", module.name());
                records.extend(exporter.export_results(&view, solution)?);
            }
        }
        Ok(records)
    }

    /// Collects the dual values of every module that exports them, in load
    /// order.
    pub fn export_duals(&self, solution: &Solution) -> Result<Vec<ResultRecord>, Error> {
        let view = self.view();
        let mut records = vec![];
        for module in &self.modules {
            if let Some(exporter) = module.duals_exporter() {
                tracing::debug!("Exporting duals of module '{}'.", module.name());
                records.extend(exporter.export_duals(&view, solution)?);
            }
        }
        Ok(records)
    }
}
