// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! The variables, expressions, constraints and objective that make up an
//! assembled model.

mod expr;
mod index;

pub use expr::{Expr, LinearTerms};
pub use index::{Index, VarRef};

use std::collections::{BTreeMap, BTreeSet};

use crate::Error;

/// The domain of a decision variable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Domain {
    Reals,
    NonNegativeReals,
    NonNegativeIntegers,
    Binary,
}

/// An indexed decision variable.
#[derive(Clone, Debug, PartialEq)]
pub struct Variable {
    pub name: String,
    pub domain: Domain,
    pub lower: Option<f64>,
    pub upper: Option<f64>,
    pub indices: BTreeSet<Index>,
}

impl Variable {
    pub fn new(
        name: impl Into<String>,
        domain: Domain,
        indices: impl IntoIterator<Item = Index>,
    ) -> Self {
        Self {
            name: name.into(),
            domain,
            lower: None,
            upper: None,
            indices: indices.into_iter().collect(),
        }
    }

    pub fn with_bounds(mut self, lower: Option<f64>, upper: Option<f64>) -> Self {
        self.lower = lower;
        self.upper = upper;
        self
    }
}

/// The relation between the two sides of a constraint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sense {
    LessEqual,
    Equal,
    GreaterEqual,
}

impl std::fmt::Display for Sense {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sense::LessEqual => write!(f, "<="),
            Sense::Equal => write!(f, "=="),
            Sense::GreaterEqual => write!(f, ">="),
        }
    }
}

/// A single linear constraint.
#[derive(Clone, Debug, PartialEq)]
pub struct Constraint {
    pub lhs: Expr,
    pub sense: Sense,
    pub rhs: Expr,
}

impl Constraint {
    pub fn less_equal(lhs: Expr, rhs: Expr) -> Self {
        Self {
            lhs,
            sense: Sense::LessEqual,
            rhs,
        }
    }

    pub fn equal(lhs: Expr, rhs: Expr) -> Self {
        Self {
            lhs,
            sense: Sense::Equal,
            rhs,
        }
    }

    pub fn greater_equal(lhs: Expr, rhs: Expr) -> Self {
        Self {
            lhs,
            sense: Sense::GreaterEqual,
            rhs,
        }
    }
}

impl std::fmt::Display for Constraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.lhs, self.sense, self.rhs)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObjectiveSense {
    Minimize,
    Maximize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Objective {
    pub sense: ObjectiveSense,
    pub expr: Expr,
}

/// The model being assembled.
///
/// Variables, expressions and constraints share a single namespace, so that
/// a dynamic component list can refer to any of them by name.
#[derive(Clone, Debug, Default)]
pub struct Formulation {
    variables: BTreeMap<String, Variable>,
    expressions: BTreeMap<String, BTreeMap<Index, Expr>>,
    constraints: BTreeMap<String, BTreeMap<Index, Constraint>>,
    objective: Option<Objective>,
}

/// Declaration.
impl Formulation {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_unused(&self, name: &str) -> Result<(), Error> {
        if self.variables.contains_key(name)
            || self.expressions.contains_key(name)
            || self.constraints.contains_key(name)
        {
            return Err(Error::duplicate_component(format!(
                "Model component '{name}' is already declared."
            )));
        }
        Ok(())
    }

    pub fn add_variable(&mut self, variable: Variable) -> Result<(), Error> {
        self.ensure_unused(&variable.name)?;
        self.variables.insert(variable.name.clone(), variable);
        Ok(())
    }

    pub fn add_expression(
        &mut self,
        name: impl Into<String>,
        members: impl IntoIterator<Item = (Index, Expr)>,
    ) -> Result<(), Error> {
        let name = name.into();
        self.ensure_unused(&name)?;
        self.expressions
            .insert(name, members.into_iter().collect());
        Ok(())
    }

    pub fn add_constraint(
        &mut self,
        name: impl Into<String>,
        members: impl IntoIterator<Item = (Index, Constraint)>,
    ) -> Result<(), Error> {
        let name = name.into();
        self.ensure_unused(&name)?;
        self.constraints
            .insert(name, members.into_iter().collect());
        Ok(())
    }

    pub fn set_objective(&mut self, objective: Objective) -> Result<(), Error> {
        if self.objective.is_some() {
            return Err(Error::duplicate_component("The objective is already set."));
        }
        self.objective = Some(objective);
        Ok(())
    }
}

/// Retrieval.
impl Formulation {
    /// Returns an expression referring to the given member of a variable.
    pub fn variable(&self, name: &str, index: Index) -> Result<Expr, Error> {
        let variable = self
            .variables
            .get(name)
            .ok_or_else(|| Error::not_found(format!("Variable '{name}' not found.")))?;
        if !variable.indices.contains(&index) {
            return Err(Error::not_found(format!(
                "Variable '{name}' has no member {index}."
            )));
        }
        Ok(Expr::variable(VarRef::new(name, index)))
    }

    /// Returns all members of an expression.
    pub fn expression_members(&self, name: &str) -> Result<&BTreeMap<Index, Expr>, Error> {
        self.expressions
            .get(name)
            .ok_or_else(|| Error::not_found(format!("Expression '{name}' not found.")))
    }

    /// Returns the given member of an expression.
    pub fn expression(&self, name: &str, index: &Index) -> Result<&Expr, Error> {
        self.expression_members(name)?
            .get(index)
            .ok_or_else(|| Error::not_found(format!("Expression '{name}' has no member {index}.")))
    }

    /// Returns the value of the named expression or variable at the given
    /// index, `None` if the element is not defined at that index, and an
    /// error if no element with that name exists.
    pub fn member(&self, name: &str, index: &Index) -> Result<Option<Expr>, Error> {
        if let Some(members) = self.expressions.get(name) {
            return Ok(members.get(index).cloned());
        }
        if let Some(variable) = self.variables.get(name) {
            return Ok(variable
                .indices
                .contains(index)
                .then(|| Expr::variable(VarRef::new(name, index.clone()))));
        }
        Err(Error::not_found(format!(
            "No expression or variable named '{name}'."
        )))
    }

    pub fn constraint(&self, name: &str) -> Result<&BTreeMap<Index, Constraint>, Error> {
        self.constraints
            .get(name)
            .ok_or_else(|| Error::not_found(format!("Constraint '{name}' not found.")))
    }

    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.variables.values()
    }

    pub fn expressions(&self) -> impl Iterator<Item = (&String, &BTreeMap<Index, Expr>)> {
        self.expressions.iter()
    }

    pub fn constraints(&self) -> impl Iterator<Item = (&String, &BTreeMap<Index, Constraint>)> {
        self.constraints.iter()
    }

    pub fn objective(&self) -> Option<&Objective> {
        self.objective.as_ref()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.ensure_unused(name).is_err()
    }

    /// Returns the number of variable members in the model.
    pub fn num_variables(&self) -> usize {
        self.variables.values().map(|v| v.indices.len()).sum()
    }

    /// Returns the number of constraint members in the model.
    pub fn num_constraints(&self) -> usize {
        self.constraints.values().map(|c| c.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn formulation() -> Result<Formulation, Error> {
        let mut model = Formulation::new();
        model.add_variable(Variable::new(
            "dispatch",
            Domain::NonNegativeReals,
            [Index::resource_timepoint("gas", 1), Index::resource_timepoint("gas", 2)],
        ))?;
        model.add_expression(
            "power",
            [(
                Index::zone_timepoint("north", 1),
                model.variable("dispatch", Index::resource_timepoint("gas", 1))? * 0.5,
            )],
        )?;
        Ok(model)
    }

    #[test]
    fn test_namespace() -> Result<(), Error> {
        let mut model = formulation()?;

        assert!(model
            .add_expression("dispatch", [])
            .is_err_and(|e| e == Error::duplicate_component(
                "Model component 'dispatch' is already declared."
            )));
        assert!(model
            .add_constraint("power", [])
            .is_err_and(|e| e == Error::duplicate_component(
                "Model component 'power' is already declared."
            )));
        assert!(model.contains("power"));
        assert!(!model.contains("meet_load"));

        model.add_constraint(
            "max_dispatch",
            [(
                Index::resource_timepoint("gas", 1),
                Constraint::less_equal(
                    model.variable("dispatch", Index::resource_timepoint("gas", 1))?,
                    Expr::number(100.0),
                ),
            )],
        )?;
        assert_eq!(model.num_variables(), 2);
        assert_eq!(model.num_constraints(), 1);
        assert_eq!(
            model.constraint("max_dispatch")?[&Index::resource_timepoint("gas", 1)].to_string(),
            "dispatch[gas,1] <= 100.0"
        );

        Ok(())
    }

    #[test]
    fn test_members() -> Result<(), Error> {
        let model = formulation()?;

        assert_eq!(
            model
                .member("power", &Index::zone_timepoint("north", 1))?
                .map(|e| e.to_string()),
            Some("0.5 * dispatch[gas,1]".to_string())
        );
        assert_eq!(model.member("power", &Index::zone_timepoint("north", 2))?, None);
        assert_eq!(
            model
                .member("dispatch", &Index::resource_timepoint("gas", 2))?
                .map(|e| e.to_string()),
            Some("dispatch[gas,2]".to_string())
        );
        assert!(model
            .member("missing", &Index::Scalar)
            .is_err_and(|e| e == Error::not_found("No expression or variable named 'missing'.")));
        assert!(model
            .variable("dispatch", Index::resource_timepoint("gas", 3))
            .is_err_and(|e| e == Error::not_found("Variable 'dispatch' has no member [gas,3].")));

        Ok(())
    }
}
