// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! The shared state handed to module and type-behavior hooks.

use crate::{
    Constraint, DynamicComponents, Error, Expr, Formulation, Index, Objective, Parameters,
    Resource, RuleSet, TemporalHierarchy, TypeAxis, TypeRegistry, Variable,
};

/// A read-only view of the model under construction.
///
/// Rule functions receive a view rather than the full context, so they can
/// read variables and parameters but can't add to the model.
#[derive(Clone, Copy)]
pub struct ModelView<'a> {
    temporal: &'a TemporalHierarchy,
    types: &'a TypeRegistry,
    parameters: &'a Parameters,
    formulation: &'a Formulation,
}

impl<'a> ModelView<'a> {
    pub(crate) fn new(
        temporal: &'a TemporalHierarchy,
        types: &'a TypeRegistry,
        parameters: &'a Parameters,
        formulation: &'a Formulation,
    ) -> Self {
        Self {
            temporal,
            types,
            parameters,
            formulation,
        }
    }

    pub fn temporal(&self) -> &'a TemporalHierarchy {
        self.temporal
    }

    pub fn types(&self) -> &'a TypeRegistry {
        self.types
    }

    pub fn parameters(&self) -> &'a Parameters {
        self.parameters
    }

    pub fn formulation(&self) -> &'a Formulation {
        self.formulation
    }

    /// Returns the rules governing the resource on the given axis.
    pub fn rule_set<'r>(
        &'r self,
        resource: &'r Resource,
        axis: TypeAxis,
    ) -> Result<RuleSet<'r>, Error> {
        self.types.rule_set(resource, axis)
    }

    /// Returns an expression referring to a member of a declared variable.
    pub fn variable(&self, name: &str, index: Index) -> Result<Expr, Error> {
        self.formulation.variable(name, index)
    }
}

/// The build-scoped state a module's declaration hook works on.
///
/// A context is created by the builder for each hook invocation and knows
/// which module it was created for, so that dynamic list appends and
/// aggregations can be checked against the resolved load order.
pub struct BuildContext<'a> {
    module: &'a str,
    temporal: &'a TemporalHierarchy,
    types: &'a TypeRegistry,
    parameters: &'a Parameters,
    dynamic: &'a mut DynamicComponents,
    formulation: &'a mut Formulation,
    allow_unused_types: bool,
}

impl<'a> BuildContext<'a> {
    pub(crate) fn new(
        module: &'a str,
        temporal: &'a TemporalHierarchy,
        types: &'a TypeRegistry,
        parameters: &'a Parameters,
        dynamic: &'a mut DynamicComponents,
        formulation: &'a mut Formulation,
        allow_unused_types: bool,
    ) -> Self {
        Self {
            module,
            temporal,
            types,
            parameters,
            dynamic,
            formulation,
            allow_unused_types,
        }
    }

    /// The name of the module this context was created for.
    pub fn module(&self) -> &str {
        self.module
    }

    pub fn view(&self) -> ModelView<'_> {
        ModelView::new(
            self.temporal,
            self.types,
            self.parameters,
            &*self.formulation,
        )
    }

    pub fn temporal(&self) -> &'a TemporalHierarchy {
        self.temporal
    }

    pub fn types(&self) -> &'a TypeRegistry {
        self.types
    }

    pub fn parameters(&self) -> &'a Parameters {
        self.parameters
    }

    pub fn formulation(&self) -> &Formulation {
        &*self.formulation
    }

    pub fn dynamic(&self) -> &DynamicComponents {
        &*self.dynamic
    }
}

/// Model declarations.
impl BuildContext<'_> {
    pub fn add_variable(&mut self, variable: Variable) -> Result<(), Error> {
        tracing::debug!("{}: declaring variable '{}'.", self.module, variable.name);
        self.formulation.add_variable(variable)
    }

    pub fn add_expression(
        &mut self,
        name: impl Into<String>,
        members: impl IntoIterator<Item = (Index, Expr)>,
    ) -> Result<(), Error> {
        self.formulation.add_expression(name, members)
    }

    pub fn add_constraint(
        &mut self,
        name: impl Into<String>,
        members: impl IntoIterator<Item = (Index, Constraint)>,
    ) -> Result<(), Error> {
        self.formulation.add_constraint(name, members)
    }

    pub fn set_objective(&mut self, objective: Objective) -> Result<(), Error> {
        self.formulation.set_objective(objective)
    }

    pub fn variable(&self, name: &str, index: Index) -> Result<Expr, Error> {
        self.formulation.variable(name, index)
    }
}

/// Dynamic component lists.
impl BuildContext<'_> {
    pub fn declare_list(&mut self, name: &str) -> Result<(), Error> {
        self.dynamic.declare_list(name)
    }

    /// Registers a contributor in a list, on behalf of this context's module.
    pub fn append(&mut self, list: &str, contributor: &str) -> Result<(), Error> {
        self.dynamic.append_from(Some(self.module), list, contributor)
    }

    /// Sums the contributors of a list at the given index.
    ///
    /// Fails with `PrematureAggregation` if a module producing the list runs
    /// after this context's module.
    pub fn sum_over(&mut self, list: &str, index: &Index) -> Result<Expr, Error> {
        self.dynamic
            .sum_over_from(Some(self.module), list, index, &*self.formulation)
    }
}

/// Type behaviors.
impl BuildContext<'_> {
    /// Invokes the declaration hook of every behavior on the given axis that
    /// governs at least one resource.
    ///
    /// Behaviors that govern no resource are skipped, unless the build was
    /// configured with `allow_unused_types`.
    pub fn declare_type_components(&mut self, axis: TypeAxis) -> Result<(), Error> {
        let types = self.types;
        for (module, resources) in types.in_use(axis, self.allow_unused_types) {
            tracing::debug!(
                "{}: declaring components of {:?} for {} resource(s).",
                self.module,
                module,
                resources.len()
            );
            module.declare_components(self, &resources)?;
        }
        Ok(())
    }
}
