// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Resolution of a resource's type tags to the behaviors that govern it.
//!
//! Callers never branch on a tag.  They resolve the resource on an axis
//! and go through the returned [`RuleSet`].

mod behaviors;
mod rule_set;

pub use behaviors::{
    AvailabilityType, CapacityType, ComplianceType, OperationalType, Rule, TypeBehavior,
};
pub use rule_set::RuleSet;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::{BuildContext, Error, Resource, TypeAxis};

/// A type behavior, tagged with the axis it belongs to.
#[derive(Clone)]
pub enum TypeModule {
    Capacity(Arc<dyn CapacityType>),
    Operational(Arc<dyn OperationalType>),
    Availability(Arc<dyn AvailabilityType>),
    Compliance(Arc<dyn ComplianceType>),
}

impl TypeModule {
    pub fn capacity(behavior: impl CapacityType + 'static) -> Self {
        Self::Capacity(Arc::new(behavior))
    }

    pub fn operational(behavior: impl OperationalType + 'static) -> Self {
        Self::Operational(Arc::new(behavior))
    }

    pub fn availability(behavior: impl AvailabilityType + 'static) -> Self {
        Self::Availability(Arc::new(behavior))
    }

    pub fn compliance(behavior: impl ComplianceType + 'static) -> Self {
        Self::Compliance(Arc::new(behavior))
    }

    pub fn axis(&self) -> TypeAxis {
        match self {
            Self::Capacity(_) => TypeAxis::Capacity,
            Self::Operational(_) => TypeAxis::Operational,
            Self::Availability(_) => TypeAxis::Availability,
            Self::Compliance(_) => TypeAxis::Compliance,
        }
    }

    pub fn tag(&self) -> &str {
        match self {
            Self::Capacity(b) => b.tag(),
            Self::Operational(b) => b.tag(),
            Self::Availability(b) => b.tag(),
            Self::Compliance(b) => b.tag(),
        }
    }

    pub fn rules(&self) -> BTreeSet<Rule> {
        match self {
            Self::Capacity(b) => b.rules(),
            Self::Operational(b) => b.rules(),
            Self::Availability(b) => b.rules(),
            Self::Compliance(b) => b.rules(),
        }
    }

    pub(crate) fn declare_components(
        &self,
        ctx: &mut BuildContext<'_>,
        resources: &[&Resource],
    ) -> Result<(), Error> {
        match self {
            Self::Capacity(b) => b.declare_components(ctx, resources),
            Self::Operational(b) => b.declare_components(ctx, resources),
            Self::Availability(b) => b.declare_components(ctx, resources),
            Self::Compliance(b) => b.declare_components(ctx, resources),
        }
    }
}

impl std::fmt::Debug for TypeModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.axis(), self.tag())
    }
}

/// Maps `(axis, tag)` pairs to the behaviors governing resources carrying
/// that tag on that axis, and holds the resources of the build.
#[derive(Clone, Debug, Default)]
pub struct TypeRegistry {
    behaviors: BTreeMap<(TypeAxis, String), TypeModule>,
    resources: Vec<Resource>,
    resource_indices: BTreeMap<String, usize>,
}

/// Registration.
impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a behavior under its own axis and tag.
    pub fn register_type(&mut self, module: TypeModule) -> Result<(), Error> {
        let key = (module.axis(), module.tag().to_string());
        if self.behaviors.contains_key(&key) {
            return Err(Error::duplicate_type_registration(format!(
                "{} type '{}' is already registered.",
                key.0, key.1
            )));
        }
        tracing::debug!("Registered {} type '{}'.", key.0, key.1);
        self.behaviors.insert(key, module);
        Ok(())
    }

    /// Adds the resources of the build.
    pub fn add_resources(
        &mut self,
        resources: impl IntoIterator<Item = Resource>,
    ) -> Result<(), Error> {
        for resource in resources {
            if self.resource_indices.contains_key(&resource.id) {
                return Err(Error::invalid_config(format!(
                    "Duplicate resource ID found: {}",
                    resource.id
                )));
            }
            self.resource_indices
                .insert(resource.id.clone(), self.resources.len());
            self.resources.push(resource);
        }
        Ok(())
    }

    /// Checks that every resource resolves on every given axis.
    pub fn validate(&self, axes: &BTreeSet<TypeAxis>) -> Result<(), Error> {
        for resource in &self.resources {
            for axis in axes {
                self.resolve(resource, *axis)?;
            }
        }
        Ok(())
    }
}

/// Resolution.
impl TypeRegistry {
    /// Returns the behavior governing the resource on the given axis.
    pub fn resolve(&self, resource: &Resource, axis: TypeAxis) -> Result<&TypeModule, Error> {
        let tag = resource.type_tag(axis).ok_or_else(|| {
            Error::unknown_type_tag(format!(
                "Resource '{}' has no {axis} type.",
                resource.id
            ))
        })?;
        self.behaviors
            .get(&(axis, tag.to_string()))
            .ok_or_else(|| {
                Error::unknown_type_tag(format!(
                    "{axis} type '{tag}' of resource '{}' is not registered.",
                    resource.id
                ))
            })
    }

    /// Returns the rules available for the resource on the given axis.
    pub fn rule_set<'a>(
        &'a self,
        resource: &'a Resource,
        axis: TypeAxis,
    ) -> Result<RuleSet<'a>, Error> {
        Ok(RuleSet::new(resource, self.resolve(resource, axis)?))
    }

    /// Returns the registered behaviors on the given axis, each with the
    /// resources it governs.
    ///
    /// Behaviors that govern no resource are left out, unless
    /// `include_unused` is `true`.
    pub fn in_use(
        &self,
        axis: TypeAxis,
        include_unused: bool,
    ) -> Vec<(&TypeModule, Vec<&Resource>)> {
        self.behaviors
            .iter()
            .filter(|((a, _), _)| *a == axis)
            .map(|((_, tag), module)| {
                let resources = self
                    .resources
                    .iter()
                    .filter(|r| r.type_tag(axis) == Some(tag.as_str()))
                    .collect::<Vec<_>>();
                (module, resources)
            })
            .filter(|(_, resources)| include_unused || !resources.is_empty())
            .collect()
    }

    pub fn behaviors(&self) -> impl Iterator<Item = &TypeModule> {
        self.behaviors.values()
    }
}

/// Resource retrieval.
impl TypeRegistry {
    pub fn resource(&self, id: &str) -> Result<&Resource, Error> {
        self.resource_indices
            .get(id)
            .map(|i| &self.resources[*i])
            .ok_or_else(|| Error::not_found(format!("Resource '{id}' not found.")))
    }

    /// Returns an iterator over the resources, in input order.
    pub fn resources(&self) -> impl Iterator<Item = &Resource> {
        self.resources.iter()
    }

    /// Returns the distinct zones the resources belong to for the given
    /// service, in ascending order.
    pub fn zones(&self, service: &str) -> BTreeSet<&str> {
        self.resources.iter().filter_map(|r| r.zone(service)).collect()
    }

    /// Returns the resources belonging to the given zone of a service.
    pub fn resources_in_zone<'a>(
        &'a self,
        service: &'a str,
        zone: &'a str,
    ) -> impl Iterator<Item = &'a Resource> {
        self.resources
            .iter()
            .filter(move |r| r.zone(service) == Some(zone))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{TestAvailability, TestCapacity, TestOperational};

    fn registry() -> Result<TypeRegistry, Error> {
        let mut registry = TypeRegistry::new();
        registry.register_type(TypeModule::capacity(TestCapacity::new("specified", 100.0)))?;
        registry.register_type(TypeModule::operational(TestOperational::new("must_run")))?;
        registry.register_type(TypeModule::operational(TestOperational::new("hydro")))?;
        registry.register_type(TypeModule::availability(TestAvailability::new("exogenous", 1.0)))?;
        registry.add_resources([
            Resource::new("coal")
                .with_type(TypeAxis::Capacity, "specified")
                .with_type(TypeAxis::Operational, "must_run")
                .with_zone("load_zone", "north"),
            Resource::new("wind")
                .with_type(TypeAxis::Capacity, "specified")
                .with_type(TypeAxis::Operational, "variable")
                .with_zone("load_zone", "south"),
        ])?;
        Ok(registry)
    }

    #[test]
    fn test_registration() -> Result<(), Error> {
        let mut registry = registry()?;

        assert!(registry
            .register_type(TypeModule::operational(TestOperational::new("must_run")))
            .is_err_and(|e| e
                == Error::duplicate_type_registration(
                    "Operational type 'must_run' is already registered."
                )));
        // The same tag on another axis is a different registration.
        registry.register_type(TypeModule::capacity(TestCapacity::new("must_run", 1.0)))?;
        assert!(registry.behaviors().map(|m| (m.axis(), m.tag())).eq([
            (TypeAxis::Capacity, "must_run"),
            (TypeAxis::Capacity, "specified"),
            (TypeAxis::Operational, "hydro"),
            (TypeAxis::Operational, "must_run"),
            (TypeAxis::Availability, "exogenous"),
        ]));

        assert!(registry
            .add_resources([Resource::new("coal")])
            .is_err_and(|e| e == Error::invalid_config("Duplicate resource ID found: coal")));

        Ok(())
    }

    #[test]
    fn test_resolve() -> Result<(), Error> {
        let registry = registry()?;
        let coal = registry.resource("coal")?;
        let wind = registry.resource("wind")?;

        let module = registry.resolve(coal, TypeAxis::Operational)?;
        assert_eq!(module.axis(), TypeAxis::Operational);
        assert_eq!(module.tag(), coal.type_tag(TypeAxis::Operational).unwrap_or_default());

        assert!(registry
            .resolve(wind, TypeAxis::Operational)
            .is_err_and(|e| e
                == Error::unknown_type_tag(
                    "Operational type 'variable' of resource 'wind' is not registered."
                )));
        assert!(registry
            .resolve(coal, TypeAxis::Availability)
            .is_err_and(|e| e
                == Error::unknown_type_tag("Resource 'coal' has no Availability type.")));

        assert!(registry
            .validate(&BTreeSet::from([TypeAxis::Capacity]))
            .is_ok());
        assert!(registry
            .validate(&BTreeSet::from([TypeAxis::Capacity, TypeAxis::Operational]))
            .is_err_and(|e| e
                == Error::unknown_type_tag(
                    "Operational type 'variable' of resource 'wind' is not registered."
                )));

        Ok(())
    }

    #[test]
    fn test_in_use() -> Result<(), Error> {
        let registry = registry()?;

        let in_use = registry.in_use(TypeAxis::Operational, false);
        assert_eq!(in_use.len(), 1);
        assert_eq!(in_use[0].0.tag(), "must_run");
        assert!(in_use[0].1.iter().map(|r| r.id.as_str()).eq(["coal"]));

        let all = registry.in_use(TypeAxis::Operational, true);
        assert!(all.iter().map(|(m, _)| m.tag()).eq(["hydro", "must_run"]));

        assert!(registry.zones("load_zone").into_iter().eq(["north", "south"]));
        assert!(registry
            .resources_in_zone("load_zone", "south")
            .map(|r| r.id.as_str())
            .eq(["wind"]));

        Ok(())
    }
}
