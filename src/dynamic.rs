// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Named, append-only lists of model components, populated by modules that
//! don't know about each other and summed over by the modules that consume
//! them.

use std::collections::{BTreeMap, BTreeSet};

use crate::{Error, Expr, Formulation, Index};

#[derive(Clone, Debug, Default)]
struct DynamicList {
    contributors: Vec<String>,
    /// Set once the list has been summed over.  Appends fail from then on.
    aggregated: bool,
    /// The first module that summed over the list, if any.
    aggregated_by: Option<String>,
}

/// The position of each module in the load order, and the modules that
/// declared themselves producers of each list.
#[derive(Clone, Debug, Default)]
pub(crate) struct Schedule {
    pub(crate) positions: BTreeMap<String, usize>,
    pub(crate) producers: BTreeMap<String, BTreeSet<String>>,
}

/// The dynamic component lists of a single build.
///
/// Lists can only be summed over through [`sum_over`][Self::sum_over] or
/// [`BuildContext::sum_over`][crate::BuildContext::sum_over], which record
/// the aggregation, so that a later append can't go uncounted.
#[derive(Debug, Default)]
pub struct DynamicComponents {
    lists: BTreeMap<String, DynamicList>,
    schedule: Schedule,
    frozen: bool,
}

impl DynamicComponents {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn set_schedule(&mut self, schedule: Schedule) {
        self.schedule = schedule;
    }

    /// Declares a list.  Declaring an existing list is a no-op.
    pub fn declare_list(&mut self, name: &str) -> Result<(), Error> {
        if self.frozen {
            return Err(Error::registry_frozen(format!(
                "Can't declare list '{name}': the registry is frozen."
            )));
        }
        if !self.lists.contains_key(name) {
            tracing::debug!("Declared dynamic list '{}'.", name);
            self.lists.insert(name.to_string(), DynamicList::default());
        }
        Ok(())
    }

    /// Appends a contributor to a list.
    pub fn append(&mut self, list: &str, contributor: &str) -> Result<(), Error> {
        self.append_from(None, list, contributor)
    }

    pub(crate) fn append_from(
        &mut self,
        module: Option<&str>,
        list: &str,
        contributor: &str,
    ) -> Result<(), Error> {
        if self.frozen {
            return Err(Error::registry_frozen(format!(
                "Can't append '{contributor}' to list '{list}': the registry is frozen."
            )));
        }
        let entry = self.lists.get_mut(list).ok_or_else(|| {
            Error::unknown_dynamic_list(format!("Dynamic list '{list}' is not declared."))
        })?;
        if entry.contributors.iter().any(|c| c == contributor) {
            return Err(Error::duplicate_contributor(format!(
                "Contributor '{contributor}' is already registered in list '{list}'."
            )));
        }
        if entry.aggregated {
            let by = entry
                .aggregated_by
                .as_ref()
                .map(|m| format!(" by module '{m}'"))
                .unwrap_or_default();
            return Err(Error::premature_aggregation(format!(
                "Can't append '{contributor}' to list '{list}': it was already \
                 aggregated{by}."
            )));
        }
        if let Some(module) = module {
            let declared = self
                .schedule
                .producers
                .get(list)
                .is_some_and(|p| p.contains(module));
            if !declared {
                tracing::warn!(
                    "Module '{}' appends '{}' to list '{}' without declaring it as produced.",
                    module,
                    contributor,
                    list
                );
            }
        }
        entry.contributors.push(contributor.to_string());
        Ok(())
    }

    /// Returns the contributors of a list, in registration order.
    pub fn contributors(&self, list: &str) -> Result<&[String], Error> {
        self.lists
            .get(list)
            .map(|l| l.contributors.as_slice())
            .ok_or_else(|| {
                Error::unknown_dynamic_list(format!("Dynamic list '{list}' is not declared."))
            })
    }

    /// Returns the names of the declared lists.
    pub fn lists(&self) -> impl Iterator<Item = &str> {
        self.lists.keys().map(String::as_str)
    }

    /// Returns the sum of every contributor of the list at the given index.
    ///
    /// Contributors that are not defined at the index don't contribute.
    /// Unless the registry is frozen, the list is marked as aggregated and
    /// further appends to it fail with `PrematureAggregation`.
    pub fn sum_over(
        &mut self,
        list: &str,
        index: &Index,
        formulation: &Formulation,
    ) -> Result<Expr, Error> {
        self.sum_over_from(None, list, index, formulation)
    }

    pub(crate) fn sum_over_from(
        &mut self,
        module: Option<&str>,
        list: &str,
        index: &Index,
        formulation: &Formulation,
    ) -> Result<Expr, Error> {
        if let Some(module) = module {
            self.ensure_producers_ran(module, list)?;
        }
        let expr = self.aggregate(list, index, formulation)?;
        if !self.frozen {
            if let Some(entry) = self.lists.get_mut(list) {
                if !entry.aggregated {
                    entry.aggregated = true;
                    entry.aggregated_by = module.map(String::from);
                }
            }
        }
        Ok(expr)
    }

    fn aggregate(
        &self,
        list: &str,
        index: &Index,
        formulation: &Formulation,
    ) -> Result<Expr, Error> {
        let mut terms = vec![];
        for contributor in self.contributors(list)? {
            if let Some(expr) = formulation.member(contributor, index)? {
                terms.push(expr);
            }
        }
        Ok(Expr::sum(terms))
    }

    fn ensure_producers_ran(&self, module: &str, list: &str) -> Result<(), Error> {
        let Some(position) = self.schedule.positions.get(module) else {
            return Ok(());
        };
        for producer in self.schedule.producers.get(list).into_iter().flatten() {
            let runs_later = self
                .schedule
                .positions
                .get(producer)
                .is_some_and(|p| p > position);
            if runs_later {
                return Err(Error::premature_aggregation(format!(
                    "Module '{module}' aggregates list '{list}' before its producer \
                     '{producer}' has run."
                )));
            }
        }
        Ok(())
    }

    /// Freezes the registry.  Later declarations and appends fail.
    pub(crate) fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }
}
