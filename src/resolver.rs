// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Computes the order in which modules run, from their requirements and the
//! dynamic lists they produce and consume.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

use crate::dynamic::Schedule;
use crate::{Error, Module};

/// The resolved load order of a set of modules.
#[derive(Clone, Debug, PartialEq)]
pub struct LoadOrder {
    /// Positions of the modules in the requested set, in load order.
    indices: Vec<usize>,
    names: Vec<String>,
    producers: BTreeMap<String, BTreeSet<String>>,
}

impl LoadOrder {
    /// Returns the module names, in load order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub(crate) fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Returns the modules that declared themselves producers of the list.
    pub fn producers(&self, list: &str) -> impl Iterator<Item = &str> {
        self.producers
            .get(list)
            .into_iter()
            .flatten()
            .map(String::as_str)
    }

    pub(crate) fn schedule(&self) -> Schedule {
        Schedule {
            positions: self
                .names
                .iter()
                .enumerate()
                .map(|(i, n)| (n.clone(), i))
                .collect(),
            producers: self.producers.clone(),
        }
    }
}

/// Returns the order in which the given modules must run.
///
/// A module runs after every module it requires, after every producer of a
/// list it requires, and after every producer of a list it consumes.
/// Modules without an ordering constraint between them keep their requested
/// order, so the same input always gives the same order.
pub fn resolve_order(modules: &[Box<dyn Module>]) -> Result<LoadOrder, Error> {
    let mut graph = DiGraph::<usize, ()>::new();
    let mut indices = BTreeMap::new();
    for (position, module) in modules.iter().enumerate() {
        let name = module.name();
        if indices.contains_key(name) {
            return Err(Error::invalid_config(format!(
                "Module '{name}' is requested more than once."
            )));
        }
        indices.insert(name, graph.add_node(position));
    }

    let mut producers: BTreeMap<&str, Vec<NodeIndex>> = BTreeMap::new();
    for module in modules {
        for list in module.produces() {
            producers.entry(list).or_default().push(indices[module.name()]);
        }
    }

    for module in modules {
        let node = indices[module.name()];
        for requirement in module.requires() {
            if let Some(&dependency) = indices.get(requirement) {
                graph.update_edge(dependency, node, ());
            } else if let Some(list_producers) = producers.get(requirement) {
                for &producer in list_producers.iter().filter(|p| **p != node) {
                    graph.update_edge(producer, node, ());
                }
            } else {
                return Err(Error::missing_module(format!(
                    "Module '{}' requires '{requirement}', which is neither a requested \
                     module nor a list produced by one.",
                    module.name()
                )));
            }
        }
        for list in module.consumes() {
            let list_producers = producers.get(list).map(Vec::as_slice).unwrap_or_default();
            if list_producers.is_empty() {
                tracing::debug!(
                    "Module '{}' consumes list '{}', which no requested module produces.",
                    module.name(),
                    list
                );
            }
            for &producer in list_producers.iter().filter(|p| **p != node) {
                graph.update_edge(producer, node, ());
            }
        }
    }

    let order = topological_order(&graph).map_err(|cycle| {
        Error::cyclic_module_dependency(format!(
            "Cycle detected: {}",
            cycle
                .iter()
                .map(|n| modules[graph[*n]].name())
                .collect::<Vec<_>>()
                .join(" -> ")
        ))
    })?;

    let indices = order.iter().map(|n| graph[*n]).collect::<Vec<_>>();
    let names = indices
        .iter()
        .map(|i| modules[*i].name().to_string())
        .collect::<Vec<_>>();
    tracing::debug!("Resolved load order: {}", names.join(", "));

    let mut list_producers = BTreeMap::<String, BTreeSet<String>>::new();
    for (list, nodes) in producers {
        list_producers.insert(
            list.to_string(),
            nodes.iter().map(|n| modules[graph[*n]].name().to_string()).collect(),
        );
    }

    Ok(LoadOrder {
        indices,
        names,
        producers: list_producers,
    })
}

/// Kahn's algorithm, always picking the ready node that was requested
/// first.
///
/// On failure, returns the nodes of a cycle, with the first node repeated at
/// the end.
fn topological_order(graph: &DiGraph<usize, ()>) -> Result<Vec<NodeIndex>, Vec<NodeIndex>> {
    let mut in_degree = graph
        .node_indices()
        .map(|n| graph.neighbors_directed(n, Direction::Incoming).count())
        .collect::<Vec<_>>();
    let mut ready = graph
        .node_indices()
        .filter(|n| in_degree[n.index()] == 0)
        .map(|n| Reverse((graph[n], n)))
        .collect::<BinaryHeap<_>>();

    let mut order = Vec::with_capacity(graph.node_count());
    while let Some(Reverse((_, node))) = ready.pop() {
        order.push(node);
        for successor in graph.neighbors_directed(node, Direction::Outgoing) {
            in_degree[successor.index()] -= 1;
            if in_degree[successor.index()] == 0 {
                ready.push(Reverse((graph[successor], successor)));
            }
        }
    }

    if order.len() == graph.node_count() {
        return Ok(order);
    }
    Err(find_cycle(graph, &in_degree))
}

/// Every node left with a non-zero in-degree has a predecessor that is also
/// left, so walking predecessors from any of them ends up in a cycle.
fn find_cycle(graph: &DiGraph<usize, ()>, in_degree: &[usize]) -> Vec<NodeIndex> {
    let remaining = |n: &NodeIndex| in_degree[n.index()] > 0;
    let mut path: Vec<NodeIndex> = vec![];
    let mut current = graph.node_indices().find(remaining);
    while let Some(node) = current {
        if let Some(start) = path.iter().position(|n| *n == node) {
            let mut cycle = path[start..].to_vec();
            cycle.reverse();
            cycle.push(cycle[0]);
            return cycle;
        }
        path.push(node);
        current = graph
            .neighbors_directed(node, Direction::Incoming)
            .filter(remaining)
            .min_by_key(|n| graph[*n]);
    }
    path
}
