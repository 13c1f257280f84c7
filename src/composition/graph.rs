// Copyright (c) 2025 - Cowboy AI, Inc.

//! Stack Dependency Graph
//!
//! Nodes are stacks in insertion order; an edge `a -> b` means `a` depends
//! on `b`. Ordering uses Kahn's algorithm and always picks the earliest
//! inserted ready stack, so the order is a pure function of the insertion
//! sequence.

use std::collections::{BTreeMap, BTreeSet};

use crate::domain::StackName;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    nodes: Vec<StackName>,
    edges: BTreeMap<StackName, BTreeSet<StackName>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a stack with the stacks it depends on
    pub fn add_node(&mut self, stack: StackName, dependencies: impl IntoIterator<Item = StackName>) {
        if !self.edges.contains_key(&stack) {
            self.nodes.push(stack.clone());
        }
        self.edges
            .entry(stack)
            .or_default()
            .extend(dependencies);
    }

    pub fn contains(&self, stack: &StackName) -> bool {
        self.edges.contains_key(stack)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Stacks that depend directly on `stack`, in insertion order
    pub fn dependents(&self, stack: &StackName) -> Vec<StackName> {
        self.nodes
            .iter()
            .filter(|node| {
                self.edges
                    .get(*node)
                    .is_some_and(|dependencies| dependencies.contains(stack))
            })
            .cloned()
            .collect()
    }

    /// Dependencies that are not nodes of the graph, as `(stack, dependency)`
    pub fn missing(&self) -> Vec<(StackName, StackName)> {
        self.nodes
            .iter()
            .flat_map(|node| {
                self.edges
                    .get(node)
                    .into_iter()
                    .flatten()
                    .filter(|dependency| !self.contains(dependency))
                    .map(move |dependency| (node.clone(), dependency.clone()))
            })
            .collect()
    }

    /// Dependencies before dependents; ties broken by insertion order
    ///
    /// Dependencies outside the graph are ignored. On a cycle, returns the
    /// stacks that could not be ordered.
    pub fn topological_order(&self) -> Result<Vec<StackName>, Vec<StackName>> {
        let mut remaining: BTreeMap<&StackName, usize> = self
            .nodes
            .iter()
            .map(|node| {
                let in_graph = self
                    .edges
                    .get(node)
                    .map(|dependencies| dependencies.iter().filter(|d| self.contains(d)).count())
                    .unwrap_or(0);
                (node, in_graph)
            })
            .collect();

        let mut order = Vec::with_capacity(self.nodes.len());
        while order.len() < self.nodes.len() {
            let next = self
                .nodes
                .iter()
                .find(|node| remaining.get(node) == Some(&0));

            let Some(next) = next else {
                return Err(self
                    .nodes
                    .iter()
                    .filter(|node| remaining.contains_key(node))
                    .cloned()
                    .collect());
            };

            remaining.remove(next);
            for dependent in self.dependents(next) {
                if let Some(count) = remaining.get_mut(&dependent) {
                    *count -= 1;
                }
            }
            order.push(next.clone());
        }

        Ok(order)
    }

    /// Remove a stack and its outgoing edges
    pub fn remove(&mut self, stack: &StackName) {
        self.nodes.retain(|node| node != stack);
        self.edges.remove(stack);
    }
}
