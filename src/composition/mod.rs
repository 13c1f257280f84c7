// Copyright (c) 2025 - Cowboy AI, Inc.
//! Composition Root
//!
//! Holds every stack of a deployment and enforces the wiring rules before
//! anything is realized:
//!
//! - a stack's dependencies must already be present ([`StackError::MissingDependency`])
//! - references must point into declared dependencies and name exported attributes
//! - stack names are unique
//! - a stack cannot be removed while another stack depends on it
//!
//! # Example
//!
//! ```rust
//! use cim_stacks::composition::CompositionRoot;
//! use cim_stacks::domain::Ipv4Cidr;
//! use cim_stacks::stack::StackEnv;
//! use cim_stacks::units::NetworkTopology;
//!
//! let env = StackEnv::new("000000000000", "ap-northeast-1");
//! let mut root = CompositionRoot::new();
//! let network = root
//!     .compose(&env, NetworkTopology::new(Ipv4Cidr::new("10.0.0.0/16").unwrap(), 2))
//!     .unwrap();
//!
//! assert_eq!(network.private_subnets().len(), 2);
//! assert_eq!(root.topological_order().unwrap().len(), 1);
//! ```

pub mod graph;

use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::domain::StackName;
use crate::errors::{StackError, StackResult};
use crate::stack::{Stack, StackBuilder, StackEnv, StackTemplate};

pub use graph::DependencyGraph;

/// An independently defined infrastructure unit
///
/// A unit receives the handles of its dependencies at construction and
/// returns its own handles from [`Unit::declare`].
pub trait Unit {
    /// Handles exposed to consumers
    type Output;

    /// Fixed deployment name of the unit's stack
    fn stack_name(&self) -> &str;

    /// Declare resources into the unit's stack
    fn declare(self, stack: &mut StackBuilder) -> StackResult<Self::Output>;
}

/// Every stack of one deployment, in insertion order
#[derive(Debug, Clone, Default)]
pub struct CompositionRoot {
    stacks: Vec<Stack>,
    graph: DependencyGraph,
    tags: BTreeMap<String, String>,
}

impl CompositionRoot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tags applied to every stack composed afterwards
    pub fn with_tags(mut self, tags: BTreeMap<String, String>) -> Self {
        self.tags = tags;
        self
    }

    /// Declare a unit into a new stack and add it
    pub fn compose<U: Unit>(&mut self, env: &StackEnv, unit: U) -> StackResult<U::Output> {
        let name = StackName::new(unit.stack_name())?;
        if self.graph.contains(&name) {
            return Err(StackError::DuplicateStack(name));
        }

        let mut builder = StackBuilder::new(name, env.clone());
        for (key, value) in &self.tags {
            builder.tag(key.clone(), value.clone());
        }

        let output = unit.declare(&mut builder)?;
        self.add(builder.build()?)?;
        Ok(output)
    }

    /// Add a built stack
    pub fn add(&mut self, stack: Stack) -> StackResult<()> {
        if self.graph.contains(stack.name()) {
            return Err(StackError::DuplicateStack(stack.name().clone()));
        }

        if let Some(dependency) = stack
            .dependencies()
            .iter()
            .find(|dependency| !self.graph.contains(dependency))
        {
            return Err(StackError::MissingDependency {
                stack: stack.name().clone(),
                dependency: dependency.clone(),
            });
        }

        for reference in stack.imports() {
            if !stack.dependencies().contains(&reference.stack) {
                return Err(StackError::UndeclaredDependency {
                    stack: stack.name().clone(),
                    producer: reference.stack.clone(),
                    reference: reference.clone(),
                });
            }

            let exported = self
                .get(&reference.stack)
                .is_some_and(|producer| producer.exports(reference));
            if !exported {
                return Err(StackError::UnresolvableReference {
                    stack: stack.name().clone(),
                    reference: reference.clone(),
                });
            }
        }

        info!(
            "Registered stack {} ({} resources, depends on {:?})",
            stack.name(),
            stack.resources().len(),
            stack.dependencies()
        );
        self.graph
            .add_node(stack.name().clone(), stack.dependencies().iter().cloned());
        self.stacks.push(stack);
        Ok(())
    }

    /// Remove a stack nothing depends on
    pub fn remove(&mut self, name: &StackName) -> StackResult<Stack> {
        if !self.graph.contains(name) {
            return Err(StackError::UnknownStack(name.clone()));
        }

        let dependents = self.graph.dependents(name);
        if !dependents.is_empty() {
            return Err(StackError::StillReferenced {
                stack: name.clone(),
                dependents,
            });
        }

        self.graph.remove(name);
        let position = self
            .stacks
            .iter()
            .position(|stack| stack.name() == name)
            .ok_or_else(|| StackError::UnknownStack(name.clone()))?;

        info!("Removed stack {}", name);
        Ok(self.stacks.remove(position))
    }

    pub fn get(&self, name: &StackName) -> Option<&Stack> {
        self.stacks.iter().find(|stack| stack.name() == name)
    }

    /// Stacks in insertion order
    pub fn stacks(&self) -> &[Stack] {
        &self.stacks
    }

    pub fn len(&self) -> usize {
        self.stacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stacks.is_empty()
    }

    /// Dependencies before dependents, ties broken by insertion order
    pub fn topological_order(&self) -> StackResult<Vec<&Stack>> {
        let order = self.graph.topological_order().map_err(StackError::Cycle)?;
        debug!("Realization order: {:?}", order);

        order
            .iter()
            .map(|name| {
                self.get(name)
                    .ok_or_else(|| StackError::UnknownStack(name.clone()))
            })
            .collect()
    }

    /// Re-check the whole graph
    pub fn validate(&self) -> StackResult<()> {
        if let Some((stack, dependency)) = self.graph.missing().into_iter().next() {
            return Err(StackError::MissingDependency { stack, dependency });
        }

        for stack in &self.stacks {
            for reference in stack.imports() {
                let exported = self
                    .get(&reference.stack)
                    .is_some_and(|producer| producer.exports(reference));
                if !exported {
                    return Err(StackError::UnresolvableReference {
                        stack: stack.name().clone(),
                        reference: reference.clone(),
                    });
                }
            }
        }

        self.topological_order().map(|_| ())
    }

    /// Render every stack, in realization order
    pub fn synth(&self) -> StackResult<Vec<StackTemplate>> {
        self.validate()?;
        self.topological_order()?
            .into_iter()
            .map(StackTemplate::from_stack)
            .collect()
    }
}
