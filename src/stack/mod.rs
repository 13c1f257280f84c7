// Copyright (c) 2025 - Cowboy AI, Inc.
//! Stacks
//!
//! A stack is a named, independently deployable set of declared resources.
//! Stacks are assembled with a [`StackBuilder`] and are immutable afterwards.
//!
//! # Reference Rules
//!
//! A stack may reference:
//! 1. Attributes its own resources export
//! 2. Attributes of stacks whose handles it consumed
//!
//! Anything else is rejected by [`StackBuilder::build`].

pub mod handles;
pub mod resource;
pub mod template;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::domain::{AttrRef, Attribute, LogicalId, StackName, Value};
use crate::errors::{StackError, StackResult};

pub use handles::{
    EndpointReference, InstanceHandle, NamespaceHandle, NetworkHandle, OutputHandle,
    SecurityGroupHandle, ServiceHandle, ServiceRegistration, StoreOutputs, SubnetHandle,
    TaskRunHandle,
};
pub use resource::{RemovalPolicy, ResourceSpec};
pub use template::StackTemplate;

/// Target account and region of a stack
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StackEnv {
    pub account: String,
    pub region: String,
}

impl StackEnv {
    pub fn new(account: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            region: region.into(),
        }
    }
}

/// An immutable, validated stack
#[derive(Debug, Clone, PartialEq)]
pub struct Stack {
    name: StackName,
    env: StackEnv,
    dependencies: BTreeSet<StackName>,
    resources: BTreeMap<LogicalId, ResourceSpec>,
    outputs: BTreeMap<String, Value>,
    tags: BTreeMap<String, String>,
    references: BTreeSet<AttrRef>,
}

impl Stack {
    pub fn name(&self) -> &StackName {
        &self.name
    }

    pub fn env(&self) -> &StackEnv {
        &self.env
    }

    /// Producer stacks of every consumed handle
    pub fn dependencies(&self) -> &BTreeSet<StackName> {
        &self.dependencies
    }

    pub fn resources(&self) -> &BTreeMap<LogicalId, ResourceSpec> {
        &self.resources
    }

    pub fn resource(&self, logical_id: &LogicalId) -> Option<&ResourceSpec> {
        self.resources.get(logical_id)
    }

    pub fn outputs(&self) -> &BTreeMap<String, Value> {
        &self.outputs
    }

    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    /// Every attribute reference in resources and outputs
    pub fn references(&self) -> &BTreeSet<AttrRef> {
        &self.references
    }

    /// References into other stacks
    pub fn imports(&self) -> impl Iterator<Item = &AttrRef> {
        self.references
            .iter()
            .filter(move |reference| reference.is_import_for(&self.name))
    }

    /// Whether `reference` names a resource attribute of this stack
    pub fn exports(&self, reference: &AttrRef) -> bool {
        reference.stack == self.name
            && self
                .resources
                .get(&reference.resource)
                .is_some_and(|spec| spec.exports_attribute(reference.attribute))
    }
}

/// Declares the resources of one stack
#[derive(Debug)]
pub struct StackBuilder {
    name: StackName,
    env: StackEnv,
    dependencies: BTreeSet<StackName>,
    resources: BTreeMap<LogicalId, ResourceSpec>,
    outputs: BTreeMap<String, Value>,
    tags: BTreeMap<String, String>,
}

impl StackBuilder {
    pub fn new(name: StackName, env: StackEnv) -> Self {
        Self {
            name,
            env,
            dependencies: BTreeSet::new(),
            resources: BTreeMap::new(),
            outputs: BTreeMap::new(),
            tags: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &StackName {
        &self.name
    }

    pub fn env(&self) -> &StackEnv {
        &self.env
    }

    /// Tag every resource of the stack
    pub fn tag(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Declare the handle's producer as a dependency
    pub fn consume(&mut self, handle: &impl OutputHandle) -> &mut Self {
        let producer = handle.producer();
        if producer != &self.name {
            self.depends_on(producer.clone());
        }
        self
    }

    /// Declare an explicit dependency
    pub fn depends_on(&mut self, stack: StackName) -> &mut Self {
        if self.dependencies.insert(stack.clone()) {
            debug!("{} depends on {}", self.name, stack);
        }
        self
    }

    /// Declare a resource under a logical id unique within the stack
    pub fn add_resource(&mut self, logical_id: &str, spec: ResourceSpec) -> StackResult<LogicalId> {
        let logical_id = LogicalId::new(logical_id)?;
        if self.resources.contains_key(&logical_id) {
            return Err(StackError::DuplicateResource {
                stack: self.name.clone(),
                logical_id,
            });
        }

        debug!("{}: declared {} {}", self.name, spec.kind(), logical_id);
        self.resources.insert(logical_id.clone(), spec);
        Ok(logical_id)
    }

    /// Reference an attribute of one of this stack's resources
    pub fn reference(&self, logical_id: &LogicalId, attribute: Attribute) -> AttrRef {
        AttrRef::new(self.name.clone(), logical_id.clone(), attribute)
    }

    /// Publish a stack output
    pub fn add_output(&mut self, name: &str, value: impl Into<Value>) -> StackResult<()> {
        let name = LogicalId::new(name)?;
        self.outputs.insert(name.to_string(), value.into());
        Ok(())
    }

    /// Validate every reference and freeze the stack
    pub fn build(self) -> StackResult<Stack> {
        let mut references = BTreeSet::new();
        for spec in self.resources.values() {
            template::collect_references(&serde_json::to_value(spec)?, &mut references);
        }
        for value in self.outputs.values() {
            references.extend(value.references().into_iter().cloned());
        }

        for reference in &references {
            if !reference.is_import_for(&self.name) {
                let exported = self
                    .resources
                    .get(&reference.resource)
                    .is_some_and(|spec| spec.exports_attribute(reference.attribute));
                if !exported {
                    return Err(StackError::UnresolvableReference {
                        stack: self.name.clone(),
                        reference: reference.clone(),
                    });
                }
            } else if !self.dependencies.contains(&reference.stack) {
                return Err(StackError::UndeclaredDependency {
                    stack: self.name.clone(),
                    producer: reference.stack.clone(),
                    reference: reference.clone(),
                });
            }
        }

        Ok(Stack {
            name: self.name,
            env: self.env,
            dependencies: self.dependencies,
            resources: self.resources,
            outputs: self.outputs,
            tags: self.tags,
            references,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ResourceName;
    use crate::stack::resource::{ClusterSpec, LogGroupSpec};

    fn builder(name: &str) -> StackBuilder {
        StackBuilder::new(
            StackName::new(name).unwrap(),
            StackEnv::new("000000000000", "ap-northeast-1"),
        )
    }

    fn log_group(name: &str) -> ResourceSpec {
        ResourceSpec::LogGroup(LogGroupSpec {
            name: ResourceName::new(name).unwrap(),
            removal_policy: RemovalPolicy::Destroy,
        })
    }

    fn foreign_vpc() -> AttrRef {
        AttrRef::new(
            StackName::new("VpcStack").unwrap(),
            LogicalId::new("Vpc").unwrap(),
            Attribute::VpcId,
        )
    }

    fn cluster(vpc: Value) -> ResourceSpec {
        ResourceSpec::Cluster(ClusterSpec {
            name: ResourceName::new("redash-server-cluster").unwrap(),
            vpc,
        })
    }

    #[test]
    fn test_duplicate_logical_id() {
        let mut stack = builder("RedashServerStack");
        stack.add_resource("LogGroup", log_group("a")).unwrap();
        assert!(matches!(
            stack.add_resource("LogGroup", log_group("b")),
            Err(StackError::DuplicateResource { .. })
        ));
    }

    #[test]
    fn test_local_reference_must_be_exported() {
        let mut stack = builder("RedashServerStack");
        let id = stack.add_resource("LogGroup", log_group("a")).unwrap();
        stack
            .add_output("LogGroupArn", stack.reference(&id, Attribute::Arn))
            .unwrap();
        assert!(stack.build().is_ok());

        let mut stack = builder("RedashServerStack");
        let id = stack.add_resource("LogGroup", log_group("a")).unwrap();
        stack
            .add_output("Bad", stack.reference(&id, Attribute::EndpointAddress))
            .unwrap();
        assert!(matches!(
            stack.build(),
            Err(StackError::UnresolvableReference { .. })
        ));
    }

    #[test]
    fn test_undeclared_producer_rejected() {
        let mut stack = builder("RedashServerStack");
        stack
            .add_resource("EcsCluster", cluster(foreign_vpc().into()))
            .unwrap();
        assert!(matches!(
            stack.build(),
            Err(StackError::UndeclaredDependency { .. })
        ));
    }

    #[test]
    fn test_declared_producer_accepted() {
        let mut stack = builder("RedashServerStack");
        stack.depends_on(StackName::new("VpcStack").unwrap());
        stack
            .add_resource("EcsCluster", cluster(foreign_vpc().into()))
            .unwrap();
        let stack = stack.build().unwrap();

        assert_eq!(stack.imports().count(), 1);
        let cluster_arn = AttrRef::new(
            stack.name().clone(),
            LogicalId::new("EcsCluster").unwrap(),
            Attribute::Arn,
        );
        assert!(stack.exports(&cluster_arn));
        assert!(!stack.exports(&foreign_vpc()));
    }
}
