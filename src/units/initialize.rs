// Copyright (c) 2025 - Cowboy AI, Inc.
//! Initialization Unit
//!
//! Runs the schema-creation command once against the relational store. The
//! returned [`TaskRunHandle`] is the ready signal long-running workloads can
//! be ordered after.

use tracing::info;

use super::workload::{self, StoreConnections};
use crate::composition::Unit;
use crate::config::InitializeConfig;
use crate::domain::{Attribute, Value, WorkloadKind};
use crate::errors::StackResult;
use crate::stack::resource::TaskRunSpec;
use crate::stack::{NetworkHandle, ResourceSpec, StackBuilder, TaskRunHandle};

pub const STACK_NAME: &str = "RedashInitializeStack";

#[derive(Debug, Clone)]
pub struct Initialization {
    network: NetworkHandle,
    connections: StoreConnections,
    image: String,
    config: InitializeConfig,
}

impl Initialization {
    pub fn new(
        network: &NetworkHandle,
        connections: &StoreConnections,
        image: &str,
        config: &InitializeConfig,
    ) -> Self {
        Self {
            network: network.clone(),
            connections: connections.clone(),
            image: image.to_string(),
            config: config.clone(),
        }
    }
}

impl Unit for Initialization {
    type Output = TaskRunHandle;

    fn stack_name(&self) -> &str {
        STACK_NAME
    }

    fn declare(self, stack: &mut StackBuilder) -> StackResult<TaskRunHandle> {
        let kind = WorkloadKind::Initialization;
        stack
            .consume(&self.network)
            .consume(self.connections.database())
            .consume(self.connections.cache());

        let environment =
            workload::base_environment(kind, &self.config.task.log_level, &self.connections);
        let task = workload::declare_task(
            stack,
            &self.network,
            &self.image,
            &self.config.task,
            kind,
            environment,
            None,
        )?;

        let security_group = workload::declare_security_group(
            stack,
            &self.network,
            &self.config.security_group_name,
            "security group for Redash initialization task",
            Vec::new(),
        )?;

        let cluster = stack.reference(&task.cluster, Attribute::Arn);
        let task_definition = stack.reference(&task.task_definition, Attribute::Arn);
        let run = stack.add_resource(
            "InitializeTaskRun",
            ResourceSpec::TaskRun(TaskRunSpec {
                cluster: Value::from(cluster),
                task_definition: Value::from(task_definition),
                count: 1,
                networking: workload::private_networking(&self.network, &security_group),
            }),
        )?;

        info!(
            "Initialization task {} runs '{}' once",
            task.container_name,
            kind.command()
        );

        Ok(TaskRunHandle::new(stack.reference(&run, Attribute::TaskArn)))
    }
}
