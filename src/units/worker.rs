// Copyright (c) 2025 - Cowboy AI, Inc.
//! Worker Unit
//!
//! Background queue processing. No load balancer and no registration.

use tracing::info;

use super::workload::{self, StoreConnections};
use crate::composition::Unit;
use crate::config::WorkerConfig;
use crate::domain::{env_keys, Attribute, ResourceName, Value, WorkloadKind};
use crate::errors::StackResult;
use crate::stack::resource::FargateServiceSpec;
use crate::stack::{NetworkHandle, ResourceSpec, ServiceHandle, StackBuilder, TaskRunHandle};

pub const STACK_NAME: &str = "RedashWorkerStack";

#[derive(Debug, Clone)]
pub struct Worker {
    network: NetworkHandle,
    connections: StoreConnections,
    image: String,
    config: WorkerConfig,
    ready: Option<TaskRunHandle>,
}

impl Worker {
    pub fn new(
        network: &NetworkHandle,
        connections: &StoreConnections,
        image: &str,
        config: &WorkerConfig,
    ) -> Self {
        Self {
            network: network.clone(),
            connections: connections.clone(),
            image: image.to_string(),
            config: config.clone(),
            ready: None,
        }
    }

    /// Order this stack after the initialization run
    pub fn after(mut self, ready: &TaskRunHandle) -> Self {
        self.ready = Some(ready.clone());
        self
    }
}

impl Unit for Worker {
    type Output = ServiceHandle;

    fn stack_name(&self) -> &str {
        STACK_NAME
    }

    fn declare(self, stack: &mut StackBuilder) -> StackResult<ServiceHandle> {
        let kind = WorkloadKind::Worker;
        let config = &self.config;

        stack
            .consume(&self.network)
            .consume(self.connections.database())
            .consume(self.connections.cache());
        if let Some(ready) = &self.ready {
            stack.consume(ready);
        }

        let mut environment =
            workload::base_environment(kind, &config.task.log_level, &self.connections);
        environment
            .set(env_keys::QUEUE_NAMES, config.queues.join(","))
            .set(env_keys::WORKER_COUNT, config.worker_count.to_string());

        let task = workload::declare_task(
            stack,
            &self.network,
            &self.image,
            &config.task,
            kind,
            environment,
            None,
        )?;

        let security_group = workload::declare_security_group(
            stack,
            &self.network,
            &config.security_group_name,
            "security group for Redash worker service",
            Vec::new(),
        )?;

        let service_name = ResourceName::new(config.service_name.as_str())?;
        let cluster = stack.reference(&task.cluster, Attribute::Arn);
        let task_definition = stack.reference(&task.task_definition, Attribute::Arn);
        let service = stack.add_resource(
            "ECSService",
            ResourceSpec::FargateService(FargateServiceSpec {
                name: service_name.clone(),
                cluster: Value::from(cluster),
                task_definition: Value::from(task_definition),
                desired_count: config.desired_count,
                networking: workload::private_networking(&self.network, &security_group),
            }),
        )?;

        info!(
            "Worker {} processes queues {:?} with {} workers",
            service_name, config.queues, config.worker_count
        );

        Ok(ServiceHandle::new(
            service_name,
            stack.reference(&service, Attribute::ServiceArn),
        ))
    }
}
