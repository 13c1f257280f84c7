// Copyright (c) 2025 - Cowboy AI, Inc.
//! Test Fixtures for cim-stacks
//!
//! Shared configuration, secrets and template accessors. Secret values are
//! fixed so expected connection strings can be spelled out in tests.

#![allow(dead_code)]

use serde_json::Value as Json;

use cim_stacks::domain::StackName;
use cim_stacks::{AnalyticsPlatform, DeploymentConfig, StackEnv, StackTemplate, StaticSecretStore};

pub const DB_PASSWORD: &str = "fixture-db-password";
pub const COOKIE_SECRET: &str = "fixture-cookie-secret";

pub const VPC_STACK: &str = "VpcStack";
pub const DISCOVERY_STACK: &str = "ServiceDiscoveryStack";
pub const RDS_STACK: &str = "RedashRdsStack";
pub const CACHE_STACK: &str = "RedashElastiCacheStack";
pub const INITIALIZE_STACK: &str = "RedashInitializeStack";
pub const SERVER_STACK: &str = "RedashServerStack";
pub const WORKER_STACK: &str = "RedashWorkerStack";
pub const ACCESS_STACK: &str = "Ec2StepServerStack";

/// Insertion order of the platform composition
pub const PLATFORM_STACKS: [&str; 8] = [
    VPC_STACK,
    RDS_STACK,
    DISCOVERY_STACK,
    ACCESS_STACK,
    CACHE_STACK,
    INITIALIZE_STACK,
    SERVER_STACK,
    WORKER_STACK,
];

pub fn env() -> StackEnv {
    StackEnv::new("123456789012", "ap-northeast-1")
}

pub fn config() -> DeploymentConfig {
    DeploymentConfig {
        env: env(),
        ..DeploymentConfig::default()
    }
}

pub fn secret_store() -> StaticSecretStore {
    StaticSecretStore::new()
        .with("REDASH_DB_PASSWORD", DB_PASSWORD)
        .with("REDASH_COOKIE_SECRET", COOKIE_SECRET)
}

pub fn platform() -> AnalyticsPlatform {
    AnalyticsPlatform::compose(&config(), &secret_store()).expect("fixture platform composes")
}

pub fn stack_name(name: &str) -> StackName {
    StackName::new(name).expect("fixture stack name is valid")
}

pub fn template<'a>(templates: &'a [StackTemplate], name: &str) -> &'a StackTemplate {
    templates
        .iter()
        .find(|template| template.stack.as_str() == name)
        .unwrap_or_else(|| panic!("no template for {}", name))
}

/// Environment of the single container of a workload template
pub fn container_environment(template: &StackTemplate) -> &serde_json::Map<String, Json> {
    template.resources["TaskDefinition"]["properties"]["containers"][0]["environment"]
        .as_object()
        .expect("workload template has a container environment")
}

pub fn container_command(template: &StackTemplate) -> Vec<String> {
    template.resources["TaskDefinition"]["properties"]["containers"][0]["command"]
        .as_array()
        .expect("workload template has a container command")
        .iter()
        .filter_map(|part| part.as_str().map(str::to_string))
        .collect()
}
