// Copyright (c) 2025 - Cowboy AI, Inc.
//! Composition Root Tests
//!
//! Wiring rules, realization order and the container environment contract
//! of the composed platform.

mod fixtures;

use pretty_assertions::assert_eq;
use serde_json::json;
use test_case::test_case;

use cim_stacks::composition::Unit;
use cim_stacks::domain::{Ipv4Cidr, LogicalId, ResourceName, Value};
use cim_stacks::stack::resource::ClusterSpec;
use cim_stacks::stack::{NetworkHandle, ResourceSpec};
use cim_stacks::units::{NetworkTopology, RelationalStore};
use cim_stacks::{
    AnalyticsPlatform, CompositionRoot, SecretValue, StackBuilder, StackError, StackResult,
};

use fixtures::*;

fn network_root() -> (CompositionRoot, NetworkHandle) {
    let mut root = CompositionRoot::new();
    let network = root
        .compose(
            &env(),
            NetworkTopology::new(Ipv4Cidr::new("10.0.0.0/16").unwrap(), 2),
        )
        .unwrap();
    (root, network)
}

/// References the VPC without consuming the network handle
struct UndeclaredConsumer {
    network: NetworkHandle,
}

impl Unit for UndeclaredConsumer {
    type Output = ();

    fn stack_name(&self) -> &str {
        "UndeclaredConsumerStack"
    }

    fn declare(self, stack: &mut StackBuilder) -> StackResult<()> {
        stack.add_resource(
            "EcsCluster",
            ResourceSpec::Cluster(ClusterSpec {
                name: ResourceName::new("orphan-cluster")?,
                vpc: Value::from(self.network.vpc_id()),
            }),
        )?;
        Ok(())
    }
}

#[test]
fn test_platform_realization_order() {
    let platform = platform();

    let order: Vec<String> = platform
        .root
        .topological_order()
        .unwrap()
        .iter()
        .map(|stack| stack.name().to_string())
        .collect();

    assert_eq!(order, PLATFORM_STACKS.to_vec());
}

#[test]
fn test_platform_dependencies() {
    let platform = platform();
    let dependencies = |name: &str| -> Vec<String> {
        platform
            .root
            .get(&stack_name(name))
            .unwrap()
            .dependencies()
            .iter()
            .map(|dependency| dependency.to_string())
            .collect()
    };

    assert!(dependencies(VPC_STACK).is_empty());
    assert_eq!(dependencies(DISCOVERY_STACK), vec![VPC_STACK]);
    assert_eq!(dependencies(INITIALIZE_STACK), vec![CACHE_STACK, RDS_STACK, VPC_STACK]);
    assert_eq!(
        dependencies(SERVER_STACK),
        vec![CACHE_STACK, INITIALIZE_STACK, RDS_STACK, DISCOVERY_STACK, VPC_STACK]
    );
    assert_eq!(
        dependencies(WORKER_STACK),
        vec![CACHE_STACK, INITIALIZE_STACK, RDS_STACK, VPC_STACK]
    );
}

#[test]
fn test_missing_dependency_rejected() {
    let (_, network) = network_root();
    let mut other = CompositionRoot::new();

    let result = other.compose(
        &env(),
        RelationalStore::new(
            &network,
            &config().database,
            &SecretValue::new(DB_PASSWORD),
        ),
    );

    match result {
        Err(StackError::MissingDependency { stack, dependency }) => {
            assert_eq!(stack.as_str(), RDS_STACK);
            assert_eq!(dependency.as_str(), VPC_STACK);
        }
        unexpected => panic!("expected MissingDependency, got {:?}", unexpected.map(|_| ())),
    }
    assert!(other.is_empty());
}

#[test]
fn test_undeclared_dependency_rejected() {
    let (mut root, network) = network_root();

    let result = root.compose(&env(), UndeclaredConsumer { network });

    assert!(matches!(
        result,
        Err(StackError::UndeclaredDependency { ref producer, .. }) if producer.as_str() == VPC_STACK
    ));
    assert_eq!(root.len(), 1);
}

#[test]
fn test_duplicate_stack_rejected() {
    let (mut root, _) = network_root();

    let result = root.compose(
        &env(),
        NetworkTopology::new(Ipv4Cidr::new("10.1.0.0/16").unwrap(), 2),
    );

    assert!(matches!(result, Err(StackError::DuplicateStack(_))));
}

#[test]
fn test_referenced_stack_cannot_be_removed() {
    let mut platform = platform();

    match platform.root.remove(&stack_name(VPC_STACK)) {
        Err(StackError::StillReferenced { dependents, .. }) => {
            assert_eq!(dependents.len(), 7);
        }
        unexpected => panic!("expected StillReferenced, got {:?}", unexpected.map(|_| ())),
    }

    assert!(matches!(
        platform.root.remove(&stack_name(INITIALIZE_STACK)),
        Err(StackError::StillReferenced { .. })
    ));

    platform.root.remove(&stack_name(WORKER_STACK)).unwrap();
    platform.root.remove(&stack_name(SERVER_STACK)).unwrap();
    platform.root.remove(&stack_name(INITIALIZE_STACK)).unwrap();
    assert_eq!(platform.root.len(), 5);
    platform.root.validate().unwrap();
}

#[test]
fn test_synth_is_deterministic() {
    let first = platform().root.synth().unwrap();
    let second = platform().root.synth().unwrap();

    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_namespaces_do_not_collide() {
    let mut other = config();
    other.discovery.namespace = "internal.example.io".parse().unwrap();

    let first = platform();
    let second = AnalyticsPlatform::compose(&other, &secret_store()).unwrap();

    let first = first.server.registration().unwrap().fqdn().clone();
    let second = second.server.registration().unwrap().fqdn().clone();

    assert_eq!(first.as_str(), "redash.internal.mornigcode.io");
    assert_eq!(second.as_str(), "redash.internal.example.io");
    assert_ne!(first, second);
}

#[test]
fn test_connection_strings_shared_by_workloads() {
    let templates = platform().root.synth().unwrap();

    let initialize = container_environment(template(&templates, INITIALIZE_STACK));
    let server = container_environment(template(&templates, SERVER_STACK));
    let worker = container_environment(template(&templates, WORKER_STACK));

    for key in ["REDASH_DATABASE_URL", "REDASH_REDIS_URL"] {
        assert_eq!(initialize[key], server[key]);
        assert_eq!(server[key], worker[key]);
    }

    assert_eq!(
        server["REDASH_REDIS_URL"],
        json!({"join": [
            "redis://",
            {"ref": {"stack": CACHE_STACK, "resource": "ElastiCache", "attribute": "primary_endpoint_address"}},
            ":",
            {"ref": {"stack": CACHE_STACK, "resource": "ElastiCache", "attribute": "primary_endpoint_port"}},
            "/0"
        ]})
    );
    assert_eq!(
        server["REDASH_DATABASE_URL"]["join"][0],
        json!(format!("postgresql://root:{}@", DB_PASSWORD))
    );
}

#[test_case(SERVER_STACK, "server", "DEBUG", &["REDASH_COOKIE_SECRET", "REDASH_DATE_FORMAT"], &["QUEUES", "WORKERS_COUNT"] ; "server")]
#[test_case(WORKER_STACK, "scheduler", "DEBUG", &["QUEUES", "WORKERS_COUNT"], &["REDASH_COOKIE_SECRET", "REDASH_PASSWORD_LOGIN_ENABLED"] ; "worker")]
#[test_case(INITIALIZE_STACK, "create_db", "INFO", &["REDASH_ALLOW_SCRIPTS_IN_USER_INPUT"], &["REDASH_COOKIE_SECRET", "QUEUES"] ; "initialize")]
fn test_container_environment_contract(
    stack: &str,
    command: &str,
    log_level: &str,
    present: &[&str],
    absent: &[&str],
) {
    let templates = platform().root.synth().unwrap();
    let template = template(&templates, stack);
    let environment = container_environment(template);

    assert_eq!(container_command(template), vec![command.to_string()]);
    assert_eq!(environment["REDASH_LOG_LEVEL"], json!(log_level));
    assert_eq!(environment["PYTHONUNBUFFERED"], json!("0"));
    assert!(environment.contains_key("REDASH_DATABASE_URL"));
    assert!(environment.contains_key("REDASH_REDIS_URL"));
    for key in present {
        assert!(environment.contains_key(*key), "{} should set {}", stack, key);
    }
    for key in absent {
        assert!(!environment.contains_key(*key), "{} should not set {}", stack, key);
    }
}

#[test]
fn test_worker_queue_settings() {
    let templates = platform().root.synth().unwrap();
    let environment = container_environment(template(&templates, WORKER_STACK));

    assert_eq!(environment["QUEUES"], json!("queries,scheduled_queries,celery"));
    assert_eq!(environment["WORKERS_COUNT"], json!("2"));
}

#[test]
fn test_tags_applied_to_every_stack() {
    for stack in platform().root.stacks() {
        assert_eq!(
            stack.tags().get("ServiceName").map(String::as_str),
            Some("morningcode")
        );
    }
}

#[test]
fn test_load_balancer_admits_listener_port() {
    let platform = platform();
    let server = platform.root.get(&stack_name(SERVER_STACK)).unwrap();
    let resource = |id: &str| server.resource(&LogicalId::new(id).unwrap()).unwrap();

    let load_balancer = match resource("LoadBalancer") {
        ResourceSpec::LoadBalancer(load_balancer) => load_balancer,
        other => panic!("expected a load balancer, got {:?}", other),
    };
    assert!(load_balancer.internet_facing);
    assert_eq!(load_balancer.listener_port, 80);

    let mut admitted = false;
    for group in &load_balancer.security_groups {
        let reference = match group {
            Value::Ref { reference } => reference,
            other => panic!("security group is not a reference: {:?}", other),
        };
        assert_eq!(reference.stack.as_str(), SERVER_STACK);
        match resource(reference.resource.as_str()) {
            ResourceSpec::SecurityGroup(spec) => {
                assert_eq!(spec.name.as_str(), "ALBSecurityGroup");
                admitted |= spec
                    .ingress
                    .iter()
                    .any(|rule| rule.admits_port(load_balancer.listener_port));
            }
            other => panic!("expected a security group, got {:?}", other),
        }
    }
    assert!(admitted, "listener port is not admitted by the load balancer's groups");

    match resource("EcsSg") {
        ResourceSpec::SecurityGroup(spec) => {
            assert!(spec.ingress.iter().any(|rule| rule.admits_port(5000)));
        }
        other => panic!("expected a security group, got {:?}", other),
    }
}

#[test_case(SERVER_STACK, json!([{"container_port": 5000, "host_port": 5000}]) ; "server")]
#[test_case(WORKER_STACK, json!([]) ; "worker")]
#[test_case(INITIALIZE_STACK, json!([]) ; "initialize")]
fn test_container_port_mappings(stack: &str, expected: serde_json::Value) {
    let templates = platform().root.synth().unwrap();
    let template = template(&templates, stack);

    assert_eq!(
        template.resources["TaskDefinition"]["properties"]["containers"][0]["port_mappings"],
        expected
    );
}
