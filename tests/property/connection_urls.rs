// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Connection Strings
//!
//! Whatever address and port a store is realized with, the declared
//! connection string resolves to exactly one well-formed URL.

use cim_stacks::domain::{AttrRef, Attribute, ConnectionUrl, Endpoint, LogicalId, StackName};
use cim_stacks::SecretValue;
use proptest::prelude::*;

// ============================================================================
// Test Endpoint
// ============================================================================

struct RealizedEndpoint {
    address: AttrRef,
    port: AttrRef,
    host: String,
    port_number: u16,
}

impl RealizedEndpoint {
    fn new(stack: &str, resource: &str, host: String, port_number: u16) -> Self {
        let reference = |attribute| {
            AttrRef::new(
                StackName::new(stack).unwrap(),
                LogicalId::new(resource).unwrap(),
                attribute,
            )
        };
        Self {
            address: reference(Attribute::EndpointAddress),
            port: reference(Attribute::EndpointPort),
            host,
            port_number,
        }
    }

    fn lookup(&self, reference: &AttrRef) -> Option<String> {
        if reference == &self.address {
            Some(self.host.clone())
        } else if reference == &self.port {
            Some(self.port_number.to_string())
        } else {
            None
        }
    }
}

impl Endpoint for RealizedEndpoint {
    fn address(&self) -> &AttrRef {
        &self.address
    }

    fn port(&self) -> &AttrRef {
        &self.port
    }
}

// ============================================================================
// Strategies
// ============================================================================

fn arb_host() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,20}\\.[a-z0-9]{6}\\.ap-northeast-1\\.rds\\.amazonaws\\.com"
}

/// Printable ASCII, including URL delimiters
fn arb_password() -> impl Strategy<Value = String> {
    "[ -~]{1,32}"
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_postgres_url_resolves(
        host in arb_host(),
        port in 1u16..=u16::MAX,
        password in arb_password(),
    ) {
        let endpoint = RealizedEndpoint::new("RedashRdsStack", "RedashDB", host.clone(), port);
        let url = ConnectionUrl::postgres(&endpoint, "root", &SecretValue::new(password.clone()), "redash");

        let resolved = url.to_value().resolve(&|reference: &AttrRef| endpoint.lookup(reference));

        let resolved = resolved.unwrap();
        prop_assert_eq!(
            &resolved,
            &format!(
                "postgresql://root:{}@{}:{}/redash",
                urlencoding::encode(&password),
                host,
                port
            )
        );

        // userinfo never leaks a delimiter into the authority
        let authority = resolved.trim_start_matches("postgresql://");
        let (userinfo, rest) = authority.split_once('@').unwrap();
        prop_assert_eq!(userinfo.matches(':').count(), 1);
        prop_assert!(!userinfo.contains('/'));
        prop_assert_eq!(rest, format!("{}:{}/redash", host, port));

        let (_, encoded) = userinfo.split_once(':').unwrap();
        prop_assert_eq!(urlencoding::decode(encoded).unwrap(), password);
    }

    #[test]
    fn prop_redis_url_resolves(host in arb_host(), port in 1u16..=u16::MAX) {
        let endpoint = RealizedEndpoint::new("RedashElastiCacheStack", "ElastiCache", host.clone(), port);
        let url = ConnectionUrl::redis(&endpoint, 0);

        let resolved = url.to_value().resolve(&|reference: &AttrRef| endpoint.lookup(reference));

        prop_assert_eq!(resolved, Some(format!("redis://{}:{}/0", host, port)));
    }

    /// The declared value depends only on the endpoint references
    #[test]
    fn prop_declared_value_independent_of_realization(
        first in arb_host(),
        second in arb_host(),
        port in 1u16..=u16::MAX,
    ) {
        let a = RealizedEndpoint::new("RedashElastiCacheStack", "ElastiCache", first, port);
        let b = RealizedEndpoint::new("RedashElastiCacheStack", "ElastiCache", second, port);

        prop_assert_eq!(
            ConnectionUrl::redis(&a, 0).to_value(),
            ConnectionUrl::redis(&b, 0).to_value()
        );
    }

    /// An unrealized endpoint leaves the URL unresolved
    #[test]
    fn prop_unknown_reference_unresolved(password in arb_password()) {
        let endpoint = RealizedEndpoint::new("RedashRdsStack", "RedashDB", String::new(), 5432);
        let url = ConnectionUrl::postgres(&endpoint, "root", &SecretValue::new(password), "redash");

        let resolved = url.to_value().resolve(&|_: &AttrRef| None);

        prop_assert_eq!(resolved, None);
    }
}
