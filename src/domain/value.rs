// Copyright (c) 2025 - Cowboy AI, Inc.
//! Attribute References and Declared Values
//!
//! A declared property is either known at composition time (a literal) or
//! refers to an attribute of a resource that only exists once its stack has
//! been realized. Values compose: a connection string is a [`Value::Join`] of
//! literals and endpoint attribute references.
//!
//! # Wire Format
//!
//! ```text
//! "literal"                                     Value::Literal
//! {"ref": {"stack": .., "resource": .., "attribute": ..}}   Value::Ref
//! {"join": [value, value, ...]}                 Value::Join
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use super::names::{LogicalId, StackName};

/// Attributes a realized resource can expose
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    Id,
    Arn,
    Name,
    VpcId,
    SubnetId,
    CidrBlock,
    AvailabilityZone,
    GroupId,
    NamespaceId,
    EndpointAddress,
    EndpointPort,
    PrimaryEndpointAddress,
    PrimaryEndpointPort,
    DnsName,
    ServiceArn,
    TaskArn,
    PublicIp,
    PublicDnsName,
}

impl Attribute {
    /// Canonical attribute name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Id => "Id",
            Self::Arn => "Arn",
            Self::Name => "Name",
            Self::VpcId => "VpcId",
            Self::SubnetId => "SubnetId",
            Self::CidrBlock => "CidrBlock",
            Self::AvailabilityZone => "AvailabilityZone",
            Self::GroupId => "GroupId",
            Self::NamespaceId => "NamespaceId",
            Self::EndpointAddress => "Endpoint.Address",
            Self::EndpointPort => "Endpoint.Port",
            Self::PrimaryEndpointAddress => "PrimaryEndPoint.Address",
            Self::PrimaryEndpointPort => "PrimaryEndPoint.Port",
            Self::DnsName => "DNSName",
            Self::ServiceArn => "ServiceArn",
            Self::TaskArn => "TaskArn",
            Self::PublicIp => "PublicIp",
            Self::PublicDnsName => "PublicDnsName",
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to one attribute of one resource in one stack
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AttrRef {
    pub stack: StackName,
    pub resource: LogicalId,
    pub attribute: Attribute,
}

impl AttrRef {
    /// Create a reference
    pub fn new(stack: StackName, resource: LogicalId, attribute: Attribute) -> Self {
        Self {
            stack,
            resource,
            attribute,
        }
    }

    /// Whether this reference points outside `stack`
    pub fn is_import_for(&self, stack: &StackName) -> bool {
        &self.stack != stack
    }
}

impl fmt::Display for AttrRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${{{}.{}.{}}}", self.stack, self.resource, self.attribute)
    }
}

/// A declared property value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Known at composition time
    Literal(String),

    /// Known once the referenced resource is realized
    Ref {
        #[serde(rename = "ref")]
        reference: AttrRef,
    },

    /// Concatenation of values
    Join { join: Vec<Value> },
}

impl Value {
    /// Literal value
    pub fn literal(value: impl Into<String>) -> Self {
        Value::Literal(value.into())
    }

    /// Concatenate parts, merging adjacent literals
    pub fn join(parts: impl IntoIterator<Item = Value>) -> Self {
        let mut merged: Vec<Value> = Vec::new();
        for part in parts {
            Self::push_part(&mut merged, part);
        }

        match merged.len() {
            0 => Value::Literal(String::new()),
            1 => merged.remove(0),
            _ => Value::Join { join: merged },
        }
    }

    fn push_part(merged: &mut Vec<Value>, part: Value) {
        match part {
            Value::Join { join } => join
                .into_iter()
                .for_each(|inner| Self::push_part(merged, inner)),
            Value::Literal(next) => {
                if let Some(Value::Literal(previous)) = merged.last_mut() {
                    previous.push_str(&next);
                } else {
                    merged.push(Value::Literal(next));
                }
            }
            reference => merged.push(reference),
        }
    }

    /// The literal text, if this value is fully known
    pub fn as_literal(&self) -> Option<&str> {
        match self {
            Value::Literal(text) => Some(text),
            _ => None,
        }
    }

    /// Every attribute reference inside this value, deduplicated
    pub fn references(&self) -> BTreeSet<&AttrRef> {
        let mut found = BTreeSet::new();
        self.collect_references(&mut found);
        found
    }

    fn collect_references<'a>(&'a self, found: &mut BTreeSet<&'a AttrRef>) {
        match self {
            Value::Literal(_) => {}
            Value::Ref { reference } => {
                found.insert(reference);
            }
            Value::Join { join } => join.iter().for_each(|part| part.collect_references(found)),
        }
    }

    /// Resolve every reference through `lookup`
    ///
    /// Returns `None` if any reference is unknown to `lookup`.
    pub fn resolve<F>(&self, lookup: &F) -> Option<String>
    where
        F: Fn(&AttrRef) -> Option<String>,
    {
        match self {
            Value::Literal(text) => Some(text.clone()),
            Value::Ref { reference } => lookup(reference),
            Value::Join { join } => join.iter().map(|part| part.resolve(lookup)).collect(),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Literal(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Literal(value)
    }
}

impl From<AttrRef> for Value {
    fn from(reference: AttrRef) -> Self {
        Value::Ref { reference }
    }
}

impl From<&AttrRef> for Value {
    fn from(reference: &AttrRef) -> Self {
        Value::Ref {
            reference: reference.clone(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Literal(text) => f.write_str(text),
            Value::Ref { reference } => write!(f, "{}", reference),
            Value::Join { join } => join.iter().try_for_each(|part| write!(f, "{}", part)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db_address() -> AttrRef {
        AttrRef::new(
            StackName::new("RedashRdsStack").unwrap(),
            LogicalId::new("RedashDB").unwrap(),
            Attribute::EndpointAddress,
        )
    }

    #[test]
    fn test_join_merges_literals() {
        let value = Value::join(vec![
            Value::literal("postgresql://"),
            Value::literal("root@"),
            db_address().into(),
            Value::literal(":"),
            Value::literal("5432"),
        ]);

        match &value {
            Value::Join { join } => assert_eq!(join.len(), 3),
            other => panic!("expected join, got {:?}", other),
        }
        assert_eq!(
            value.to_string(),
            "postgresql://root@${RedashRdsStack.RedashDB.Endpoint.Address}:5432"
        );
    }

    #[test]
    fn test_join_of_literals_collapses() {
        let value = Value::join(vec![Value::literal("a"), Value::literal("b")]);
        assert_eq!(value, Value::literal("ab"));
        assert_eq!(Value::join(Vec::new()), Value::literal(""));
    }

    #[test]
    fn test_resolve() {
        let value = Value::join(vec![Value::literal("host="), db_address().into()]);
        let resolved = value.resolve(&|r: &AttrRef| {
            (r.attribute == Attribute::EndpointAddress).then(|| "db.internal".to_string())
        });
        assert_eq!(resolved.as_deref(), Some("host=db.internal"));

        let unresolved = value.resolve(&|_: &AttrRef| None);
        assert_eq!(unresolved, None);
    }

    #[test]
    fn test_references() {
        let value = Value::join(vec![
            db_address().into(),
            Value::literal(":"),
            db_address().into(),
        ]);
        assert_eq!(value.references().len(), 1);
        assert!(db_address().is_import_for(&StackName::new("RedashServerStack").unwrap()));
    }

    #[test]
    fn test_wire_format() {
        let value = Value::join(vec![Value::literal("x"), db_address().into()]);
        let json = serde_json::to_value(&value).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"join": ["x", {"ref": {
                "stack": "RedashRdsStack",
                "resource": "RedashDB",
                "attribute": "endpoint_address"
            }}]})
        );

        let back: Value = serde_json::from_value(json).unwrap();
        assert_eq!(back, value);
    }
}
