// Copyright (c) 2025 - Cowboy AI, Inc.
//! Deployment Identifier Value Objects
//!
//! Stack names, logical resource ids, physical resource names and DNS names
//! are part of the externally observable deployment contract: operators refer
//! to them, and they must stay stable across redeployments of the same
//! environment. Every identifier is validated once at construction.
//!
//! | Type | Rules |
//! |---|---|
//! | [`StackName`] | 1-128 chars, ASCII alphanumeric or `-`, starts with a letter |
//! | [`LogicalId`] | 1-255 chars, ASCII alphanumeric only |
//! | [`ResourceName`] | 1-255 chars, ASCII alphanumeric, `-` or `_`, no leading/trailing `-` |
//! | [`DnsName`] | RFC 1123 domain name |

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Identifier validation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NameError {
    #[error("{kind} is empty")]
    Empty { kind: &'static str },

    #[error("{kind} exceeds maximum length of {max} characters: {value}")]
    TooLong {
        kind: &'static str,
        max: usize,
        value: String,
    },

    #[error("Invalid character {character:?} in {kind}: {value}")]
    InvalidCharacter {
        kind: &'static str,
        character: char,
        value: String,
    },

    #[error("{kind} has an invalid format: {value}")]
    InvalidFormat { kind: &'static str, value: String },
}

macro_rules! string_identifier {
    ($name:ident) => {
        impl $name {
            /// Get the identifier as a string slice
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl FromStr for $name {
            type Err = NameError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = NameError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = NameError;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

fn check_length(kind: &'static str, value: &str, max: usize) -> Result<(), NameError> {
    if value.is_empty() {
        return Err(NameError::Empty { kind });
    }
    if value.len() > max {
        return Err(NameError::TooLong {
            kind,
            max,
            value: value.to_string(),
        });
    }
    Ok(())
}

fn check_characters(
    kind: &'static str,
    value: &str,
    allowed: impl Fn(char) -> bool,
) -> Result<(), NameError> {
    match value.chars().find(|c| !allowed(*c)) {
        Some(character) => Err(NameError::InvalidCharacter {
            kind,
            character,
            value: value.to_string(),
        }),
        None => Ok(()),
    }
}

/// Name of an independently deployable stack (e.g. `RedashRdsStack`)
///
/// Stack names double as NATS subject tokens, so dots and wildcards are
/// excluded by construction.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StackName(String);

impl StackName {
    /// Maximum stack name length
    pub const MAX_LENGTH: usize = 128;

    const KIND: &'static str = "stack name";

    /// Create a validated stack name
    pub fn new(name: impl Into<String>) -> Result<Self, NameError> {
        let name = name.into();
        check_length(Self::KIND, &name, Self::MAX_LENGTH)?;
        check_characters(Self::KIND, &name, |c| c.is_ascii_alphanumeric() || c == '-')?;

        if !name.starts_with(|c: char| c.is_ascii_alphabetic()) {
            return Err(NameError::InvalidFormat {
                kind: Self::KIND,
                value: name,
            });
        }

        Ok(Self(name))
    }
}

string_identifier!(StackName);

/// Logical id of a resource, unique within its stack (e.g. `RedashDB`)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LogicalId(String);

impl LogicalId {
    /// Maximum logical id length
    pub const MAX_LENGTH: usize = 255;

    const KIND: &'static str = "logical id";

    /// Create a validated logical id
    pub fn new(id: impl Into<String>) -> Result<Self, NameError> {
        let id = id.into();
        check_length(Self::KIND, &id, Self::MAX_LENGTH)?;
        check_characters(Self::KIND, &id, |c| c.is_ascii_alphanumeric())?;
        Ok(Self(id))
    }
}

string_identifier!(LogicalId);

/// Fixed physical name of a sub-resource (security groups, log groups,
/// clusters, services, instances)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceName(String);

impl ResourceName {
    /// Maximum physical name length
    pub const MAX_LENGTH: usize = 255;

    const KIND: &'static str = "resource name";

    /// Create a validated resource name
    pub fn new(name: impl Into<String>) -> Result<Self, NameError> {
        let name = name.into();
        check_length(Self::KIND, &name, Self::MAX_LENGTH)?;
        check_characters(Self::KIND, &name, |c| {
            c.is_ascii_alphanumeric() || c == '-' || c == '_'
        })?;

        if name.starts_with('-') || name.ends_with('-') {
            return Err(NameError::InvalidFormat {
                kind: Self::KIND,
                value: name,
            });
        }

        Ok(Self(name))
    }
}

string_identifier!(ResourceName);

/// DNS domain name following RFC 1123
///
/// Used for private namespaces and service-discovery registrations.
///
/// # Examples
///
/// ```rust
/// use cim_stacks::domain::DnsName;
///
/// let namespace = DnsName::new("internal.example.io").unwrap();
/// let service = namespace.child("redash").unwrap();
/// assert_eq!(service.as_str(), "redash.internal.example.io");
///
/// assert!(DnsName::new("-invalid").is_err());
/// assert!(DnsName::new("invalid..io").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DnsName(String);

impl DnsName {
    /// Maximum total length (RFC 1123)
    pub const MAX_LENGTH: usize = 253;

    /// Maximum length of a single label (RFC 1123)
    pub const MAX_LABEL_LENGTH: usize = 63;

    const KIND: &'static str = "DNS name";

    /// Create a validated DNS name, normalized to lowercase
    pub fn new(name: impl Into<String>) -> Result<Self, NameError> {
        let name = name.into().to_ascii_lowercase();
        check_length(Self::KIND, &name, Self::MAX_LENGTH)?;

        let labels: Vec<&str> = name.split('.').collect();
        for label in &labels {
            Self::validate_label(label, &name)?;
        }

        // Top-level label cannot be all numeric
        if let Some(tld) = labels.last() {
            if labels.len() > 1 && tld.chars().all(|c| c.is_ascii_digit()) {
                return Err(NameError::InvalidFormat {
                    kind: Self::KIND,
                    value: name.clone(),
                });
            }
        }

        Ok(Self(name))
    }

    /// For compile-time constants already known to be valid
    pub(crate) fn from_static(name: &'static str) -> Self {
        Self(name.to_string())
    }

    fn validate_label(label: &str, name: &str) -> Result<(), NameError> {
        if label.is_empty() || label.starts_with('-') || label.ends_with('-') {
            return Err(NameError::InvalidFormat {
                kind: Self::KIND,
                value: name.to_string(),
            });
        }
        if label.len() > Self::MAX_LABEL_LENGTH {
            return Err(NameError::TooLong {
                kind: Self::KIND,
                max: Self::MAX_LABEL_LENGTH,
                value: label.to_string(),
            });
        }
        check_characters(Self::KIND, label, |c| c.is_ascii_alphanumeric() || c == '-')
    }

    /// Prepend a label, e.g. a service name under a namespace
    pub fn child(&self, label: &str) -> Result<Self, NameError> {
        Self::new(format!("{}.{}", label, self.0))
    }

    /// First label
    pub fn leading_label(&self) -> &str {
        self.0.split('.').next().unwrap_or(&self.0)
    }

    /// Labels in order
    pub fn labels(&self) -> Vec<&str> {
        self.0.split('.').collect()
    }
}

string_identifier!(DnsName);
