// Copyright (c) 2025 - Cowboy AI, Inc.

//! NATS subject hierarchy for provisioning requests
//!
//! ```text
//! provisioning.stack.{stack}.{operation}
//! ```
//!
//! - Precise requests (`provisioning.stack.VpcStack.realize`)
//! - Stack-level wildcards (`provisioning.stack.VpcStack.>`)
//! - Global subscriptions (`provisioning.>`)
//!
//! ```rust
//! use cim_stacks::domain::StackName;
//! use cim_stacks::provision::subjects::{Operation, SubjectBuilder};
//!
//! let stack = StackName::new("VpcStack").unwrap();
//! let subject = SubjectBuilder::new(&stack).operation(Operation::Realize);
//! assert_eq!(subject, "provisioning.stack.VpcStack.realize");
//! ```

use std::fmt;

use crate::domain::StackName;

/// Root namespace for all provisioning subjects
pub const PROVISIONING_ROOT: &str = "provisioning";

/// Provisioning operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Request realization of a stack template
    Realize,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Realize => write!(f, "realize"),
        }
    }
}

/// Builder for provisioning subjects of one stack
#[derive(Debug, Clone)]
pub struct SubjectBuilder<'a> {
    stack: &'a StackName,
}

impl<'a> SubjectBuilder<'a> {
    pub fn new(stack: &'a StackName) -> Self {
        Self { stack }
    }

    /// `provisioning.stack.{stack}.{operation}`
    pub fn operation(&self, operation: Operation) -> String {
        format!("{}.stack.{}.{}", PROVISIONING_ROOT, self.stack, operation)
    }

    /// `provisioning.stack.{stack}.>`
    pub fn wildcard(&self) -> String {
        format!("{}.stack.{}.>", PROVISIONING_ROOT, self.stack)
    }

    /// `provisioning.>`
    pub fn build_all() -> String {
        format!("{}.>", PROVISIONING_ROOT)
    }
}

/// Subject a provisioner listens on for realization requests of `stack`
pub fn realize(stack: &StackName) -> String {
    SubjectBuilder::new(stack).operation(Operation::Realize)
}
