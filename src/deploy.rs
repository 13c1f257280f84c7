// Copyright (c) 2025 - Cowboy AI, Inc.
//! Deployment
//!
//! Realizes the stacks of a [`CompositionRoot`] one at a time, in dependency
//! order:
//!
//! ```text
//! validate → for each stack (topological order):
//!     resolve imports from realized producers
//!     Declared → Realizing → provisioner.realize → Realized | Failed
//! ```
//!
//! The first failure halts the deployment. Nothing is retried or rolled
//! back, and stacks after the failed one stay `Declared`.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{error, info};
use uuid::Uuid;

use crate::composition::CompositionRoot;
use crate::domain::{AttrRef, StackName};
use crate::errors::{StackError, StackResult};
use crate::events::{
    DeploymentEvent, StackRealizationFailed, StackRealizationStarted, StackRealized,
};
use crate::provision::{Provisioner, ProvisioningError, RealizedStack};
use crate::stack::{Stack, StackTemplate};
use crate::state_machine::{StackInput, StackStatus, StateMachineWithHistory};

/// Outcome of one deployment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentReport {
    pub deployment_id: Uuid,
    /// Realized stacks in realization order
    pub realized: Vec<RealizedStack>,
    pub statuses: BTreeMap<StackName, StackStatus>,
    pub events: Vec<DeploymentEvent>,
}

impl DeploymentReport {
    pub fn get(&self, stack: &StackName) -> Option<&RealizedStack> {
        self.realized.iter().find(|realized| &realized.stack == stack)
    }

    /// Realized value of any reference
    pub fn attribute(&self, reference: &AttrRef) -> Option<&str> {
        self.get(&reference.stack)?.attribute(reference)
    }

    pub fn output(&self, stack: &StackName, name: &str) -> Option<&str> {
        self.get(stack)?.output(name)
    }

    pub fn status(&self, stack: &StackName) -> Option<StackStatus> {
        self.statuses.get(stack).copied()
    }
}

/// One realization pass over a composition root
pub struct Deployment<'a> {
    root: &'a CompositionRoot,
    lifecycles: BTreeMap<StackName, StateMachineWithHistory<StackStatus>>,
    report: DeploymentReport,
}

impl<'a> Deployment<'a> {
    pub fn new(root: &'a CompositionRoot) -> Self {
        let lifecycles = root
            .stacks()
            .iter()
            .map(|stack| {
                (
                    stack.name().clone(),
                    StateMachineWithHistory::new(StackStatus::Declared),
                )
            })
            .collect::<BTreeMap<_, _>>();
        let statuses = lifecycles
            .keys()
            .map(|name| (name.clone(), StackStatus::Declared))
            .collect();

        Self {
            root,
            lifecycles,
            report: DeploymentReport {
                deployment_id: Uuid::now_v7(),
                realized: Vec::new(),
                statuses,
                events: Vec::new(),
            },
        }
    }

    pub fn id(&self) -> Uuid {
        self.report.deployment_id
    }

    pub fn report(&self) -> &DeploymentReport {
        &self.report
    }

    pub fn into_report(self) -> DeploymentReport {
        self.report
    }

    /// Lifecycle history of one stack
    pub fn lifecycle(&self, stack: &StackName) -> Option<&StateMachineWithHistory<StackStatus>> {
        self.lifecycles.get(stack)
    }

    /// Realize every stack, halting at the first failure
    pub async fn run(&mut self, provisioner: &dyn Provisioner) -> StackResult<()> {
        let root = self.root;
        root.validate()?;
        let order = root.topological_order()?;

        info!(
            "Deployment {} realizing {} stacks with {}",
            self.id(),
            order.len(),
            provisioner.name()
        );

        for stack in order {
            self.realize(stack, provisioner).await?;
        }

        info!("Deployment {} complete", self.id());
        Ok(())
    }

    async fn realize(&mut self, stack: &Stack, provisioner: &dyn Provisioner) -> StackResult<()> {
        let name = stack.name().clone();
        let template = StackTemplate::from_stack(stack)?
            .resolve_imports(|reference| self.report.attribute(reference).map(str::to_string))?;

        self.advance(&name, StackInput::BeginRealization)?;
        let started = StackRealizationStarted::new(
            self.id(),
            self.last_event_id(),
            name.clone(),
            provisioner.name(),
        );
        self.report
            .events
            .push(DeploymentEvent::StackRealizationStarted(started));
        info!("Realizing {}", name);

        let outcome = match provisioner.realize(&template).await {
            Ok(realized) if realized.stack != name => Err(ProvisioningError::Rejected {
                message: format!("provisioner answered for '{}'", realized.stack),
            }),
            outcome => outcome,
        };

        match outcome {
            Ok(realized) => {
                self.advance(&name, StackInput::RealizationSucceeded)?;
                let event = StackRealized::new(
                    self.id(),
                    self.last_event_id(),
                    name.clone(),
                    realized.attributes.len(),
                    realized.outputs.clone(),
                );
                self.report.events.push(DeploymentEvent::StackRealized(event));
                self.report.realized.push(realized);
                info!("Realized {}", name);
                Ok(())
            }
            Err(source) => {
                self.advance(&name, StackInput::RealizationFailed(source.to_string()))?;
                let event = StackRealizationFailed::new(
                    self.id(),
                    self.last_event_id(),
                    name.clone(),
                    source.clone(),
                );
                self.report
                    .events
                    .push(DeploymentEvent::StackRealizationFailed(event));
                error!("Realization of {} failed: {}", name, source);
                Err(StackError::Provisioning {
                    stack: name,
                    source,
                })
            }
        }
    }

    fn advance(&mut self, stack: &StackName, input: StackInput) -> StackResult<()> {
        let lifecycle = self
            .lifecycles
            .get_mut(stack)
            .ok_or_else(|| StackError::UnknownStack(stack.clone()))?;
        lifecycle.transition_with_history(input, Utc::now())?;
        self.report
            .statuses
            .insert(stack.clone(), *lifecycle.current_state());
        Ok(())
    }

    fn last_event_id(&self) -> Option<Uuid> {
        self.report.events.last().map(DeploymentEvent::event_id)
    }
}

/// Realize every stack of `root` with `provisioner`
pub async fn deploy(
    root: &CompositionRoot,
    provisioner: &dyn Provisioner,
) -> StackResult<DeploymentReport> {
    let mut deployment = Deployment::new(root);
    deployment.run(provisioner).await?;
    Ok(deployment.into_report())
}
