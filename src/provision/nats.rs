//! NATS request-reply provisioner
//!
//! Each template is sent to `provisioning.stack.{stack}.realize`; the
//! responder replies with a [`RealizationReply`].

use async_nats::{Client, ConnectOptions};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use super::{subjects, Provisioner, ProvisioningError, RealizedStack};
use crate::stack::StackTemplate;

/// Configuration for NATS connection
#[derive(Debug, Clone)]
pub struct NatsConfig {
    /// NATS server URLs
    pub servers: Vec<String>,
    /// Client name
    pub name: String,
    pub connect_timeout: Duration,
    /// Upper bound on one stack realization
    pub request_timeout: Duration,
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self {
            servers: vec!["nats://localhost:4222".to_string()],
            name: "cim-stacks".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(900),
        }
    }
}

impl NatsConfig {
    /// Defaults overridden by `NATS_URL`
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("NATS_URL") {
            config.servers = url.split(',').map(|s| s.trim().to_string()).collect();
        }
        config
    }
}

/// Reply of the provisioning responder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RealizationReply {
    Realized { stack: RealizedStack },
    Failed { error: ProvisioningError },
}

/// Provisioner that delegates realization over NATS
#[derive(Clone)]
pub struct NatsProvisioner {
    client: Client,
}

impl NatsProvisioner {
    pub async fn connect(config: NatsConfig) -> Result<Self, ProvisioningError> {
        let connect_options = ConnectOptions::new()
            .name(&config.name)
            .connection_timeout(config.connect_timeout)
            .request_timeout(Some(config.request_timeout));

        let client = async_nats::connect_with_options(config.servers.join(","), connect_options)
            .await
            .map_err(|e| ProvisioningError::Transport {
                message: e.to_string(),
            })?;

        info!("Connected to NATS at {:?}", config.servers);

        Ok(Self { client })
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Provisioner for NatsProvisioner {
    async fn realize(&self, template: &StackTemplate) -> Result<RealizedStack, ProvisioningError> {
        let subject = subjects::realize(&template.stack);
        let payload = serde_json::to_vec(template).map_err(|e| {
            ProvisioningError::InvalidParameter {
                resource: template.stack.to_string(),
                message: e.to_string(),
            }
        })?;

        debug!("Requesting realization on {}", subject);
        let response = self
            .client
            .request(subject.clone(), payload.into())
            .await
            .map_err(|e| ProvisioningError::Transport {
                message: format!("{}: {}", subject, e),
            })?;

        let reply: RealizationReply = serde_json::from_slice(&response.payload).map_err(|e| {
            ProvisioningError::Transport {
                message: format!("malformed reply on {}: {}", subject, e),
            }
        })?;

        match reply {
            RealizationReply::Realized { stack } if stack.stack == template.stack => Ok(stack),
            RealizationReply::Realized { stack } => Err(ProvisioningError::Rejected {
                message: format!(
                    "reply for '{}' answered a request for '{}'",
                    stack.stack, template.stack
                ),
            }),
            RealizationReply::Failed { error } => Err(error),
        }
    }

    fn name(&self) -> &str {
        "nats"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::BTreeMap;

    #[test]
    fn test_reply_wire_format() {
        let reply = RealizationReply::Failed {
            error: ProvisioningError::NamingConflict {
                name: "redash-db".to_string(),
            },
        };
        let json = serde_json::to_value(&reply).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["error"]["kind"], "naming_conflict");

        let reply = RealizationReply::Realized {
            stack: RealizedStack {
                stack: crate::domain::StackName::new("VpcStack").unwrap(),
                attributes: BTreeMap::new(),
                outputs: BTreeMap::new(),
                realized_at: Utc::now(),
            },
        };
        let json = serde_json::to_string(&reply).unwrap();
        assert_eq!(serde_json::from_str::<RealizationReply>(&json).unwrap(), reply);
    }

    #[test]
    fn test_default_config() {
        let config = NatsConfig::default();
        assert_eq!(config.servers, vec!["nats://localhost:4222".to_string()]);
        assert!(config.request_timeout > config.connect_timeout);
    }
}
