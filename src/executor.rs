//! HTTP client for the remote plan execution engine.

use crate::collaborators::{ExecutionReport, PlanExecutor, NO_RESPONSE_STATUS};
use crate::config::ExecutorConfig;
use crate::error::PlanError;
use crate::mapper::WirePlan;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

const EXECUTOR_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Posts wire plans as JSON to the configured submission URL.
pub struct HttpExecutor {
    client: Client,
    server_url: String,
}

impl HttpExecutor {
    pub fn new(server_url: impl Into<String>, timeout: Duration) -> Result<Self, PlanError> {
        let client = Client::builder()
            .connect_timeout(EXECUTOR_CONNECT_TIMEOUT)
            .timeout(timeout)
            .build()
            .map_err(|e| PlanError::Collaborator(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            server_url: server_url.into(),
        })
    }

    pub fn from_config(config: &ExecutorConfig) -> Result<Self, PlanError> {
        let server_url = config.server_url.clone().ok_or_else(|| {
            PlanError::ConfigError("executor.server_url is not configured".to_string())
        })?;
        Self::new(server_url, Duration::from_secs(config.timeout_secs))
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }
}

/// Response body as JSON when it parses, else as a JSON string.
fn body_to_value(body: String) -> Value {
    serde_json::from_str(&body).unwrap_or(Value::String(body))
}

#[async_trait]
impl PlanExecutor for HttpExecutor {
    async fn execute(&self, plan: &WirePlan) -> Result<ExecutionReport, PlanError> {
        debug!(url = %self.server_url, operators = plan.operators.len(), "Submitting plan");

        let response = match self.client.post(&self.server_url).json(plan).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(url = %self.server_url, error = %e, "Executor unreachable");
                return Ok(ExecutionReport::new(
                    NO_RESPONSE_STATUS,
                    Value::String(e.to_string()),
                ));
            }
        };

        let status = response.status().as_u16();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                warn!(status, error = %e, "Failed to read executor response");
                return Ok(ExecutionReport::new(status, Value::String(e.to_string())));
            }
        };

        Ok(ExecutionReport::new(status, body_to_value(body)))
    }
}
