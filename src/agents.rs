//! Provider-backed planning agents.
//!
//! Each agent wraps a chat-completion client, a configured system prompt and
//! its own conversation history. Requests go out as a JSON document in the
//! user message; replies must be JSON, optionally inside a code fence.

use crate::collaborators::{Generator, RefineAgent, RepairAgent};
use crate::error::PlanError;
use crate::graph::{Operation, OperationGraph, Subplan, WorkStep};
use crate::provider::{
    ChatMessage, CompletionOptions, ModelProviderClient, ProviderConfig, ProviderFactory,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Agent configuration section (`[agents.<role>]`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Name of a `[providers.<name>]` section.
    pub provider: String,

    /// Inline system prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,

    /// File holding the system prompt; used when no inline prompt is given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt_path: Option<PathBuf>,
}

impl AgentConfig {
    pub fn validate(&self, providers: &HashMap<String, ProviderConfig>) -> Result<(), String> {
        if !providers.contains_key(&self.provider) {
            return Err(format!("Unknown provider '{}'", self.provider));
        }
        if self.system_prompt.is_none() && self.system_prompt_path.is_none() {
            return Err("Either system_prompt or system_prompt_path is required".to_string());
        }
        Ok(())
    }

    /// Resolve the system prompt text.
    pub fn load_prompt(&self) -> Result<String, PlanError> {
        if let Some(prompt) = &self.system_prompt {
            return Ok(prompt.clone());
        }
        match &self.system_prompt_path {
            Some(path) => std::fs::read_to_string(path).map_err(|e| {
                PlanError::ConfigError(format!(
                    "Failed to read system prompt {}: {}",
                    path.display(),
                    e
                ))
            }),
            None => Err(PlanError::ConfigError(
                "Agent has no system prompt".to_string(),
            )),
        }
    }
}

/// The three agent roles, named as in `[agents.<role>]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentRole {
    Builder,
    Debugger,
    Refiner,
}

impl AgentRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentRole::Builder => "builder",
            AgentRole::Debugger => "debugger",
            AgentRole::Refiner => "refiner",
        }
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Chat session shared by all agent roles.
pub struct LlmAgent {
    role: AgentRole,
    client: Arc<dyn ModelProviderClient>,
    options: CompletionOptions,
    history: Mutex<Vec<ChatMessage>>,
}

impl LlmAgent {
    pub fn new(
        role: AgentRole,
        client: Arc<dyn ModelProviderClient>,
        system_prompt: impl Into<String>,
        options: CompletionOptions,
    ) -> Self {
        Self {
            role,
            client,
            options,
            history: Mutex::new(vec![ChatMessage::system(system_prompt)]),
        }
    }

    /// Build the agent for `role` from configuration.
    pub fn from_config(
        role: AgentRole,
        agent: &AgentConfig,
        providers: &HashMap<String, ProviderConfig>,
    ) -> Result<Self, PlanError> {
        let provider = providers.get(&agent.provider).ok_or_else(|| {
            PlanError::ProviderNotConfigured(format!(
                "Agent '{}' references unknown provider '{}'",
                role, agent.provider
            ))
        })?;
        let client: Arc<dyn ModelProviderClient> = Arc::from(ProviderFactory::from_config(provider)?);
        Ok(Self::new(
            role,
            client,
            agent.load_prompt()?,
            provider.default_options.clone(),
        ))
    }

    pub fn role(&self) -> AgentRole {
        self.role
    }

    /// Number of messages so far, system prompt included.
    pub fn history_len(&self) -> usize {
        self.history.lock().len()
    }

    /// Drop everything but the system prompt.
    pub fn reset(&self) {
        self.history.lock().truncate(1);
    }

    /// Send `request` and parse the reply as `T`.
    pub async fn ask<T: DeserializeOwned>(&self, request: &Value) -> Result<T, PlanError> {
        let messages = {
            let mut history = self.history.lock();
            history.push(ChatMessage::user(request.to_string()));
            history.clone()
        };

        debug!(
            role = %self.role,
            provider = self.client.provider_name(),
            model = self.client.model_name(),
            messages = messages.len(),
            "Agent request"
        );
        let response = self.client.complete(messages, self.options.clone()).await?;

        self.history
            .lock()
            .push(ChatMessage::assistant(response.content.clone()));

        parse_reply(&response.content).map_err(|e| {
            PlanError::Collaborator(format!("{} agent returned an unusable reply: {}", self.role, e))
        })
    }
}

/// Parse a JSON reply, tolerating a surrounding Markdown code fence.
pub fn parse_reply<T: DeserializeOwned>(content: &str) -> Result<T, serde_json::Error> {
    serde_json::from_str(strip_code_fence(content))
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Skip the language tag on the opening fence.
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Generator producing a step's operations.
pub struct BuilderAgent {
    agent: LlmAgent,
}

impl BuilderAgent {
    pub fn new(agent: LlmAgent) -> Self {
        Self { agent }
    }
}

#[async_trait]
impl Generator for BuilderAgent {
    async fn generate(&self, step: &WorkStep, context: &[Operation]) -> Result<Subplan, PlanError> {
        let request = json!({ "step": step, "context": context });
        self.agent
            .ask(&request)
            .await
            .map_err(|e| PlanError::Generation {
                step_id: step.step_id,
                message: e.to_string(),
            })
    }

    fn start_session(&self) {
        self.agent.reset();
    }
}

/// Repair agent proposing a corrected plan.
pub struct DebuggerAgent {
    agent: LlmAgent,
}

impl DebuggerAgent {
    pub fn new(agent: LlmAgent) -> Self {
        Self { agent }
    }
}

#[async_trait]
impl RepairAgent for DebuggerAgent {
    async fn debug(
        &self,
        intent: &str,
        plan: &OperationGraph,
        execution_diagnostics: Option<&Value>,
        validation_errors: &[String],
    ) -> Result<OperationGraph, PlanError> {
        let request = json!({
            "intent": intent,
            "plan": plan,
            "execution_diagnostics": execution_diagnostics,
            "validation_errors": validation_errors,
        });
        self.agent.ask(&request).await
    }

    fn start_session(&self) {
        self.agent.reset();
    }
}

/// Refine agent aligning a plan with the request.
pub struct RefinerAgent {
    agent: LlmAgent,
}

impl RefinerAgent {
    pub fn new(agent: LlmAgent) -> Self {
        Self { agent }
    }
}

#[async_trait]
impl RefineAgent for RefinerAgent {
    async fn refine(&self, intent: &str, plan: &OperationGraph) -> Result<OperationGraph, PlanError> {
        let request = json!({ "intent": intent, "plan": plan });
        self.agent.ask(&request).await
    }

    fn start_session(&self) {
        self.agent.reset();
    }
}
