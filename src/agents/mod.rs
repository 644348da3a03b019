pub mod llm_agent;

pub use llm_agent::LlmAgent;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Persona an agent works under: who it is, what it optimizes for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentProfile {
    pub role: String,
    pub goal: String,
    pub backstory: String,
}

/// A unit of work handed to an agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSpec {
    pub id: String,
    pub description: String,
    pub expected_output: String,
    pub context: Option<String>,
}

impl TaskSpec {
    pub fn new(description: impl Into<String>, expected_output: impl Into<String>) -> Self {
        Self {
            id: format!("task-{}", uuid::Uuid::new_v4()),
            description: description.into(),
            expected_output: expected_output.into(),
            context: None,
        }
    }

    /// Thread output from an earlier stage into this task.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

/// An opaque text-generation capability bound to a role.
#[async_trait]
pub trait Agent: Send + Sync {
    fn role(&self) -> &str;

    async fn execute(&self, task: &TaskSpec) -> Result<String>;
}
