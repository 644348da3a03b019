use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;

use super::{Agent, AgentProfile, TaskSpec};
use crate::providers::{CompletionRequest, LlmProvider, Message, MessageRole};

/// An agent powered by an LLM provider
pub struct LlmAgent {
    profile: AgentProfile,
    provider: Arc<dyn LlmProvider>,
    model: String,
    temperature: f32,
}

impl LlmAgent {
    pub fn new(
        profile: AgentProfile,
        provider: Arc<dyn LlmProvider>,
        model: impl Into<String>,
        temperature: f32,
    ) -> Self {
        Self {
            profile,
            provider,
            model: model.into(),
            temperature,
        }
    }

    fn system_prompt(&self) -> String {
        format!(
            "You are a {role}.\n\nYour goal: {goal}\n\n{backstory}",
            role = self.profile.role,
            goal = self.profile.goal,
            backstory = self.profile.backstory,
        )
    }

    fn user_prompt(&self, task: &TaskSpec) -> String {
        let mut prompt = task.description.clone();

        if let Some(context) = &task.context {
            prompt.push_str("\n\nOutput of the previous step:\n");
            prompt.push_str(context);
        }

        prompt.push_str("\n\nExpected output: ");
        prompt.push_str(&task.expected_output);
        prompt
    }
}

#[async_trait]
impl Agent for LlmAgent {
    fn role(&self) -> &str {
        &self.profile.role
    }

    async fn execute(&self, task: &TaskSpec) -> Result<String> {
        let request = CompletionRequest {
            model: self.model.clone(),
            messages: vec![
                Message {
                    role: MessageRole::System,
                    content: self.system_prompt(),
                },
                Message {
                    role: MessageRole::User,
                    content: self.user_prompt(task),
                },
            ],
            temperature: Some(self.temperature),
            max_tokens: None,
        };

        let response = self
            .provider
            .complete(request)
            .await
            .with_context(|| format!("agent '{}' failed on {}", self.profile.role, task.id))?;

        Ok(response.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{CompletionResponse, ProviderError};

    struct EchoProvider;

    #[async_trait]
    impl LlmProvider for EchoProvider {
        fn name(&self) -> &str {
            "echo"
        }

        async fn complete(
            &self,
            request: CompletionRequest,
        ) -> Result<CompletionResponse, ProviderError> {
            Ok(CompletionResponse {
                content: request.messages.last().unwrap().content.clone(),
                model: request.model,
                usage: None,
            })
        }
    }

    fn profile() -> AgentProfile {
        AgentProfile {
            role: "Senior Software Developer".to_string(),
            goal: "Write maintainable code".to_string(),
            backstory: "Ten years of shipping production systems.".to_string(),
        }
    }

    #[tokio::test]
    async fn test_execute_sends_task_and_context() {
        let agent = LlmAgent::new(profile(), Arc::new(EchoProvider), "gemma3:latest", 0.1);
        let task = TaskSpec::new("Review the code", "A detailed review")
            .with_context("fn add(a: i32, b: i32) -> i32 { a + b }");

        let output = agent.execute(&task).await.unwrap();
        assert!(output.starts_with("Review the code"));
        assert!(output.contains("fn add(a: i32, b: i32)"));
        assert!(output.contains("Expected output: A detailed review"));
    }

    #[test]
    fn test_system_prompt_carries_persona() {
        let agent = LlmAgent::new(profile(), Arc::new(EchoProvider), "gemma3:latest", 0.1);
        let prompt = agent.system_prompt();
        assert!(prompt.contains("Senior Software Developer"));
        assert!(prompt.contains("Write maintainable code"));
    }
}
