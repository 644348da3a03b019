use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::agents::{Agent, TaskSpec};
use crate::config::TaskTemplates;

/// Record of one completed stage, kept for the saved project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageOutcome {
    pub name: String,
    pub agent_role: String,
    pub description: String,
    pub output: String,
}

/// The result of a full run. `result` is the final stage's output verbatim.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub project_name: String,
    pub stages: Vec<StageOutcome>,
    pub result: String,
}

/// Development then Review, strictly in that order. Each stage's agent is an
/// injected capability; any invocation failure aborts the run with nothing
/// persisted.
pub struct TaskPipeline {
    developer: Arc<dyn Agent>,
    reviewer: Arc<dyn Agent>,
    tasks: TaskTemplates,
}

impl TaskPipeline {
    pub fn new(developer: Arc<dyn Agent>, reviewer: Arc<dyn Agent>, tasks: TaskTemplates) -> Self {
        Self {
            developer,
            reviewer,
            tasks,
        }
    }

    pub async fn run(&self, requirements: &str, project_name: &str) -> Result<PipelineRun> {
        let development = TaskSpec::new(
            format!(
                "{}\n\nProject: {}\n\nRequirements:\n{}",
                self.tasks.development.description, project_name, requirements
            ),
            self.tasks.development.expected_output.clone(),
        );

        info!(stage = "development", agent = self.developer.role(), "running stage");
        let development_output = self
            .developer
            .execute(&development)
            .await
            .context("development stage failed")?;

        let review = TaskSpec::new(
            format!(
                "{}\n\nProject: {}",
                self.tasks.review.description, project_name
            ),
            self.tasks.review.expected_output.clone(),
        )
        .with_context(development_output.clone());

        info!(stage = "review", agent = self.reviewer.role(), "running stage");
        let review_output = self
            .reviewer
            .execute(&review)
            .await
            .context("review stage failed")?;

        Ok(PipelineRun {
            project_name: project_name.to_string(),
            result: review_output.clone(),
            stages: vec![
                StageOutcome {
                    name: "development".to_string(),
                    agent_role: self.developer.role().to_string(),
                    description: development.description,
                    output: development_output,
                },
                StageOutcome {
                    name: "review".to_string(),
                    agent_role: self.reviewer.role().to_string(),
                    description: review.description,
                    output: review_output,
                },
            ],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Returns a canned response and records every task it sees.
    struct ScriptedAgent {
        role: String,
        response: String,
        seen: Mutex<Vec<TaskSpec>>,
    }

    impl ScriptedAgent {
        fn new(role: &str, response: &str) -> Arc<Self> {
            Arc::new(Self {
                role: role.to_string(),
                response: response.to_string(),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Agent for ScriptedAgent {
        fn role(&self) -> &str {
            &self.role
        }

        async fn execute(&self, task: &TaskSpec) -> Result<String> {
            self.seen.lock().unwrap().push(task.clone());
            Ok(self.response.clone())
        }
    }

    struct FailingAgent;

    #[async_trait]
    impl Agent for FailingAgent {
        fn role(&self) -> &str {
            "Broken"
        }

        async fn execute(&self, _task: &TaskSpec) -> Result<String> {
            Err(anyhow!("model unavailable"))
        }
    }

    #[tokio::test]
    async fn test_review_runs_after_development_with_its_output() {
        let developer = ScriptedAgent::new("Senior Software Developer", "the implementation");
        let reviewer = ScriptedAgent::new("Code Review Specialist", "the review");
        let pipeline = TaskPipeline::new(
            developer.clone(),
            reviewer.clone(),
            TaskTemplates::default(),
        );

        let run = pipeline.run("build a calculator", "calc").await.unwrap();

        let dev_tasks = developer.seen.lock().unwrap();
        assert_eq!(dev_tasks.len(), 1);
        assert!(dev_tasks[0].description.contains("build a calculator"));
        assert!(dev_tasks[0].description.contains("calc"));
        assert!(dev_tasks[0].context.is_none());

        let review_tasks = reviewer.seen.lock().unwrap();
        assert_eq!(review_tasks.len(), 1);
        assert_eq!(review_tasks[0].context.as_deref(), Some("the implementation"));

        assert_eq!(run.result, "the review");
        assert_eq!(run.stages.len(), 2);
        assert_eq!(run.stages[0].name, "development");
        assert_eq!(run.stages[0].output, "the implementation");
        assert_eq!(run.stages[1].name, "review");
    }

    #[tokio::test]
    async fn test_development_failure_aborts_before_review() {
        let reviewer = ScriptedAgent::new("Code Review Specialist", "the review");
        let pipeline = TaskPipeline::new(
            Arc::new(FailingAgent),
            reviewer.clone(),
            TaskTemplates::default(),
        );

        let err = pipeline.run("anything", "doomed").await.unwrap_err();
        assert!(err.to_string().contains("development stage failed"));
        assert!(reviewer.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_review_failure_is_terminal() {
        let developer = ScriptedAgent::new("Senior Software Developer", "the implementation");
        let pipeline = TaskPipeline::new(
            developer,
            Arc::new(FailingAgent),
            TaskTemplates::default(),
        );

        let err = pipeline.run("anything", "doomed").await.unwrap_err();
        assert!(err.to_string().contains("review stage failed"));
    }
}
