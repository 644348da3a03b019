use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use chrono::Local;
use tracing::{info, warn};

use crate::agents::{Agent, LlmAgent};
use crate::config::{Config, TaskTemplates};
use crate::extract::ArtifactExtractor;
use crate::pipeline::TaskPipeline;
use crate::project::{
    ProjectDescriptor, ProjectDetails, ProjectMetadata, ProjectStore, StoreError,
};
use crate::providers::{LlmProvider, OllamaProvider};

/// One explicitly constructed system instance: the pipeline, the extractor
/// and the store, with agent capabilities injected at build time.
pub struct Orchestrator {
    pipeline: TaskPipeline,
    extractor: ArtifactExtractor,
    store: ProjectStore,
    model_used: String,
    agent_roles: Vec<String>,
}

impl Orchestrator {
    /// Build the default developer/reviewer pair against the configured
    /// Ollama endpoint.
    pub fn new(config: &Config) -> Result<Self> {
        let provider: Arc<dyn LlmProvider> =
            Arc::new(OllamaProvider::new(&config.ollama_base_url)?);

        let developer = Arc::new(LlmAgent::new(
            config.agents.developer.clone(),
            provider.clone(),
            &config.model_name,
            config.temperature,
        ));
        let reviewer = Arc::new(LlmAgent::new(
            config.agents.reviewer.clone(),
            provider,
            &config.model_name,
            config.temperature,
        ));

        Ok(Self::with_agents(
            developer,
            reviewer,
            config.tasks.clone(),
            config.output_dir.clone(),
            &config.model_name,
        ))
    }

    /// Assemble an orchestrator from explicit capabilities.
    pub fn with_agents(
        developer: Arc<dyn Agent>,
        reviewer: Arc<dyn Agent>,
        tasks: TaskTemplates,
        output_dir: PathBuf,
        model_used: &str,
    ) -> Self {
        let agent_roles = vec![
            developer.role().to_string(),
            reviewer.role().to_string(),
        ];

        Self {
            pipeline: TaskPipeline::new(developer, reviewer, tasks),
            extractor: ArtifactExtractor::new(),
            store: ProjectStore::new(output_dir),
            model_used: model_used.to_string(),
            agent_roles,
        }
    }

    /// Run the two-stage pipeline for `requirements` and persist the outcome
    /// as a named project. Nothing is written unless both stages succeed.
    pub async fn create_project(
        &self,
        requirements: &str,
        project_name: Option<String>,
    ) -> Result<ProjectDescriptor> {
        // Second-resolution names can collide when two unnamed runs start in
        // the same second; the later save wins.
        let project_name = project_name
            .unwrap_or_else(|| format!("project_{}", Local::now().format("%Y%m%d_%H%M%S")));

        info!(project = %project_name, "starting project");

        let run = self.pipeline.run(requirements, &project_name).await?;
        let artifacts = self.extractor.extract(&run.result, &project_name);

        let report = self.store.create(
            &project_name,
            requirements,
            &run.result,
            &artifacts,
            &self.model_used,
            &self.agent_roles,
        )?;

        let failed = report.failed_files();
        if !failed.is_empty() {
            warn!(project = %project_name, ?failed, "project saved with missing files");
        }

        info!(project = %project_name, dir = %report.descriptor.project_dir.display(), "project completed");
        Ok(report.descriptor)
    }

    pub fn list_projects(&self) -> Result<Vec<ProjectMetadata>, StoreError> {
        self.store.list()
    }

    pub fn project_details(&self, project_name: &str) -> Result<ProjectDetails, StoreError> {
        self.store.details(project_name)
    }

    pub fn delete_project(&self, project_name: &str) -> Result<bool, StoreError> {
        self.store.delete(project_name)
    }
}
