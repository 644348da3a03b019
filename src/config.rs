use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::agents::AgentProfile;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub ollama_base_url: String,
    pub model_name: String,
    pub temperature: f32,
    pub output_dir: PathBuf,
    pub agents: AgentConfigs,
    pub tasks: TaskTemplates,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfigs {
    pub developer: AgentProfile,
    pub reviewer: AgentProfile,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskTemplates {
    pub development: TaskTemplate,
    pub review: TaskTemplate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskTemplate {
    pub description: String,
    pub expected_output: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ollama_base_url: "http://localhost:11434".to_string(),
            model_name: "gemma3:latest".to_string(),
            // Lower temperature for more deterministic code generation
            temperature: 0.1,
            output_dir: PathBuf::from("output"),
            agents: AgentConfigs::default(),
            tasks: TaskTemplates::default(),
        }
    }
}

impl Default for AgentConfigs {
    fn default() -> Self {
        Self {
            developer: AgentProfile {
                role: "Senior Software Developer".to_string(),
                goal: "Write high-quality, efficient, and maintainable code following best practices"
                    .to_string(),
                backstory: "You are a senior software engineer with 10+ years of experience \
                            across multiple programming languages and frameworks. You excel at \
                            architectural decisions, clean code principles, and creating scalable \
                            solutions. You always write well-documented, production-ready code."
                    .to_string(),
            },
            reviewer: AgentProfile {
                role: "Code Review Specialist".to_string(),
                goal: "Ensure code quality, security, and adherence to best practices".to_string(),
                backstory: "You are a meticulous code reviewer with expertise in multiple \
                            programming languages, security vulnerabilities, and software \
                            architecture patterns. You focus on maintainability, performance, \
                            and code quality. You provide constructive feedback and suggest \
                            improvements."
                    .to_string(),
            },
        }
    }
}

impl Default for TaskTemplates {
    fn default() -> Self {
        Self {
            development: TaskTemplate {
                description: "Develop high-quality, production-ready code based on the requirements"
                    .to_string(),
                expected_output:
                    "Complete, well-documented code with proper structure and error handling"
                        .to_string(),
            },
            review: TaskTemplate {
                description: "Review the code for quality, security, and best practices".to_string(),
                expected_output:
                    "Detailed code review with specific suggestions and improvements".to_string(),
            },
        }
    }
}

impl Config {
    /// Load the config file, creating it with defaults on first run, then
    /// apply environment overrides.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_file_path()?;

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            let default_config = Self::default();
            default_config.save()?;
            default_config
        };

        if let Ok(base_url) = std::env::var("OLLAMA_BASE_URL") {
            config.ollama_base_url = base_url;
        }
        if let Ok(model) = std::env::var("MODEL_NAME") {
            config.model_name = model;
        }

        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_file_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    fn config_file_path() -> Result<PathBuf> {
        let home =
            dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Could not find home directory"))?;
        Ok(home.join(".config").join("devcrew").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_local_ollama_setup() {
        let config = Config::default();
        assert_eq!(config.ollama_base_url, "http://localhost:11434");
        assert_eq!(config.model_name, "gemma3:latest");
        assert_eq!(config.output_dir, PathBuf::from("output"));
        assert_eq!(config.agents.developer.role, "Senior Software Developer");
        assert_eq!(config.agents.reviewer.role, "Code Review Specialist");
    }

    #[test]
    fn test_config_round_trips_through_toml() {
        let config = Config::default();
        let serialized = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&serialized).unwrap();

        assert_eq!(parsed.model_name, config.model_name);
        assert_eq!(parsed.tasks.review.description, config.tasks.review.description);
    }
}
