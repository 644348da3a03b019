use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset, Local};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::extract::Artifact;

pub const METADATA_FILE: &str = "metadata.json";
pub const RESULT_FILE: &str = "result.txt";
pub const SUMMARY_FILE: &str = "PROJECT_README.md";

const UNKNOWN: &str = "Unknown";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("project '{0}' not found")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("metadata error: {0}")]
    Metadata(#[from] serde_json::Error),
}

/// Snapshot of a project's identifying attributes; the source of truth for
/// list and show.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectMetadata {
    pub project_name: String,
    pub timestamp: String,
    pub requirements: String,
    pub model_used: String,
    pub agents: Vec<String>,
    pub project_dir: String,
}

impl ProjectMetadata {
    /// Stand-in record for a directory whose metadata is missing or corrupt.
    fn placeholder(project_name: &str, project_dir: &Path) -> Self {
        Self {
            project_name: project_name.to_string(),
            timestamp: UNKNOWN.to_string(),
            requirements: UNKNOWN.to_string(),
            model_used: UNKNOWN.to_string(),
            agents: vec![UNKNOWN.to_string()],
            project_dir: project_dir.display().to_string(),
        }
    }
}

/// What `create` hands back to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectDescriptor {
    pub project_name: String,
    pub project_dir: PathBuf,
    pub requirements: String,
    pub result: String,
}

#[derive(Debug, Clone)]
pub struct ProjectDetails {
    pub metadata: Option<ProjectMetadata>,
    pub result: String,
    pub files: Vec<String>,
    pub project_dir: PathBuf,
}

/// Outcome of one file write during a save.
#[derive(Debug)]
pub struct WriteOutcome {
    pub file: String,
    pub result: Result<(), String>,
}

/// Per-file report of a best-effort save. A failed artifact write does not
/// abort the save; it shows up here and in the logs.
#[derive(Debug)]
pub struct SaveReport {
    pub descriptor: ProjectDescriptor,
    pub writes: Vec<WriteOutcome>,
}

impl SaveReport {
    pub fn failed_files(&self) -> Vec<&str> {
        self.writes
            .iter()
            .filter(|w| w.result.is_err())
            .map(|w| w.file.as_str())
            .collect()
    }
}

/// Directory-per-project persistence under a single output root.
pub struct ProjectStore {
    root: PathBuf,
}

impl ProjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn project_dir(&self, project_name: &str) -> PathBuf {
        self.root.join(project_name)
    }

    /// Persist a completed pipeline run. Directory creation is fatal;
    /// everything after that is attempted per file.
    pub fn create(
        &self,
        project_name: &str,
        requirements: &str,
        result: &str,
        artifacts: &[Artifact],
        model_used: &str,
        agents: &[String],
    ) -> Result<SaveReport, StoreError> {
        let project_dir = self.project_dir(project_name);
        fs::create_dir_all(&project_dir)?;

        let metadata = ProjectMetadata {
            project_name: project_name.to_string(),
            timestamp: Local::now().to_rfc3339(),
            requirements: requirements.to_string(),
            model_used: model_used.to_string(),
            agents: agents.to_vec(),
            project_dir: project_dir.display().to_string(),
        };

        let mut writes = Vec::new();
        attempt_write(
            &mut writes,
            &project_dir,
            METADATA_FILE,
            &serde_json::to_string_pretty(&metadata)?,
        );
        attempt_write(&mut writes, &project_dir, RESULT_FILE, result);
        for artifact in artifacts {
            attempt_write(&mut writes, &project_dir, &artifact.name, &artifact.content);
        }
        attempt_write(
            &mut writes,
            &project_dir,
            SUMMARY_FILE,
            &render_summary(project_name, requirements, artifacts, &metadata),
        );

        info!(project = project_name, dir = %project_dir.display(), "project saved");

        Ok(SaveReport {
            descriptor: ProjectDescriptor {
                project_name: project_name.to_string(),
                project_dir,
                requirements: requirements.to_string(),
                result: result.to_string(),
            },
            writes,
        })
    }

    /// All known projects, newest first. A directory with unreadable or
    /// corrupt metadata is listed with a placeholder record instead of
    /// aborting the listing.
    pub fn list(&self) -> Result<Vec<ProjectMetadata>, StoreError> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut projects = Vec::new();
        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            let record = read_metadata(&path).unwrap_or_else(|| {
                warn!(project = %name, "metadata missing or corrupt, listing placeholder");
                ProjectMetadata::placeholder(&name, &path)
            });
            projects.push(record);
        }

        // Newest first; records without a parseable timestamp sort last.
        projects.sort_by(|a, b| {
            let (ka, kb) = (parse_timestamp(&a.timestamp), parse_timestamp(&b.timestamp));
            kb.cmp(&ka)
        });

        Ok(projects)
    }

    /// Whatever subset of the project is on disk. Only a missing directory
    /// is an error.
    pub fn details(&self, project_name: &str) -> Result<ProjectDetails, StoreError> {
        let project_dir = self.project_dir(project_name);
        if !project_dir.is_dir() {
            return Err(StoreError::NotFound(project_name.to_string()));
        }

        let metadata = read_metadata(&project_dir);
        let result = fs::read_to_string(project_dir.join(RESULT_FILE)).unwrap_or_default();

        let mut files = Vec::new();
        for entry in fs::read_dir(&project_dir)? {
            let entry = entry?;
            if entry.path().is_file() {
                files.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        files.sort();

        Ok(ProjectDetails {
            metadata,
            result,
            files,
            project_dir,
        })
    }

    /// Remove the project's whole subtree. A filesystem refusal is reported
    /// as `Ok(false)`, not an error.
    pub fn delete(&self, project_name: &str) -> Result<bool, StoreError> {
        let project_dir = self.project_dir(project_name);
        if !project_dir.is_dir() {
            return Err(StoreError::NotFound(project_name.to_string()));
        }

        match fs::remove_dir_all(&project_dir) {
            Ok(()) => {
                info!(project = project_name, "deleted project");
                Ok(true)
            }
            Err(e) => {
                warn!(project = project_name, error = %e, "failed to delete project");
                Ok(false)
            }
        }
    }
}

fn attempt_write(writes: &mut Vec<WriteOutcome>, dir: &Path, file: &str, content: &str) {
    let result = fs::write(dir.join(file), content).map_err(|e| e.to_string());
    match &result {
        Ok(()) => info!(file, "saved"),
        Err(reason) => warn!(file, %reason, "failed to write project file"),
    }
    writes.push(WriteOutcome {
        file: file.to_string(),
        result,
    });
}

fn read_metadata(project_dir: &Path) -> Option<ProjectMetadata> {
    let content = fs::read_to_string(project_dir.join(METADATA_FILE)).ok()?;
    serde_json::from_str(&content).ok()
}

fn parse_timestamp(timestamp: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(timestamp).ok()
}

fn render_summary(
    project_name: &str,
    requirements: &str,
    artifacts: &[Artifact],
    metadata: &ProjectMetadata,
) -> String {
    let mut file_list = String::new();
    for artifact in artifacts {
        file_list.push_str(&format!("- `{}`\n", artifact.name));
    }

    format!(
        "# {project_name}\n\n\
         ## Project Overview\n\
         This project was generated by the DevCrew multi-agent development pipeline.\n\n\
         ## Requirements\n\
         {requirements}\n\n\
         ## Generated Files\n\
         - `{RESULT_FILE}` - Complete agent output and review\n\
         - `{METADATA_FILE}` - Project metadata\n\
         {file_list}\n\
         ## How to Use\n\
         1. Review the generated files\n\
         2. Install any dependencies they mention\n\
         3. Run the application according to the code instructions\n\n\
         ## Generated by\n\
         {agents}\n\n\
         ## Model Used\n\
         {model}\n\n\
         Generated on: {timestamp}\n",
        agents = metadata
            .agents
            .iter()
            .map(|a| format!("- **{a}**"))
            .collect::<Vec<_>>()
            .join("\n"),
        model = metadata.model_used,
        timestamp = metadata.timestamp,
    )
}
