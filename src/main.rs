use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use devcrew::{Config, Orchestrator};

#[derive(Parser)]
#[command(name = "devcrew", version, about = "Multi-agent software development pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a new project from a requirements description
    Create {
        /// What the agents should build
        requirements: String,

        /// Project name; derived from the current time when omitted
        #[arg(long)]
        name: Option<String>,
    },

    /// List completed projects, newest first
    List,

    /// Show the details of a project
    Show { name: String },

    /// Delete a project and all of its files
    Delete { name: String },

    /// Run a built-in example project
    Example,
}

const EXAMPLE_REQUIREMENTS: &str = "\
Create a Python web application with the following features:
1. RESTful API for user management (CRUD operations)
2. User authentication with JWT tokens
3. Database integration (SQLite for simplicity)
4. Input validation and error handling
5. API documentation
6. Unit tests
7. Docker configuration

The application should follow best practices for code organization,
security, performance, error handling and documentation.";

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;
    let orchestrator = Orchestrator::new(&config)?;

    match cli.command {
        Command::Create { requirements, name } => {
            create(&orchestrator, &requirements, name).await?;
        }
        Command::List => {
            let projects = orchestrator.list_projects()?;
            if projects.is_empty() {
                println!("No completed projects found.");
            }
            for (i, project) in projects.iter().enumerate() {
                println!("\n{}. {}", i + 1, project.project_name);
                println!("   📅 Created: {}", project.timestamp);
                println!("   🤖 Model: {}", project.model_used);
                println!("   📝 Requirements: {}", truncate(&project.requirements, 100));
            }
        }
        Command::Show { name } => {
            let details = orchestrator.project_details(&name)?;
            if let Some(metadata) = &details.metadata {
                println!("📅 Created: {}", metadata.timestamp);
                println!("🤖 Model: {}", metadata.model_used);
                println!("👥 Agents: {}", metadata.agents.join(", "));
                println!("\n📋 Requirements:\n{}", metadata.requirements);
            }
            println!("\n📦 Files: {}", details.files.join(", "));
            println!("\n📄 Result:\n{}", details.result);
        }
        Command::Delete { name } => {
            if orchestrator.delete_project(&name)? {
                println!("🗑️ Deleted project: {name}");
            } else {
                anyhow::bail!("could not delete project '{name}'");
            }
        }
        Command::Example => {
            create(&orchestrator, EXAMPLE_REQUIREMENTS, Some("example_user_management_api".to_string())).await?;
        }
    }

    Ok(())
}

async fn create(
    orchestrator: &Orchestrator,
    requirements: &str,
    name: Option<String>,
) -> Result<()> {
    println!("🚀 Creating project...");
    let descriptor = orchestrator.create_project(requirements, name).await?;
    println!("✅ Project completed: {}", descriptor.project_name);
    println!("📁 Project directory: {}", descriptor.project_dir.display());
    Ok(())
}

fn truncate(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        flat
    } else {
        let cut: String = flat.chars().take(max_chars).collect();
        format!("{cut}...")
    }
}
