//! `rusty-automation-tool` CLI entry-point.
//!
//! Available sub-commands:
//! - `serve`    — start the API server.
//! - `validate` — validate a workflow JSON file.
//! - `import`   — convert an n8n export into an internal workflow.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;

#[derive(Parser)]
#[command(
    name = "rusty-automation-tool",
    about = "High-performance workflow automation engine",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the REST API server.
    Serve {
        #[arg(long, default_value = "0.0.0.0:8080")]
        bind: String,
        #[arg(long, default_value_t = 5)]
        max_parallel_nodes: usize,
    },
    /// Validate a workflow definition JSON file.
    Validate {
        /// Path to the workflow JSON file.
        path: std::path::PathBuf,
    },
    /// Convert an n8n workflow export into the internal workflow format.
    Import {
        /// Path to the n8n export JSON file.
        path: std::path::PathBuf,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve { bind, max_parallel_nodes } => {
            info!("Starting API server on {bind}");
            let registry = Arc::new(nodes::SkillRegistry::with_standard_skills());
            let runner = Arc::new(engine::WorkflowRunner::new(registry, engine::RunnerConfig { max_parallel_nodes }));
            let manager = Arc::new(engine::WorkflowManager::new(runner));
            api::serve(&bind, manager).await.unwrap();
        }
        Command::Validate { path } => {
            let content = std::fs::read_to_string(&path)
                .unwrap_or_else(|e| panic!("cannot read file {}: {e}", path.display()));

            let workflow: engine::Workflow = serde_json::from_str(&content)
                .unwrap_or_else(|e| panic!("invalid JSON: {e}"));

            let errors = engine::validate_workflow(&workflow);
            if errors.is_empty() {
                let order = engine::get_execution_order(&workflow).unwrap_or_default();
                println!("workflow is valid. execution order: {order:?}");
            } else {
                eprintln!("validation failed:");
                for error in &errors {
                    eprintln!("  - {error}");
                }
                std::process::exit(1);
            }
        }
        Command::Import { path } => match importer::convert_file(&path) {
            Ok(workflow) => {
                let json = serde_json::to_string_pretty(&workflow).expect("workflow always serializes");
                println!("{json}");
            }
            Err(e) => {
                eprintln!("import failed: {e}");
                std::process::exit(1);
            }
        },
    }
}
