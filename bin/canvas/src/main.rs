//! Command-line host for flowdeck workflow canvases.
//!
//! Loads configuration from `FLOWDECK__*` environment variables, stores
//! workflows as JSON files and talks to the execution and agent catalog
//! services over HTTP.

mod commands;
mod error;

use clap::{Parser, Subcommand};
use error::CliError;
use flowdeck_remote::{FileWorkflowStore, HttpAgentCatalog, HttpExecutionClient, RemoteConfig};
use flowdeck_workflow::{AgentCatalog, LayoutDirection, StaticAgentCatalog};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Edit, lay out and run flowdeck workflows
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Workflow directory (overrides FLOWDECK__STORE__DIRECTORY)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a workflow containing a single trigger node
    New {
        name: String,
        /// Shown next to the workflow in listings
        #[arg(long)]
        description: Option<String>,
    },
    /// List stored workflows
    List,
    /// Check a stored workflow's graph
    Validate { name: String },
    /// Auto-layout a stored workflow and save the new positions
    Layout {
        name: String,
        /// TB, BT, LR or RL (defaults to FLOWDECK__LAYOUT__DIRECTION)
        #[arg(long, short)]
        direction: Option<LayoutDirection>,
    },
    /// List the node palette
    Agents {
        /// Use the built-in palette instead of the catalog service
        #[arg(long)]
        builtin: bool,
    },
    /// Submit a stored workflow to the execution service
    Execute { name: String },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            tracing::error!(error = %err, "command failed");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode, CliError> {
    let config = RemoteConfig::from_env()?;
    tracing::debug!(?config, "loaded configuration");
    let store = FileWorkflowStore::new(cli.store.unwrap_or(config.store.directory.clone()));

    let output = match cli.command {
        Command::New { name, description } => {
            commands::create(&store, &name, description.as_deref()).await?
        }
        Command::List => commands::list(&store).await?,
        Command::Validate { name } => commands::validate(&store, &name).await?,
        Command::Layout { name, direction } => {
            let mut options = config.layout.options();
            if let Some(direction) = direction {
                options = options.with_direction(direction);
            }
            commands::layout(&store, &name, options).await?
        }
        Command::Agents { builtin } => {
            let catalog: Box<dyn AgentCatalog> = if builtin {
                Box::new(StaticAgentCatalog::builtin())
            } else {
                Box::new(HttpAgentCatalog::new(&config.catalog)?)
            };
            commands::agents(catalog.as_ref()).await?
        }
        Command::Execute { name } => {
            let executor = HttpExecutionClient::new(&config.execution)?;
            let (output, success) = commands::execute(&store, &executor, &name).await?;
            println!("{output}");
            return Ok(if success {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            });
        }
    };
    print!("{output}");
    if !output.ends_with('\n') {
        println!();
    }
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_layout_direction() {
        let cli = Cli::try_parse_from(["flowdeck-canvas", "layout", "daily", "-d", "lr"])
            .expect("parse");
        match cli.command {
            Command::Layout { name, direction } => {
                assert_eq!(name, "daily");
                assert_eq!(direction, Some(LayoutDirection::LeftToRight));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_new_with_description() {
        let cli = Cli::try_parse_from([
            "flowdeck-canvas",
            "new",
            "daily",
            "--description",
            "morning digest",
        ])
        .expect("parse");
        match cli.command {
            Command::New { name, description } => {
                assert_eq!(name, "daily");
                assert_eq!(description.as_deref(), Some("morning digest"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_direction() {
        assert!(
            Cli::try_parse_from(["flowdeck-canvas", "layout", "daily", "-d", "diagonal"]).is_err()
        );
    }

    #[test]
    fn store_override_is_global() {
        let cli = Cli::try_parse_from(["flowdeck-canvas", "list", "--store", "/tmp/wf"])
            .expect("parse");
        assert_eq!(cli.store, Some(PathBuf::from("/tmp/wf")));
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
