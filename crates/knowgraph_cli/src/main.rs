//! Command-line entry point for the knowledge-graph core.
//!
//! # Responsibility
//! - Verify core linkage (`info`) and report the schema of a database file
//!   without migrating it (`schema`).
//! - Run the annotation pipeline over pre-tagged JSON documents.
//! - Print graph contents from a database file as JSON.

use clap::{Parser, Subcommand};
use knowgraph_core::nlp::annotate_tagged;
use knowgraph_core::{
    init_logging, inspect_schema, open_db, AttributeService, CoreConfig, GraphService,
    SqliteAttributeRepository, SqliteGraphRepository, TaggedText,
};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "knowgraph", version, about = "Knowledge graph store and text annotation")]
struct Cli {
    /// Database file; defaults to `db/graph.db`.
    #[arg(long, global = true, env = "KNOWLEDGE_DB_PATH")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print core version and health check.
    Info,
    /// Report the database's schema version and any pending steps.
    Schema,
    /// Extract candidates from a tagged JSON document and print the result.
    Annotate {
        /// Path to a JSON document shaped like `{"sentences": [{"tokens": [...]}]}`.
        tagged: PathBuf,
    },
    /// List all nodes.
    Nodes,
    /// List all relations with endpoint titles.
    Relations,
    /// Show direct and inherited possible attributes of a node.
    PossibleAttributes { node_id: Uuid },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let config = CoreConfig::from_env()?;
    if let Some(log_dir) = &config.log_dir {
        init_logging(config.log_level, log_dir)?;
    }
    let db_path = cli.db.unwrap_or(config.db_path);

    match cli.command {
        Command::Info => {
            println!("knowgraph_core ping={}", knowgraph_core::ping());
            println!("knowgraph_core version={}", knowgraph_core::core_version());
        }
        Command::Schema => {
            let status = inspect_schema(&db_path)?;
            println!("schema version={} latest={}", status.version, status.latest);
            if status.is_newer() {
                println!("schema status=newer_than_supported");
            } else if status.is_current() {
                println!("schema status=current");
            } else {
                println!("schema status=pending steps={}", status.pending.join(","));
            }
        }
        Command::Annotate { tagged } => {
            let raw = std::fs::read_to_string(&tagged)?;
            let document: TaggedText = serde_json::from_str(&raw)?;
            let annotation = annotate_tagged(&document)?;
            println!("{}", serde_json::to_string_pretty(&annotation)?);
        }
        Command::Nodes => {
            let conn = open_db(&db_path)?;
            let graph = GraphService::new(SqliteGraphRepository::try_new(&conn)?);
            println!("{}", serde_json::to_string_pretty(&graph.list_nodes()?)?);
        }
        Command::Relations => {
            let conn = open_db(&db_path)?;
            let graph = GraphService::new(SqliteGraphRepository::try_new(&conn)?);
            println!("{}", serde_json::to_string_pretty(&graph.list_relations()?)?);
        }
        Command::PossibleAttributes { node_id } => {
            let conn = open_db(&db_path)?;
            let attributes = AttributeService::new(SqliteAttributeRepository::try_new(&conn)?);
            let possible = attributes.possible_attributes(node_id)?;
            println!("{}", serde_json::to_string_pretty(&possible)?);
        }
    }
    log::debug!("event=cli_command module=cli status=ok");
    Ok(())
}
