//! Nodeflow CLI - run graph documents against the built-in nodes.
//!
//! Set RUST_LOG=debug to see per-node progress.

mod commands;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

/// Run and inspect Nodeflow graph documents.
#[derive(Parser)]
#[command(name = "nodeflow")]
#[command(author, version, about, long_about = None)]
#[command(after_help = r#"Environment variables:
  OPENAI_API_KEY          API key for textCompletion nodes
  NODEFLOW_PROVIDER_URL   OpenAI-compatible base URL (default: https://api.openai.com/v1)
  NODEFLOW_MODEL          Completion model (default: o4-mini)"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a graph document and print the report as JSON
    Run {
        /// Path to the graph document
        graph: PathBuf,

        /// JSON file mapping source node names to their initial inputs
        #[arg(short, long, value_name = "FILE")]
        inputs: Option<PathBuf>,

        /// Initial input for one node, as NODE=JSON (repeatable)
        #[arg(long = "input", value_name = "NODE=JSON")]
        input: Vec<String>,

        /// Node whose output to report (repeatable)
        #[arg(short, long = "sink", value_name = "NODE")]
        sinks: Vec<String>,

        /// Authenticated user id for record nodes
        #[arg(short, long)]
        user: Option<String>,

        /// Maximum number of nodes running at once
        #[arg(long, value_name = "N")]
        max_concurrency: Option<usize>,
    },

    /// Check a graph document and print its execution order
    Validate {
        /// Path to the graph document
        graph: PathBuf,
    },

    /// List the built-in nodes with their kinds and schemas
    Nodes,
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            graph,
            inputs,
            input,
            sinks,
            user,
            max_concurrency,
        } => {
            let options = commands::RunOptions {
                graph,
                inputs_file: inputs,
                inline_inputs: input,
                sinks,
                user,
                max_concurrency,
            };
            commands::run(options).await
        }
        Commands::Validate { graph } => commands::validate(&graph),
        Commands::Nodes => commands::nodes(),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(2);
        }
    }
}
