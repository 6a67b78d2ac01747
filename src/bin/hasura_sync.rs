use clap::{Parser, Subcommand};
use hasura_sync::{
    client::HasuraClient, graph, runtime, HasuraSyncError, Result, Runtime, RuntimeConfig,
};
use log::{error, info};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "hasura-sync", version, about = "Derives and applies metadata-store configuration from a schema graph export")]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short = 'f', long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay the full graph against the metadata store
    Apply {
        /// Path to the schema graph JSON export
        #[arg(short, long, default_value = "schema/graph.json")]
        graph: PathBuf,

        /// Clear all store metadata instead of untracking graph tables
        #[arg(long)]
        clear_first: bool,

        /// Database schema override
        #[arg(short = 'n', long)]
        schema: Option<String>,

        /// Data source override
        #[arg(short = 'c', long)]
        source: Option<String>,
    },
    /// Write a complete metadata document without contacting a store
    Generate {
        /// Path to the schema graph JSON export
        #[arg(short, long, default_value = "schema/graph.json")]
        graph: PathBuf,

        /// Output file for the metadata document
        #[arg(short, long, default_value = "hasura/metadata.json")]
        output: PathBuf,

        /// Attach minimal open permissions for this role to every table
        #[arg(short, long)]
        role: Option<String>,

        /// Database schema override
        #[arg(short = 'n', long)]
        schema: Option<String>,

        /// Data source override
        #[arg(short = 'c', long)]
        source: Option<String>,
    },
    /// Clear all metadata on the store
    Reset,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_level = if cli.debug { "debug" } else { "info" };
    env_logger::init_from_env(env_logger::Env::default().default_filter_or(default_level));

    if let Err(error) = run(cli).await {
        error!("{}", error);
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = RuntimeConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Apply {
            graph,
            clear_first,
            schema,
            source,
        } => {
            if let Some(schema) = schema {
                config.schema = schema;
            }
            if let Some(source) = source {
                config.source = source;
            }

            let graph = graph::load_graph(&graph)?;
            let client = HasuraClient::new(&config)?;
            let runtime = Runtime::new(client, config);
            let summary = runtime
                .perform_full_metadata_transform(&graph, clear_first)
                .await?;

            if summary.batches_rejected > 0 || summary.batches_failed > 0 {
                return Err(HasuraSyncError::SyncIncomplete(format!(
                    "{} batches rejected, {} failed",
                    summary.batches_rejected, summary.batches_failed
                )));
            }
        }
        Commands::Generate {
            graph,
            output,
            role,
            schema,
            source,
        } => {
            if let Some(schema) = schema {
                config.schema = schema;
            }
            if let Some(source) = source {
                config.source = source;
            }

            let graph = graph::load_graph(&graph)?;
            let document =
                runtime::generate_metadata_document(&graph, &config, role.as_deref())?;

            if let Some(parent) = output.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&output, serde_json::to_string_pretty(&document)?)?;
            info!("wrote metadata document to {}", output.display());
        }
        Commands::Reset => {
            let client = HasuraClient::new(&config)?;
            let runtime = Runtime::new(client, config);
            runtime.clear_metadata().await?;
            info!("store metadata cleared");
        }
    }

    Ok(())
}
