//! Synod Node Binary

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use synod_core::NodeConfig;
use synod_node::NodeBuilder;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "synod-node")]
#[command(about = "Synod Node - single-decree consensus service")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the node
    Run {
        /// Configuration file path (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// API listen address
        #[arg(long)]
        api_addr: Option<String>,

        /// Proposer identity
        #[arg(long)]
        node_id: Option<u32>,

        /// Number of in-process acceptors
        #[arg(long)]
        acceptors: Option<usize>,

        /// Retries after the first attempt
        #[arg(long)]
        retries: Option<u32>,

        /// Per-request deadline in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,
    },

    /// Print the default configuration
    Config {
        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            api_addr,
            node_id,
            acceptors,
            retries,
            timeout_ms,
        } => {
            let node_config = match config {
                Some(path) => {
                    let content = std::fs::read_to_string(&path)?;
                    NodeConfig::from_json(&content)?
                }
                None => NodeConfig::default(),
            };

            init_logging(&node_config.log_level);
            info!("Starting Synod node {}...", node_config.name);

            let mut builder = NodeBuilder::new().config(node_config);
            if let Some(addr) = api_addr {
                builder = builder.api_addr(&addr);
            }
            if let Some(id) = node_id {
                builder = builder.node_id(id);
            }
            if let Some(count) = acceptors {
                builder = builder.acceptors(count);
            }
            if let Some(retries) = retries {
                builder = builder.max_retries(retries);
            }
            if let Some(timeout_ms) = timeout_ms {
                builder = builder.request_timeout_ms(timeout_ms);
            }

            let node = builder.build()?;
            node.start().await?;
        }

        Commands::Config { output } => {
            let json = NodeConfig::default().to_json()?;

            match output {
                Some(path) => {
                    std::fs::write(&path, &json)?;
                    println!("Configuration saved to: {}", path.display());
                }
                None => {
                    println!("{}", json);
                }
            }
        }
    }

    Ok(())
}

/// `RUST_LOG` wins over the configured level
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
