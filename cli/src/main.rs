//! Synod CLI - Command Line Interface

use clap::{Parser, Subcommand};
use colored::Colorize;
use synod_cli::{ApiClient, ApiError, ProposeRequest};

#[derive(Parser)]
#[command(name = "synod")]
#[command(about = "Synod - single-decree consensus client")]
#[command(version)]
struct Cli {
    /// Node URL
    #[arg(short, long, default_value = "http://127.0.0.1:8080")]
    node: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Propose a value
    Propose {
        /// Value to propose
        value: String,

        /// Minimum proposal round
        #[arg(short = 'p', long)]
        number: Option<u64>,
    },

    /// Node status
    Status,

    /// Per-acceptor state
    Acceptors {
        /// Print raw JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that the node is up
    Health,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let api_client = ApiClient::new(&cli.node)?;

    match cli.command {
        Commands::Propose { value, number } => {
            let req = ProposeRequest {
                proposal_number: number,
                value,
            };

            match api_client.propose(&req).await {
                Ok(decided) => {
                    println!("{} Consensus reached: {}", "✔".green(), decided.value.bold());
                    println!("Proposal: {}", decided.proposal_number);
                    println!("Attempts: {}", decided.attempts);
                }
                Err(ApiError::Conflict { attempts, reason }) => {
                    eprintln!(
                        "{} Consensus not reached ({}, {} attempts)",
                        "✘".red(),
                        reason,
                        attempts
                    );
                    std::process::exit(2);
                }
                Err(e) => {
                    eprintln!("{} {}", "Error:".red(), e);
                    std::process::exit(1);
                }
            }
        }

        Commands::Status => match api_client.status().await {
            Ok(status) => {
                println!("{}", "Synod Node Status".bold());
                println!("=================");
                println!("Name:          {}", status.name);
                println!("Node ID:       {}", status.node_id);
                println!("Acceptors:     {}", status.acceptor_count);
                println!("Quorum:        {}", status.quorum);
                println!("Attempts:      {}", status.stats.attempts);
                println!("Decided:       {}", status.stats.decided);
                println!("Exhausted:     {}", status.stats.exhausted);
                println!("Cancelled:     {}", status.stats.cancelled);
                match status.stats.last_decision {
                    Some(decision) => println!(
                        "Last decision: {} @ {}",
                        decision.value.green(),
                        decision.number
                    ),
                    None => println!("Last decision: {}", "none".dimmed()),
                }
            }
            Err(e) => {
                eprintln!("{} {}", "Error:".red(), e);
                std::process::exit(1);
            }
        },

        Commands::Acceptors { json } => {
            let acceptors = api_client.acceptors().await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&acceptors)?);
            } else {
                println!("{:<10} {:<14} {}", "Acceptor", "Promised", "Accepted");
                println!("{:-<10} {:-<14} {:-<24}", "", "", "");
                for a in acceptors {
                    let promised = a
                        .highest_promised
                        .map(|n| n.to_string())
                        .unwrap_or_else(|| "-".into());
                    let accepted = a
                        .accepted
                        .map(|p| format!("{} @ {}", p.value, p.number))
                        .unwrap_or_else(|| "-".into());
                    println!("{:<10} {:<14} {}", a.id.to_string(), promised, accepted);
                }
            }
        }

        Commands::Health => {
            if api_client.health().await? {
                println!("{}", "ok".green());
            } else {
                println!("{}", "unhealthy".red());
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
