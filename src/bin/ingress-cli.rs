use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::Value;

use ingress_node::ingress::OpenOrderRequest;

#[derive(Parser)]
#[command(name = "ingress-cli")]
#[command(about = "Client for an ingress node's public API", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:18514")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show node identity, contracts and bootstrap result
    Status,
    /// List known overlay peers
    Peers,
    /// Submit an order read from a JSON file
    SubmitOrder {
        #[arg(short, long)]
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Status => {
            let res = client.get(format!("{}/status", cli.url)).send().await?;
            print_response(res).await?;
        }
        Commands::Peers => {
            let res = client.get(format!("{}/peers", cli.url)).send().await?;
            print_response(res).await?;
        }
        Commands::SubmitOrder { file } => {
            let content = std::fs::read_to_string(&file)?;
            let order: OpenOrderRequest = serde_json::from_str(&content)?;
            order.validate()?;

            let res = client
                .post(format!("{}/orders", cli.url))
                .json(&order)
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: node returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
