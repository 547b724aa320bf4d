use std::path::PathBuf;

use clap::{Parser, Subcommand};
use reqwest::StatusCode;
use serde_json::Value;

use router_control::store::Configuration;

#[derive(Parser)]
#[command(name = "router-control-cli")]
#[command(about = "Management CLI for the router control daemon", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://127.0.0.1:3456")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the current configuration
    Config,
    /// Replace the configuration with the contents of a JSON file
    Save {
        /// Path to the JSON document to upload
        file: PathBuf,
    },
    /// List configured providers
    Providers,
    /// List registered transformers
    Transformers,
    /// Ask the daemon to restart itself
    Restart,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Config => {
            let res = client.get(format!("{}/api/config", cli.url)).send().await?;
            print_response(res).await?;
        }
        Commands::Save { file } => {
            let content = std::fs::read_to_string(&file)?;
            let body: Value = serde_json::from_str(&content)?;
            let res = client
                .post(format!("{}/api/config", cli.url))
                .json(&body)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Providers => {
            let res = client.get(format!("{}/api/config", cli.url)).send().await?;
            if !res.status().is_success() {
                return print_response(res).await;
            }
            let config: Configuration = res.json().await?;
            for provider in config.providers() {
                println!(
                    "{:<20} {:<40} {}",
                    provider.name,
                    provider.api_base_url,
                    provider.models.join(", ")
                );
            }
        }
        Commands::Transformers => {
            let res = client.get(format!("{}/api/transformers", cli.url)).send().await?;
            print_response(res).await?;
        }
        Commands::Restart => {
            let res = client.post(format!("{}/api/restart", cli.url)).send().await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        let text = res.text().await.unwrap_or_default();
        return Err(failure(status, &text).into());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

/// Error reported for a non-2xx reply; the process exits non-zero.
fn failure(status: StatusCode, body: &str) -> String {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string());
    format!("control API returned status {status}: {message}")
}
