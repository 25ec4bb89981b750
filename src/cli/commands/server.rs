use clap::Subcommand;
use serde_json::json;

use crate::cli::config::{load_config, ping_server, save_config, ServerStatus};
use crate::cli::utils::{output_error, output_success};
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum ServerCommands {
    #[command(about = "Point the CLI at a server (clears any saved login)")]
    Set {
        #[arg(help = "Server URL, e.g. http://localhost:3000")]
        url: String,
    },

    #[command(about = "Show the configured server")]
    Show,

    #[command(about = "Health check the configured server")]
    Ping,
}

pub async fn handle(cmd: ServerCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        ServerCommands::Set { url } => {
            let mut config = load_config()?;
            config.set_server(&url)?;
            save_config(&config)?;

            output_success(
                &output_format,
                &format!("Server set to {}", config.server_url),
                Some(json!({ "server_url": config.server_url })),
            )
        }
        ServerCommands::Show => {
            let config = load_config()?;
            match output_format {
                OutputFormat::Json => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&json!({
                            "server_url": config.server_url,
                            "status": config.status,
                            "last_ping": config.last_ping,
                            "logged_in_as": config.email,
                        }))?
                    );
                }
                OutputFormat::Text => {
                    println!("Server: {}", config.server_url);
                    println!("Status: {:?}", config.status);
                    if let Some(email) = &config.email {
                        println!("Logged in as: {}", email);
                    }
                }
            }
            Ok(())
        }
        ServerCommands::Ping => {
            let mut config = load_config()?;
            let status = ping_server(&config.server_url).await;
            config.update_ping(status.clone());
            save_config(&config)?;

            if status == ServerStatus::Up {
                output_success(
                    &output_format,
                    &format!("{} is up", config.server_url),
                    Some(json!({ "status": status })),
                )
            } else {
                output_error(&output_format, &format!("{} is not responding", config.server_url))?;
                anyhow::bail!("server unreachable")
            }
        }
    }
}
