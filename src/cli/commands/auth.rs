use anyhow::Context;
use clap::Subcommand;
use serde_json::json;

use crate::cli::client::ApiClient;
use crate::cli::config::{load_config, save_config};
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Create an account and log in")]
    Register {
        #[arg(help = "Email")]
        email: String,
        #[arg(long, help = "Password (falls back to CALC_PASSWORD)")]
        password: Option<String>,
    },

    #[command(about = "Log in and store the access token")]
    Login {
        #[arg(help = "Email")]
        email: String,
        #[arg(long, help = "Password (falls back to CALC_PASSWORD)")]
        password: Option<String>,
    },

    #[command(about = "Forget the stored access token")]
    Logout,

    #[command(about = "Show current user information")]
    Whoami,
}

pub async fn handle(cmd: AuthCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        AuthCommands::Register { email, password } => {
            acquire_token("/auth/register", email, password, "Registered", &output_format).await
        }
        AuthCommands::Login { email, password } => {
            acquire_token("/auth/login", email, password, "Logged in", &output_format).await
        }
        AuthCommands::Logout => {
            let mut config = load_config()?;
            config.clear_session();
            save_config(&config)?;
            output_success(&output_format, "Logged out", None)
        }
        AuthCommands::Whoami => {
            let config = load_config()?;
            let user = ApiClient::authenticated(&config)?.get("/api/auth/whoami").await?;

            match output_format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&user)?),
                OutputFormat::Text => {
                    println!("Username: {}", user["username"].as_str().unwrap_or_default());
                    println!("Email: {}", user["email"].as_str().unwrap_or_default());
                    println!("Server: {}", config.server_url);
                }
            }
            Ok(())
        }
    }
}

async fn acquire_token(
    path: &str,
    email: String,
    password: Option<String>,
    verb: &str,
    output_format: &OutputFormat,
) -> anyhow::Result<()> {
    let password = resolve_password(password)?;
    let mut config = load_config()?;

    let token = ApiClient::from_config(&config)
        .post(path, &json!({ "email": email, "password": password }))
        .await?;
    let access_token = token["access_token"]
        .as_str()
        .context("Server response did not include an access token")?
        .to_string();

    config.set_session(email.clone(), access_token);
    save_config(&config)?;

    output_success(
        output_format,
        &format!("{} as {}", verb, email),
        Some(json!({ "email": email, "server_url": config.server_url })),
    )
}

fn resolve_password(password: Option<String>) -> anyhow::Result<String> {
    password
        .or_else(|| std::env::var("CALC_PASSWORD").ok())
        .filter(|p| !p.is_empty())
        .context("Password required: pass --password or set CALC_PASSWORD")
}
