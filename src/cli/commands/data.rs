use anyhow::Context;
use clap::Subcommand;
use serde_json::{json, Map, Value};

use crate::cli::client::ApiClient;
use crate::cli::config::load_config;
use crate::cli::utils::{output_calculations, output_empty_collection, output_success};
use crate::cli::OutputFormat;

const COLLECTION: &str = "/api/calculations";

#[derive(Subcommand)]
pub enum DataCommands {
    #[command(about = "Create a calculation")]
    Create {
        #[arg(help = "First operand", allow_negative_numbers = true)]
        a: f64,
        #[arg(help = "Second operand", allow_negative_numbers = true)]
        b: f64,
        #[arg(help = "Operation: Add, Sub, Multiply or Divide")]
        kind: String,
    },

    #[command(about = "List your calculations")]
    List,

    #[command(about = "Show one calculation")]
    Get {
        #[arg(help = "Calculation ID")]
        id: i64,
    },

    #[command(about = "Change some fields of a calculation")]
    Update {
        #[arg(help = "Calculation ID")]
        id: i64,
        #[arg(long, allow_negative_numbers = true)]
        a: Option<f64>,
        #[arg(long, allow_negative_numbers = true)]
        b: Option<f64>,
        #[arg(long = "type", help = "Operation: Add, Sub, Multiply or Divide")]
        kind: Option<String>,
    },

    #[command(about = "Delete a calculation")]
    Delete {
        #[arg(help = "Calculation ID")]
        id: i64,
    },
}

pub async fn handle(cmd: DataCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let config = load_config()?;
    let client = ApiClient::authenticated(&config)?;

    match cmd {
        DataCommands::Create { a, b, kind } => {
            let created = client.post(COLLECTION, &json!({ "a": a, "b": b, "type": kind })).await?;
            output_calculations(&output_format, &[created])
        }
        DataCommands::List => {
            let listed = client.get(COLLECTION).await?;
            let calculations = listed.as_array().context("Expected a list of calculations")?;
            if calculations.is_empty() {
                return output_empty_collection(&output_format, "calculations", "No calculations yet");
            }
            output_calculations(&output_format, calculations)
        }
        DataCommands::Get { id } => {
            let calculation = client.get(&format!("{}/{}", COLLECTION, id)).await?;
            output_calculations(&output_format, &[calculation])
        }
        DataCommands::Update { id, a, b, kind } => {
            let patch = update_body(a, b, kind);
            if patch.is_empty() {
                anyhow::bail!("Nothing to update: pass at least one of --a, --b, --type");
            }
            let updated = client
                .patch(&format!("{}/{}", COLLECTION, id), &Value::Object(patch))
                .await?;
            output_calculations(&output_format, &[updated])
        }
        DataCommands::Delete { id } => {
            client.delete(&format!("{}/{}", COLLECTION, id)).await?;
            output_success(
                &output_format,
                &format!("Calculation {} deleted", id),
                Some(json!({ "id": id })),
            )
        }
    }
}

/// Only the flags that were given end up in the request body
fn update_body(a: Option<f64>, b: Option<f64>, kind: Option<String>) -> Map<String, Value> {
    let mut body = Map::new();
    if let Some(a) = a {
        body.insert("a".to_string(), json!(a));
    }
    if let Some(b) = b {
        body.insert("b".to_string(), json!(b));
    }
    if let Some(kind) = kind {
        body.insert("type".to_string(), json!(kind));
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_body_omits_absent_flags() {
        let body = update_body(None, Some(0.0), Some("Multiply".to_string()));
        assert_eq!(Value::Object(body), json!({"b": 0.0, "type": "Multiply"}));
        assert!(update_body(None, None, None).is_empty());
    }
}
