use anyhow::Context;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde_json::Value;

use crate::cli::config::CliConfig;

/// Thin HTTP client that strips the `{"success", "data"}` envelope
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn from_config(config: &CliConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.server_url.clone(),
            token: config.token.clone(),
        }
    }

    /// Fail early instead of sending a request the server will reject
    pub fn authenticated(config: &CliConfig) -> anyhow::Result<Self> {
        if config.token.is_none() {
            anyhow::bail!("Not logged in. Run `calc auth login <email>` first");
        }
        Ok(Self::from_config(config))
    }

    pub async fn get(&self, path: &str) -> anyhow::Result<Value> {
        self.send(self.request(Method::GET, path)).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> anyhow::Result<Value> {
        self.send(self.request(Method::POST, path).json(body)).await
    }

    pub async fn patch(&self, path: &str, body: &Value) -> anyhow::Result<Value> {
        self.send(self.request(Method::PATCH, path).json(body)).await
    }

    pub async fn delete(&self, path: &str) -> anyhow::Result<()> {
        self.send(self.request(Method::DELETE, path)).await?;
        Ok(())
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let request = self.http.request(method, format!("{}{}", self.base_url, path));
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> anyhow::Result<Value> {
        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to reach server at {}", self.base_url))?;

        let status = response.status();
        if status == StatusCode::NO_CONTENT {
            return Ok(Value::Null);
        }

        let body: Value = response
            .json()
            .await
            .with_context(|| format!("Server returned a non-JSON response ({})", status))?;

        unwrap_envelope(status, body)
    }
}

fn unwrap_envelope(status: StatusCode, mut body: Value) -> anyhow::Result<Value> {
    if status.is_success() && body["success"] == Value::Bool(true) {
        return Ok(body["data"].take());
    }

    let message = body["message"]
        .as_str()
        .or_else(|| body["error"].as_str())
        .unwrap_or("request failed");

    match body["field_errors"].as_object() {
        Some(fields) if !fields.is_empty() => {
            let details: Vec<String> = fields
                .iter()
                .map(|(field, error)| format!("{}: {}", field, error.as_str().unwrap_or_default()))
                .collect();
            anyhow::bail!("{} ({}) [{}]", message, status.as_u16(), details.join(", "))
        }
        _ => anyhow::bail!("{} ({})", message, status.as_u16()),
    }
}
