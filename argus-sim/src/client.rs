use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use argus_core::{Command, SimWorld, Telemetry};

use crate::error::SimError;

/// Default per-call timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Header carrying the shared simulator secret.
const TOKEN_HEADER: &str = "X-Sim-Token";

/// HTTP client for the simulator. Cheap to clone; all clones share one
/// connection pool.
#[derive(Debug, Clone)]
pub struct SimClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

/// Builder for configuring a [`SimClient`].
#[derive(Debug)]
pub struct SimClientBuilder {
    base_url: String,
    timeout: Duration,
    token: Option<String>,
}

impl SimClientBuilder {
    /// Create a new builder for the given simulator base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            timeout: DEFAULT_TIMEOUT,
            token: None,
        }
    }

    /// Override the per-call timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the shared secret sent in the `X-Sim-Token` header.
    #[must_use]
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<SimClient, SimError> {
        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| SimError::Configuration(e.to_string()))?;
        Ok(SimClient {
            client,
            base_url: self.base_url,
            token: self.token,
        })
    }
}

impl SimClient {
    /// A client with default timeout and no token.
    pub fn new(base_url: impl Into<String>) -> Result<Self, SimError> {
        SimClientBuilder::new(base_url).build()
    }

    /// Fetch the static world definition.
    pub async fn get_world(&self) -> Result<SimWorld, SimError> {
        let value = self.get("/world").await?;
        serde_json::from_value(value).map_err(|e| SimError::Decode(e.to_string()))
    }

    /// Fetch the current telemetry snapshot.
    pub async fn get_telemetry(&self) -> Result<Telemetry, SimError> {
        let value = self.get("/telemetry").await?;
        serde_json::from_value(value).map_err(|e| SimError::Decode(e.to_string()))
    }

    /// Send a command for execution. Returns the simulator's raw response.
    pub async fn send_command(&self, command: &Command) -> Result<Value, SimError> {
        debug!(intent = %command.intent, "sending simulator command");
        let request = self
            .client
            .post(format!("{}/command", self.base_url))
            .json(command);
        let request = match &self.token {
            Some(token) => request.header(TOKEN_HEADER, token),
            None => request,
        };
        let response = request
            .send()
            .await
            .map_err(|e| SimError::Unreachable(e.to_string()))?;
        Self::read_json(response).await
    }

    async fn get(&self, path: &str) -> Result<Value, SimError> {
        let request = self.client.get(format!("{}{path}", self.base_url));
        let request = match &self.token {
            Some(token) => request.header(TOKEN_HEADER, token),
            None => request,
        };
        let response = request
            .send()
            .await
            .map_err(|e| SimError::Unreachable(e.to_string()))?;
        Self::read_json(response).await
    }

    async fn read_json(response: reqwest::Response) -> Result<Value, SimError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SimError::Status {
                status: status.as_u16(),
                body: body.chars().take(400).collect(),
            });
        }
        response
            .json()
            .await
            .map_err(|e| SimError::Decode(e.to_string()))
    }
}
