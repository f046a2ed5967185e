//! HTTP client configuration and request helpers shared by all commands.

use super::error::CommandError;

use anyhow::Result;
use serde::de::DeserializeOwned;
use std::time::Duration;

pub const CONNECT_TIMEOUT_ENV: &str = "FLEET_CONNECT_TIMEOUT_MS";
pub const READ_TIMEOUT_ENV: &str = "FLEET_READ_TIMEOUT_MS";

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10 * 60);
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(90);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup. Unparseable values fall
    /// back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            connect_timeout: millis_or(&lookup, CONNECT_TIMEOUT_ENV, DEFAULT_CONNECT_TIMEOUT),
            read_timeout: millis_or(&lookup, READ_TIMEOUT_ENV, DEFAULT_READ_TIMEOUT),
        }
    }

    pub fn build(&self) -> Result<reqwest::Client> {
        let client = reqwest::Client::builder()
            .connect_timeout(self.connect_timeout)
            .read_timeout(self.read_timeout)
            .build()?;
        Ok(client)
    }
}

fn millis_or<F>(lookup: &F, key: &str, default: Duration) -> Duration
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => match raw.trim().parse::<u64>() {
            Ok(ms) => Duration::from_millis(ms),
            Err(e) => {
                tracing::warn!("Ignoring {}={}: {}", key, raw, e);
                default
            }
        },
        None => default,
    }
}

pub async fn get_json<T: DeserializeOwned>(
    client: &reqwest::Client,
    endpoint: &str,
) -> Result<T, CommandError> {
    let response = client
        .get(endpoint)
        .send()
        .await
        .map_err(|source| CommandError::Transport {
            endpoint: endpoint.to_string(),
            source,
        })?;

    let response = ensure_success(endpoint, response).await?;

    response
        .json::<T>()
        .await
        .map_err(|e| CommandError::Decode {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })
}

pub async fn post_text(client: &reqwest::Client, endpoint: &str) -> Result<String, CommandError> {
    let response = client
        .post(endpoint)
        .send()
        .await
        .map_err(|source| CommandError::Transport {
            endpoint: endpoint.to_string(),
            source,
        })?;

    let response = ensure_success(endpoint, response).await?;

    response.text().await.map_err(|e| CommandError::Decode {
        endpoint: endpoint.to_string(),
        reason: e.to_string(),
    })
}

async fn ensure_success(
    endpoint: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response, CommandError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(CommandError::Status {
        endpoint: endpoint.to_string(),
        status: status.as_u16(),
        body,
    })
}
