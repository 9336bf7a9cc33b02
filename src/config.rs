//! Global configuration parsing, validation, and credential loading.

use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;

use serde::Deserialize;
use tracing::warn;

use crate::webhook::dispatcher::WebhookSettings;
use crate::{AppError, Result};

const KEYRING_SERVICE: &str = "helpdesk-gateway";

/// Webhook endpoint configuration.
///
/// The signing secret is loaded at runtime via the OS keychain or an
/// environment variable, never from the TOML file.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct WebhookConfig {
    /// Base path that receives platform callbacks.
    #[serde(default = "default_base_path")]
    pub base_path: String,
    /// Optional mutual-TLS identity header name to enforce.
    #[serde(default)]
    pub identity_header: Option<String>,
    /// Shared signing secret (populated at runtime).
    #[serde(skip)]
    pub signing_secret: String,
}

fn default_base_path() -> String {
    "/slack".into()
}

/// Slack connectivity for the platform client.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct SlackConfig {
    /// Channel where confirmations are posted.
    pub channel_id: String,
    /// Bot user token for API calls (populated at runtime; empty means
    /// local-only mode without a platform client).
    #[serde(skip)]
    pub bot_token: String,
}

/// Global configuration parsed from `config.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct GlobalConfig {
    /// Address to listen for platform callbacks on.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// Webhook endpoint settings.
    pub webhook: WebhookConfig,
    /// Slack connectivity settings.
    pub slack: SlackConfig,
}

fn default_listen_addr() -> String {
    "127.0.0.1:4390".into()
}

impl GlobalConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load credentials from the OS keychain with env-var fallback.
    ///
    /// The signing secret (`SLACK_SIGNING_SECRET`) is required; the bot
    /// token (`SLACK_BOT_TOKEN`) is optional and its absence puts the
    /// server in local-only mode.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if neither keychain nor env vars
    /// provide the signing secret.
    pub async fn load_credentials(&mut self) -> Result<()> {
        self.webhook.signing_secret =
            load_credential("slack_signing_secret", "SLACK_SIGNING_SECRET").await?;
        self.slack.bot_token = load_credential("slack_bot_token", "SLACK_BOT_TOKEN")
            .await
            .unwrap_or_default();
        Ok(())
    }

    /// Parsed listen address.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `listen_addr` is not a socket
    /// address.
    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen_addr
            .parse()
            .map_err(|err| AppError::Config(format!("invalid listen_addr: {err}")))
    }

    /// Core dispatcher settings derived from this configuration.
    #[must_use]
    pub fn webhook_settings(&self) -> WebhookSettings {
        WebhookSettings {
            base_path: self.webhook.base_path.clone(),
            signing_secret: self.webhook.signing_secret.clone(),
            identity_header: self.webhook.identity_header.clone(),
        }
    }

    fn validate(&self) -> Result<()> {
        if !self.webhook.base_path.starts_with('/') {
            return Err(AppError::Config(
                "webhook.base_path must start with '/'".into(),
            ));
        }

        if self.slack.channel_id.is_empty() {
            return Err(AppError::Config("slack.channel_id must not be empty".into()));
        }

        self.listen_addr()?;
        Ok(())
    }
}

/// Load a single credential from the OS keychain with env-var fallback.
async fn load_credential(keyring_key: &str, env_key: &str) -> Result<String> {
    let key = keyring_key.to_owned();

    // Try the OS keychain first via spawn_blocking (keyring is synchronous I/O).
    let keychain_result = tokio::task::spawn_blocking(move || {
        keyring::Entry::new(KEYRING_SERVICE, &key).and_then(|entry| entry.get_password())
    })
    .await
    .map_err(|err| AppError::Config(format!("keychain task panicked: {err}")))?;

    match keychain_result {
        Ok(value) if !value.is_empty() => return Ok(value),
        Ok(_) => {
            warn!(key = keyring_key, "keychain entry is empty, trying env var");
        }
        Err(err) => {
            warn!(
                key = keyring_key,
                ?err,
                "keychain lookup failed, trying env var"
            );
        }
    }

    env::var(env_key).map_err(|_| {
        AppError::Config(format!(
            "credential {keyring_key} not found in keychain or {env_key} env var"
        ))
    })
}
