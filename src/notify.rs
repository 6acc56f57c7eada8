// src/notify.rs

use std::{env, fmt};

use reqwest::Client;
use serde::Serialize;
use tracing::{info, warn};
use url::Url;

use crate::{error::IngestError, ops_log::OpsLog};

pub const RELAY_URL_ENV: &str = "REPD_NOTIFY_URL";
pub const RELAY_TOKEN_ENV: &str = "REPD_NOTIFY_TOKEN";
pub const RECIPIENT_ENV: &str = "REPD_NOTIFY_TO";

#[derive(Debug, Serialize)]
struct RelayMessage<'a> {
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

/// Best-effort operator notification through an HTTP mail relay.
#[derive(Clone)]
pub enum Notifier {
    Disabled,
    Relay {
        client: Client,
        endpoint: Url,
        token: Option<String>,
        recipient: String,
    },
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notifier::Disabled => f.write_str("Disabled"),
            Notifier::Relay {
                endpoint,
                token,
                recipient,
                ..
            } => f
                .debug_struct("Relay")
                .field("endpoint", &endpoint.as_str())
                .field("token", &token.as_ref().map(|_| "<redacted>"))
                .field("recipient", recipient)
                .finish(),
        }
    }
}

impl Notifier {
    /// Build from `REPD_NOTIFY_URL`, `REPD_NOTIFY_TOKEN` and `REPD_NOTIFY_TO`.
    pub fn from_env(client: &Client, enabled: bool) -> Self {
        Self::from_settings(
            client,
            enabled,
            env::var(RELAY_URL_ENV).ok(),
            env::var(RECIPIENT_ENV).ok(),
            env::var(RELAY_TOKEN_ENV).ok(),
        )
    }

    /// A missing or unparsable relay URL, or a missing recipient, disables
    /// notification; it never stops an ingest run.
    pub fn from_settings(
        client: &Client,
        enabled: bool,
        url: Option<String>,
        recipient: Option<String>,
        token: Option<String>,
    ) -> Self {
        if !enabled {
            return Notifier::Disabled;
        }
        let url = url.map(|u| u.trim().to_string()).filter(|u| !u.is_empty());
        let recipient = recipient
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());
        let (Some(url), Some(recipient)) = (url, recipient) else {
            warn!("notification relay not configured, notifications disabled");
            return Notifier::Disabled;
        };
        let endpoint = match Url::parse(&url) {
            Ok(u) => u,
            Err(e) => {
                warn!(var = RELAY_URL_ENV, error = %e, "invalid relay URL, notifications disabled");
                return Notifier::Disabled;
            }
        };
        Notifier::Relay {
            client: client.clone(),
            endpoint,
            token: token.filter(|t| !t.is_empty()),
            recipient,
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, Notifier::Relay { .. })
    }

    pub async fn notify(&self, subject: &str, body: &str) -> Result<(), IngestError> {
        let Notifier::Relay {
            client,
            endpoint,
            token,
            recipient,
        } = self
        else {
            return Ok(());
        };

        let msg = RelayMessage {
            to: recipient,
            subject,
            text: body,
        };
        let mut req = client.post(endpoint.clone()).json(&msg);
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        req.send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| IngestError::Notification(e.to_string()))?;
        Ok(())
    }
}

/// Send and record the outcome in the ops log. Failures are never returned:
/// the data they announce is already persisted.
pub async fn notify_and_log(notifier: &Notifier, ops_log: &OpsLog, subject: &str, body: &str) {
    if !notifier.is_enabled() {
        return;
    }
    match notifier.notify(subject, body).await {
        Ok(()) => {
            info!(subject, "notification sent");
            ops_log.log("Email notification sent successfully.");
        }
        Err(e) => {
            warn!(error = %e, "notification failed");
            ops_log.log(&format!("Failed to send email notification: {}", e));
        }
    }
}
