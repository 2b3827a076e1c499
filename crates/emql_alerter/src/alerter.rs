use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::{AlerterError, Result};
use crate::sender::{sender_for, Sender};
use crate::store::KeyValueStore;

/// Store key under which the destination list is persisted, as a JSON
/// array of `transport:endpoint` strings.
pub const DESTINATIONS_KEY: &[u8] = b"emql-alerter-destinations";

/// Configuration necessary to send emails.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailConfig {
    pub from_email: String,
    pub from_name: String,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_user: String,
    pub smtp_password: String,
}

/// Configuration necessary to send alerts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub email: EmailConfig,
}

/// Registry of alert destinations and the fan-out logic.
///
/// A destination is a `transport:endpoint` string, e.g.
/// `http:https://example.com/alert` or `smtp:alerts@example.com`. The
/// registered list is persisted into the supplied store so it survives
/// restarts.
pub struct Alerter {
    config: Config,
    destinations: HashMap<String, Box<dyn Sender>>,
    store: Box<dyn KeyValueStore>,
}

impl Alerter {
    pub fn new(config: Config, store: Box<dyn KeyValueStore>) -> Self {
        Alerter {
            config,
            destinations: HashMap::new(),
            store,
        }
    }

    /// Re-register every destination persisted in the store. A missing key
    /// means nothing was ever registered.
    pub fn restore_destinations(&mut self) -> Result<()> {
        for destination in self.load_destinations() {
            let (transport, endpoint) = split_destination(&destination)?;
            let sender = sender_for(transport, endpoint, &self.config)?;
            self.destinations.insert(destination, sender);
        }
        info!(count = self.destinations.len(), "restored alert destinations");
        Ok(())
    }

    fn load_destinations(&self) -> Vec<String> {
        let bytes = match self.store.get(DESTINATIONS_KEY) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return Vec::new(),
            Err(err) => {
                warn!(%err, "failed to read persisted destinations");
                return Vec::new();
            }
        };
        serde_json::from_slice(&bytes).unwrap_or_default()
    }

    fn persist_destination(&mut self, destination: &str) -> Result<()> {
        let mut destinations = self.load_destinations();
        destinations.push(destination.to_string());
        let bytes = serde_json::to_vec(&destinations)?;
        self.store.put(DESTINATIONS_KEY, &bytes)
    }

    /// Register a new destination to send alerts to. Returns false if it
    /// was already registered.
    pub fn register_destination(&mut self, destination: &str) -> Result<bool> {
        if self.destinations.contains_key(destination) {
            return Ok(false);
        }

        let (transport, endpoint) = split_destination(destination)?;
        let sender = sender_for(transport, endpoint, &self.config)?;
        self.destinations.insert(destination.to_string(), sender);
        self.persist_destination(destination)?;
        info!(%destination, "registered alert destination");
        Ok(true)
    }

    /// The currently registered destination strings, in no particular
    /// order.
    pub fn list_destinations(&self) -> Vec<String> {
        self.destinations.keys().cloned().collect()
    }

    /// Send an alert to every registered destination. Failures are
    /// collected and reported together; one bad destination does not stop
    /// delivery to the others.
    pub fn send_alert(&self, subject: &str, message: &str) -> Result<()> {
        let mut failures = Vec::new();
        for (destination, sender) in &self.destinations {
            if let Err(err) = sender.send(subject, message) {
                warn!(%destination, %err, "alert delivery failed");
                failures.push(err.to_string());
            }
        }

        if failures.is_empty() {
            return Ok(());
        }
        Err(AlerterError::DestinationsFailed(failures.join("; ")))
    }
}

/// Split `transport:endpoint` on the first colon.
fn split_destination(destination: &str) -> Result<(&str, &str)> {
    destination
        .split_once(':')
        .ok_or_else(|| AlerterError::InvalidDestination(destination.to_string()))
}
