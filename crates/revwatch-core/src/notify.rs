//! Operator notification channel.
//!
//! Notifications are send-only status text for humans. Delivery problems are
//! logged and swallowed; they never abort a cycle.

use futures::future::{BoxFuture, FutureExt};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};

pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);

    /// Wait until messages handed to `notify` have been delivered (or given
    /// up on). Sinks that deliver inline have nothing to wait for.
    fn flush(&self) -> BoxFuture<'_, ()> {
        futures::future::ready(()).boxed()
    }
}

// ---------------------------------------------------------------------------
// LogNotifier
// ---------------------------------------------------------------------------

/// Writes operator messages to the log.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str) {
        info!(target: "revwatch::operator", "{message}");
    }
}

// ---------------------------------------------------------------------------
// WebhookNotifier
// ---------------------------------------------------------------------------

/// POSTs `{"text": "<prefix> <message>"}` to an HTTP endpoint.
///
/// Each message is sent from its own task, so a slow endpoint never holds up
/// the caller. Outside a Tokio runtime the message is dropped with a warning.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
    prefix: String,
    pending: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>, prefix: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self {
            client,
            url: url.into(),
            prefix: prefix.into(),
            pending: Arc::default(),
        }
    }

    fn payload(&self, message: &str) -> serde_json::Value {
        let text = if self.prefix.is_empty() {
            message.to_string()
        } else {
            format!("{} {message}", self.prefix)
        };
        serde_json::json!({ "text": text })
    }

    /// Deliver one message and report the outcome.
    pub async fn send(&self, message: &str) -> anyhow::Result<()> {
        let resp = self
            .client
            .post(&self.url)
            .json(&self.payload(message))
            .send()
            .await?;
        resp.error_for_status()?;
        Ok(())
    }
}

impl Notifier for WebhookNotifier {
    fn notify(&self, message: &str) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!("webhook notification dropped: no async runtime");
            return;
        };
        let this = self.clone();
        let message = message.to_string();
        let task = handle.spawn(async move {
            if let Err(e) = this.send(&message).await {
                warn!(url = %this.url, "webhook notification failed: {e:#}");
            }
        });
        if let Ok(mut pending) = self.pending.lock() {
            pending.retain(|t| !t.is_finished());
            pending.push(task);
        }
    }

    fn flush(&self) -> BoxFuture<'_, ()> {
        let tasks = self
            .pending
            .lock()
            .map(|mut pending| std::mem::take(&mut *pending))
            .unwrap_or_default();
        async move {
            futures::future::join_all(tasks).await;
        }
        .boxed()
    }
}

// ---------------------------------------------------------------------------
// FanoutNotifier
// ---------------------------------------------------------------------------

/// Sends every message to each inner notifier in order.
#[derive(Clone, Default)]
pub struct FanoutNotifier {
    sinks: Vec<Arc<dyn Notifier>>,
}

impl FanoutNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Arc<dyn Notifier>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl Notifier for FanoutNotifier {
    fn notify(&self, message: &str) {
        for sink in &self.sinks {
            sink.notify(message);
        }
    }

    fn flush(&self) -> BoxFuture<'_, ()> {
        let flushes = self.sinks.iter().map(|sink| sink.flush());
        futures::future::join_all(flushes).map(|_| ()).boxed()
    }
}

/// Build the notifier described by the `notify` config section.
pub fn from_config(cfg: &crate::config::NotifyConfig) -> FanoutNotifier {
    let mut fanout = FanoutNotifier::new().with(Arc::new(LogNotifier));
    if let Some(url) = &cfg.webhook_url {
        if url.starts_with("http://") || url.starts_with("https://") {
            fanout = fanout.with(Arc::new(WebhookNotifier::new(url.clone(), cfg.prefix.clone())));
        }
    }
    fanout
}
