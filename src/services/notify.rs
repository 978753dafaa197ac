//! Outbound notifications.
//!
//! Mail delivery is an external collaborator. Workflows send a
//! [`Notification`] after their state change is committed; a delivery
//! failure is logged and never fails the operation that triggered it.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::{EngineError, EngineResult};

/// A message for one employee.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Employee id of the recipient.
    pub recipient: String,
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub body: String,
}

/// Delivers notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Delivers one notification.
    async fn send(&self, notification: Notification) -> EngineResult<()>;
}

/// Sends a notification and logs a failure instead of returning it.
pub async fn notify_best_effort(notifier: &dyn Notifier, notification: Notification) {
    let recipient = notification.recipient.clone();
    if let Err(err) = notifier.send(notification).await {
        warn!(recipient = %recipient, error = %err, "Notification delivery failed");
    }
}

/// Writes notifications to the log through the configured mail relay name.
#[derive(Debug, Clone)]
pub struct LogNotifier {
    relay: String,
}

impl LogNotifier {
    /// Creates a notifier reporting `relay` as the mail host.
    pub fn new(relay: impl Into<String>) -> Self {
        Self { relay: relay.into() }
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, notification: Notification) -> EngineResult<()> {
        info!(
            relay = %self.relay,
            recipient = %notification.recipient,
            subject = %notification.subject,
            "Notification queued"
        );
        Ok(())
    }
}

/// Keeps notifications in memory; optionally fails every delivery.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<Notification>>>,
    failing: bool,
}

impl RecordingNotifier {
    /// A notifier that records every delivery.
    pub fn new() -> Self {
        Self::default()
    }

    /// A notifier whose deliveries all fail.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    /// Notifications delivered so far.
    pub fn sent(&self) -> Vec<Notification> {
        match self.sent.lock() {
            Ok(sent) => sent.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, notification: Notification) -> EngineResult<()> {
        if self.failing {
            return Err(EngineError::Downstream {
                service: "mail".to_string(),
                message: "relay unavailable".to_string(),
            });
        }
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(notification);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notification() -> Notification {
        Notification {
            recipient: "emp_001".to_string(),
            subject: "Leave approved".to_string(),
            body: String::new(),
        }
    }

    #[tokio::test]
    async fn test_recording_notifier_keeps_messages() {
        let notifier = RecordingNotifier::new();
        notify_best_effort(&notifier, notification()).await;
        assert_eq!(notifier.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_delivery_is_swallowed() {
        let notifier = RecordingNotifier::failing();
        notify_best_effort(&notifier, notification()).await;
        assert!(notifier.sent().is_empty());
    }
}
