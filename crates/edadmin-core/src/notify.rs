// ── Notifications ──
//
// Toast-style messages raised by binders and commands. Every notification
// is broadcast to subscribers; the most recent one is also kept as the
// "current" toast until it times out or is dismissed. A timer only hides
// the toast it was started for, never a newer one.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, watch};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(7);

const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Level {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: Uuid,
    pub level: Level,
    pub message: String,
    pub timeout: Duration,
    pub created_at: DateTime<Utc>,
}

/// Cloneable handle; clones share the channel and current toast.
#[derive(Debug, Clone)]
pub struct Notifier {
    events: broadcast::Sender<Notification>,
    current: Arc<watch::Sender<Option<Notification>>>,
    timeout: Duration,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        let (events, _) = broadcast::channel(CHANNEL_CAPACITY);
        let (current, _) = watch::channel(None);
        Self {
            events,
            current: Arc::new(current),
            timeout,
        }
    }

    /// Publish a notification and make it the current toast.
    ///
    /// Inside a Tokio runtime the toast hides itself after the timeout.
    pub fn notify(&self, level: Level, message: impl Into<String>) -> Uuid {
        let note = Notification {
            id: Uuid::new_v4(),
            level,
            message: message.into(),
            timeout: self.timeout,
            created_at: Utc::now(),
        };
        let id = note.id;

        match level {
            Level::Error => error!(%id, "{}", note.message),
            Level::Warning => warn!(%id, "{}", note.message),
            Level::Info | Level::Success => info!(%id, "{}", note.message),
        }

        self.current.send_replace(Some(note.clone()));
        // No subscribers is fine.
        let _ = self.events.send(note);

        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let notifier = self.clone();
            let timeout = self.timeout;
            handle.spawn(async move {
                tokio::time::sleep(timeout).await;
                notifier.dismiss(id);
            });
        }

        id
    }

    pub fn info(&self, message: impl Into<String>) -> Uuid {
        self.notify(Level::Info, message)
    }

    pub fn success(&self, message: impl Into<String>) -> Uuid {
        self.notify(Level::Success, message)
    }

    pub fn warning(&self, message: impl Into<String>) -> Uuid {
        self.notify(Level::Warning, message)
    }

    pub fn error(&self, message: impl Into<String>) -> Uuid {
        self.notify(Level::Error, message)
    }

    /// Hide the current toast if it is still `id`. Returns whether it was.
    pub fn dismiss(&self, id: Uuid) -> bool {
        let hidden = self.current.send_if_modified(|current| {
            if current.as_ref().is_some_and(|n| n.id == id) {
                *current = None;
                true
            } else {
                false
            }
        });
        if hidden {
            debug!(%id, "toast dismissed");
        }
        hidden
    }

    pub fn current(&self) -> Option<Notification> {
        self.current.borrow().clone()
    }

    pub fn watch_current(&self) -> watch::Receiver<Option<Notification>> {
        self.current.subscribe()
    }

    /// Every notification published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.events.subscribe()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn dismiss_only_hides_latest() {
        let notifier = Notifier::new();
        let first = notifier.info("saved");
        let second = notifier.error("failed");

        assert!(!notifier.dismiss(first));
        assert_eq!(notifier.current().unwrap().id, second);
        assert!(notifier.dismiss(second));
        assert!(notifier.current().is_none());
    }

    #[tokio::test]
    async fn subscribers_receive_every_notification() {
        let notifier = Notifier::new();
        let mut rx = notifier.subscribe();
        notifier.warning("one");
        notifier.success("two");

        let a = rx.recv().await.unwrap();
        let b = rx.recv().await.unwrap();
        assert_eq!((a.level, a.message.as_str()), (Level::Warning, "one"));
        assert_eq!((b.level, b.message.as_str()), (Level::Success, "two"));
        assert_eq!(a.timeout, DEFAULT_TIMEOUT);
    }

    #[tokio::test(start_paused = true)]
    async fn toast_times_out() {
        let notifier = Notifier::with_timeout(Duration::from_secs(7));
        notifier.info("hello");
        assert!(notifier.current().is_some());

        tokio::time::sleep(Duration::from_secs(8)).await;
        assert!(notifier.current().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn stale_timer_keeps_newer_toast() {
        let notifier = Notifier::with_timeout(Duration::from_secs(7));
        notifier.info("old");
        tokio::time::sleep(Duration::from_secs(5)).await;
        let newer = notifier.info("new");

        // First timer fires at 7s; the newer toast must survive it.
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(notifier.current().unwrap().id, newer);
    }
}
