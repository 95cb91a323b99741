//! Progress observer channel.
//!
//! The core pushes [`ProgressEvent`]s into an unbounded channel and never
//! waits on the consumer; a reporter without a receiver is a no-op, so
//! headless runs behave exactly like terminal runs.

use std::fmt;

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

/// Per-mod lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModStatus {
    Pending,
    FetchingMetadata,
    Downloading,
    Succeeded,
    Failed,
}

impl ModStatus {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

impl fmt::Display for ModStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Pending => "pending",
            Self::FetchingMetadata => "fetching metadata",
            Self::Downloading => "downloading",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Payload of a [`ProgressEvent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressKind {
    Status(ModStatus),
    /// A transfer (re)started: expected total and resume offset.
    Started { total: Option<u64>, offset: u64 },
    /// Bytes received since the previous `Bytes` event.
    Bytes(u64),
    /// Attempt `attempt` of `max_attempts` is about to start.
    Retrying { attempt: u32, max_attempts: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    pub mod_name: String,
    pub kind: ProgressKind,
}

/// Sending half of the progress channel.
#[derive(Debug, Clone, Default)]
pub struct ProgressReporter {
    sender: Option<UnboundedSender<ProgressEvent>>,
}

impl ProgressReporter {
    #[must_use]
    pub fn new(sender: UnboundedSender<ProgressEvent>) -> Self {
        Self {
            sender: Some(sender),
        }
    }

    /// Reporter that drops every event.
    #[must_use]
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Creates a reporter and the receiver its events arrive on.
    #[must_use]
    pub fn channel() -> (Self, UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = unbounded_channel();
        (Self::new(tx), rx)
    }

    pub fn status(&self, mod_name: &str, status: ModStatus) {
        self.send(mod_name, ProgressKind::Status(status));
    }

    pub fn started(&self, mod_name: &str, total: Option<u64>, offset: u64) {
        self.send(mod_name, ProgressKind::Started { total, offset });
    }

    pub fn bytes(&self, mod_name: &str, delta: u64) {
        if delta > 0 {
            self.send(mod_name, ProgressKind::Bytes(delta));
        }
    }

    pub fn retrying(&self, mod_name: &str, attempt: u32, max_attempts: u32) {
        self.send(
            mod_name,
            ProgressKind::Retrying {
                attempt,
                max_attempts,
            },
        );
    }

    fn send(&self, mod_name: &str, kind: ProgressKind) {
        if let Some(sender) = &self.sender {
            // A dropped receiver only means nobody is watching.
            let _ = sender.send(ProgressEvent {
                mod_name: mod_name.to_string(),
                kind,
            });
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_reporter_is_noop() {
        let reporter = ProgressReporter::disabled();
        reporter.status("flib", ModStatus::Downloading);
        reporter.bytes("flib", 10);
    }

    #[tokio::test]
    async fn test_events_arrive_in_order() {
        let (reporter, mut rx) = ProgressReporter::channel();
        reporter.status("flib", ModStatus::Downloading);
        reporter.bytes("flib", 0);
        reporter.bytes("flib", 42);
        reporter.retrying("flib", 2, 4);
        drop(reporter);

        let mut kinds = Vec::new();
        while let Some(event) = rx.recv().await {
            assert_eq!(event.mod_name, "flib");
            kinds.push(event.kind);
        }
        assert_eq!(
            kinds,
            vec![
                ProgressKind::Status(ModStatus::Downloading),
                ProgressKind::Bytes(42),
                ProgressKind::Retrying {
                    attempt: 2,
                    max_attempts: 4
                },
            ]
        );
    }

    #[test]
    fn test_send_after_receiver_dropped_does_not_panic() {
        let (reporter, rx) = ProgressReporter::channel();
        drop(rx);
        reporter.status("flib", ModStatus::Failed);
    }

    #[test]
    fn test_terminal_states() {
        assert!(ModStatus::Succeeded.is_terminal());
        assert!(ModStatus::Failed.is_terminal());
        assert!(!ModStatus::Downloading.is_terminal());
    }
}
