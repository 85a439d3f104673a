//! Message types for the pollers

use std::fmt;

use tokio::sync::oneshot;

/// What a poller re-collects on every tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollJob {
    /// Liveness and certificates of every website. Drives the alerts.
    Websites,

    /// Every version and lifecycle collection
    Collections,
}

impl fmt::Display for PollJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PollJob::Websites => write!(f, "websites"),
            PollJob::Collections => write!(f, "collections"),
        }
    }
}

/// Commands that can be sent to a [`PollerActor`](super::PollerActor)
#[derive(Debug)]
pub enum PollerCommand {
    /// Poll immediately, bypassing the interval timer
    PollNow {
        /// Receives the number of items collected
        respond_to: oneshot::Sender<usize>,
    },

    /// Replace the polling interval, restarts the timer
    UpdateInterval { interval_secs: u64 },

    /// Stop after the poll in flight
    Shutdown,
}
