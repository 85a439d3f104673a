//! PollerActor - keeps one part of the dashboard fresh
//!
//! ```text
//! Timer tick → Dashboard (forced collection) → cache + registry + alerts
//!     ↑
//!     └─── Commands (PollNow, UpdateInterval, Shutdown)
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, instrument, warn};

use super::messages::{PollJob, PollerCommand};
use crate::dashboard::Dashboard;

pub struct PollerActor {
    dashboard: Arc<Dashboard>,
    job: PollJob,
    command_rx: mpsc::Receiver<PollerCommand>,
    interval_duration: Duration,
}

impl PollerActor {
    pub fn new(
        dashboard: Arc<Dashboard>,
        job: PollJob,
        interval_duration: Duration,
        command_rx: mpsc::Receiver<PollerCommand>,
    ) -> Self {
        Self {
            dashboard,
            job,
            command_rx,
            interval_duration: interval_duration.max(Duration::from_secs(1)),
        }
    }

    /// Run until a Shutdown command arrives or every handle is dropped
    #[instrument(skip(self), fields(job = %self.job))]
    pub async fn run(mut self) {
        debug!("starting poller every {:?}", self.interval_duration);

        let mut ticker = self.ticker();

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.poll().await;
                }

                Some(cmd) = self.command_rx.recv() => {
                    match cmd {
                        PollerCommand::PollNow { respond_to } => {
                            debug!("received PollNow command");
                            let items = self.poll().await;
                            let _ = respond_to.send(items);
                        }

                        PollerCommand::UpdateInterval { interval_secs } => {
                            if interval_secs == 0 {
                                warn!("ignoring zero polling interval");
                                continue;
                            }
                            debug!("updating interval to {interval_secs}s");
                            self.interval_duration = Duration::from_secs(interval_secs);
                            ticker = self.ticker();
                        }

                        PollerCommand::Shutdown => {
                            debug!("received shutdown command");
                            break;
                        }
                    }
                }

                else => {
                    warn!("command channel closed, shutting down");
                    break;
                }
            }
        }

        debug!("poller stopped");
    }

    fn ticker(&self) -> tokio::time::Interval {
        let mut ticker = interval(self.interval_duration);
        // a slow poll must not be followed by a burst of catch-up polls
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker
    }

    async fn poll(&self) -> usize {
        match self.job {
            PollJob::Websites => {
                let statuses = self.dashboard.check_websites(true).await;
                let online = statuses.iter().filter(|s| s.is_online()).count();
                info!("{online} of {} websites online", statuses.len());
                statuses.len()
            }
            PollJob::Collections => self.dashboard.refresh_all().await.total(),
        }
    }
}

/// Handle for controlling a [`PollerActor`]
#[derive(Clone)]
pub struct PollerHandle {
    sender: mpsc::Sender<PollerCommand>,
    job: PollJob,
}

impl PollerHandle {
    pub fn spawn(dashboard: Arc<Dashboard>, job: PollJob, interval: Duration) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);

        let actor = PollerActor::new(dashboard, job, interval, cmd_rx);
        tokio::spawn(actor.run());

        Self {
            sender: cmd_tx,
            job,
        }
    }

    /// Poll immediately and wait for it, returns the number of items collected
    pub async fn poll_now(&self) -> Result<usize> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(PollerCommand::PollNow { respond_to: tx })
            .await?;

        Ok(rx.await?)
    }

    pub async fn update_interval(&self, interval_secs: u64) -> Result<()> {
        self.sender
            .send(PollerCommand::UpdateInterval { interval_secs })
            .await?;
        Ok(())
    }

    pub async fn shutdown(self) {
        let _ = self.sender.send(PollerCommand::Shutdown).await;
    }

    pub fn job(&self) -> PollJob {
        self.job
    }
}
