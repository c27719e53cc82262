use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::errors::{ClientError, Result};
use crate::sync::{Feed, Reconciled};

/// Something that can be fetched on a timer and applied to a [`Feed`].
#[async_trait]
pub trait PollSource: Send + Sync + 'static {
    type Snapshot: Send + 'static;

    /// Label used in logs.
    fn name(&self) -> &str;

    async fn fetch(&self) -> Result<Self::Snapshot>;

    /// Called after a failed fetch. The previous state is always kept.
    fn on_failure(&self, _error: &ClientError) -> TickControl {
        TickControl::Continue
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickControl {
    Continue,
    Stop,
}

/// One poll: draw a ticket, fetch, apply unless something newer landed meanwhile.
pub async fn poll_once<P, S>(source: &P, feed: &Feed<S>) -> TickControl
where
    P: PollSource + ?Sized,
    S: Reconciled<Snapshot = P::Snapshot>,
{
    let ticket = feed.ticket();
    match source.fetch().await {
        Ok(snapshot) => {
            if !feed.update_if(|state| state.apply_snapshot(ticket, snapshot)) {
                debug!("{}: snapshot #{ticket} superseded, dropped", source.name());
            }
            TickControl::Continue
        }
        Err(e) => {
            warn!("{}: poll failed, keeping previous state: {e}", source.name());
            source.on_failure(&e)
        }
    }
}

/// Polls `source` immediately and then every `period` until the handle is stopped
/// or dropped. Ticks that fall behind are delayed, never bunched up.
pub fn spawn_poller<P, S>(source: P, feed: Feed<S>, period: Duration) -> PollHandle
where
    P: PollSource,
    S: Reconciled<Snapshot = P::Snapshot>,
{
    let name = source.name().to_string();
    debug!("{name}: polling every {period:?}");
    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if poll_once(&source, &feed).await == TickControl::Stop {
                info!("{}: polling stopped after failure", source.name());
                break;
            }
        }
    });
    PollHandle { name, task }
}

/// Owns a running poller. Stopping (or dropping) aborts the task, including a fetch
/// in flight, so nothing is applied after the owning view goes away.
#[derive(Debug)]
pub struct PollHandle {
    name: String,
    task: JoinHandle<()>,
}

impl PollHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub fn stop(self) {
        debug!("{}: polling cancelled", self.name);
        self.task.abort();
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
