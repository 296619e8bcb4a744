//! Status watching by polling.
//!
//! `subscribe` spawns one timer task per subscriber.  Each tick re-reads the
//! record and offers a snapshot through a single-slot channel; if the
//! subscriber has not taken the previous one yet, the new one is dropped.
//! The task ends when the session disappears, when the store fails, or when
//! the subscription is cancelled.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use pb_domain::error::Error;
use pb_domain::trace::TraceEvent;

use crate::lifecycle::LifecycleManager;
use crate::record::SessionStatus;

/// What a watcher sees each tick.  Missing counters read as zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusSnapshot {
    pub status: SessionStatus,
    pub peers: u32,
    pub progress: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    Snapshot(StatusSnapshot),
    /// The session is gone.  Terminal.
    Expired,
    /// The store could not be read.  Terminal.
    Unavailable(String),
}

impl WatchEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Snapshot(_))
    }
}

/// Handle on a running status watch.  Dropping it cancels the poller.
pub struct StatusSubscription {
    rx: mpsc::Receiver<WatchEvent>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl StatusSubscription {
    /// Next event, or `None` once the watch has ended.
    pub async fn next(&mut self) -> Option<WatchEvent> {
        self.rx.recv().await
    }

    /// Stop polling and wait for the poller to exit.  Once this returns the
    /// subscription performs no further store reads.
    pub async fn unsubscribe(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Stream for StatusSubscription {
    type Item = WatchEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

impl Drop for StatusSubscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl LifecycleManager {
    /// Watch `session_id`, one snapshot per poll interval.  The first snapshot
    /// arrives one full interval after subscribing.
    pub fn subscribe(self: &Arc<Self>, session_id: &str) -> StatusSubscription {
        let (tx, rx) = mpsc::channel(1);
        let cancel = CancellationToken::new();
        let task = tokio::spawn(poll_status(
            self.clone(),
            session_id.to_owned(),
            tx,
            cancel.clone(),
        ));
        StatusSubscription {
            rx,
            cancel,
            task: Some(task),
        }
    }
}

async fn poll_status(
    manager: Arc<LifecycleManager>,
    session_id: String,
    tx: mpsc::Sender<WatchEvent>,
    cancel: CancellationToken,
) {
    let period = manager.config().status_poll_interval();
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    TraceEvent::WatchStarted {
        session_id: session_id.clone(),
        interval_ms: period.as_millis() as u64,
    }
    .emit();

    let mut ticks: u64 = 0;
    let reason = loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break "cancelled",
            _ = ticker.tick() => {}
        }
        ticks += 1;

        // The read itself races cancellation so an unsubscribe never waits
        // on, or is followed by, a store round-trip.
        let loaded = tokio::select! {
            biased;
            _ = cancel.cancelled() => break "cancelled",
            loaded = manager.load(&session_id) => loaded,
        };

        let event = match loaded {
            Ok(record) => WatchEvent::Snapshot(StatusSnapshot {
                status: record.status,
                peers: record.peers.unwrap_or(0),
                progress: record.progress.unwrap_or(0),
            }),
            Err(Error::NotFound) => WatchEvent::Expired,
            Err(e) => {
                tracing::warn!(session_id = %session_id, error = %e, "status watch read failed");
                WatchEvent::Unavailable(e.to_string())
            }
        };

        if event.is_terminal() {
            let reason = match event {
                WatchEvent::Expired => "expired",
                _ => "unavailable",
            };
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = tx.send(event) => {}
            }
            break reason;
        }

        match tx.try_send(event) {
            Ok(()) => {}
            // Slow subscriber: drop this snapshot, never queue.
            Err(mpsc::error::TrySendError::Full(_)) => {}
            Err(mpsc::error::TrySendError::Closed(_)) => break "closed",
        }
    };

    TraceEvent::WatchEnded {
        session_id,
        reason: reason.to_owned(),
        ticks,
    }
    .emit();
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
