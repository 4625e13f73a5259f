//! Periodic heartbeat task.

use crate::cancellation::StopSignal;
use crate::core::JobEvent;
use crate::events::EventSender;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

/// Puts a `Heartbeat` on the event channel every `interval` until stopped.
///
/// The interval must be shorter than any idle timeout between server and
/// client; the default is 15 seconds.
#[derive(Debug, Clone, Copy)]
pub struct HeartbeatTicker {
    interval: Duration,
}

impl HeartbeatTicker {
    /// Creates a ticker with the given interval.
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// Returns the tick interval.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Spawns the ticker loop.
    ///
    /// The loop exits as soon as `stop` is set, without emitting a final
    /// heartbeat, or once the channel consumer is gone. The returned handle
    /// resolves to the number of heartbeats enqueued.
    pub fn start(&self, events: EventSender, stop: StopSignal) -> JoinHandle<u64> {
        let interval = self.interval;
        tokio::spawn(async move {
            let mut sent = 0u64;
            loop {
                tokio::select! {
                    biased;
                    () = stop.stopped() => break,
                    () = tokio::time::sleep(interval) => {}
                }

                // Re-checked under the gate so nothing lands after Done.
                match stop.run_unless_stopped(|| events.put(JobEvent::Heartbeat)) {
                    Some(true) => {
                        sent += 1;
                        debug!(tick = sent, "heartbeat");
                    }
                    Some(false) | None => break,
                }
            }
            debug!(heartbeats = sent, reason = ?stop.reason(), "heartbeat stopped");
            sent
        })
    }
}

impl Default for HeartbeatTicker {
    fn default() -> Self {
        Self::new(Duration::from_secs(15))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::event_channel;

    #[tokio::test(start_paused = true)]
    async fn test_ticks_until_stopped() {
        let (tx, mut rx) = event_channel();
        let stop = StopSignal::new();
        let handle = HeartbeatTicker::new(Duration::from_secs(1)).start(tx, stop.clone());

        tokio::time::sleep(Duration::from_millis(3500)).await;
        stop.stop("done");
        let sent = handle.await.unwrap();

        assert_eq!(sent, 3);
        let mut received = 0;
        while let Some(event) = rx.try_get() {
            assert!(event.is_heartbeat());
            received += 1;
        }
        assert_eq!(received, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_tick_before_first_interval() {
        let (tx, mut rx) = event_channel();
        let stop = StopSignal::new();
        let handle = HeartbeatTicker::new(Duration::from_secs(15)).start(tx, stop.clone());

        tokio::time::sleep(Duration::from_secs(10)).await;
        stop.stop("fast job");

        assert_eq!(handle.await.unwrap(), 0);
        assert!(rx.try_get().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_exits_when_consumer_gone() {
        let (tx, rx) = event_channel();
        drop(rx);
        let handle = HeartbeatTicker::new(Duration::from_secs(1)).start(tx, StopSignal::new());

        assert_eq!(handle.await.unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_nothing_after_stop_then() {
        let (tx, mut rx) = event_channel();
        let stop = StopSignal::new();
        let handle = HeartbeatTicker::new(Duration::from_secs(1)).start(tx.clone(), stop.clone());

        tokio::time::sleep(Duration::from_millis(1500)).await;
        stop.stop_then("finished", || tx.put(JobEvent::Done));
        tokio::time::sleep(Duration::from_secs(5)).await;
        handle.await.unwrap();
        drop(tx);

        let mut events = Vec::new();
        while let Some(event) = rx.get().await {
            events.push(event);
        }
        assert_eq!(events, vec![JobEvent::Heartbeat, JobEvent::Done]);
    }
}
