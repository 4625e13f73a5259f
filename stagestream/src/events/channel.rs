//! Ordered, unbounded event channel shared by the runner and the heartbeat.

use crate::core::JobEvent;
use tokio::sync::mpsc;

/// Creates a new event channel.
///
/// The sender half is cloneable so the pipeline runner and the heartbeat
/// ticker can both write to it; the receiver half is owned by the job
/// coordinator.
#[must_use]
pub fn event_channel() -> (EventSender, EventReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSender { tx }, EventReceiver { rx })
}

/// Producer half of an event channel.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<JobEvent>,
}

impl EventSender {
    /// Enqueues an event.
    ///
    /// Never blocks and never drops while the consumer is alive. Returns
    /// `false` once the consumer has gone away.
    pub fn put(&self, event: JobEvent) -> bool {
        self.tx.send(event).is_ok()
    }

    /// Returns true if the consumer has been dropped.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer half of an event channel.
#[derive(Debug)]
pub struct EventReceiver {
    rx: mpsc::UnboundedReceiver<JobEvent>,
}

impl EventReceiver {
    /// Waits for the next event.
    ///
    /// Returns `None` once every sender is gone and the queue is drained.
    pub async fn get(&mut self) -> Option<JobEvent> {
        self.rx.recv().await
    }

    /// Takes the next event if one is already queued.
    pub fn try_get(&mut self) -> Option<JobEvent> {
        self.rx.try_recv().ok()
    }

    /// Stops accepting new events; queued events can still be read.
    pub fn close(&mut self) {
        self.rx.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_fifo_order_across_producers() {
        let (tx, mut rx) = event_channel();
        let heartbeat_tx = tx.clone();

        assert!(tx.put(JobEvent::started("a")));
        assert!(heartbeat_tx.put(JobEvent::Heartbeat));
        assert!(tx.put(JobEvent::ended("a")));
        assert!(tx.put(JobEvent::Done));

        let mut seen = Vec::new();
        while let Some(event) = rx.get().await {
            let done = event.is_done();
            seen.push(event);
            if done {
                break;
            }
        }

        assert_eq!(
            seen,
            vec![
                JobEvent::started("a"),
                JobEvent::Heartbeat,
                JobEvent::ended("a"),
                JobEvent::Done,
            ]
        );
    }

    #[tokio::test]
    async fn test_put_after_consumer_dropped_reports_false() {
        let (tx, rx) = event_channel();
        drop(rx);

        assert!(tx.is_closed());
        assert!(!tx.put(JobEvent::Heartbeat));
    }

    #[tokio::test]
    async fn test_get_returns_none_when_senders_gone() {
        let (tx, mut rx) = event_channel();
        tx.put(JobEvent::Heartbeat);
        drop(tx);

        assert_eq!(rx.get().await, Some(JobEvent::Heartbeat));
        assert_eq!(rx.get().await, None);
    }

    #[test]
    fn test_try_get_does_not_wait() {
        let (tx, mut rx) = event_channel();
        assert!(rx.try_get().is_none());

        tx.put(JobEvent::Done);
        assert_eq!(rx.try_get(), Some(JobEvent::Done));
    }

    #[tokio::test]
    async fn test_close_rejects_new_events() {
        let (tx, mut rx) = event_channel();
        tx.put(JobEvent::started("a"));
        rx.close();

        assert!(!tx.put(JobEvent::Heartbeat));
        assert_eq!(rx.get().await, Some(JobEvent::started("a")));
    }
}
