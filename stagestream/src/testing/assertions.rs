//! Assertions over job event sequences.

use crate::core::JobEvent;
use crate::events::EventReceiver;

/// Reads every event until all senders are gone.
pub async fn drain(mut rx: EventReceiver) -> Vec<JobEvent> {
    let mut events = Vec::new();
    while let Some(event) = rx.get().await {
        events.push(event);
    }
    events
}

/// Returns the events with heartbeats removed.
#[must_use]
pub fn non_heartbeat(events: &[JobEvent]) -> Vec<JobEvent> {
    events.iter().filter(|e| !e.is_heartbeat()).cloned().collect()
}

/// Returns the wire kinds of the non-heartbeat events.
#[must_use]
pub fn non_heartbeat_kinds(events: &[JobEvent]) -> Vec<&'static str> {
    events
        .iter()
        .filter(|e| !e.is_heartbeat())
        .map(JobEvent::kind)
        .collect()
}

/// Counts heartbeats.
#[must_use]
pub fn heartbeat_count(events: &[JobEvent]) -> usize {
    events.iter().filter(|e| e.is_heartbeat()).count()
}

/// Asserts the canonical success sequence for `stages`:
/// `Started(S1), Ended(S1), ..., Started(Sn), Ended(Sn), FinalResult, Done`
/// once heartbeats are removed.
pub fn assert_success_sequence(events: &[JobEvent], stages: &[&str], result: &str) {
    let mut expected = Vec::new();
    for stage in stages {
        expected.push(JobEvent::started(*stage));
        expected.push(JobEvent::ended(*stage));
    }
    expected.push(JobEvent::final_result(result));
    expected.push(JobEvent::Done);

    assert_eq!(
        non_heartbeat(events),
        expected,
        "Event sequence does not match the canonical success order"
    );
}

/// Asserts at most one `FinalResult`/`Error` and exactly one `Done`, last.
pub fn assert_single_terminal(events: &[JobEvent]) {
    let terminals = events.iter().filter(|e| e.is_terminal_result()).count();
    assert!(
        terminals <= 1,
        "Expected at most one final_result/error event, got {terminals}"
    );

    let done = events.iter().filter(|e| e.is_done()).count();
    assert_eq!(done, 1, "Expected exactly one completed event, got {done}");
    assert!(
        events.last().is_some_and(JobEvent::is_done),
        "Expected completed to be the last event, got {:?}",
        events.last()
    );
}

/// Asserts that no heartbeat follows `Done`.
pub fn assert_no_heartbeat_after_done(events: &[JobEvent]) {
    if let Some(done) = events.iter().position(JobEvent::is_done) {
        assert!(
            !events[done..].iter().any(JobEvent::is_heartbeat),
            "Heartbeat emitted after completed: {events:?}"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_sequence_ignores_heartbeats() {
        let events = vec![
            JobEvent::started("a"),
            JobEvent::Heartbeat,
            JobEvent::ended("a"),
            JobEvent::final_result("r"),
            JobEvent::Done,
        ];
        assert_success_sequence(&events, &["a"], "r");
        assert_single_terminal(&events);
        assert_no_heartbeat_after_done(&events);
        assert_eq!(heartbeat_count(&events), 1);
    }

    #[test]
    #[should_panic(expected = "at most one")]
    fn test_single_terminal_rejects_two_results() {
        assert_single_terminal(&[
            JobEvent::final_result("a"),
            JobEvent::error("b"),
            JobEvent::Done,
        ]);
    }

    #[test]
    #[should_panic(expected = "after completed")]
    fn test_heartbeat_after_done_detected() {
        assert_no_heartbeat_after_done(&[JobEvent::Done, JobEvent::Heartbeat]);
    }
}
