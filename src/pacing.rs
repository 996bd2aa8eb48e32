use std::time::Duration;

use tokio::time::{sleep_until, Instant};

use stream_agent_api::{ParsedRecord, StreamEvent};

use crate::dedup::DedupQueue;

pub const DEFAULT_PACING_INTERVAL: Duration = Duration::from_millis(50);

/// Single-consumer drain of the turn's tool-event queue.
///
/// Consecutive applications are spaced by at least `interval`, so a burst of
/// buffered events reaches subscribers as separate snapshots. With a zero
/// interval the scheduler only yields to the runtime between events.
#[derive(Debug)]
pub struct PacingScheduler {
    queue: DedupQueue,
    interval: Duration,
    next_slot: Option<Instant>,
}

impl PacingScheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            queue: DedupQueue::new(),
            interval,
            next_slot: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Offer a parsed tool record to the de-duplicating queue.
    pub fn offer(&mut self, record: ParsedRecord) -> bool {
        self.queue.offer(record)
    }

    pub fn has_pending(&self) -> bool {
        !self.queue.is_empty()
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Resolves once the next event may be applied. Cancel-safe.
    pub async fn ready(&self) {
        if self.interval.is_zero() {
            tokio::task::yield_now().await;
            return;
        }
        if let Some(slot) = self.next_slot {
            sleep_until(slot).await;
        }
    }

    /// Pop the next event and arm the following slot.
    pub fn next_event(&mut self) -> Option<StreamEvent> {
        let event = self.queue.pop_front()?;
        self.next_slot = Some(Instant::now() + self.interval);
        Some(event)
    }

    /// Take every queued event at once, without pacing.
    pub fn flush(&mut self) -> Vec<StreamEvent> {
        self.queue.drain()
    }
}

impl Default for PacingScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_PACING_INTERVAL)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use stream_agent_api::ndjson::parse_record;
    use tokio::time::Instant;

    use super::{PacingScheduler, DEFAULT_PACING_INTERVAL};

    fn offer(pacer: &mut PacingScheduler, query: &str) -> bool {
        let line = format!(
            r#"{{"type":"tool_start","tool_name":"tavily_search","content":{{"query":"{query}"}}}}"#
        );
        pacer.offer(parse_record(&line).expect("valid record"))
    }

    #[test]
    fn default_interval_is_fifty_millis() {
        assert_eq!(PacingScheduler::default().interval(), DEFAULT_PACING_INTERVAL);
        assert_eq!(DEFAULT_PACING_INTERVAL, Duration::from_millis(50));
    }

    #[tokio::test(start_paused = true)]
    async fn events_are_spaced_by_the_interval() {
        let mut pacer = PacingScheduler::new(Duration::from_millis(50));
        offer(&mut pacer, "a");
        offer(&mut pacer, "b");
        offer(&mut pacer, "c");

        let started = Instant::now();
        let mut applied_at = Vec::new();
        while pacer.has_pending() {
            pacer.ready().await;
            pacer.next_event().expect("pending event");
            applied_at.push(started.elapsed());
        }

        assert_eq!(
            applied_at,
            vec![
                Duration::ZERO,
                Duration::from_millis(50),
                Duration::from_millis(100)
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn flush_bypasses_pacing_and_keeps_order() {
        let mut pacer = PacingScheduler::new(Duration::from_secs(10));
        offer(&mut pacer, "a");
        offer(&mut pacer, "b");
        assert!(!offer(&mut pacer, "a"));

        pacer.next_event();
        let started = Instant::now();
        let rest = pacer.flush();
        assert_eq!(rest.len(), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
        assert!(!pacer.has_pending());
    }

    #[tokio::test]
    async fn zero_interval_only_yields() {
        let mut pacer = PacingScheduler::new(Duration::ZERO);
        offer(&mut pacer, "a");
        pacer.ready().await;
        assert!(pacer.next_event().is_some());
        assert_eq!(pacer.pending(), 0);
    }
}
