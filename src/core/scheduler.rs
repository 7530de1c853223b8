use std::cmp::Ordering;
use std::collections::BinaryHeap;

use log::trace;

use super::error::SimError;
use super::types::SimTime;

#[derive(Debug)]
struct ScheduledEvent<T> {
    due_time: SimTime,
    sequence_num: u64,
    payload: T,
}

impl<T> PartialEq for ScheduledEvent<T> {
    fn eq(&self, other: &Self) -> bool {
        self.due_time == other.due_time && self.sequence_num == other.sequence_num
    }
}

impl<T> Eq for ScheduledEvent<T> {}

impl<T> PartialOrd for ScheduledEvent<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for ScheduledEvent<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap (BinaryHeap is max-heap by default).
        // Due times never hold NaN: `schedule` rejects non-finite delays.
        other
            .due_time
            .total_cmp(&self.due_time)
            .then_with(|| other.sequence_num.cmp(&self.sequence_num))
    }
}

/// Time-ordered event queue owning the simulated clock.
///
/// Events due at the same instant are dispatched in FIFO insertion order:
/// the monotonically increasing sequence number breaks ties.
pub struct EventScheduler<T> {
    event_queue: BinaryHeap<ScheduledEvent<T>>,
    sequence_counter: u64,
    now: SimTime,
}

impl<T> EventScheduler<T> {
    /// Create a new EventScheduler with the clock at zero
    pub fn new() -> Self {
        Self {
            event_queue: BinaryHeap::new(),
            sequence_counter: 0,
            now: 0.0,
        }
    }

    /// Current simulated time. Monotonically non-decreasing.
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// Schedule a payload for dispatch `delay` time units from now.
    pub fn schedule(&mut self, delay: SimTime, payload: T) -> Result<(), SimError> {
        if !delay.is_finite() || delay < 0.0 {
            return Err(SimError::InvalidDelay { delay });
        }

        let scheduled_event = ScheduledEvent {
            due_time: self.now + delay,
            sequence_num: self.sequence_counter,
            payload,
        };
        trace!(
            "scheduled event seq={} due={:.6}",
            scheduled_event.sequence_num,
            scheduled_event.due_time
        );

        self.event_queue.push(scheduled_event);
        self.sequence_counter += 1;
        Ok(())
    }

    /// Pop the earliest event due at or before `horizon`, advancing the
    /// clock to its due time. Returns `None` when the queue is empty or the
    /// next event lies beyond the horizon; the clock is then left where it
    /// is (callers advance it with [`advance_to`](Self::advance_to)).
    pub fn pop_due(&mut self, horizon: SimTime) -> Option<T> {
        match self.peek_next_due() {
            Some(due) if due <= horizon => {
                let event = self.event_queue.pop()?;
                self.now = event.due_time;
                Some(event.payload)
            }
            _ => None,
        }
    }

    /// Get the next due time without removing the event
    pub fn peek_next_due(&self) -> Option<SimTime> {
        self.event_queue.peek().map(|event| event.due_time)
    }

    /// Check if there are any events remaining in the queue
    pub fn has_events(&self) -> bool {
        !self.event_queue.is_empty()
    }

    /// Number of pending events.
    pub fn len(&self) -> usize {
        self.event_queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.event_queue.is_empty()
    }

    /// Advance the clock to `horizon` at the end of a run. The clock never
    /// moves backwards.
    pub fn advance_to(&mut self, horizon: SimTime) {
        if horizon > self.now {
            self.now = horizon;
        }
    }
}

impl<T> Default for EventScheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_events_in_time_order() {
        let mut scheduler = EventScheduler::new();
        scheduler.schedule(3.0, "c").unwrap();
        scheduler.schedule(1.0, "a").unwrap();
        scheduler.schedule(2.0, "b").unwrap();

        assert_eq!(scheduler.pop_due(10.0), Some("a"));
        assert_eq!(scheduler.now(), 1.0);
        assert_eq!(scheduler.pop_due(10.0), Some("b"));
        assert_eq!(scheduler.pop_due(10.0), Some("c"));
        assert_eq!(scheduler.now(), 3.0);
        assert_eq!(scheduler.pop_due(10.0), None);
    }

    #[test]
    fn equal_due_times_dispatch_in_fifo_order() {
        let mut scheduler = EventScheduler::new();
        scheduler.schedule(1.0, "first").unwrap();
        scheduler.schedule(1.0, "second").unwrap();
        scheduler.schedule(1.0, "third").unwrap();

        assert_eq!(scheduler.pop_due(10.0), Some("first"));
        assert_eq!(scheduler.pop_due(10.0), Some("second"));
        assert_eq!(scheduler.pop_due(10.0), Some("third"));
    }

    #[test]
    fn rejects_negative_delay() {
        let mut scheduler = EventScheduler::new();
        let err = scheduler.schedule(-0.5, ()).unwrap_err();
        assert_eq!(err, SimError::InvalidDelay { delay: -0.5 });
        assert!(!scheduler.has_events());
    }

    #[test]
    fn rejects_non_finite_delay() {
        let mut scheduler = EventScheduler::new();
        assert!(scheduler.schedule(f64::NAN, ()).is_err());
        assert!(scheduler.schedule(f64::INFINITY, ()).is_err());
    }

    #[test]
    fn events_beyond_horizon_stay_queued() {
        let mut scheduler = EventScheduler::new();
        scheduler.schedule(5.0, "late").unwrap();

        assert_eq!(scheduler.pop_due(4.0), None);
        assert_eq!(scheduler.now(), 0.0);
        assert!(scheduler.has_events());

        scheduler.advance_to(4.0);
        assert_eq!(scheduler.now(), 4.0);
        assert_eq!(scheduler.pop_due(5.0), Some("late"));
        assert_eq!(scheduler.now(), 5.0);
    }

    #[test]
    fn delays_are_relative_to_the_current_clock() {
        let mut scheduler = EventScheduler::new();
        scheduler.schedule(1.0, "a").unwrap();
        scheduler.pop_due(10.0);
        scheduler.schedule(1.0, "b").unwrap();

        assert_eq!(scheduler.peek_next_due(), Some(2.0));
    }

    #[test]
    fn advance_to_never_moves_backwards() {
        let mut scheduler: EventScheduler<()> = EventScheduler::new();
        scheduler.advance_to(7.0);
        scheduler.advance_to(3.0);
        assert_eq!(scheduler.now(), 7.0);
    }
}
