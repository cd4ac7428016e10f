use core_types::{Millis, TimerId};

struct Pending<T> {
    id: TimerId,
    due_at: Millis,
    seq: u64,
    task: T,
}

/// `setTimeout`-style queue over a virtual clock.
///
/// Nothing runs on its own: the host pops due tasks while advancing the
/// clock. Tasks due at the same instant come out in scheduling order.
pub struct TimerQueue<T> {
    now: Millis,
    next_id: TimerId,
    next_seq: u64,
    pending: Vec<Pending<T>>,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self {
            now: 0,
            next_id: 1,
            next_seq: 0,
            pending: Vec::new(),
        }
    }

    pub fn now(&self) -> Millis {
        self.now
    }

    pub fn schedule(&mut self, delay: Millis, task: T) -> TimerId {
        let id = self.next_id;
        self.next_id += 1;
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.push(Pending {
            id,
            due_at: self.now.saturating_add(delay),
            seq,
            task,
        });
        id
    }

    /// Returns `false` if the timer already fired or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.id != id);
        before != self.pending.len()
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.pending.iter().any(|p| p.id == id)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Removes the earliest task due at or before `until`, moving the clock to
    /// its deadline.
    pub fn pop_due(&mut self, until: Millis) -> Option<(TimerId, T)> {
        let (index, _) = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, p)| p.due_at <= until)
            .min_by_key(|(_, p)| (p.due_at, p.seq))?;
        let p = self.pending.swap_remove(index);
        self.now = self.now.max(p.due_at);
        Some((p.id, p.task))
    }

    /// Moves the clock forward without running anything.
    pub fn set_now(&mut self, now: Millis) {
        self.now = self.now.max(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_in_deadline_then_schedule_order() {
        let mut q = TimerQueue::new();
        q.schedule(5000, "dismiss");
        q.schedule(0, "arm-a");
        q.schedule(0, "arm-b");

        assert_eq!(q.pop_due(0).map(|(_, t)| t), Some("arm-a"));
        assert_eq!(q.pop_due(0).map(|(_, t)| t), Some("arm-b"));
        assert_eq!(q.pop_due(4999).map(|(_, t)| t), None);
        assert_eq!(q.pop_due(5000).map(|(_, t)| t), Some("dismiss"));
        assert_eq!(q.now(), 5000);
        assert!(q.is_empty());
    }

    #[test]
    fn cancel_is_idempotent() {
        let mut q = TimerQueue::new();
        let id = q.schedule(10, ());
        assert!(q.is_pending(id));
        assert!(q.cancel(id));
        assert!(!q.cancel(id));
        assert!(q.pop_due(100).is_none());
    }

    #[test]
    fn delays_are_relative_to_current_clock() {
        let mut q = TimerQueue::new();
        q.set_now(1000);
        q.schedule(10, 1);
        assert!(q.pop_due(1009).is_none());
        assert_eq!(q.pop_due(1010).map(|(_, t)| t), Some(1));
    }
}
