//! Cooperative timer queue
//!
//! Stands in for browser timeouts/intervals. Nothing runs on its own:
//! the session pops due tasks in (due time, insertion) order and runs each
//! as one serialized callback.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// Handle to a pending timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// Work a timer triggers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// Regular spawn batch; re-armed with the current difficulty's interval
    SpawnTick,
    /// Second phase of a target change: spawn against the committed target
    ImmediateSpawn,
    /// One progressive worm at session start
    WormSpawn,
    /// Periodic worm top-up
    WormInterval,
    /// Invalidate the fairness cache
    FairnessSweep,
}

/// A task popped from the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fired {
    pub id: TimerId,
    pub task: Task,
    /// Logical time the task was due (callbacks run "at" this time)
    pub due: u64,
}

#[derive(Debug, Clone)]
struct Entry {
    due: u64,
    seq: u64,
    id: TimerId,
    task: Task,
    period: Option<u64>,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.due, self.seq).cmp(&(other.due, other.seq))
    }
}

#[derive(Debug, Default)]
pub struct Scheduler {
    queue: BinaryHeap<Reverse<Entry>>,
    next_id: u64,
    seq: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, due: u64, task: Task, period: Option<u64>, id: TimerId) {
        let seq = self.seq;
        self.seq += 1;
        self.queue.push(Reverse(Entry {
            due,
            seq,
            id,
            task,
            period,
        }));
    }

    fn alloc_id(&mut self) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Run `task` once, `delay_ms` after `now`. A zero delay defers the task
    /// to the next drain rather than running it inline.
    pub fn schedule(&mut self, now: u64, delay_ms: u64, task: Task) -> TimerId {
        let id = self.alloc_id();
        self.push(now.saturating_add(delay_ms), task, None, id);
        id
    }

    /// Run `task` every `period_ms`, first at `now + period_ms`
    pub fn schedule_every(&mut self, now: u64, period_ms: u64, task: Task) -> TimerId {
        let period = period_ms.max(1);
        let id = self.alloc_id();
        self.push(now.saturating_add(period), task, Some(period), id);
        id
    }

    /// Cancel every pending timer. Returns how many were dropped.
    pub fn cancel_all(&mut self) -> usize {
        let dropped = self.queue.len();
        self.queue.clear();
        dropped
    }

    /// Pop the earliest task due at or before `now`. Recurring timers are
    /// re-armed under the same id before returning.
    pub fn pop_due(&mut self, now: u64) -> Option<Fired> {
        let due = self.queue.peek().map(|Reverse(entry)| entry.due)?;
        if due > now {
            return None;
        }
        let Reverse(entry) = self.queue.pop()?;
        if let Some(period) = entry.period {
            self.push(entry.due.saturating_add(period), entry.task, Some(period), entry.id);
        }
        Some(Fired {
            id: entry.id,
            task: entry.task,
            due: entry.due,
        })
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Number of pending timers for a task kind
    pub fn pending(&self, task: Task) -> usize {
        self.queue
            .iter()
            .filter(|Reverse(entry)| entry.task == task)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_in_due_then_insertion_order() {
        let mut sched = Scheduler::new();
        sched.schedule(0, 100, Task::WormSpawn);
        sched.schedule(0, 0, Task::ImmediateSpawn);
        sched.schedule(0, 0, Task::FairnessSweep);

        assert_eq!(sched.pop_due(0).unwrap().task, Task::ImmediateSpawn);
        assert_eq!(sched.pop_due(0).unwrap().task, Task::FairnessSweep);
        assert!(sched.pop_due(99).is_none());
        let fired = sched.pop_due(250).unwrap();
        assert_eq!(fired.task, Task::WormSpawn);
        assert_eq!(fired.due, 100);
        assert!(sched.is_empty());
    }

    #[test]
    fn test_recurring_rearms_with_same_id() {
        let mut sched = Scheduler::new();
        let id = sched.schedule_every(0, 1000, Task::WormInterval);
        let first = sched.pop_due(1000).unwrap();
        assert_eq!(first.id, id);
        assert_eq!(sched.pending(Task::WormInterval), 1);
        // A late drain catches up one period at a time
        assert_eq!(sched.pop_due(3500).unwrap().due, 2000);
        assert_eq!(sched.pop_due(3500).unwrap().due, 3000);
        assert!(sched.pop_due(3500).is_none());
    }

    #[test]
    fn test_cancel_all_drops_one_shot_and_recurring() {
        let mut sched = Scheduler::new();
        sched.schedule(0, 10, Task::WormSpawn);
        sched.schedule(0, 20, Task::WormSpawn);
        sched.schedule_every(0, 30, Task::SpawnTick);
        assert_eq!(sched.pending(Task::WormSpawn), 2);

        assert_eq!(sched.cancel_all(), 3);
        assert!(sched.pop_due(u64::MAX).is_none());
    }
}
