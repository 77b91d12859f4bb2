//! Timer, animation-frame and background-task bookkeeping.
//!
//! Nothing here blocks: the host calls [`Site::step`](crate::Site::step) and
//! the scheduler hands back whatever is due at that instant.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll, Waker};
use std::time::Duration;

use super::events::TaskResult;

/// Interval between animation frames (~60Hz).
pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Slot of a behavior unit in the site registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(pub(crate) usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer-{}", self.0)
    }
}

/// Boxed background future, e.g. a form submission.
pub type BoxTask = Pin<Box<dyn Future<Output = TaskResult> + Send>>;

#[derive(Debug, Clone, Copy)]
struct ScheduledTimer {
    owner: UnitId,
    tag: u64,
}

/// A timer that came due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DueTimer {
    pub id: TimerId,
    pub owner: UnitId,
    pub tag: u64,
}

#[derive(Debug)]
pub struct Scheduler {
    next_id: u64,
    timers: BTreeMap<(Duration, TimerId), ScheduledTimer>,
    deadlines: HashMap<TimerId, Duration>,
    frame_requests: Vec<(UnitId, u64)>,
    last_frame: Option<Duration>,
    frame_interval: Duration,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(FRAME_INTERVAL)
    }
}

impl Scheduler {
    pub fn new(frame_interval: Duration) -> Self {
        Self {
            next_id: 0,
            timers: BTreeMap::new(),
            deadlines: HashMap::new(),
            frame_requests: Vec::new(),
            last_frame: None,
            frame_interval,
        }
    }

    pub fn set_timeout(&mut self, owner: UnitId, due: Duration, tag: u64) -> TimerId {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        self.timers.insert((due, id), ScheduledTimer { owner, tag });
        self.deadlines.insert(id, due);
        id
    }

    /// Cancel a pending timer. Returns `false` if it already fired or was cleared.
    pub fn clear_timeout(&mut self, id: TimerId) -> bool {
        match self.deadlines.remove(&id) {
            Some(due) => self.timers.remove(&(due, id)).is_some(),
            None => false,
        }
    }

    /// Earliest timer due at or before `now`, removed from the queue.
    pub fn pop_due(&mut self, now: Duration) -> Option<DueTimer> {
        let (&(due, id), _) = self.timers.first_key_value()?;
        if due > now {
            return None;
        }
        let timer = self.timers.remove(&(due, id))?;
        self.deadlines.remove(&id);
        Some(DueTimer {
            id,
            owner: timer.owner,
            tag: timer.tag,
        })
    }

    pub fn request_frame(&mut self, owner: UnitId, tag: u64) {
        self.frame_requests.push((owner, tag));
    }

    /// Frame callbacks to run at `now`, if a frame boundary has been reached.
    ///
    /// Requests made while these callbacks run land in the following frame.
    pub fn take_frame(&mut self, now: Duration) -> Option<Vec<(UnitId, u64)>> {
        if self.frame_requests.is_empty() {
            return None;
        }
        if let Some(last) = self.last_frame
            && now.saturating_sub(last) < self.frame_interval
        {
            return None;
        }
        self.last_frame = Some(now);
        Some(std::mem::take(&mut self.frame_requests))
    }

    /// Earliest instant at which something is due.
    pub fn next_deadline(&self) -> Option<Duration> {
        let timer = self.timers.keys().next().map(|(due, _)| *due);
        let frame = (!self.frame_requests.is_empty()).then(|| {
            self.last_frame
                .map_or(Duration::ZERO, |last| last + self.frame_interval)
        });
        match (timer, frame) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Drop every timer and frame request owned by `owner`.
    pub fn cancel_owner(&mut self, owner: UnitId) {
        let cancelled: Vec<(Duration, TimerId)> = self
            .timers
            .iter()
            .filter(|(_, timer)| timer.owner == owner)
            .map(|(key, _)| *key)
            .collect();
        for (due, id) in cancelled {
            self.timers.remove(&(due, id));
            self.deadlines.remove(&id);
        }
        self.frame_requests.retain(|(unit, _)| *unit != owner);
    }
}

struct PendingTask {
    owner: UnitId,
    tag: u64,
    future: BoxTask,
}

/// Background futures polled once per host step.
#[derive(Default)]
pub struct TaskQueue {
    pending: Vec<PendingTask>,
}

impl fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskQueue")
            .field("pending", &self.pending.len())
            .finish()
    }
}

/// A finished background task.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedTask {
    pub owner: UnitId,
    pub tag: u64,
    pub result: TaskResult,
}

impl TaskQueue {
    pub fn spawn(&mut self, owner: UnitId, tag: u64, future: BoxTask) {
        self.pending.push(PendingTask { owner, tag, future });
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Poll every pending task once, in spawn order.
    ///
    /// The waker is a no-op: the host re-polls on every step.
    pub fn poll_ready(&mut self) -> Vec<CompletedTask> {
        let mut cx = Context::from_waker(Waker::noop());
        let mut completed = Vec::new();
        let mut index = 0;
        while index < self.pending.len() {
            match self.pending[index].future.as_mut().poll(&mut cx) {
                Poll::Ready(result) => {
                    let task = self.pending.remove(index);
                    completed.push(CompletedTask {
                        owner: task.owner,
                        tag: task.tag,
                        result,
                    });
                }
                Poll::Pending => index += 1,
            }
        }
        completed
    }

    pub fn cancel_owner(&mut self, owner: UnitId) {
        self.pending.retain(|task| task.owner != owner);
    }
}
