//! Rate-limiting helpers for bursty page signals.
//!
//! [`Debounce`] and [`Throttle`] are time-explicit state machines: callers
//! pass the current page time and get back what should run. Behavior units
//! pair them with scheduler timers. [`debounce`] and [`throttle`] wrap a
//! callback for the classic "wrapped action" shape.

use std::fmt;
use std::time::Duration;

/// Collapses a burst of calls into one call after `wait` of silence.
#[derive(Debug, Clone)]
pub struct Debounce<A> {
    wait: Duration,
    pending: Option<(Duration, A)>,
}

impl<A> Debounce<A> {
    pub fn new(wait: Duration) -> Self {
        Self { wait, pending: None }
    }

    /// Record a call, superseding any pending one. Returns the new deadline.
    pub fn call(&mut self, now: Duration, args: A) -> Duration {
        let deadline = now.saturating_add(self.wait);
        self.pending = Some((deadline, args));
        deadline
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.pending.as_ref().map(|(deadline, _)| *deadline)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Take the pending arguments if the quiet period has elapsed.
    pub fn poll(&mut self, now: Duration) -> Option<A> {
        match &self.pending {
            Some((deadline, _)) if *deadline <= now => self.pending.take().map(|(_, args)| args),
            _ => None,
        }
    }

    pub fn cancel(&mut self) -> Option<A> {
        self.pending.take().map(|(_, args)| args)
    }
}

/// Outcome of a [`Throttle::call`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThrottleCall<A> {
    /// Execute now with these arguments.
    Run(A),
    /// A trailing execution was scheduled; poll again at `due`.
    Scheduled { due: Duration },
    /// Folded into the already scheduled trailing execution.
    Coalesced,
}

/// At most one execution per `delay` window, plus one trailing execution
/// carrying the latest arguments.
#[derive(Debug, Clone)]
pub struct Throttle<A> {
    delay: Duration,
    last_run: Option<Duration>,
    trailing: Option<(Duration, A)>,
}

impl<A> Throttle<A> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            last_run: None,
            trailing: None,
        }
    }

    pub fn call(&mut self, now: Duration, args: A) -> ThrottleCall<A> {
        if let Some((_, latest)) = self.trailing.as_mut() {
            *latest = args;
            return ThrottleCall::Coalesced;
        }

        match self.last_run {
            Some(last) if now.saturating_sub(last) < self.delay => {
                let due = last.saturating_add(self.delay);
                self.trailing = Some((due, args));
                ThrottleCall::Scheduled { due }
            }
            _ => {
                self.last_run = Some(now);
                ThrottleCall::Run(args)
            }
        }
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.trailing.as_ref().map(|(due, _)| *due)
    }

    /// Take the trailing execution if its window has closed.
    pub fn poll(&mut self, now: Duration) -> Option<A> {
        match &self.trailing {
            Some((due, _)) if *due <= now => {
                self.last_run = Some(now);
                self.trailing.take().map(|(_, args)| args)
            }
            _ => None,
        }
    }

    pub fn last_run(&self) -> Option<Duration> {
        self.last_run
    }
}

type Action<A> = Box<dyn FnMut(A) + Send>;

/// A debounced callback. See [`debounce`].
pub struct Debounced<A> {
    state: Debounce<A>,
    action: Action<A>,
}

impl<A> Debounced<A> {
    pub fn call(&mut self, now: Duration, args: A) -> Duration {
        self.state.call(now, args)
    }

    /// Run the callback if it is due. Returns whether it ran.
    pub fn flush(&mut self, now: Duration) -> bool {
        match self.state.poll(now) {
            Some(args) => {
                (self.action)(args);
                true
            }
            None => false,
        }
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.state.deadline()
    }
}

impl<A> fmt::Debug for Debounced<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Debounced")
            .field("deadline", &self.state.deadline())
            .finish()
    }
}

/// A throttled callback. See [`throttle`].
pub struct Throttled<A> {
    state: Throttle<A>,
    action: Action<A>,
}

impl<A> Throttled<A> {
    /// Invoke; runs the callback immediately when the window allows it.
    pub fn call(&mut self, now: Duration, args: A) -> bool {
        match self.state.call(now, args) {
            ThrottleCall::Run(args) => {
                (self.action)(args);
                true
            }
            ThrottleCall::Scheduled { .. } | ThrottleCall::Coalesced => false,
        }
    }

    /// Run the trailing call if it is due. Returns whether it ran.
    pub fn flush(&mut self, now: Duration) -> bool {
        match self.state.poll(now) {
            Some(args) => {
                (self.action)(args);
                true
            }
            None => false,
        }
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.state.deadline()
    }
}

impl<A> fmt::Debug for Throttled<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Throttled")
            .field("deadline", &self.state.deadline())
            .field("last_run", &self.state.last_run())
            .finish()
    }
}

/// Wrap `action` so bursts execute once, `wait` after the last call.
pub fn debounce<A, F>(action: F, wait: Duration) -> Debounced<A>
where
    F: FnMut(A) + Send + 'static,
{
    Debounced {
        state: Debounce::new(wait),
        action: Box::new(action),
    }
}

/// Wrap `action` so it runs at most once per `delay`, plus a trailing call.
pub fn throttle<A, F>(action: F, delay: Duration) -> Throttled<A>
where
    F: FnMut(A) + Send + 'static,
{
    Throttled {
        state: Throttle::new(delay),
        action: Box::new(action),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn recorder() -> (Arc<Mutex<Vec<u64>>>, impl FnMut(u64) + Send + 'static) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = log.clone();
        (log, move |arg: u64| sink.lock().unwrap().push(arg))
    }

    #[test]
    fn throttle_runs_leading_then_one_trailing_with_latest_args() {
        let (log, sink) = recorder();
        let mut wrapped = throttle(sink, ms(10));
        let mut fired_at = Vec::new();

        for t in [0, 5, 12] {
            if wrapped.call(ms(t), t) {
                fired_at.push(ms(t));
            }
        }
        assert_eq!(wrapped.deadline(), Some(ms(10)));

        let now = ms(12);
        if wrapped.flush(now) {
            fired_at.push(now);
        }

        assert_eq!(*log.lock().unwrap(), vec![0, 12]);
        assert_eq!(fired_at[0], ms(0));
        assert!(fired_at[1] >= ms(10));
    }

    #[test]
    fn throttle_state_reports_schedule_and_coalescing() {
        let mut state = Throttle::new(ms(16));
        assert_eq!(state.call(ms(0), 'a'), ThrottleCall::Run('a'));
        assert_eq!(state.call(ms(4), 'b'), ThrottleCall::Scheduled { due: ms(16) });
        assert_eq!(state.call(ms(8), 'c'), ThrottleCall::Coalesced);
        assert_eq!(state.poll(ms(15)), None);
        assert_eq!(state.poll(ms(16)), Some('c'));
        assert_eq!(state.call(ms(40), 'd'), ThrottleCall::Run('d'));
    }

    #[test]
    fn debounce_collapses_burst_to_last_call() {
        let (log, sink) = recorder();
        let mut wrapped = debounce(sink, ms(250));

        for (i, t) in [0u64, 40, 90, 200, 320].into_iter().enumerate() {
            wrapped.call(ms(t), i as u64);
            assert!(!wrapped.flush(ms(t)));
        }
        assert_eq!(wrapped.deadline(), Some(ms(570)));
        assert!(!wrapped.flush(ms(569)));
        assert!(wrapped.flush(ms(570)));
        assert!(!wrapped.flush(ms(900)));

        assert_eq!(*log.lock().unwrap(), vec![4]);
    }

    #[test]
    fn debounce_cancel_drops_pending() {
        let mut state = Debounce::new(ms(100));
        state.call(ms(0), "resize");
        assert_eq!(state.cancel(), Some("resize"));
        assert_eq!(state.poll(ms(500)), None);
    }
}
