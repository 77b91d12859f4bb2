//! The contract every behavior unit implements.
//!
//! Units are constructed once by [`Site::start`](crate::Site::start), then
//! receive page events through [`BehaviorUnit::handle`]. They never reach
//! each other; everything they share lives in the DOM.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

use crate::modules::events::{EventDispatcher, SiteEvent};
use crate::modules::timing::{Throttle, ThrottleCall};
use crate::platform::{
    DomError, ElementId, Host, PageEvent, Scheduler, SelectorError, TaskQueue, TaskResult,
    TimerId, UnitId,
};

/// Result alias used by behavior units.
pub type BehaviorResult<T> = Result<T, BehaviorError>;

#[derive(Debug, Error)]
pub enum BehaviorError {
    #[error("dom error: {0}")]
    Dom(#[from] DomError),
    #[error("bad selector in configuration: {0}")]
    Selector(#[from] SelectorError),
    #[error("required element not found: {0}")]
    MissingElement(String),
    #[error("element {element} has invalid {name}={value:?}")]
    InvalidAttribute {
        element: ElementId,
        name: String,
        value: String,
    },
}

/// Uniform lifecycle of an independently initialised piece of UI logic.
pub trait BehaviorUnit {
    fn name(&self) -> &'static str;

    /// Bind to the page. Called once, on page-ready.
    fn start(&mut self, ctx: &mut UnitContext<'_>) -> BehaviorResult<()>;

    fn handle(&mut self, event: &PageEvent, ctx: &mut UnitContext<'_>) -> BehaviorResult<()>;

    /// Undo anything `start` added to the page. Pending timers, frames and
    /// tasks of the unit are cancelled by the site afterwards.
    fn stop(&mut self, _ctx: &mut UnitContext<'_>) -> BehaviorResult<()> {
        Ok(())
    }
}

/// Capabilities handed to a unit for the duration of one callback.
pub struct UnitContext<'a> {
    host: &'a mut dyn Host,
    scheduler: &'a mut Scheduler,
    tasks: &'a mut TaskQueue,
    telemetry: &'a EventDispatcher,
    unit: UnitId,
    now: Duration,
    default_prevented: bool,
}

impl<'a> UnitContext<'a> {
    pub(crate) fn new(
        host: &'a mut dyn Host,
        scheduler: &'a mut Scheduler,
        tasks: &'a mut TaskQueue,
        telemetry: &'a EventDispatcher,
        unit: UnitId,
        now: Duration,
    ) -> Self {
        Self {
            host,
            scheduler,
            tasks,
            telemetry,
            unit,
            now,
            default_prevented: false,
        }
    }

    pub fn host(&mut self) -> &mut dyn Host {
        &mut *self.host
    }

    pub fn view(&self) -> &dyn Host {
        &*self.host
    }

    /// Page time at which the current event is being handled.
    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn unit(&self) -> UnitId {
        self.unit
    }

    /// Schedule a `Timer` event for this unit after `delay`.
    pub fn set_timeout(&mut self, delay: Duration, tag: u64) -> TimerId {
        self.scheduler
            .set_timeout(self.unit, self.now.saturating_add(delay), tag)
    }

    pub fn clear_timeout(&mut self, id: TimerId) -> bool {
        self.scheduler.clear_timeout(id)
    }

    /// Ask for an `AnimationFrame` event on the next frame.
    pub fn request_animation_frame(&mut self, tag: u64) {
        self.scheduler.request_frame(self.unit, tag);
    }

    /// Run `future` in the background; its result arrives as `TaskComplete`.
    pub fn spawn<F>(&mut self, tag: u64, future: F)
    where
        F: Future<Output = TaskResult> + Send + 'static,
    {
        self.tasks.spawn(self.unit, tag, Box::pin(future));
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }

    pub fn emit(&self, event: SiteEvent) {
        self.telemetry.dispatch(event);
    }
}

/// A throttle whose trailing call is delivered through a unit timer.
///
/// Feed every raw signal to [`ThrottledSignal::signal`] and every `Timer`
/// event to [`ThrottledSignal::on_timer`]; either returns `true` when the
/// caller should sample the page now.
#[derive(Debug)]
pub struct ThrottledSignal {
    throttle: Throttle<()>,
    tag: u64,
    timer: Option<TimerId>,
}

impl ThrottledSignal {
    pub fn new(delay: Duration, tag: u64) -> Self {
        Self {
            throttle: Throttle::new(delay),
            tag,
            timer: None,
        }
    }

    pub fn signal(&mut self, ctx: &mut UnitContext<'_>) -> bool {
        match self.throttle.call(ctx.now(), ()) {
            ThrottleCall::Run(()) => true,
            ThrottleCall::Scheduled { due } => {
                let delay = due.saturating_sub(ctx.now());
                self.timer = Some(ctx.set_timeout(delay, self.tag));
                false
            }
            ThrottleCall::Coalesced => false,
        }
    }

    pub fn on_timer(&mut self, id: TimerId, tag: u64, ctx: &UnitContext<'_>) -> bool {
        if tag != self.tag || self.timer != Some(id) {
            return false;
        }
        self.timer = None;
        self.throttle.poll(ctx.now()).is_some()
    }

    /// Convenience for units whose only inputs are scroll-like signals.
    pub fn accept(&mut self, event: &PageEvent, ctx: &mut UnitContext<'_>) -> bool {
        match event {
            PageEvent::Timer { id, tag } => self.on_timer(*id, *tag, ctx),
            _ => self.signal(ctx),
        }
    }
}
