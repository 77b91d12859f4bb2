use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

use crate::behavior::{BehaviorError, BehaviorResult, BehaviorUnit, UnitContext};
use crate::config::ContentConfig;
use crate::modules::viewport::{IntersectionWatcher, WatchOptions};
use crate::platform::{ElementId, FRAME_INTERVAL, PageEvent, Selector};

/// Running state of one counter animation.
#[derive(Debug, Clone, PartialEq)]
pub struct CounterProgress {
    target: f64,
    current: f64,
    increment: f64,
    shown: Option<i64>,
}

impl CounterProgress {
    /// Animate from zero to `target` over `duration`, one step per frame.
    pub fn new(target: f64, duration: Duration) -> Self {
        let frames = (duration.as_secs_f64() / FRAME_INTERVAL.as_secs_f64()).max(1.0);
        Self {
            target,
            current: 0.0,
            increment: target / frames,
            shown: None,
        }
    }

    /// Advance one frame. Returns the text to display if it changed, and
    /// whether the animation has finished.
    pub fn step(&mut self) -> (Option<String>, bool) {
        self.current += self.increment;
        if self.current >= self.target {
            self.current = self.target;
            return (Some(format_count(self.target)), true);
        }
        let floor = self.current.floor() as i64;
        if self.shown == Some(floor) {
            return (None, false);
        }
        self.shown = Some(floor);
        (Some(floor.to_string()), false)
    }

    pub fn current(&self) -> f64 {
        self.current
    }
}

fn format_count(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// Counts `[data-target]` elements up from zero the first time they scroll
/// into view.
#[derive(Debug)]
pub struct Counters {
    config: ContentConfig,
    watcher: IntersectionWatcher,
    visited: HashSet<ElementId>,
    running: BTreeMap<u64, (ElementId, CounterProgress)>,
    next_tag: u64,
}

impl Counters {
    pub fn new(config: ContentConfig) -> Self {
        Self {
            config,
            watcher: IntersectionWatcher::new(WatchOptions::default()),
            visited: HashSet::new(),
            running: BTreeMap::new(),
            next_tag: 0,
        }
    }

    pub fn is_running(&self) -> bool {
        !self.running.is_empty()
    }

    fn check_visibility(&mut self, ctx: &mut UnitContext<'_>) -> BehaviorResult<()> {
        let entries = self.watcher.poll(ctx.view());
        let mut first_error = None;

        for entry in entries.into_iter().filter(|entry| entry.is_intersecting) {
            self.watcher.release(entry.handle);
            if !self.visited.insert(entry.element) {
                continue;
            }
            if let Err(err) = self.begin(entry.element, ctx) {
                log::warn!("counter {} not animated: {err}", entry.element);
                first_error.get_or_insert(err);
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn begin(&mut self, element: ElementId, ctx: &mut UnitContext<'_>) -> BehaviorResult<()> {
        let raw = ctx.view().attr(element, "data-target")?.unwrap_or_default();
        let target = raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite() && *value >= 0.0)
            .ok_or_else(|| BehaviorError::InvalidAttribute {
                element,
                name: "data-target".into(),
                value: raw.clone(),
            })?;

        self.next_tag += 1;
        let tag = self.next_tag;
        self.running.insert(
            tag,
            (element, CounterProgress::new(target, self.config.counter_duration())),
        );
        ctx.request_animation_frame(tag);
        Ok(())
    }

    fn on_frame(&mut self, tag: u64, ctx: &mut UnitContext<'_>) -> BehaviorResult<()> {
        let Some((element, progress)) = self.running.get_mut(&tag) else {
            return Ok(());
        };
        let element = *element;
        let (text, finished) = progress.step();
        if finished {
            self.running.remove(&tag);
        } else {
            ctx.request_animation_frame(tag);
        }
        if let Some(text) = text {
            ctx.host().set_text(element, &text)?;
        }
        Ok(())
    }
}

impl BehaviorUnit for Counters {
    fn name(&self) -> &'static str {
        "counters"
    }

    fn start(&mut self, ctx: &mut UnitContext<'_>) -> BehaviorResult<()> {
        let selector = Selector::parse(&self.config.counter_selector)?;
        for element in ctx.view().query_all(&selector) {
            self.watcher.observe(element);
        }
        self.check_visibility(ctx)
    }

    fn handle(&mut self, event: &PageEvent, ctx: &mut UnitContext<'_>) -> BehaviorResult<()> {
        match event {
            PageEvent::Scroll | PageEvent::Resize | PageEvent::Load => self.check_visibility(ctx),
            PageEvent::AnimationFrame { tag } => self.on_frame(*tag, ctx),
            _ => Ok(()),
        }
    }

    fn stop(&mut self, _ctx: &mut UnitContext<'_>) -> BehaviorResult<()> {
        self.watcher.release_all();
        self.running.clear();
        Ok(())
    }
}
