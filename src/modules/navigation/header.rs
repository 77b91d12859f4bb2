use crate::behavior::{BehaviorResult, BehaviorUnit, ThrottledSignal, UnitContext};
use crate::config::NavigationConfig;
use crate::platform::{ElementId, PageEvent, Selector};

const SAMPLE: u64 = 1;

/// Adds `scrolled` to the header once the page leaves the top.
#[derive(Debug)]
pub struct HeaderStyle {
    config: NavigationConfig,
    header: Option<ElementId>,
    sampler: ThrottledSignal,
}

impl HeaderStyle {
    pub fn new(config: NavigationConfig) -> Self {
        let sampler = ThrottledSignal::new(config.header_throttle(), SAMPLE);
        Self {
            config,
            header: None,
            sampler,
        }
    }

    fn update(&self, ctx: &mut UnitContext<'_>) -> BehaviorResult<()> {
        let Some(header) = self.header else {
            return Ok(());
        };
        let scrolled = ctx.view().scroll_y() > self.config.header_threshold;
        ctx.host().toggle_class(header, "scrolled", scrolled)?;
        Ok(())
    }
}

impl BehaviorUnit for HeaderStyle {
    fn name(&self) -> &'static str {
        "header-style"
    }

    fn start(&mut self, ctx: &mut UnitContext<'_>) -> BehaviorResult<()> {
        let selector = Selector::parse(&self.config.header_selector)?;
        self.header = ctx.view().query_first(&selector);
        self.update(ctx)
    }

    fn handle(&mut self, event: &PageEvent, ctx: &mut UnitContext<'_>) -> BehaviorResult<()> {
        match event {
            PageEvent::Scroll | PageEvent::Timer { .. } if self.sampler.accept(event, ctx) => {
                self.update(ctx)
            }
            _ => Ok(()),
        }
    }
}
