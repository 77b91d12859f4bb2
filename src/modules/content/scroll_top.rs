use crate::behavior::{BehaviorResult, BehaviorUnit, ThrottledSignal, UnitContext};
use crate::config::ContentConfig;
use crate::platform::{ElementId, PageEvent, ScrollBehavior};

const SAMPLE: u64 = 1;

/// Floating "back to top" button, shown once the reader is deep in the page.
#[derive(Debug)]
pub struct ScrollToTop {
    config: ContentConfig,
    button: Option<ElementId>,
    sampler: ThrottledSignal,
}

impl ScrollToTop {
    pub fn new(config: ContentConfig) -> Self {
        let sampler = ThrottledSignal::new(config.scroll_top_throttle(), SAMPLE);
        Self {
            config,
            button: None,
            sampler,
        }
    }

    pub fn button(&self) -> Option<ElementId> {
        self.button
    }

    fn update(&self, ctx: &mut UnitContext<'_>) -> BehaviorResult<()> {
        let Some(button) = self.button else {
            return Ok(());
        };
        let visible = ctx.view().scroll_y() > self.config.scroll_top_threshold;
        ctx.host().toggle_class(button, "visible", visible)?;
        Ok(())
    }
}

impl BehaviorUnit for ScrollToTop {
    fn name(&self) -> &'static str {
        "scroll-to-top"
    }

    fn start(&mut self, ctx: &mut UnitContext<'_>) -> BehaviorResult<()> {
        let host = ctx.host();
        let button = host.create_element("button");
        host.add_class(button, "scroll-to-top")?;
        host.set_attr(button, "type", "button")?;
        host.set_attr(button, "aria-label", &self.config.scroll_top_label)?;
        host.set_text(button, "\u{2191}")?;
        let body = host.body();
        host.append_child(body, button)?;
        self.button = Some(button);
        self.update(ctx)
    }

    fn handle(&mut self, event: &PageEvent, ctx: &mut UnitContext<'_>) -> BehaviorResult<()> {
        match event {
            PageEvent::Click { target } => {
                if let Some(button) = self.button
                    && ctx.view().contains(button, *target)
                {
                    ctx.host().scroll_to(0.0, ScrollBehavior::Smooth);
                }
                Ok(())
            }
            PageEvent::Scroll | PageEvent::Timer { .. } if self.sampler.accept(event, ctx) => {
                self.update(ctx)
            }
            _ => Ok(()),
        }
    }

    fn stop(&mut self, ctx: &mut UnitContext<'_>) -> BehaviorResult<()> {
        if let Some(button) = self.button.take()
            && ctx.view().is_connected(button)
        {
            ctx.host().remove(button)?;
        }
        Ok(())
    }
}
