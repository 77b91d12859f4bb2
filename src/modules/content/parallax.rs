use crate::behavior::{BehaviorResult, BehaviorUnit, ThrottledSignal, UnitContext};
use crate::config::ContentConfig;
use crate::platform::{ElementId, PageEvent, Selector};

const SAMPLE: u64 = 1;

/// Hero offset for a scroll position, or `None` once the hero is out of range.
pub fn parallax_offset(
    scroll_y: f64,
    hero_height: f64,
    viewport_height: f64,
    factor: f64,
) -> Option<f64> {
    if scroll_y < 0.0 || scroll_y >= hero_height + viewport_height {
        return None;
    }
    let offset = scroll_y * factor;
    // Avoid rendering "-0px".
    Some(if offset == 0.0 { 0.0 } else { offset })
}

/// Moves the hero slower than the page while it is on screen.
#[derive(Debug)]
pub struct Parallax {
    config: ContentConfig,
    hero: Option<ElementId>,
    sampler: ThrottledSignal,
}

impl Parallax {
    pub fn new(config: ContentConfig) -> Self {
        let sampler = ThrottledSignal::new(config.parallax_throttle(), SAMPLE);
        Self {
            config,
            hero: None,
            sampler,
        }
    }

    fn update(&self, ctx: &mut UnitContext<'_>) -> BehaviorResult<()> {
        let Some(hero) = self.hero else {
            return Ok(());
        };
        let view = ctx.view();
        let offset = parallax_offset(
            view.scroll_y(),
            view.offset_height(hero)?,
            view.inner_height(),
            self.config.parallax_factor,
        );
        if let Some(offset) = offset {
            ctx.host()
                .set_style(hero, "transform", &format!("translateY({offset}px)"))?;
        }
        Ok(())
    }
}

impl BehaviorUnit for Parallax {
    fn name(&self) -> &'static str {
        "parallax"
    }

    fn start(&mut self, ctx: &mut UnitContext<'_>) -> BehaviorResult<()> {
        let selector = Selector::parse(&self.config.hero_selector)?;
        self.hero = ctx.view().query_first(&selector);
        Ok(())
    }

    fn handle(&mut self, event: &PageEvent, ctx: &mut UnitContext<'_>) -> BehaviorResult<()> {
        match event {
            PageEvent::Scroll | PageEvent::Timer { .. } if self.sampler.accept(event, ctx) => {
                self.update(ctx)
            }
            _ => Ok(()),
        }
    }

    fn stop(&mut self, ctx: &mut UnitContext<'_>) -> BehaviorResult<()> {
        if let Some(hero) = self.hero {
            ctx.host().set_style(hero, "transform", "")?;
        }
        Ok(())
    }
}
