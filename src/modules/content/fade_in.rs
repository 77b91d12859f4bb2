use crate::behavior::{BehaviorResult, BehaviorUnit, UnitContext};
use crate::config::ContentConfig;
use crate::modules::viewport::{IntersectionWatcher, WatchOptions};
use crate::platform::{PageEvent, Selector};

/// Reveals card-like blocks the first time they scroll into view.
#[derive(Debug)]
pub struct FadeIn {
    config: ContentConfig,
    watcher: IntersectionWatcher,
}

impl FadeIn {
    pub fn new(config: ContentConfig) -> Self {
        let options = WatchOptions::default()
            .with_threshold(config.fade_in_threshold)
            .with_bottom_margin(config.fade_in_bottom_margin);
        Self {
            config,
            watcher: IntersectionWatcher::new(options),
        }
    }

    pub fn pending(&self) -> usize {
        self.watcher.len()
    }

    fn reveal_visible(&mut self, ctx: &mut UnitContext<'_>) -> BehaviorResult<()> {
        for entry in self.watcher.poll(ctx.view()) {
            if !entry.is_intersecting {
                continue;
            }
            ctx.host().add_class(entry.element, "revealed")?;
            self.watcher.release(entry.handle);
        }
        Ok(())
    }
}

impl BehaviorUnit for FadeIn {
    fn name(&self) -> &'static str {
        "fade-in"
    }

    fn start(&mut self, ctx: &mut UnitContext<'_>) -> BehaviorResult<()> {
        let selector = Selector::parse(&self.config.fade_in_selector)?;
        for element in ctx.view().query_all(&selector) {
            ctx.host().add_class(element, "fade-in")?;
            self.watcher.observe(element);
        }
        self.reveal_visible(ctx)
    }

    fn handle(&mut self, event: &PageEvent, ctx: &mut UnitContext<'_>) -> BehaviorResult<()> {
        match event {
            PageEvent::Scroll | PageEvent::Resize | PageEvent::Load => self.reveal_visible(ctx),
            _ => Ok(()),
        }
    }

    fn stop(&mut self, _ctx: &mut UnitContext<'_>) -> BehaviorResult<()> {
        self.watcher.release_all();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::testing::Harness;
    use crate::platform::Dom;

    #[test]
    fn reveals_once_inside_shrunk_viewport() {
        let mut harness = Harness::parse(
            r#"<html><body>
                <div class="service-card"></div>
                <div class="portfolio-item"></div>
                <div class="unrelated"></div>
            </body></html>"#,
        );
        let card = harness.first(".service-card");
        let item = harness.first(".portfolio-item");
        harness.doc.set_layout(card, 100.0, 200.0).unwrap();
        harness.doc.set_layout(item, 770.0, 200.0).unwrap();

        let mut unit = FadeIn::new(ContentConfig::default());
        harness.start(&mut unit).unwrap();

        assert!(harness.doc.has_class(card, "fade-in").unwrap());
        assert!(harness.doc.has_class(card, "revealed").unwrap());
        // Its top 30px are on screen but fall in the 50px bottom margin.
        assert!(!harness.doc.has_class(item, "revealed").unwrap());
        assert_eq!(unit.pending(), 1);

        harness.doc.set_scroll_y(200.0);
        harness.send(&mut unit, PageEvent::Scroll);
        assert!(harness.doc.has_class(item, "revealed").unwrap());
        assert_eq!(unit.pending(), 0);

        // One-shot: leaving the viewport keeps the reveal.
        harness.doc.set_scroll_y(5000.0);
        harness.send(&mut unit, PageEvent::Scroll);
        assert!(harness.doc.has_class(card, "revealed").unwrap());
        let unrelated = harness.first(".unrelated");
        assert!(!harness.doc.has_class(unrelated, "fade-in").unwrap());
    }
}
