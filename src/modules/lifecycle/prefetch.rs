use std::collections::HashSet;

use crate::behavior::{BehaviorResult, BehaviorUnit, UnitContext};
use crate::config::LifecycleConfig;
use crate::modules::navigation::smooth_scroll::in_page_fragment;
use crate::platform::{ElementId, PageEvent, Selector};

/// Marks a link's target section as prefetched the first time the pointer
/// rests on the link.
#[derive(Debug)]
pub struct HoverPrefetch {
    config: LifecycleConfig,
    anchors: Option<Selector>,
    seen: HashSet<ElementId>,
}

impl HoverPrefetch {
    pub fn new(config: LifecycleConfig) -> Self {
        Self {
            config,
            anchors: None,
            seen: HashSet::new(),
        }
    }

    fn on_pointer_enter(&mut self, target: ElementId, ctx: &mut UnitContext<'_>) -> BehaviorResult<()> {
        let Some(anchors) = &self.anchors else {
            return Ok(());
        };
        let view = ctx.view();
        let Some(link) = view.closest(target, anchors)? else {
            return Ok(());
        };
        if !self.seen.insert(link) {
            return Ok(());
        }

        let href = view.attr(link, "href")?.unwrap_or_default();
        let section = in_page_fragment(&href).and_then(|id| view.element_by_id(id));
        if let Some(section) = section {
            ctx.host().set_attr(section, "data-prefetched", "true")?;
            log::debug!("prefetched {href}");
        }
        Ok(())
    }
}

impl BehaviorUnit for HoverPrefetch {
    fn name(&self) -> &'static str {
        "hover-prefetch"
    }

    fn start(&mut self, _ctx: &mut UnitContext<'_>) -> BehaviorResult<()> {
        self.anchors = Some(Selector::parse(&self.config.prefetch_selector)?);
        Ok(())
    }

    fn handle(&mut self, event: &PageEvent, ctx: &mut UnitContext<'_>) -> BehaviorResult<()> {
        match event {
            PageEvent::PointerEnter { target } => self.on_pointer_enter(*target, ctx),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::testing::Harness;
    use crate::platform::Dom;

    #[test]
    fn marks_target_once_per_link() {
        let mut harness = Harness::parse(
            r##"<html><body>
                <a class="to-team" href="#team"><b>Team</b></a>
                <a class="to-top" href="#">Top</a>
                <section id="team"></section>
            </body></html>"##,
        );
        let mut unit = HoverPrefetch::new(LifecycleConfig::default());
        harness.start(&mut unit).unwrap();

        let inner = harness.first("b");
        let team = harness.first("#team");
        harness.send(&mut unit, PageEvent::PointerEnter { target: inner });
        assert_eq!(harness.doc.attr(team, "data-prefetched").unwrap().as_deref(), Some("true"));

        harness.doc.remove_attr(team, "data-prefetched").unwrap();
        let link = harness.first(".to-team");
        harness.send(&mut unit, PageEvent::PointerEnter { target: link });
        assert_eq!(harness.doc.attr(team, "data-prefetched").unwrap(), None);

        let top = harness.first(".to-top");
        harness.send(&mut unit, PageEvent::PointerEnter { target: top });
        assert!(harness.select("[data-prefetched]").is_empty());
    }
}
