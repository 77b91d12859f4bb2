use crate::behavior::{BehaviorResult, BehaviorUnit, UnitContext};
use crate::config::NavigationConfig;
use crate::platform::{ElementId, PageEvent, ScrollBehavior, Selector};

/// Turns in-page anchor clicks into smooth viewport scrolls.
#[derive(Debug)]
pub struct SmoothScroll {
    config: NavigationConfig,
    anchors: Option<Selector>,
}

impl SmoothScroll {
    pub fn new(config: NavigationConfig) -> Self {
        Self {
            config,
            anchors: None,
        }
    }

    fn on_click(&self, target: ElementId, ctx: &mut UnitContext<'_>) -> BehaviorResult<()> {
        let Some(anchors) = &self.anchors else {
            return Ok(());
        };
        let view = ctx.view();
        let Some(anchor) = view.closest(target, anchors)? else {
            return Ok(());
        };
        let Some(href) = view.attr(anchor, "href")? else {
            return Ok(());
        };
        let Some(fragment) = in_page_fragment(&href) else {
            return Ok(());
        };

        let destination = match view.element_by_id(fragment) {
            Some(section) => Some(view.offset_top(section)?),
            None => None,
        };
        ctx.prevent_default();

        match destination {
            Some(top) => ctx.host().scroll_to(top, ScrollBehavior::Smooth),
            None => log::debug!("anchor {href} points at no element"),
        }
        Ok(())
    }
}

/// Id an in-page link points at; `None` for placeholder hrefs (`#`, `#!`)
/// and links leaving the page.
pub(crate) fn in_page_fragment(href: &str) -> Option<&str> {
    let fragment = href.strip_prefix('#')?;
    if fragment.is_empty() || fragment == "!" {
        return None;
    }
    Some(fragment)
}

impl BehaviorUnit for SmoothScroll {
    fn name(&self) -> &'static str {
        "smooth-scroll"
    }

    fn start(&mut self, _ctx: &mut UnitContext<'_>) -> BehaviorResult<()> {
        self.anchors = Some(Selector::parse(&self.config.anchor_selector)?);
        Ok(())
    }

    fn handle(&mut self, event: &PageEvent, ctx: &mut UnitContext<'_>) -> BehaviorResult<()> {
        match event {
            PageEvent::Click { target } => self.on_click(*target, ctx),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::behavior::testing::Harness;

    const PAGE: &str = r##"
        <html><body>
          <a class="go" href="#pricing"><span class="label">Pricing</span></a>
          <a class="missing" href="#nowhere">Gone</a>
          <a class="placeholder" href="#">Top</a>
          <a class="hashbang" href="#!">Bang</a>
          <a class="external" href="https://example.com/#pricing">Out</a>
          <section id="pricing"></section>
        </body></html>
    "##;

    fn setup() -> (Harness, SmoothScroll) {
        let mut harness = Harness::parse(PAGE);
        let pricing = harness.first("#pricing");
        harness.doc.set_layout(pricing, 1400.0, 600.0).unwrap();
        let mut unit = SmoothScroll::new(NavigationConfig::default());
        harness.start(&mut unit).unwrap();
        (harness, unit)
    }

    #[test]
    fn scrolls_target_to_viewport_top() {
        let (mut harness, mut unit) = setup();
        let label = harness.first(".label");
        assert!(harness.send(&mut unit, PageEvent::Click { target: label }));
        assert_eq!(
            harness.doc.last_scroll_request(),
            Some((1400.0, ScrollBehavior::Smooth))
        );
    }

    #[test]
    fn missing_target_still_prevents_navigation() {
        let (mut harness, mut unit) = setup();
        let missing = harness.first(".missing");
        assert!(harness.send(&mut unit, PageEvent::Click { target: missing }));
        assert_eq!(harness.doc.last_scroll_request(), None);
    }

    #[test]
    fn placeholder_and_external_links_are_left_alone() {
        let (mut harness, mut unit) = setup();
        for class in [".placeholder", ".hashbang", ".external"] {
            let link = harness.first(class);
            assert!(!harness.send(&mut unit, PageEvent::Click { target: link }));
        }
        assert_eq!(harness.doc.last_scroll_request(), None);
    }

    #[test]
    fn fragment_parsing() {
        assert_eq!(in_page_fragment("#about"), Some("about"));
        assert_eq!(in_page_fragment("#"), None);
        assert_eq!(in_page_fragment("#!"), None);
        assert_eq!(in_page_fragment("/about#team"), None);
    }
}
