use crate::behavior::{BehaviorResult, BehaviorUnit, ThrottledSignal, UnitContext};
use crate::config::NavigationConfig;
use crate::platform::{Host, PageEvent, Selector};

const SAMPLE: u64 = 1;

/// A section's id and vertical extent in document coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionBox {
    pub id: String,
    pub top: f64,
    pub height: f64,
}

/// The section the reader is in: the last one (document order) whose
/// band `[top - offset, top - offset + height)` contains `scroll_y`.
///
/// Overscroll above the page (`scroll_y < 0`) selects nothing.
pub fn current_section(scroll_y: f64, offset: f64, sections: &[SectionBox]) -> Option<&str> {
    if scroll_y < 0.0 {
        return None;
    }
    sections
        .iter()
        .rev()
        .find(|section| {
            let start = section.top - offset;
            scroll_y >= start && scroll_y < start + section.height
        })
        .map(|section| section.id.as_str())
}

/// Highlights the nav link pointing at the section in view.
#[derive(Debug)]
pub struct ActiveLink {
    config: NavigationConfig,
    sections: Option<Selector>,
    links: Option<Selector>,
    sampler: ThrottledSignal,
    current: Option<String>,
}

impl ActiveLink {
    pub fn new(config: NavigationConfig) -> Self {
        let sampler = ThrottledSignal::new(config.active_link_throttle(), SAMPLE);
        Self {
            config,
            sections: None,
            links: None,
            sampler,
            current: None,
        }
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    fn measure(&self, dom: &dyn Host) -> BehaviorResult<Vec<SectionBox>> {
        let Some(sections) = &self.sections else {
            return Ok(Vec::new());
        };
        let mut boxes = Vec::new();
        for section in dom.query_all(sections) {
            let Some(id) = dom.attr(section, "id")? else {
                continue;
            };
            boxes.push(SectionBox {
                id,
                top: dom.offset_top(section)?,
                height: dom.offset_height(section)?,
            });
        }
        Ok(boxes)
    }

    fn update(&mut self, ctx: &mut UnitContext<'_>) -> BehaviorResult<()> {
        let Some(links) = self.links.clone() else {
            return Ok(());
        };
        let boxes = self.measure(ctx.view())?;
        let current = current_section(ctx.view().scroll_y(), self.config.section_offset, &boxes)
            .map(|id| format!("#{id}"));

        let host = ctx.host();
        for link in host.query_all(&links) {
            let href = host.attr(link, "href")?;
            let active = current.is_some() && href == current;
            host.toggle_class(link, "active", active)?;
        }
        self.current = current.map(|href| href.trim_start_matches('#').to_string());
        Ok(())
    }
}

impl BehaviorUnit for ActiveLink {
    fn name(&self) -> &'static str {
        "active-link"
    }

    fn start(&mut self, ctx: &mut UnitContext<'_>) -> BehaviorResult<()> {
        self.sections = Some(Selector::parse(&self.config.section_selector)?);
        self.links = Some(Selector::parse(&self.config.link_selector)?);
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
