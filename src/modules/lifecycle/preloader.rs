use crate::behavior::{BehaviorResult, BehaviorUnit, UnitContext};
use crate::config::LifecycleConfig;
use crate::platform::{ElementId, PageEvent};

const FADE: u64 = 1;
const REMOVE: u64 = 2;

/// Full-page loading overlay, faded out shortly after the load event.
#[derive(Debug)]
pub struct Preloader {
    config: LifecycleConfig,
    overlay: Option<ElementId>,
    loaded: bool,
}

impl Preloader {
    pub fn new(config: LifecycleConfig) -> Self {
        Self {
            config,
            overlay: None,
            loaded: false,
        }
    }

    pub fn overlay(&self) -> Option<ElementId> {
        self.overlay
    }
}

impl BehaviorUnit for Preloader {
    fn name(&self) -> &'static str {
        "preloader"
    }

    fn start(&mut self, ctx: &mut UnitContext<'_>) -> BehaviorResult<()> {
        let host = ctx.host();
        let overlay = host.create_element("div");
        host.add_class(overlay, "preloader")?;
        host.set_attr(overlay, "aria-hidden", "true")?;
        let spinner = host.create_element("div");
        host.add_class(spinner, "loader")?;
        host.append_child(overlay, spinner)?;
        let body = host.body();
        host.append_child(body, overlay)?;
        self.overlay = Some(overlay);
        Ok(())
    }

    fn handle(&mut self, event: &PageEvent, ctx: &mut UnitContext<'_>) -> BehaviorResult<()> {
        let Some(overlay) = self.overlay else {
            return Ok(());
        };
        match event {
            PageEvent::Load if !self.loaded => {
                self.loaded = true;
                ctx.set_timeout(self.config.preloader_delay(), FADE);
            }
            PageEvent::Timer { tag: FADE, .. } => {
                ctx.host().add_class(overlay, "fade-out")?;
                ctx.set_timeout(self.config.preloader_fade(), REMOVE);
            }
            PageEvent::Timer { tag: REMOVE, .. } => {
                self.overlay = None;
                if ctx.view().is_connected(overlay) {
                    ctx.host().remove(overlay)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn stop(&mut self, ctx: &mut UnitContext<'_>) -> BehaviorResult<()> {
        if let Some(overlay) = self.overlay.take()
            && ctx.view().is_connected(overlay)
        {
            ctx.host().remove(overlay)?;
        }
        Ok(())
    }
}
