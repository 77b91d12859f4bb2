use crate::behavior::{BehaviorResult, BehaviorUnit, UnitContext};
use crate::config::LifecycleConfig;
use crate::modules::viewport::{IntersectionWatcher, WatchOptions};
use crate::platform::{PageEvent, Selector};

/// Swaps `data-src` into `src` once an image nears the viewport.
#[derive(Debug)]
pub struct LazyImages {
    config: LifecycleConfig,
    watcher: IntersectionWatcher,
}

impl LazyImages {
    pub fn new(config: LifecycleConfig) -> Self {
        Self {
            config,
            watcher: IntersectionWatcher::new(WatchOptions::default()),
        }
    }

    pub fn pending(&self) -> usize {
        self.watcher.len()
    }

    fn load_visible(&mut self, ctx: &mut UnitContext<'_>) -> BehaviorResult<()> {
        for entry in self.watcher.poll(ctx.view()) {
            if !entry.is_intersecting {
                continue;
            }
            self.watcher.release(entry.handle);
            let image = entry.element;
            let Some(source) = ctx.view().attr(image, "data-src")? else {
                continue;
            };
            let host = ctx.host();
            host.set_attr(image, "src", &source)?;
            host.remove_attr(image, "data-src")?;
            host.add_class(image, "loaded")?;
            log::debug!("lazy image {image} loading {source}");
        }
        Ok(())
    }
}

impl BehaviorUnit for LazyImages {
    fn name(&self) -> &'static str {
        "lazy-images"
    }

    fn start(&mut self, ctx: &mut UnitContext<'_>) -> BehaviorResult<()> {
        let selector = Selector::parse(&self.config.lazy_image_selector)?;
        for image in ctx.view().query_all(&selector) {
            self.watcher.observe(image);
        }
        self.load_visible(ctx)
    }

    fn handle(&mut self, event: &PageEvent, ctx: &mut UnitContext<'_>) -> BehaviorResult<()> {
        match event {
            PageEvent::Scroll | PageEvent::Resize | PageEvent::Load => self.load_visible(ctx),
            _ => Ok(()),
        }
    }

    fn stop(&mut self, _ctx: &mut UnitContext<'_>) -> BehaviorResult<()> {
        self.watcher.release_all();
        Ok(())
    }
}
