use crate::behavior::{BehaviorResult, BehaviorUnit, UnitContext};
use crate::config::NavigationConfig;
use crate::modules::timing::Debounce;
use crate::platform::{ElementId, Key, PageEvent, Selector, TimerId};

const RESIZE_SETTLED: u64 = 1;

/// Mobile navigation drawer: closed or open.
#[derive(Debug)]
pub struct MobileMenu {
    config: NavigationConfig,
    toggle: Option<ElementId>,
    menu: Option<ElementId>,
    links: Option<Selector>,
    open: bool,
    resize: Debounce<()>,
    resize_timer: Option<TimerId>,
}

impl MobileMenu {
    pub fn new(config: NavigationConfig) -> Self {
        let resize = Debounce::new(config.resize_debounce());
        Self {
            config,
            toggle: None,
            menu: None,
            links: None,
            open: false,
            resize,
            resize_timer: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    fn set_open(&mut self, ctx: &mut UnitContext<'_>, open: bool) -> BehaviorResult<()> {
        let (Some(toggle), Some(menu)) = (self.toggle, self.menu) else {
            return Ok(());
        };
        let host = ctx.host();
        host.toggle_class(toggle, "active", open)?;
        host.toggle_class(menu, "active", open)?;
        host.set_attr(toggle, "aria-expanded", if open { "true" } else { "false" })?;
        let body = host.body();
        host.set_style(body, "overflow", if open { "hidden" } else { "" })?;
        self.open = open;
        Ok(())
    }

    fn on_click(&mut self, target: ElementId, ctx: &mut UnitContext<'_>) -> BehaviorResult<()> {
        let (Some(toggle), Some(menu)) = (self.toggle, self.menu) else {
            return Ok(());
        };
        let view = ctx.view();

        if view.contains(toggle, target) {
            let open = !self.open;
            return self.set_open(ctx, open);
        }
        if !self.open {
            return Ok(());
        }

        let on_link = match &self.links {
            Some(links) => view.closest(target, links)?.is_some(),
            None => false,
        };
        if on_link || !view.contains(menu, target) {
            self.set_open(ctx, false)?;
        }
        Ok(())
    }

    fn on_resize(&mut self, ctx: &mut UnitContext<'_>) {
        let deadline = self.resize.call(ctx.now(), ());
        if let Some(previous) = self.resize_timer.take() {
            ctx.clear_timeout(previous);
        }
        let delay = deadline.saturating_sub(ctx.now());
        self.resize_timer = Some(ctx.set_timeout(delay, RESIZE_SETTLED));
    }

    fn on_resize_settled(&mut self, ctx: &mut UnitContext<'_>) -> BehaviorResult<()> {
        self.resize_timer = None;
        if self.resize.poll(ctx.now()).is_none() {
            return Ok(());
        }
        if self.open && ctx.view().inner_width() > self.config.desktop_breakpoint {
            log::debug!("viewport widened past breakpoint; closing menu");
            self.set_open(ctx, false)?;
        }
        Ok(())
    }
}

impl BehaviorUnit for MobileMenu {
    fn name(&self) -> &'static str {
        "mobile-menu"
    }

    fn start(&mut self, ctx: &mut UnitContext<'_>) -> BehaviorResult<()> {
        let toggle = Selector::parse(&self.config.toggle_selector)?;
        let menu = Selector::parse(&self.config.menu_selector)?;
        self.links = Some(Selector::parse(&self.config.link_selector)?);

        let view = ctx.view();
        self.toggle = view.query_first(&toggle);
        self.menu = view.query_first(&menu);

        match self.toggle {
            Some(toggle) if self.menu.is_some() => {
                ctx.host().set_attr(toggle, "aria-expanded", "false")?;
            }
            _ => log::debug!("no mobile menu markup on this page"),
        }
        Ok(())
    }

    fn handle(&mut self, event: &PageEvent, ctx: &mut UnitContext<'_>) -> BehaviorResult<()> {
        match event {
            PageEvent::Click { target } => self.on_click(*target, ctx),
            PageEvent::KeyDown { key: Key::Escape } if self.open => self.set_open(ctx, false),
            PageEvent::Resize => {
                self.on_resize(ctx);
                Ok(())
            }
            PageEvent::Timer { tag: RESIZE_SETTLED, .. } => self.on_resize_settled(ctx),
            _ => Ok(()),
        }
    }

    fn stop(&mut self, ctx: &mut UnitContext<'_>) -> BehaviorResult<()> {
        if self.open {
            self.set_open(ctx, false)?;
        }
        Ok(())
    }
}
