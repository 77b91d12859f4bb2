use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use site_behaviors::{
    Document, Dom, ElementId, EventHandler, FeatureFlags, Key, ManualClock, OfflineRegistrar,
    PageEvent, RegistrationError, ScrollBehavior, Selector, Site, SiteBuilder, SiteConfig,
    SiteEvent,
    modules::UnitPhase,
};

const PAGE: &str = r##"
<html><body>
  <header class="header">
    <button class="nav-toggle" aria-label="Menu">Menu</button>
    <nav class="nav-menu">
      <a class="nav-link" href="#home">Home</a>
      <a class="nav-link" href="#services">Services</a>
      <a class="nav-link" href="#contact">Contact</a>
    </nav>
  </header>
  <section id="home" class="hero"><h1>We build things</h1></section>
  <section id="services">
    <div class="service-card">Design</div>
    <span class="stat" data-target="150">0</span>
  </section>
  <section id="contact">
    <form id="contact-form">
      <input type="text" name="name" required>
      <input type="email" name="email" required>
      <input type="tel" name="phone">
      <textarea name="message" required></textarea>
      <button type="submit">Send</button>
    </form>
  </section>
</body></html>
"##;

#[derive(Default)]
struct Recorder(Mutex<Vec<SiteEvent>>);

impl Recorder {
    fn events(&self) -> Vec<SiteEvent> {
        self.0.lock().unwrap().clone()
    }
}

impl EventHandler for Recorder {
    fn handle(&self, event: &SiteEvent) {
        self.0.lock().unwrap().push(event.clone());
    }
}

struct Page {
    site: Site<Document>,
    clock: ManualClock,
    telemetry: Arc<Recorder>,
}

impl Page {
    fn load(markup: &str) -> Self {
        Self::load_with(markup, SiteConfig::default(), None)
    }

    fn load_with(
        markup: &str,
        config: SiteConfig,
        registrar: Option<Arc<dyn OfflineRegistrar>>,
    ) -> Self {
        let mut doc = Document::parse_html(markup, 1024.0, 800.0).unwrap();
        for (raw, top, height) in [
            ("#home", 0.0, 800.0),
            ("#services", 800.0, 800.0),
            ("#contact", 1600.0, 800.0),
            (".stat", 1200.0, 40.0),
        ] {
            if let Some(element) = doc.query_first(&Selector::parse(raw).unwrap()) {
                doc.set_layout(element, top, height).unwrap();
            }
        }

        let clock = ManualClock::new();
        let telemetry = Arc::new(Recorder::default());
        let mut builder = SiteBuilder::new()
            .with_config(config)
            .with_clock(Arc::new(clock.clone()))
            .with_event_handler(telemetry.clone());
        if let Some(registrar) = registrar {
            builder = builder.with_offline_registrar(registrar);
        }
        let mut site = builder.build(doc).unwrap();
        site.start().unwrap();
        Self {
            site,
            clock,
            telemetry,
        }
    }

    fn advance(&mut self, ms: u64) {
        for _ in 0..ms {
            self.clock.advance(Duration::from_millis(1));
            self.site.step();
        }
    }

    fn scroll_to(&mut self, y: f64) {
        self.site.host_mut().set_scroll_y(y);
        self.site.dispatch(PageEvent::Scroll);
    }

    fn find(&self, raw: &str) -> Option<ElementId> {
        self.site.host().query_first(&Selector::parse(raw).unwrap())
    }

    fn el(&self, raw: &str) -> ElementId {
        self.find(raw).unwrap()
    }

    fn has_class(&self, raw: &str, class: &str) -> bool {
        self.site.host().has_class(self.el(raw), class).unwrap()
    }

    fn text(&self, raw: &str) -> String {
        self.site.host().text(self.el(raw)).unwrap()
    }

    fn fill(&mut self, raw: &str, value: &str) {
        let field = self.el(raw);
        self.site.host_mut().set_value(field, value).unwrap();
    }

    fn submit(&mut self) -> bool {
        let form = self.el("#contact-form");
        self.site
            .dispatch(PageEvent::Submit { form })
            .default_prevented
    }
}

#[test]
fn scrolling_updates_navigation_state() {
    let mut page = Page::load(PAGE);

    page.scroll_to(850.0);
    assert!(page.has_class(r##".nav-link[href="#services"]"##, "active"));
    assert!(!page.has_class(r##".nav-link[href="#home"]"##, "active"));
    assert!(page.has_class(".header", "scrolled"));
    assert!(page.has_class(".scroll-to-top", "visible"));

    page.advance(200);
    page.scroll_to(-50.0);
    page.advance(200);
    assert!(page.site.host().query_all(&Selector::parse(".nav-link.active").unwrap()).is_empty());
    assert!(!page.has_class(".header", "scrolled"));
    assert!(!page.has_class(".scroll-to-top", "visible"));
}

#[test]
fn menu_closes_when_a_link_is_followed() {
    let mut page = Page::load(PAGE);
    let toggle = page.el(".nav-toggle");
    let body = page.site.host().body();

    page.site.dispatch(PageEvent::Click { target: toggle });
    assert!(page.has_class(".nav-menu", "active"));
    assert_eq!(
        page.site.host().attr(toggle, "aria-expanded").unwrap().as_deref(),
        Some("true")
    );
    assert_eq!(
        page.site.host().style(body, "overflow").unwrap().as_deref(),
        Some("hidden")
    );

    let link = page.el(r##".nav-link[href="#contact"]"##);
    let outcome = page.site.dispatch(PageEvent::Click { target: link });
    assert!(outcome.default_prevented);
    assert!(!page.has_class(".nav-menu", "active"));
    assert_eq!(page.site.host().style(body, "overflow").unwrap(), None);
    assert_eq!(
        page.site.host().last_scroll_request(),
        Some((1600.0, ScrollBehavior::Smooth))
    );

    page.site.dispatch(PageEvent::Click { target: toggle });
    page.site.dispatch(PageEvent::KeyDown { key: Key::Escape });
    assert!(!page.has_class(".nav-menu", "active"));
}

#[test]
fn valid_form_is_sent_after_simulated_delay() {
    let mut page = Page::load(PAGE);
    page.fill("input[name=name]", "Ada Lovelace");
    page.fill("input[name=email]", "ada@example.com");
    page.fill("textarea", "Hello there");

    assert!(page.submit());
    let button = page.el("button[type=submit]");
    assert!(page.site.host().attr(button, "disabled").unwrap().is_some());
    assert_eq!(page.text("button[type=submit]"), "Sending...");

    assert!(page.submit(), "resubmission is still intercepted");
    page.advance(1900);
    assert!(page.find(".form-success").is_none());
    assert!(page.site.host().attr(button, "disabled").unwrap().is_some());

    page.advance(200);
    assert!(page.site.host().attr(button, "disabled").unwrap().is_none());
    assert_eq!(page.text("button[type=submit]"), "Send");
    assert!(page.find(".form-success").is_some());
    let email = page.el("input[name=email]");
    assert_eq!(page.site.host().value(email).unwrap(), "");

    let sent: Vec<_> = page
        .telemetry
        .events()
        .into_iter()
        .filter_map(|event| match event {
            SiteEvent::Submission(submission) => Some((submission.success, submission.fields)),
            _ => None,
        })
        .collect();
    assert_eq!(sent, vec![(true, 4)]);

    page.advance(5000);
    assert!(page.find(".form-success").is_none());
}

#[test]
fn invalid_form_shows_errors_and_is_not_sent() {
    let mut page = Page::load(PAGE);
    page.fill("input[name=name]", "Ada");
    page.fill("input[name=email]", "not-an-email");

    assert!(page.submit());
    let errors = page
        .site
        .host()
        .query_all(&Selector::parse(".error-message").unwrap());
    assert_eq!(errors.len(), 2);
    assert_eq!(
        page.text(".form-error"),
        "Please correct the errors above and try again."
    );
    let button = page.el("button[type=submit]");
    assert!(page.site.host().attr(button, "disabled").unwrap().is_none());

    page.advance(3000);
    assert!(page.find(".form-success").is_none());
    assert!(
        !page
            .telemetry
            .events()
            .iter()
            .any(|event| matches!(event, SiteEvent::Submission(_)))
    );
}

#[test]
fn counter_runs_once_scrolled_into_view() {
    let mut page = Page::load(PAGE);
    page.advance(100);
    assert_eq!(page.text(".stat"), "0");

    page.scroll_to(900.0);
    page.advance(1000);
    let midway: u32 = page.text(".stat").parse().unwrap();
    assert!(midway > 0 && midway < 150, "midway value {midway}");

    page.advance(1500);
    assert_eq!(page.text(".stat"), "150");

    page.scroll_to(0.0);
    page.scroll_to(900.0);
    page.advance(100);
    assert_eq!(page.text(".stat"), "150");
}

#[test]
fn preloader_fades_out_after_load() {
    let mut page = Page::load(PAGE);
    assert!(page.find(".preloader").is_some());

    page.site.dispatch(PageEvent::Load);
    page.advance(600);
    assert!(page.has_class(".preloader", "fade-out"));
    page.advance(300);
    assert!(page.find(".preloader").is_none());
}

#[test]
fn failing_unit_is_disabled_while_others_keep_running() {
    let markup = PAGE.replace(r#"data-target="150""#, r#"data-target="lots""#);
    let mut page = Page::load(&markup);
    assert!(page.site.is_active("counters"));

    page.advance(20);
    page.scroll_to(900.0);
    assert!(page.site.is_active("counters"), "runtime failures keep the unit");
    assert!(page.has_class(r##".nav-link[href="#services"]"##, "active"));

    let failures: Vec<_> = page
        .telemetry
        .events()
        .into_iter()
        .filter_map(|event| match event {
            SiteEvent::UnitFailed(failure) => Some((failure.unit, failure.phase)),
            _ => None,
        })
        .collect();
    assert_eq!(failures, vec![("counters", UnitPhase::Event("scroll"))]);
}

#[test]
fn start_failure_disables_only_that_unit() {
    let markup = PAGE.replace(r#"data-target="150""#, r#"data-target="lots""#);
    let mut doc = Document::parse_html(&markup, 1024.0, 800.0).unwrap();
    let stat = doc.query_first(&Selector::parse(".stat").unwrap()).unwrap();
    doc.set_layout(stat, 300.0, 40.0).unwrap();

    let telemetry = Arc::new(Recorder::default());
    let mut site = SiteBuilder::new()
        .with_clock(Arc::new(ManualClock::new()))
        .with_event_handler(telemetry.clone())
        .build(doc)
        .unwrap();
    site.start().unwrap();

    assert!(!site.is_active("counters"));
    assert!(site.is_active("active-link"));
    assert!(site.is_active("contact-form"));
    assert!(telemetry.events().iter().any(|event| matches!(
        event,
        SiteEvent::UnitFailed(failure)
            if failure.unit == "counters" && failure.phase == UnitPhase::Start
    )));
}

#[test]
fn page_errors_are_reported_not_raised() {
    let page = Page::load(PAGE);
    let before = page.site.active_units();
    page.site.report_error("TypeError: x is undefined");

    assert_eq!(page.site.active_units(), before);
    assert!(page.telemetry.events().iter().any(|event| matches!(
        event,
        SiteEvent::RuntimeError(error) if error.message == "TypeError: x is undefined"
    )));
}

struct CountingRegistrar(Mutex<Vec<String>>);

#[async_trait]
impl OfflineRegistrar for CountingRegistrar {
    async fn register(&self, script: &str) -> Result<(), RegistrationError> {
        self.0.lock().unwrap().push(script.to_string());
        Ok(())
    }
}

#[test]
fn offline_cache_registers_after_load() {
    let registrar = Arc::new(CountingRegistrar(Mutex::new(Vec::new())));
    let mut page = Page::load_with(PAGE, SiteConfig::default(), Some(registrar.clone()));
    assert!(page.site.is_active("offline-cache"));

    page.site.dispatch(PageEvent::Load);
    page.advance(5);
    assert_eq!(*registrar.0.lock().unwrap(), vec!["/sw.js".to_string()]);
    assert!(page.telemetry.events().iter().any(|event| matches!(
        event,
        SiteEvent::Registration(registration) if registration.success
    )));
}

#[test]
fn features_can_be_switched_off_from_json() {
    let config = SiteConfig::from_json_str(
        r#"{ "features": { "parallax": false, "preloader": false } }"#,
    )
    .unwrap();
    let page = Page::load_with(PAGE, config, None);
    assert!(!page.site.is_active("parallax"));
    assert!(page.find(".preloader").is_none());
    assert!(page.site.is_active("mobile-menu"));

    let bare = Page::load_with(
        PAGE,
        SiteConfig {
            features: FeatureFlags::none(),
            ..SiteConfig::default()
        },
        None,
    );
    assert!(bare.site.active_units().is_empty());
}
