//! # site-behaviors
//!
//! Client-side behaviors of a single-page marketing site, written against an
//! injected page host so they run the same in a browser binding, a headless
//! renderer or a unit test.
//!
//! ## Features
//!
//! - Mobile menu, header styling, active navigation link and smooth scrolling
//! - Hero parallax, animated counters, scroll-to-top button and fade-in reveals
//! - Contact form validation with background submission
//! - Preloader, lazy images, hover prefetch and offline cache registration
//! - Debounce/throttle helpers and an intersection watcher
//!
//! ## Example
//!
//! ```no_run
//! use site_behaviors::{Document, PageEvent, Site};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let markup = std::fs::read_to_string("public/index.html")?;
//!     let page = Document::parse_html(&markup, 1280.0, 800.0)?;
//!     let mut site = Site::new(page)?;
//!     site.start()?;
//!
//!     site.host_mut().set_scroll_y(900.0);
//!     site.dispatch(PageEvent::Scroll);
//!     site.step();
//!     Ok(())
//! }
//! ```

mod site;

pub mod behavior;
pub mod config;
pub mod modules;
pub mod platform;

pub use crate::site::{Site, SiteBuilder, SiteError, SiteResult};

pub use crate::behavior::{BehaviorError, BehaviorResult, BehaviorUnit, ThrottledSignal, UnitContext};

pub use crate::config::{
    ConfigError,
    ContentConfig,
    FeatureFlags,
    FormConfig,
    LifecycleConfig,
    NavigationConfig,
    SiteConfig,
};

pub use crate::platform::{
    Clock,
    DispatchOutcome,
    Document,
    Dom,
    DomError,
    DomResult,
    ElementId,
    Host,
    Key,
    ManualClock,
    PageEvent,
    ScrollBehavior,
    Selector,
    SelectorError,
    SystemClock,
    TaskFailure,
    TaskResult,
    TimerId,
    UnitId,
    Viewport,
};

pub use crate::modules::{
    ActiveLink,
    ContactForm,
    Counters,
    EventDispatcher,
    EventHandler,
    FadeIn,
    FieldError,
    FormSubmission,
    FormSubmitter,
    HeaderStyle,
    HoverPrefetch,
    HttpSubmitter,
    IntersectionWatcher,
    LazyImages,
    LoggingHandler,
    MobileMenu,
    OfflineCache,
    OfflineRegistrar,
    Parallax,
    Preloader,
    RegistrationError,
    ScrollToTop,
    SimulatedSubmitter,
    SiteEvent,
    SmoothScroll,
    SubmissionState,
    SubmitError,
    WatchOptions,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
