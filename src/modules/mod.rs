//! Behavior modules
//!
//! Navigation, content and form behaviors plus the page lifecycle units,
//! along with the timing and viewport helpers they share.

pub mod content;
pub mod events;
pub mod form;
pub mod lifecycle;
pub mod navigation;
pub mod timing;
pub mod viewport;

// Re-export commonly used types
pub use content::{Counters, FadeIn, Parallax, ScrollToTop};
pub use events::{
    EventDispatcher, EventHandler, LoggingHandler, RegistrationEvent, RuntimeErrorEvent,
    SiteEvent, SubmissionEvent, UnitEvent, UnitFailureEvent, UnitPhase,
};
pub use form::{
    ContactForm, FieldError, FormSubmission, FormSubmitter, HttpSubmitter, SimulatedSubmitter,
    SubmissionState, SubmitError,
};
pub use lifecycle::{
    HoverPrefetch, LazyImages, OfflineCache, OfflineRegistrar, Preloader, RegistrationError,
};
pub use navigation::{ActiveLink, HeaderStyle, MobileMenu, SmoothScroll};
pub use timing::{Debounce, Debounced, Throttle, ThrottleCall, Throttled, debounce, throttle};
pub use viewport::{IntersectionEntry, IntersectionWatcher, WatchHandle, WatchOptions};
