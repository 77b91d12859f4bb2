//! Site configuration
//!
//! Provides:
//! - Feature flags for every behavior unit
//! - Selectors and timings per behavior group
//! - JSON loading and validation

pub mod settings;

pub use settings::{
    ConfigError, ContentConfig, FeatureFlags, FormConfig, LifecycleConfig, NavigationConfig,
    SiteConfig,
};
