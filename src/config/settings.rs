use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::platform::{Selector, SelectorError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed configuration: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid selector for {field}: {source}")]
    Selector {
        field: &'static str,
        #[source]
        source: SelectorError,
    },
    #[error("invalid endpoint: {0}")]
    Endpoint(#[from] url::ParseError),
    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Which behavior units the site constructs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureFlags {
    pub mobile_menu: bool,
    pub header_style: bool,
    pub active_link: bool,
    pub smooth_scroll: bool,
    pub parallax: bool,
    pub counters: bool,
    pub scroll_to_top: bool,
    pub fade_in: bool,
    pub contact_form: bool,
    pub preloader: bool,
    pub lazy_images: bool,
    pub prefetch: bool,
    pub offline_cache: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            mobile_menu: true,
            header_style: true,
            active_link: true,
            smooth_scroll: true,
            parallax: true,
            counters: true,
            scroll_to_top: true,
            fade_in: true,
            contact_form: true,
            preloader: true,
            lazy_images: true,
            prefetch: true,
            offline_cache: true,
        }
    }
}

impl FeatureFlags {
    /// Every behavior switched off.
    pub fn none() -> Self {
        Self {
            mobile_menu: false,
            header_style: false,
            active_link: false,
            smooth_scroll: false,
            parallax: false,
            counters: false,
            scroll_to_top: false,
            fade_in: false,
            contact_form: false,
            preloader: false,
            lazy_images: false,
            prefetch: false,
            offline_cache: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    pub toggle_selector: String,
    pub menu_selector: String,
    pub link_selector: String,
    pub header_selector: String,
    pub section_selector: String,
    pub anchor_selector: String,
    /// Scroll offset past which the header gets the `scrolled` class.
    pub header_threshold: f64,
    pub header_throttle_ms: u64,
    /// Distance above a section's top at which it becomes current.
    pub section_offset: f64,
    pub active_link_throttle_ms: u64,
    pub desktop_breakpoint: f64,
    pub resize_debounce_ms: u64,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            toggle_selector: ".nav-toggle".into(),
            menu_selector: ".nav-menu".into(),
            link_selector: ".nav-link".into(),
            header_selector: ".header".into(),
            section_selector: "section[id]".into(),
            anchor_selector: "a[href^=\"#\"]".into(),
            header_threshold: 100.0,
            header_throttle_ms: 16,
            section_offset: 120.0,
            active_link_throttle_ms: 10,
            desktop_breakpoint: 768.0,
            resize_debounce_ms: 250,
        }
    }
}

impl NavigationConfig {
    pub fn header_throttle(&self) -> Duration {
        Duration::from_millis(self.header_throttle_ms)
    }

    pub fn active_link_throttle(&self) -> Duration {
        Duration::from_millis(self.active_link_throttle_ms)
    }

    pub fn resize_debounce(&self) -> Duration {
        Duration::from_millis(self.resize_debounce_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    pub hero_selector: String,
    /// Multiplier applied to the scroll offset for the hero translation.
    pub parallax_factor: f64,
    pub parallax_throttle_ms: u64,
    pub counter_selector: String,
    pub counter_duration_ms: u64,
    pub scroll_top_threshold: f64,
    pub scroll_top_throttle_ms: u64,
    pub scroll_top_label: String,
    pub fade_in_selector: String,
    pub fade_in_threshold: f64,
    pub fade_in_bottom_margin: f64,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            hero_selector: ".hero".into(),
            parallax_factor: -0.5,
            parallax_throttle_ms: 16,
            counter_selector: "[data-target]".into(),
            counter_duration_ms: 2000,
            scroll_top_threshold: 500.0,
            scroll_top_throttle_ms: 100,
            scroll_top_label: "Scroll to top".into(),
            fade_in_selector: ".service-card, .portfolio-item, .testimonial-card, .about-content"
                .into(),
            fade_in_threshold: 0.1,
            fade_in_bottom_margin: -50.0,
        }
    }
}

impl ContentConfig {
    pub fn parallax_throttle(&self) -> Duration {
        Duration::from_millis(self.parallax_throttle_ms)
    }

    pub fn counter_duration(&self) -> Duration {
        Duration::from_millis(self.counter_duration_ms)
    }

    pub fn scroll_top_throttle(&self) -> Duration {
        Duration::from_millis(self.scroll_top_throttle_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormConfig {
    pub form_selector: String,
    pub pending_label: String,
    pub success_message: String,
    /// Banner shown when required fields fail validation.
    pub invalid_message: String,
    /// Banner shown when the submitter reports an error.
    pub failure_message: String,
    pub success_banner_ms: u64,
    /// Latency of the built-in simulated submitter.
    pub simulated_delay_ms: u64,
    /// When set, submissions are POSTed here as JSON.
    pub endpoint: Option<String>,
    pub request_timeout_ms: u64,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            form_selector: "#contact-form".into(),
            pending_label: "Sending...".into(),
            success_message: "Thank you! Your message has been sent successfully.".into(),
            invalid_message: "Please correct the errors above and try again.".into(),
            failure_message: "Sorry, your message could not be sent. Please try again later."
                .into(),
            success_banner_ms: 5000,
            simulated_delay_ms: 2000,
            endpoint: None,
            request_timeout_ms: 10_000,
        }
    }
}

impl FormConfig {
    pub fn success_banner(&self) -> Duration {
        Duration::from_millis(self.success_banner_ms)
    }

    pub fn simulated_delay(&self) -> Duration {
        Duration::from_millis(self.simulated_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn endpoint_url(&self) -> Result<Option<Url>, ConfigError> {
        self.endpoint
            .as_deref()
            .map(Url::parse)
            .transpose()
            .map_err(ConfigError::from)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    pub preloader_delay_ms: u64,
    pub preloader_fade_ms: u64,
    pub lazy_image_selector: String,
    pub prefetch_selector: String,
    pub offline_script: String,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            preloader_delay_ms: 500,
            preloader_fade_ms: 300,
            lazy_image_selector: "img[data-src]".into(),
            prefetch_selector: "a[href^=\"#\"]".into(),
            offline_script: "/sw.js".into(),
        }
    }
}

impl LifecycleConfig {
    pub fn preloader_delay(&self) -> Duration {
        Duration::from_millis(self.preloader_delay_ms)
    }

    pub fn preloader_fade(&self) -> Duration {
        Duration::from_millis(self.preloader_fade_ms)
    }
}

/// Top-level configuration for a [`Site`](crate::Site).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub features: FeatureFlags,
    pub navigation: NavigationConfig,
    pub content: ContentConfig,
    pub form: FormConfig,
    pub lifecycle: LifecycleConfig,
}

impl SiteConfig {
    /// Parse JSON; missing keys take their defaults.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: SiteConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let nav = &self.navigation;
        let content = &self.content;
        let selectors: [(&'static str, &str); 12] = [
            ("navigation.toggle_selector", &nav.toggle_selector),
            ("navigation.menu_selector", &nav.menu_selector),
            ("navigation.link_selector", &nav.link_selector),
            ("navigation.header_selector", &nav.header_selector),
            ("navigation.section_selector", &nav.section_selector),
            ("navigation.anchor_selector", &nav.anchor_selector),
            ("content.hero_selector", &content.hero_selector),
            ("content.counter_selector", &content.counter_selector),
            ("content.fade_in_selector", &content.fade_in_selector),
            ("form.form_selector", &self.form.form_selector),
            ("lifecycle.lazy_image_selector", &self.lifecycle.lazy_image_selector),
            ("lifecycle.prefetch_selector", &self.lifecycle.prefetch_selector),
        ];
        for (field, raw) in selectors {
            Selector::parse(raw).map_err(|source| ConfigError::Selector { field, source })?;
        }

        if !(0.0..=1.0).contains(&content.fade_in_threshold) {
            return Err(ConfigError::Invalid {
                field: "content.fade_in_threshold",
                reason: format!("{} is outside 0..=1", content.fade_in_threshold),
            });
        }
        if content.counter_duration_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "content.counter_duration_ms",
                reason: "must be positive".into(),
            });
        }
        if nav.desktop_breakpoint <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "navigation.desktop_breakpoint",
                reason: "must be positive".into(),
            });
        }
        if !self.lifecycle.offline_script.starts_with('/') {
            return Err(ConfigError::Invalid {
                field: "lifecycle.offline_script",
                reason: format!("{:?} is not an absolute path", self.lifecycle.offline_script),
            });
        }
        self.form.endpoint_url()?;
        Ok(())
    }
}
