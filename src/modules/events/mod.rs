//! Telemetry events for the behavior layer.
//!
//! Units and the site emit structured events; handlers decide what to do
//! with them (log, count, forward to an analytics hook). Nothing here is
//! user-visible.

use chrono::{DateTime, Utc};
use std::sync::Arc;

/// A unit finished a lifecycle phase.
#[derive(Debug, Clone)]
pub struct UnitEvent {
    pub unit: &'static str,
    pub timestamp: DateTime<Utc>,
}

/// Which callback a unit failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitPhase {
    Start,
    Event(&'static str),
    Stop,
}

#[derive(Debug, Clone)]
pub struct UnitFailureEvent {
    pub unit: &'static str,
    pub phase: UnitPhase,
    pub error: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct SubmissionEvent {
    pub success: bool,
    pub fields: usize,
    pub detail: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct RegistrationEvent {
    pub script: String,
    pub success: bool,
    pub detail: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct RuntimeErrorEvent {
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub enum SiteEvent {
    UnitStarted(UnitEvent),
    UnitStopped(UnitEvent),
    UnitFailed(UnitFailureEvent),
    Submission(SubmissionEvent),
    Registration(RegistrationEvent),
    RuntimeError(RuntimeErrorEvent),
}

impl SiteEvent {
    pub fn unit_started(unit: &'static str) -> Self {
        SiteEvent::UnitStarted(UnitEvent {
            unit,
            timestamp: Utc::now(),
        })
    }

    pub fn unit_stopped(unit: &'static str) -> Self {
        SiteEvent::UnitStopped(UnitEvent {
            unit,
            timestamp: Utc::now(),
        })
    }

    pub fn unit_failed(unit: &'static str, phase: UnitPhase, error: impl ToString) -> Self {
        SiteEvent::UnitFailed(UnitFailureEvent {
            unit,
            phase,
            error: error.to_string(),
            timestamp: Utc::now(),
        })
    }

    pub fn submission(success: bool, fields: usize, detail: Option<String>) -> Self {
        SiteEvent::Submission(SubmissionEvent {
            success,
            fields,
            detail,
            timestamp: Utc::now(),
        })
    }

    pub fn registration(script: impl Into<String>, success: bool, detail: Option<String>) -> Self {
        SiteEvent::Registration(RegistrationEvent {
            script: script.into(),
            success,
            detail,
            timestamp: Utc::now(),
        })
    }

    pub fn runtime_error(message: impl Into<String>) -> Self {
        SiteEvent::RuntimeError(RuntimeErrorEvent {
            message: message.into(),
            timestamp: Utc::now(),
        })
    }
}

/// Trait implemented by event handlers.
pub trait EventHandler: Send + Sync {
    fn handle(&self, event: &SiteEvent);
}

/// Dispatcher that broadcasts events to registered handlers.
#[derive(Default)]
pub struct EventDispatcher {
    handlers: Vec<Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self { handlers: Vec::new() }
    }

    pub fn register_handler(&mut self, handler: Arc<dyn EventHandler>) {
        self.handlers.push(handler);
    }

    pub fn dispatch(&self, event: SiteEvent) {
        for handler in &self.handlers {
            handler.handle(&event);
        }
    }
}

/// Logs events using the `log` crate.
#[derive(Debug)]
pub struct LoggingHandler;

impl EventHandler for LoggingHandler {
    fn handle(&self, event: &SiteEvent) {
        match event {
            SiteEvent::UnitStarted(started) => {
                log::debug!("behavior {} started", started.unit);
            }
            SiteEvent::UnitStopped(stopped) => {
                log::debug!("behavior {} stopped", stopped.unit);
            }
            SiteEvent::UnitFailed(failure) => {
                log::warn!("behavior {} failed during {:?}: {}", failure.unit, failure.phase, failure.error);
            }
            SiteEvent::Submission(submission) => {
                if submission.success {
                    log::info!("contact form sent ({} fields)", submission.fields);
                } else {
                    log::info!(
                        "contact form not sent: {}",
                        submission.detail.as_deref().unwrap_or("unknown reason")
                    );
                }
            }
            SiteEvent::Registration(registration) => {
                if registration.success {
                    log::info!("offline cache registered from {}", registration.script);
                } else {
                    log::warn!(
                        "offline cache registration failed for {}: {}",
                        registration.script,
                        registration.detail.as_deref().unwrap_or("unknown reason")
                    );
                }
            }
            SiteEvent::RuntimeError(error) => {
                log::warn!("uncaught page error: {}", error.message);
            }
        }
    }
}
