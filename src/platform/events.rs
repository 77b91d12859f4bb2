//! Signals delivered to behavior units.

use thiserror::Error;

use super::dom::ElementId;
use super::scheduler::TimerId;

/// Keyboard keys the behaviors care about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Escape,
    Enter,
    Tab,
    Other(String),
}

impl Key {
    /// Map a DOM `KeyboardEvent.key` value.
    pub fn from_dom(value: &str) -> Self {
        match value {
            "Escape" | "Esc" => Key::Escape,
            "Enter" => Key::Enter,
            "Tab" => Key::Tab,
            other => Key::Other(other.to_string()),
        }
    }
}

/// Failure reported by a background task.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TaskFailure {
    pub message: String,
}

impl TaskFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub type TaskResult = Result<(), TaskFailure>;

/// Everything a unit can react to.
///
/// Host events (`DomReady` through `Submit`) are broadcast to every active
/// unit. `Timer`, `AnimationFrame` and `TaskComplete` are routed only to the
/// unit that scheduled them.
#[derive(Debug, Clone, PartialEq)]
pub enum PageEvent {
    DomReady,
    Load,
    Scroll,
    Resize,
    Click { target: ElementId },
    KeyDown { key: Key },
    PointerEnter { target: ElementId },
    Input { target: ElementId },
    Blur { target: ElementId },
    Submit { form: ElementId },
    Timer { id: TimerId, tag: u64 },
    AnimationFrame { tag: u64 },
    TaskComplete { tag: u64, result: TaskResult },
}

impl PageEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            PageEvent::DomReady => "dom-ready",
            PageEvent::Load => "load",
            PageEvent::Scroll => "scroll",
            PageEvent::Resize => "resize",
            PageEvent::Click { .. } => "click",
            PageEvent::KeyDown { .. } => "keydown",
            PageEvent::PointerEnter { .. } => "pointerenter",
            PageEvent::Input { .. } => "input",
            PageEvent::Blur { .. } => "blur",
            PageEvent::Submit { .. } => "submit",
            PageEvent::Timer { .. } => "timer",
            PageEvent::AnimationFrame { .. } => "animation-frame",
            PageEvent::TaskComplete { .. } => "task-complete",
        }
    }
}

/// What the host should do after a dispatched event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub default_prevented: bool,
}
