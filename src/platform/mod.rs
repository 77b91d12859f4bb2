//! Browser capabilities the behaviors are written against.

pub mod clock;
pub mod document;
pub mod dom;
pub mod events;
pub mod scheduler;
pub mod selector;

pub use clock::{Clock, ManualClock, SystemClock};
pub use document::Document;
pub use dom::{Dom, DomError, DomResult, ElementId, Host, ScrollBehavior, Viewport};
pub use events::{DispatchOutcome, Key, PageEvent, TaskFailure, TaskResult};
pub use scheduler::{
    BoxTask, CompletedTask, DueTimer, FRAME_INTERVAL, Scheduler, TaskQueue, TimerId, UnitId,
};
pub use selector::{Selector, SelectorError, SelectorSubject};
