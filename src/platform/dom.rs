//! Capability traits standing in for the browser's document and window.
//!
//! Behaviors never touch a concrete page; they talk to a [`Host`], which is
//! anything implementing both [`Dom`] and [`Viewport`]. The in-memory
//! [`Document`](super::document::Document) is the reference implementation.

use std::fmt;

use thiserror::Error;

use super::selector::{Selector, SelectorError};

/// Arena handle for an element owned by a [`Dom`] implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub(crate) usize);

impl ElementId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Result alias for DOM operations.
pub type DomResult<T> = Result<T, DomError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomError {
    #[error("element {0} no longer exists")]
    StaleElement(ElementId),
    #[error("invalid selector: {0}")]
    InvalidSelector(#[from] SelectorError),
    #[error("invalid tree operation: {0}")]
    InvalidOperation(String),
    #[error("markup could not be loaded: {0}")]
    Markup(String),
}

/// How a viewport scroll request should be animated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrollBehavior {
    #[default]
    Instant,
    Smooth,
}

/// Read/write access to the element tree.
pub trait Dom {
    fn body(&self) -> ElementId;

    fn query_all(&self, selector: &Selector) -> Vec<ElementId>;

    fn query_within(&self, root: ElementId, selector: &Selector) -> DomResult<Vec<ElementId>>;

    fn element_by_id(&self, id: &str) -> Option<ElementId>;

    /// Nearest inclusive ancestor of `element` matching `selector`.
    fn closest(&self, element: ElementId, selector: &Selector) -> DomResult<Option<ElementId>>;

    /// Whether `node` is `ancestor` or one of its descendants.
    fn contains(&self, ancestor: ElementId, node: ElementId) -> bool;

    fn is_connected(&self, element: ElementId) -> bool;

    fn tag_name(&self, element: ElementId) -> DomResult<String>;

    fn attr(&self, element: ElementId, name: &str) -> DomResult<Option<String>>;

    fn set_attr(&mut self, element: ElementId, name: &str, value: &str) -> DomResult<()>;

    fn remove_attr(&mut self, element: ElementId, name: &str) -> DomResult<()>;

    fn has_class(&self, element: ElementId, class: &str) -> DomResult<bool>;

    fn add_class(&mut self, element: ElementId, class: &str) -> DomResult<()>;

    fn remove_class(&mut self, element: ElementId, class: &str) -> DomResult<()>;

    fn style(&self, element: ElementId, property: &str) -> DomResult<Option<String>>;

    fn set_style(&mut self, element: ElementId, property: &str, value: &str) -> DomResult<()>;

    fn text(&self, element: ElementId) -> DomResult<String>;

    fn set_text(&mut self, element: ElementId, text: &str) -> DomResult<()>;

    /// Current value of a form control.
    fn value(&self, element: ElementId) -> DomResult<String>;

    fn set_value(&mut self, element: ElementId, value: &str) -> DomResult<()>;

    /// Create a detached element; attach it with [`Dom::append_child`].
    fn create_element(&mut self, tag: &str) -> ElementId;

    fn append_child(&mut self, parent: ElementId, child: ElementId) -> DomResult<()>;

    /// Insert `node` as the next sibling of `reference`.
    fn insert_after(&mut self, reference: ElementId, node: ElementId) -> DomResult<()>;

    /// Detach `element` (and its subtree) from the document.
    fn remove(&mut self, element: ElementId) -> DomResult<()>;

    /// Distance in pixels from the document top to the element's top edge.
    fn offset_top(&self, element: ElementId) -> DomResult<f64>;

    fn offset_height(&self, element: ElementId) -> DomResult<f64>;

    fn toggle_class(&mut self, element: ElementId, class: &str, on: bool) -> DomResult<()> {
        if on {
            self.add_class(element, class)
        } else {
            self.remove_class(element, class)
        }
    }

    fn query_first(&self, selector: &Selector) -> Option<ElementId> {
        self.query_all(selector).into_iter().next()
    }
}

/// Window-level scroll and size state.
pub trait Viewport {
    fn scroll_y(&self) -> f64;

    fn inner_width(&self) -> f64;

    fn inner_height(&self) -> f64;

    fn scroll_to(&mut self, top: f64, behavior: ScrollBehavior);
}

/// A page the behaviors can drive.
pub trait Host: Dom + Viewport {}

impl<T: Dom + Viewport> Host for T {}
