//! Content behaviors
//!
//! Scroll-driven decoration of page content: hero parallax, animated
//! counters, the scroll-to-top button and fade-in reveals.

pub mod counters;
pub mod fade_in;
pub mod parallax;
pub mod scroll_top;

pub use counters::{CounterProgress, Counters};
pub use fade_in::FadeIn;
pub use parallax::{Parallax, parallax_offset};
pub use scroll_top::ScrollToTop;
