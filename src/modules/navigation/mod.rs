//! Navigation behaviors
//!
//! Mobile menu, header appearance, active-link highlighting and smooth
//! in-page scrolling.

pub mod active_link;
pub mod header;
pub mod menu;
pub mod smooth_scroll;

pub use active_link::{ActiveLink, SectionBox, current_section};
pub use header::HeaderStyle;
pub use menu::MobileMenu;
pub use smooth_scroll::SmoothScroll;
