//! Page lifecycle behaviors
//!
//! Preloader overlay, lazily loaded images, hover prefetch of in-page
//! sections and background registration of the offline cache.

pub mod lazy_images;
pub mod offline;
pub mod prefetch;
pub mod preloader;

pub use lazy_images::LazyImages;
pub use offline::{OfflineCache, OfflineRegistrar, RegistrationError};
pub use prefetch::HoverPrefetch;
pub use preloader::Preloader;
