//! Viewport intersection tracking.
//!
//! An [`IntersectionWatcher`] plays the role of a browser intersection
//! observer: units register elements, then call [`IntersectionWatcher::poll`]
//! whenever scroll or size may have changed and receive one entry per element
//! whose intersecting state flipped (every element reports once on its first
//! poll). Watches live in an arena; a [`WatchHandle`] carries a generation so
//! a released slot can be reused without old handles reaching the new watch.

use crate::platform::{DomResult, ElementId, Host};

/// Trigger-zone options, mirroring an observer's `threshold` and `rootMargin`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WatchOptions {
    /// Fraction of the element that must be visible. `0.0` means any overlap.
    pub threshold: f64,
    /// Added to the viewport's bottom edge; negative values shrink the zone.
    pub bottom_margin: f64,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            threshold: 0.0,
            bottom_margin: 0.0,
        }
    }
}

impl WatchOptions {
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold.clamp(0.0, 1.0);
        self
    }

    pub fn with_bottom_margin(mut self, margin: f64) -> Self {
        self.bottom_margin = margin;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchHandle {
    index: u32,
    generation: u32,
}

/// A change in an element's visibility.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntersectionEntry {
    pub handle: WatchHandle,
    pub element: ElementId,
    pub ratio: f64,
    pub is_intersecting: bool,
}

#[derive(Debug, Clone)]
struct Watch {
    element: ElementId,
    last_intersecting: Option<bool>,
}

#[derive(Debug, Clone, Default)]
struct Slot {
    generation: u32,
    watch: Option<Watch>,
}

#[derive(Debug, Clone, Default)]
pub struct IntersectionWatcher {
    options: WatchOptions,
    slots: Vec<Slot>,
    free: Vec<u32>,
}

impl IntersectionWatcher {
    pub fn new(options: WatchOptions) -> Self {
        Self {
            options,
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    pub fn options(&self) -> WatchOptions {
        self.options
    }

    pub fn observe(&mut self, element: ElementId) -> WatchHandle {
        let watch = Watch {
            element,
            last_intersecting: None,
        };

        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.watch = Some(watch);
            return WatchHandle {
                index,
                generation: slot.generation,
            };
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            watch: Some(watch),
        });
        WatchHandle {
            index,
            generation: 0,
        }
    }

    /// Stop watching. Returns `false` for stale or already released handles.
    pub fn release(&mut self, handle: WatchHandle) -> bool {
        let Some(slot) = self.slots.get_mut(handle.index as usize) else {
            return false;
        };
        if slot.generation != handle.generation || slot.watch.is_none() {
            return false;
        }
        slot.watch = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        true
    }

    pub fn release_all(&mut self) {
        for index in 0..self.slots.len() {
            let slot = &mut self.slots[index];
            if slot.watch.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(index as u32);
            }
        }
    }

    pub fn is_watching(&self, handle: WatchHandle) -> bool {
        self.slots
            .get(handle.index as usize)
            .is_some_and(|slot| slot.generation == handle.generation && slot.watch.is_some())
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.watch.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Recompute visibility and report elements whose state changed.
    ///
    /// Elements that have left the document are released silently.
    pub fn poll(&mut self, host: &dyn Host) -> Vec<IntersectionEntry> {
        let mut entries = Vec::new();
        let mut detached = Vec::new();

        for (index, slot) in self.slots.iter_mut().enumerate() {
            let Some(watch) = slot.watch.as_mut() else {
                continue;
            };
            let handle = WatchHandle {
                index: index as u32,
                generation: slot.generation,
            };

            if !host.is_connected(watch.element) {
                detached.push(handle);
                continue;
            }

            let Ok(ratio) = visible_ratio(host, watch.element, self.options) else {
                detached.push(handle);
                continue;
            };
            let is_intersecting = if self.options.threshold <= 0.0 {
                ratio > 0.0
            } else {
                ratio >= self.options.threshold
            };

            if watch.last_intersecting != Some(is_intersecting) {
                watch.last_intersecting = Some(is_intersecting);
                entries.push(IntersectionEntry {
                    handle,
                    element: watch.element,
                    ratio,
                    is_intersecting,
                });
            }
        }

        for handle in detached {
            self.release(handle);
        }

        entries
    }
}

/// Fraction of `element` inside the (margin-adjusted) viewport.
///
/// Zero-height elements count as fully visible when their top edge lies
/// inside the zone, the top boundary included.
pub fn visible_ratio(host: &dyn Host, element: ElementId, options: WatchOptions) -> DomResult<f64> {
    let top = host.offset_top(element)? - host.scroll_y();
    let height = host.offset_height(element)?.max(0.0);
    let bottom = top + height;
    let zone_bottom = host.inner_height() + options.bottom_margin;

    if height == 0.0 {
        return Ok(if top >= 0.0 && top < zone_bottom { 1.0 } else { 0.0 });
    }

    let overlap = (bottom.min(zone_bottom) - top.max(0.0)).max(0.0);
    Ok((overlap / height).clamp(0.0, 1.0))
}
