//! Latest-sample cell shared between a delivery thread and readers

use arc_swap::ArcSwapOption;
use std::sync::Arc;

/// Holds the most recent sample of one stream.
///
/// Writers replace the whole sample on every arrival; readers get a clone of
/// whatever was stored last. Once a sample is stored the cell never goes
/// back to empty.
#[derive(Debug)]
pub struct LatestSample<T> {
    slot: ArcSwapOption<T>,
}

impl<T> LatestSample<T> {
    pub fn new() -> Self {
        Self {
            slot: ArcSwapOption::empty(),
        }
    }

    pub fn store(&self, sample: T) {
        self.slot.store(Some(Arc::new(sample)));
    }

    /// Shared handle to the latest sample, without cloning it
    pub fn load(&self) -> Option<Arc<T>> {
        self.slot.load_full()
    }

    pub fn has_sample(&self) -> bool {
        self.slot.load().is_some()
    }
}

impl<T: Clone> LatestSample<T> {
    pub fn latest(&self) -> Option<T> {
        self.load().map(|sample| (*sample).clone())
    }
}

impl<T> Default for LatestSample<T> {
    fn default() -> Self {
        Self::new()
    }
}
