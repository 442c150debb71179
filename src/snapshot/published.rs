//! Single-slot container holding the current snapshot
//!
//! Readers take an `Arc` to whatever snapshot is current and keep using it
//! while a newer one is published. Loading never blocks and never observes a
//! partially built snapshot.

use std::sync::Arc;

use arc_swap::ArcSwapOption;

use crate::snapshot::database::VersionDatabase;

#[derive(Default)]
pub struct PublishedDatabase {
    slot: ArcSwapOption<VersionDatabase>,
}

impl PublishedDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current snapshot, `None` until the first publish
    pub fn load(&self) -> Option<Arc<VersionDatabase>> {
        self.slot.load_full()
    }

    pub fn is_published(&self) -> bool {
        self.slot.load().is_some()
    }

    /// Replaces the current snapshot, returning the previous one
    pub fn publish(&self, database: VersionDatabase) -> Option<Arc<VersionDatabase>> {
        self.slot.swap(Some(Arc::new(database)))
    }
}
