//! Progress reporting for seeding runs.
//!
//! The library never renders anything itself. Callers pass a
//! [`ProgressCallback`] and decide how to present events.

use std::path::PathBuf;

use super::types::{RunState, SkipReason};
use crate::resource::{ResourceId, ResourceKind};

/// Progress events emitted during a run.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum SeedProgress {
    /// The run moved to a new phase.
    StateChanged { state: RunState },

    /// Reconciliation of a kind is starting.
    PhaseStarted {
        kind: ResourceKind,
        /// Number of specs of this kind in the dataset.
        total: usize,
        /// Resources of this kind already on the server.
        existing: usize,
    },

    /// A resource was created.
    ItemCreated {
        kind: ResourceKind,
        key: String,
        id: ResourceId,
    },

    /// A resource was not created.
    ItemSkipped {
        kind: ResourceKind,
        key: String,
        id: Option<ResourceId>,
        reason: SkipReason,
    },

    /// A resource could not be created.
    ItemFailed {
        kind: ResourceKind,
        key: String,
        error: String,
    },

    /// An image was uploaded for a freshly created resource.
    AssetAttached {
        kind: ResourceKind,
        key: String,
        path: PathBuf,
    },

    /// No image was found for a freshly created resource.
    AssetMissing { kind: ResourceKind, key: String },

    /// An image was found but could not be renamed into place.
    AssetUnavailable {
        kind: ResourceKind,
        key: String,
        error: String,
    },

    /// An image was found but could not be uploaded.
    AssetUploadFailed {
        kind: ResourceKind,
        key: String,
        error: String,
    },

    /// Reconciliation of a kind finished.
    PhaseCompleted {
        kind: ResourceKind,
        created: usize,
        skipped: usize,
        failed: usize,
    },

    /// Non-fatal problem worth surfacing.
    Warning { message: String },
}

/// Callback type for progress reporting.
pub type ProgressCallback = Box<dyn Fn(SeedProgress) + Send + Sync>;

/// Emit a progress event if a callback is provided.
#[inline]
pub fn emit(on_progress: Option<&ProgressCallback>, event: SeedProgress) {
    if let Some(cb) = on_progress {
        cb(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[test]
    fn emit_with_callback() {
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = Arc::clone(&count);

        let callback: ProgressCallback = Box::new(move |_event| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });

        emit(
            Some(&callback),
            SeedProgress::PhaseStarted {
                kind: ResourceKind::Course,
                total: 3,
                existing: 0,
            },
        );

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn emit_without_callback() {
        emit(
            None,
            SeedProgress::Warning {
                message: "ignored".to_string(),
            },
        );
    }

    #[test]
    fn events_arrive_in_emission_order() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let events_clone = Arc::clone(&events);

        let callback: ProgressCallback = Box::new(move |event| {
            events_clone.lock().unwrap().push(format!("{:?}", event));
        });

        emit(
            Some(&callback),
            SeedProgress::ItemCreated {
                kind: ResourceKind::Course,
                key: "Algorithms".to_string(),
                id: ResourceId(1),
            },
        );
        emit(
            Some(&callback),
            SeedProgress::AssetMissing {
                kind: ResourceKind::Course,
                key: "Algorithms".to_string(),
            },
        );

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert!(events[0].contains("ItemCreated"));
        assert!(events[1].contains("AssetMissing"));
    }
}
