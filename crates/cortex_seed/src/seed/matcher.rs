//! Natural-key index over the resources already on the server.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use crate::dataset::ResourceSpec;
use crate::resource::{RemoteResource, ResourceKind};

/// Natural key → resource map for one kind, frozen before any create call.
#[derive(Debug, Clone, Default)]
pub struct ExistenceIndex {
    by_key: HashMap<String, RemoteResource>,
    keyless: usize,
}

impl ExistenceIndex {
    /// Index a listing. Exact string keys; the first entry for a key wins.
    pub fn build(kind: ResourceKind, existing: &[RemoteResource]) -> Self {
        let mut by_key = HashMap::with_capacity(existing.len());
        let mut keyless = 0;

        for resource in existing {
            let Some(key) = resource.natural_key.as_deref() else {
                keyless += 1;
                continue;
            };
            match by_key.entry(key.to_string()) {
                Entry::Vacant(slot) => {
                    slot.insert(resource.clone());
                }
                Entry::Occupied(first) => {
                    tracing::debug!(
                        %kind,
                        key,
                        kept = %first.get().id,
                        ignored = %resource.id,
                        "Duplicate natural key on server"
                    );
                }
            }
        }

        if keyless > 0 {
            tracing::warn!(
                %kind,
                field = kind.natural_key_field(),
                count = keyless,
                "Listed resources without a natural key were not indexed"
            );
        }

        Self { by_key, keyless }
    }

    /// The existing resource equivalent to `spec`, if any.
    #[must_use]
    pub fn matches(&self, spec: &ResourceSpec) -> Option<&RemoteResource> {
        self.get(spec.natural_key())
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&RemoteResource> {
        self.by_key.get(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    /// Number of listed entries excluded for lacking a natural key.
    #[must_use]
    pub fn keyless(&self) -> usize {
        self.keyless
    }
}
