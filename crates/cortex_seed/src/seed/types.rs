//! Result and option types shared by the reconciler and the orchestrator.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::dataset::ResourceSpec;
use crate::resource::{RemoteResource, ResourceId, ResourceKind};

/// Default number of in-flight items per kind (sequential).
pub const DEFAULT_CONCURRENCY: usize = 1;

/// Failure message for a child whose parent has no usable id.
pub const MISSING_PARENT_ID: &str = "missing parent id";

/// Why an item was not created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Matched by natural key before any create call.
    AlreadyExists,
    /// The server answered 409.
    Conflict,
    /// The server accepted the request without returning a resource.
    Accepted,
    /// Would have been created, but the run is a dry run.
    DryRun,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SkipReason::AlreadyExists => "already exists",
            SkipReason::Conflict => "conflict",
            SkipReason::Accepted => "accepted",
            SkipReason::DryRun => "dry run",
        })
    }
}

/// Outcome of reconciling one spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Created(RemoteResource),
    Skipped {
        /// Id of the existing resource, when known.
        id: Option<ResourceId>,
        reason: SkipReason,
    },
    Failed(String),
}

impl Outcome {
    /// The server id this outcome carries forward to children, if any.
    #[must_use]
    pub fn resource_id(&self) -> Option<ResourceId> {
        match self {
            Outcome::Created(resource) => Some(resource.id),
            Outcome::Skipped { id, .. } => *id,
            Outcome::Failed(_) => None,
        }
    }

    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, Outcome::Failed(_))
    }
}

/// A spec paired with what happened to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemResult {
    pub spec: ResourceSpec,
    pub outcome: Outcome,
}

impl ItemResult {
    #[must_use]
    pub fn key(&self) -> &str {
        self.spec.natural_key()
    }
}

/// Per-kind outcome list, in dataset order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciliationResult {
    pub kind: ResourceKind,
    pub items: Vec<ItemResult>,
}

impl ReconciliationResult {
    pub fn new(kind: ResourceKind) -> Self {
        Self {
            kind,
            items: Vec::new(),
        }
    }

    #[must_use]
    pub fn created(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Created(_)))
    }

    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Skipped { .. }))
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(Outcome::is_failed)
    }

    fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.items.iter().filter(|item| pred(&item.outcome)).count()
    }

    /// Outcome recorded for a natural key.
    #[must_use]
    pub fn outcome_for(&self, key: &str) -> Option<&Outcome> {
        self.items
            .iter()
            .find(|item| item.key() == key)
            .map(|item| &item.outcome)
    }

    /// `(key, error)` for every failed item.
    #[must_use]
    pub fn failures(&self) -> Vec<(&str, &str)> {
        self.items
            .iter()
            .filter_map(|item| match &item.outcome {
                Outcome::Failed(error) => Some((item.key(), error.as_str())),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn summary(&self) -> KindSummary {
        KindSummary {
            kind: self.kind,
            total: self.items.len(),
            created: self.created(),
            skipped: self.skipped(),
            failed: self.failed(),
        }
    }
}

/// Created/skipped/failed counts for one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KindSummary {
    pub kind: ResourceKind,
    pub total: usize,
    pub created: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Options for a seeding run.
#[derive(Debug, Clone)]
pub struct SeedOptions {
    /// Maximum in-flight items per kind.
    pub concurrency: usize,
    /// List and match, but never create or upload.
    pub dry_run: bool,
    /// Folder holding resource images. `None` disables image attachment.
    pub asset_dir: Option<PathBuf>,
    /// Register the admin account before authenticating.
    pub register_admin: bool,
    /// Token used to activate the freshly registered admin.
    pub activation_token: Option<String>,
}

impl Default for SeedOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            dry_run: false,
            asset_dir: None,
            register_admin: false,
            activation_token: None,
        }
    }
}

/// Phases of a run. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Init,
    Authenticated,
    UsersReconciled,
    CoursesReconciled,
    ModulesAndLessonsReconciled,
    RoadmapsReconciled,
    Done,
    Aborted,
}

impl RunState {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Done | RunState::Aborted)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RunState::Init => "init",
            RunState::Authenticated => "authenticated",
            RunState::UsersReconciled => "users reconciled",
            RunState::CoursesReconciled => "courses reconciled",
            RunState::ModulesAndLessonsReconciled => "modules and lessons reconciled",
            RunState::RoadmapsReconciled => "roadmaps reconciled",
            RunState::Done => "done",
            RunState::Aborted => "aborted",
        })
    }
}
