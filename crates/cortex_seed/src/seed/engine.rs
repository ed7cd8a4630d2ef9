//! Per-kind create-or-skip reconciliation.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Semaphore;

use super::matcher::ExistenceIndex;
use super::progress::{ProgressCallback, SeedProgress, emit};
use super::types::{
    ItemResult, MISSING_PARENT_ID, Outcome, ReconciliationResult, SeedOptions, SkipReason,
};
use crate::assets::AssetResolver;
use crate::dataset::ResourceSpec;
use crate::gateway::{AuthToken, CreateOutcome, ResourceGateway, short_error_message};
use crate::resource::{ResourceId, ResourceKind};

/// What the parent of a child spec resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParentState {
    Known(ResourceId),
    /// The parent would have been created by this dry run.
    DryRun,
    Unavailable,
}

/// Parent ids for one child kind, taken from the parent kind's results and
/// falling back to the parent kind's server index for undeclared parents.
#[derive(Debug, Clone)]
pub struct ParentLookup {
    kind: ResourceKind,
    declared: HashMap<String, ParentState>,
    index: Arc<ExistenceIndex>,
}

impl ParentLookup {
    pub fn new(parents: &ReconciliationResult, index: Arc<ExistenceIndex>) -> Self {
        let declared = parents
            .items
            .iter()
            .map(|item| {
                let state = match &item.outcome {
                    Outcome::Skipped {
                        reason: SkipReason::DryRun,
                        ..
                    } => ParentState::DryRun,
                    outcome => outcome
                        .resource_id()
                        .map_or(ParentState::Unavailable, ParentState::Known),
                };
                (item.key().to_string(), state)
            })
            .collect();

        Self {
            kind: parents.kind,
            declared,
            index,
        }
    }

    #[must_use]
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    fn resolve(&self, key: &str) -> ParentState {
        if let Some(state) = self.declared.get(key) {
            return *state;
        }
        self.index
            .get(key)
            .map_or(ParentState::Unavailable, |resource| {
                ParentState::Known(resource.id)
            })
    }
}

/// How image attachment went for a created resource.
#[derive(Debug)]
enum AssetStatus {
    NotAttempted,
    Attached(PathBuf),
    Missing,
    /// Found on disk but could not be put in place for upload.
    Unavailable(String),
    Failed(String),
}

struct ItemContext {
    gateway: Arc<dyn ResourceGateway>,
    token: AuthToken,
    index: Arc<ExistenceIndex>,
    assets: Option<AssetResolver>,
    dry_run: bool,
}

/// Reconciles one kind at a time against a [`ResourceGateway`].
#[derive(Clone)]
pub struct Reconciler {
    gateway: Arc<dyn ResourceGateway>,
    token: AuthToken,
    options: SeedOptions,
}

impl Reconciler {
    pub fn new(gateway: Arc<dyn ResourceGateway>, token: AuthToken, options: SeedOptions) -> Self {
        Self {
            gateway,
            token,
            options,
        }
    }

    /// List a kind and index it by natural key.
    ///
    /// A failed listing leaves the index empty so the run can continue; any
    /// resource that does exist then surfaces as a conflict on create.
    pub async fn fetch_index(
        &self,
        kind: ResourceKind,
        on_progress: Option<&ProgressCallback>,
    ) -> Arc<ExistenceIndex> {
        let listed = match self.gateway.list(kind, &self.token).await {
            Ok(listed) => listed,
            Err(e) => {
                tracing::debug!(%kind, error = ?e, "Failed to list existing resources");
                emit(
                    on_progress,
                    SeedProgress::Warning {
                        message: format!(
                            "could not list existing {kind}s: {}",
                            short_error_message(&e)
                        ),
                    },
                );
                Vec::new()
            }
        };

        let index = ExistenceIndex::build(kind, &listed);
        if index.keyless() > 0 {
            emit(
                on_progress,
                SeedProgress::Warning {
                    message: format!(
                        "{} listed {kind}(s) have no `{}` and were ignored",
                        index.keyless(),
                        kind.natural_key_field()
                    ),
                },
            );
        }
        Arc::new(index)
    }

    /// Reconcile every spec of one kind.
    ///
    /// `parents` is required for child kinds. Outcomes come back in the
    /// order of `specs`, one per spec.
    pub async fn reconcile(
        &self,
        kind: ResourceKind,
        specs: Vec<ResourceSpec>,
        index: Arc<ExistenceIndex>,
        parents: Option<&ParentLookup>,
        on_progress: Option<&ProgressCallback>,
    ) -> ReconciliationResult {
        let mut result = ReconciliationResult::new(kind);

        emit(
            on_progress,
            SeedProgress::PhaseStarted {
                kind,
                total: specs.len(),
                existing: index.len(),
            },
        );

        let concurrency = self.options.concurrency.clamp(1, specs.len().max(1));
        let semaphore = Arc::new(Semaphore::new(concurrency));
        let ctx = Arc::new(ItemContext {
            gateway: Arc::clone(&self.gateway),
            token: self.token.clone(),
            index,
            assets: self.options.asset_dir.clone().map(AssetResolver::new),
            dry_run: self.options.dry_run,
        });

        let mut pending = Vec::with_capacity(specs.len());

        for spec in specs {
            let parent_key = spec.parent_key().map(str::to_string);
            let parent_id = match (kind.parent(), parent_key) {
                (Some(_), Some(parent_key)) => {
                    let state =
                        parents.map_or(ParentState::Unavailable, |p| p.resolve(&parent_key));
                    match state {
                        ParentState::Known(id) => Some(id),
                        ParentState::DryRun => {
                            pending.push(Pending::Ready(
                                spec,
                                Outcome::Skipped {
                                    id: None,
                                    reason: SkipReason::DryRun,
                                },
                            ));
                            continue;
                        }
                        ParentState::Unavailable => {
                            tracing::debug!(
                                %kind,
                                key = spec.natural_key(),
                                parent = %parent_key,
                                "Parent has no id, not submitting"
                            );
                            pending.push(Pending::Ready(
                                spec,
                                Outcome::Failed(MISSING_PARENT_ID.to_string()),
                            ));
                            continue;
                        }
                    }
                }
                _ => None,
            };

            let ctx = Arc::clone(&ctx);
            let semaphore = Arc::clone(&semaphore);
            let task_spec = spec.clone();

            let handle = tokio::spawn(async move {
                let _permit = match semaphore.acquire().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        return (
                            Outcome::Failed("Semaphore closed unexpectedly".to_string()),
                            AssetStatus::NotAttempted,
                        );
                    }
                };
                reconcile_item(&ctx, &task_spec, parent_id).await
            });

            pending.push(Pending::Spawned(spec, handle));
        }

        for entry in pending {
            let (spec, outcome, asset) = match entry {
                Pending::Ready(spec, outcome) => (spec, outcome, AssetStatus::NotAttempted),
                Pending::Spawned(spec, handle) => match handle.await {
                    Ok((outcome, asset)) => (spec, outcome, asset),
                    Err(e) => (
                        spec,
                        Outcome::Failed(format!("Task panic: {}", e)),
                        AssetStatus::NotAttempted,
                    ),
                },
            };

            report_item(kind, &spec, &outcome, asset, on_progress);
            result.items.push(ItemResult { spec, outcome });
        }

        emit(
            on_progress,
            SeedProgress::PhaseCompleted {
                kind,
                created: result.created(),
                skipped: result.skipped(),
                failed: result.failed(),
            },
        );

        result
    }
}

enum Pending {
    Ready(ResourceSpec, Outcome),
    Spawned(
        ResourceSpec,
        tokio::task::JoinHandle<(Outcome, AssetStatus)>,
    ),
}

async fn reconcile_item(
    ctx: &ItemContext,
    spec: &ResourceSpec,
    parent_id: Option<ResourceId>,
) -> (Outcome, AssetStatus) {
    let kind = spec.kind();
    let key = spec.natural_key();

    if let Some(existing) = ctx.index.matches(spec) {
        return (
            Outcome::Skipped {
                id: Some(existing.id),
                reason: SkipReason::AlreadyExists,
            },
            AssetStatus::NotAttempted,
        );
    }

    if ctx.dry_run {
        return (
            Outcome::Skipped {
                id: None,
                reason: SkipReason::DryRun,
            },
            AssetStatus::NotAttempted,
        );
    }

    let payload = spec.payload(parent_id);
    match ctx.gateway.create(kind, &ctx.token, &payload).await {
        Ok(CreateOutcome::Created(resource)) => {
            let asset = attach_asset(ctx, spec, resource.id).await;
            (Outcome::Created(resource), asset)
        }
        Ok(CreateOutcome::Conflict) => {
            let id = relist_for_id(ctx, kind, key).await;
            (
                Outcome::Skipped {
                    id,
                    reason: SkipReason::Conflict,
                },
                AssetStatus::NotAttempted,
            )
        }
        Ok(CreateOutcome::Accepted) => (
            Outcome::Skipped {
                id: None,
                reason: SkipReason::Accepted,
            },
            AssetStatus::NotAttempted,
        ),
        Err(e) => {
            tracing::debug!(%kind, key, error = ?e, "Create failed");
            (
                Outcome::Failed(short_error_message(&e)),
                AssetStatus::NotAttempted,
            )
        }
    }
}

/// After a 409, list the kind again to recover the existing id.
async fn relist_for_id(ctx: &ItemContext, kind: ResourceKind, key: &str) -> Option<ResourceId> {
    match ctx.gateway.list(kind, &ctx.token).await {
        Ok(listed) => {
            let id = ExistenceIndex::build(kind, &listed).get(key).map(|r| r.id);
            if id.is_none() {
                tracing::warn!(%kind, key, "Conflict reported but resource not found on re-list");
            }
            id
        }
        Err(e) => {
            tracing::warn!(%kind, key, error = %e, "Re-list after conflict failed");
            None
        }
    }
}

/// Best-effort image upload. Never changes the item's outcome.
async fn attach_asset(ctx: &ItemContext, spec: &ResourceSpec, id: ResourceId) -> AssetStatus {
    let kind = spec.kind();
    if !kind.accepts_assets() {
        return AssetStatus::NotAttempted;
    }
    let Some(resolver) = &ctx.assets else {
        return AssetStatus::NotAttempted;
    };

    let found = match resolver.resolve(spec.natural_key(), spec.image_hint()) {
        Ok(Some(found)) => found,
        Ok(None) => return AssetStatus::Missing,
        Err(e) => return AssetStatus::Unavailable(e.to_string()),
    };

    match ctx
        .gateway
        .upload_asset(kind, id, &ctx.token, &found.source_path)
        .await
    {
        Ok(()) => AssetStatus::Attached(found.source_path),
        Err(e) => AssetStatus::Failed(short_error_message(&e)),
    }
}

fn report_item(
    kind: ResourceKind,
    spec: &ResourceSpec,
    outcome: &Outcome,
    asset: AssetStatus,
    on_progress: Option<&ProgressCallback>,
) {
    let key = spec.natural_key().to_string();

    match outcome {
        Outcome::Created(resource) => {
            emit(
                on_progress,
                SeedProgress::ItemCreated {
                    kind,
                    key: key.clone(),
                    id: resource.id,
                },
            );
        }
        Outcome::Skipped { id, reason } => {
            emit(
                on_progress,
                SeedProgress::ItemSkipped {
                    kind,
                    key: key.clone(),
                    id: *id,
                    reason: *reason,
                },
            );
        }
        Outcome::Failed(error) => {
            emit(
                on_progress,
                SeedProgress::ItemFailed {
                    kind,
                    key: key.clone(),
                    error: error.clone(),
                },
            );
        }
    }

    match asset {
        AssetStatus::NotAttempted => {}
        AssetStatus::Attached(path) => {
            emit(on_progress, SeedProgress::AssetAttached { kind, key, path });
        }
        AssetStatus::Missing => {
            emit(on_progress, SeedProgress::AssetMissing { kind, key });
        }
        AssetStatus::Unavailable(error) => {
            emit(
                on_progress,
                SeedProgress::AssetUnavailable { kind, key, error },
            );
        }
        AssetStatus::Failed(error) => {
            emit(
                on_progress,
                SeedProgress::AssetUploadFailed { kind, key, error },
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::CourseSpec;
    use crate::resource::RemoteResource;

    fn course(name: &str) -> ResourceSpec {
        ResourceSpec::Course(CourseSpec {
            name: name.to_string(),
            description: String::new(),
            is_published: false,
            display_order: None,
            image_type: None,
        })
    }

    fn courses(items: Vec<(ResourceSpec, Outcome)>) -> ReconciliationResult {
        ReconciliationResult {
            kind: ResourceKind::Course,
            items: items
                .into_iter()
                .map(|(spec, outcome)| ItemResult { spec, outcome })
                .collect(),
        }
    }

    #[test]
    fn parent_lookup_prefers_declared_results() {
        let result = courses(vec![
            (
                course("Algorithms"),
                Outcome::Created(RemoteResource::new(ResourceKind::Course, 1, "Algorithms")),
            ),
            (course("Broken"), Outcome::Failed("HTTP 500".into())),
        ]);
        let index = Arc::new(ExistenceIndex::build(
            ResourceKind::Course,
            &[
                RemoteResource::new(ResourceKind::Course, 99, "Broken"),
                RemoteResource::new(ResourceKind::Course, 5, "Legacy"),
            ],
        ));
        let lookup = ParentLookup::new(&result, index);

        assert_eq!(lookup.kind(), ResourceKind::Course);
        assert_eq!(lookup.resolve("Algorithms"), ParentState::Known(ResourceId(1)));
        // A declared parent that failed never borrows an id from the listing.
        assert_eq!(lookup.resolve("Broken"), ParentState::Unavailable);
        assert_eq!(lookup.resolve("Legacy"), ParentState::Known(ResourceId(5)));
        assert_eq!(lookup.resolve("Unknown"), ParentState::Unavailable);
    }

    #[test]
    fn parent_lookup_tracks_dry_run_parents() {
        let result = courses(vec![(
            course("Algorithms"),
            Outcome::Skipped {
                id: None,
                reason: SkipReason::DryRun,
            },
        )]);
        let lookup = ParentLookup::new(&result, Arc::new(ExistenceIndex::default()));
        assert_eq!(lookup.resolve("Algorithms"), ParentState::DryRun);
    }

    fn collect_events(
        spec: &ResourceSpec,
        outcome: &Outcome,
        asset: AssetStatus,
    ) -> Vec<SeedProgress> {
        let events = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let callback: ProgressCallback = Box::new(move |event| {
            sink.lock().unwrap().push(event);
        });
        report_item(spec.kind(), spec, outcome, asset, Some(&callback));
        let events = events.lock().unwrap().clone();
        events
    }

    #[test]
    fn unavailable_asset_is_not_reported_as_upload_failure() {
        let spec = course("Algorithms");
        let created = Outcome::Created(RemoteResource::new(ResourceKind::Course, 1, "Algorithms"));
        let events = collect_events(
            &spec,
            &created,
            AssetStatus::Unavailable("failed to rename a to b: denied".into()),
        );

        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], SeedProgress::ItemCreated { .. }));
        match &events[1] {
            SeedProgress::AssetUnavailable { kind, key, error } => {
                assert_eq!(*kind, ResourceKind::Course);
                assert_eq!(key, "Algorithms");
                assert!(error.contains("rename"));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn each_item_outcome_is_reported_once() {
        let spec = course("Algorithms");
        let created = Outcome::Created(RemoteResource::new(ResourceKind::Course, 1, "Algorithms"));

        let events = collect_events(&spec, &created, AssetStatus::Missing);
        assert_eq!(events.len(), 2);
        assert!(matches!(events[1], SeedProgress::AssetMissing { .. }));

        let failed = Outcome::Failed("HTTP 500".into());
        let events = collect_events(&spec, &failed, AssetStatus::NotAttempted);
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], SeedProgress::ItemFailed { .. }));
    }
}
