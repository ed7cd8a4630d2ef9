//! Sequencing a full run: bootstrap, authenticate, then reconcile each level.

use std::sync::Arc;

use thiserror::Error;

use super::engine::{ParentLookup, Reconciler};
use super::matcher::ExistenceIndex;
use super::progress::{ProgressCallback, SeedProgress, emit};
use super::types::{KindSummary, ReconciliationResult, RunState, SeedOptions};
use crate::dataset::{self, Dataset, DatasetSource, LoadError};
use crate::gateway::{CreateOutcome, GatewayError, ResourceGateway, short_error_message};
use crate::resource::ResourceKind;

/// Errors that abort a run.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("failed to load dataset: {0}")]
    Load(#[from] LoadError),

    #[error("authentication failed: {0}")]
    Auth(#[source] GatewayError),
}

/// Final state of a run and everything it produced.
#[derive(Debug)]
pub struct RunReport {
    pub state: RunState,
    /// One entry per reconciled kind, in reconciliation order.
    pub results: Vec<ReconciliationResult>,
    /// The fatal error, when `state` is [`RunState::Aborted`].
    pub error: Option<SeedError>,
}

impl RunReport {
    fn new() -> Self {
        Self {
            state: RunState::Init,
            results: Vec::new(),
            error: None,
        }
    }

    /// Per-kind created/skipped/failed counts.
    #[must_use]
    pub fn summary(&self) -> Vec<KindSummary> {
        self.results
            .iter()
            .map(ReconciliationResult::summary)
            .collect()
    }

    #[must_use]
    pub fn result(&self, kind: ResourceKind) -> Option<&ReconciliationResult> {
        self.results.iter().find(|r| r.kind == kind)
    }

    /// True when the run aborted or any item failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.error.is_some() || self.results.iter().any(|r| r.failed() > 0)
    }
}

/// A configured seeding run against one gateway.
pub struct SeedRun {
    gateway: Arc<dyn ResourceGateway>,
    options: SeedOptions,
}

impl SeedRun {
    pub fn new(gateway: Arc<dyn ResourceGateway>, options: SeedOptions) -> Self {
        Self { gateway, options }
    }

    /// Load the dataset from `source`, then run it.
    pub async fn run_source(
        &self,
        source: &DatasetSource,
        on_progress: Option<&ProgressCallback>,
    ) -> RunReport {
        match dataset::load(source) {
            Ok(dataset) => self.run(&dataset, on_progress).await,
            Err(e) => {
                tracing::error!(error = %e, "Dataset load failed");
                let mut report = RunReport::new();
                abort(&mut report, SeedError::Load(e), on_progress);
                report
            }
        }
    }

    /// Reconcile `dataset` level by level.
    ///
    /// Only authentication failure aborts; item failures are recorded in the
    /// report and the run carries on.
    pub async fn run(&self, dataset: &Dataset, on_progress: Option<&ProgressCallback>) -> RunReport {
        let mut report = RunReport::new();

        if self.options.register_admin && !self.options.dry_run {
            self.bootstrap_admin(dataset, on_progress).await;
        }

        let token = match self
            .gateway
            .authenticate(&dataset.admin.username, &dataset.admin.password)
            .await
        {
            Ok(token) => token,
            Err(e) => {
                tracing::error!(username = %dataset.admin.username, error = %e, "Authentication failed");
                abort(&mut report, SeedError::Auth(e), on_progress);
                return report;
            }
        };
        advance(&mut report, RunState::Authenticated, on_progress);

        let reconciler = Reconciler::new(Arc::clone(&self.gateway), token, self.options.clone());

        self.reconcile_root(&reconciler, dataset, ResourceKind::User, &mut report, on_progress)
            .await;
        advance(&mut report, RunState::UsersReconciled, on_progress);

        let courses_index = self
            .reconcile_root(&reconciler, dataset, ResourceKind::Course, &mut report, on_progress)
            .await;
        advance(&mut report, RunState::CoursesReconciled, on_progress);

        // Modules wait for every course; lessons wait for every module.
        let mut parent_index = courses_index;
        for kind in [ResourceKind::Module, ResourceKind::Lesson] {
            let parents = kind
                .parent()
                .and_then(|parent| report.result(parent))
                .map(|prev| ParentLookup::new(prev, Arc::clone(&parent_index)));
            let index = reconciler.fetch_index(kind, on_progress).await;
            let result = reconciler
                .reconcile(
                    kind,
                    dataset.specs(kind),
                    Arc::clone(&index),
                    parents.as_ref(),
                    on_progress,
                )
                .await;
            report.results.push(result);
            parent_index = index;
        }
        advance(&mut report, RunState::ModulesAndLessonsReconciled, on_progress);

        self.reconcile_root(&reconciler, dataset, ResourceKind::Roadmap, &mut report, on_progress)
            .await;
        advance(&mut report, RunState::RoadmapsReconciled, on_progress);

        advance(&mut report, RunState::Done, on_progress);
        report
    }

    async fn reconcile_root(
        &self,
        reconciler: &Reconciler,
        dataset: &Dataset,
        kind: ResourceKind,
        report: &mut RunReport,
        on_progress: Option<&ProgressCallback>,
    ) -> Arc<ExistenceIndex> {
        let index = reconciler.fetch_index(kind, on_progress).await;
        let result = reconciler
            .reconcile(kind, dataset.specs(kind), Arc::clone(&index), None, on_progress)
            .await;
        report.results.push(result);
        index
    }

    /// Register and optionally activate the admin. Failures only warn:
    /// the account may already exist, and authentication decides.
    async fn bootstrap_admin(&self, dataset: &Dataset, on_progress: Option<&ProgressCallback>) {
        let username = &dataset.admin.username;

        match self.gateway.register(&dataset.admin).await {
            Ok(CreateOutcome::Conflict) => {
                tracing::info!(username = %username, "Admin already registered");
                return;
            }
            Ok(_) => tracing::info!(username = %username, "Admin registered"),
            Err(e) => {
                tracing::warn!(username = %username, error = %e, "Admin registration failed");
                emit(
                    on_progress,
                    SeedProgress::Warning {
                        message: format!(
                            "admin registration failed: {}",
                            short_error_message(&e)
                        ),
                    },
                );
                return;
            }
        }

        let Some(activation_token) = self.options.activation_token.as_deref() else {
            return;
        };
        if let Err(e) = self.gateway.activate_account(activation_token).await {
            tracing::warn!(username = %username, error = %e, "Admin activation failed");
            emit(
                on_progress,
                SeedProgress::Warning {
                    message: format!("admin activation failed: {}", short_error_message(&e)),
                },
            );
        }
    }
}

fn advance(report: &mut RunReport, next: RunState, on_progress: Option<&ProgressCallback>) {
    debug_assert!(
        !report.state.is_terminal() && next > report.state,
        "run state must move forward"
    );
    tracing::debug!(from = %report.state, to = %next, "Run state changed");
    report.state = next;
    emit(on_progress, SeedProgress::StateChanged { state: next });
}

fn abort(report: &mut RunReport, error: SeedError, on_progress: Option<&ProgressCallback>) {
    report.error = Some(error);
    advance(report, RunState::Aborted, on_progress);
}
