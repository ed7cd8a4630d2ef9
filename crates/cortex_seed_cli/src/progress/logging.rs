use cortex_seed::seed::SeedProgress;

/// Logging reporter using tracing for structured output.
pub struct LoggingReporter;

impl LoggingReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn handle(&self, event: SeedProgress) {
        match event {
            SeedProgress::StateChanged { state } => {
                tracing::debug!(state = %state, "Run state changed");
            }

            SeedProgress::PhaseStarted {
                kind,
                total,
                existing,
            } => {
                tracing::info!(kind = %kind, total, existing, "Reconciling");
            }

            SeedProgress::ItemCreated { kind, key, id } => {
                tracing::info!(kind = %kind, key = %key, id = %id, "Created");
            }

            SeedProgress::ItemSkipped {
                kind,
                key,
                id,
                reason,
            } => {
                let id = id.map(|id| id.to_string());
                tracing::debug!(kind = %kind, key = %key, id = ?id, reason = %reason, "Skipped");
            }

            SeedProgress::ItemFailed { kind, key, error } => {
                tracing::error!(kind = %kind, key = %key, error = %error, "Failed");
            }

            SeedProgress::AssetAttached { kind, key, path } => {
                tracing::info!(kind = %kind, key = %key, path = %path.display(), "Image attached");
            }

            SeedProgress::AssetMissing { kind, key } => {
                tracing::warn!(kind = %kind, key = %key, "No image found");
            }

            SeedProgress::AssetUnavailable { kind, key, error } => {
                tracing::warn!(kind = %kind, key = %key, error = %error, "Image could not be prepared");
            }

            SeedProgress::AssetUploadFailed { kind, key, error } => {
                tracing::warn!(kind = %kind, key = %key, error = %error, "Image upload failed");
            }

            SeedProgress::PhaseCompleted {
                kind,
                created,
                skipped,
                failed,
            } => {
                tracing::info!(kind = %kind, created, skipped, failed, "Reconciled");
            }

            SeedProgress::Warning { message } => {
                tracing::warn!(message = %message, "Warning");
            }

            _ => {}
        }
    }
}

impl Default for LoggingReporter {
    fn default() -> Self {
        Self::new()
    }
}
