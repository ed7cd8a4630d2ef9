use console::Term;

/// Exit code used when the run is interrupted.
const INTERRUPTED: i32 = 130;

/// Set up the Ctrl+C handler.
///
/// Seeding is idempotent, so an interrupted run simply exits; resources
/// created so far stay on the server and the next run skips them.
pub(crate) fn setup_shutdown_handler() {
    tokio::spawn(async {
        if tokio::signal::ctrl_c().await.is_err() {
            tracing::debug!("Ctrl+C handler unavailable");
            return;
        }

        if Term::stdout().is_term() {
            eprintln!("\n\nInterrupted; created resources are kept, rerun to continue.");
        } else {
            tracing::warn!("Interrupted; created resources are kept, rerun to continue");
        }
        std::process::exit(INTERRUPTED);
    });
}
