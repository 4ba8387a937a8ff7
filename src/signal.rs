use std::{io, process, sync::Arc};

use tracing::{info, warn};

use crate::{
    backend::TestBackend,
    session::SessionStore,
    test::teardown::{TeardownReport, teardown_if_active},
};

/// Exit status after SIGINT/SIGTERM (128 + SIGINT).
pub const EXIT_INTERRUPTED: u8 = 130;

/// On SIGINT or SIGTERM, tear down an active test and exit.
pub fn install(
    backend: Arc<dyn TestBackend + Send + Sync>,
    session: SessionStore,
) -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(move || {
        warn!("interrupted");
        cleanup_on_interrupt(backend.as_ref(), &session);
        // Wait out a report being written so it is not cut short
        let _stdout = io::stdout().lock();
        process::exit(i32::from(EXIT_INTERRUPTED));
    })
}

/// Same teardown as the error paths, run only if a test is still active.
/// Waits for a teardown already running on the main thread instead of
/// repeating its steps.
pub fn cleanup_on_interrupt(
    backend: &dyn TestBackend,
    session: &SessionStore,
) -> Option<TeardownReport> {
    let report = teardown_if_active(backend, session);
    if report.is_some() {
        info!(backend = backend.name(), "stopped active test before exit");
    }
    report
}
