//! Background Refresh Task
//!
//! Refetches the feed after a request was answered from a stale snapshot.

use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::cache::{FreshnessCoordinator, RefreshGuard};

/// Spawns a one-shot task that refreshes the stored snapshot.
///
/// The task is fire-and-forget: the request that triggered it has already been
/// answered, so a failure is logged and dropped. Nothing retries it; the next
/// stale request spawns a new attempt.
///
/// # Arguments
/// * `coordinator` - Coordinator whose store and feed the refresh uses
/// * `guard` - Single-flight marker, released when the task ends
///
/// # Returns
/// A JoinHandle for the spawned task. Dropping it detaches the task.
pub(crate) fn spawn_background_refresh(
    coordinator: FreshnessCoordinator,
    guard: Option<RefreshGuard>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        // Held until the refresh finishes, whatever the outcome
        let _guard = guard;

        match coordinator.refresh().await {
            Ok(snapshot) => {
                info!("Background cache refresh completed: {} buses", snapshot.len());
            }
            Err(err) => {
                error!("Background refresh failed: {}", err);
            }
        }
    })
}
