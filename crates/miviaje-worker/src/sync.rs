//! Background sync hook.
//!
//! The worker answers sync events for a single tag. The synchronisation
//! routine doesn't replay anything: pending offline actions live in the
//! page's local storage, which this context can't read. Replay, when enabled,
//! happens on the page when connectivity returns.

use tracing::{debug, info};

/// Tag the page registers background sync under
pub const BACKGROUND_SYNC_TAG: &str = "background-sync";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The sync routine ran for our tag
    Completed,
    /// The tag isn't ours; nothing ran
    Ignored,
}

pub async fn handle_sync(tag: &str) -> SyncOutcome {
    if tag != BACKGROUND_SYNC_TAG {
        debug!(tag, "Ignoring sync event for unknown tag");
        return SyncOutcome::Ignored;
    }
    do_background_sync().await;
    SyncOutcome::Completed
}

async fn do_background_sync() {
    info!("Running background sync");
}
