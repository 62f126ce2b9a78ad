//! Reminder daemon binary.
//!
//! Loads configuration, opens the record store, and runs the daily
//! reminder loop until killed. All diagnostics go to stderr via tracing.

use std::path::PathBuf;
use std::sync::Arc;

use subtrack::notify::HttpEmailSender;
use subtrack::{
    DailyTrigger, NotificationDispatcher, ReminderEngine, StoreOwnerDirectory, TrackerConfig,
    TrackerStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = match config_path() {
        Some(path) => TrackerConfig::load(&path)
            .map_err(|e| anyhow::anyhow!("failed to load config: {e}"))?,
        None => TrackerConfig::default(),
    };

    let trigger = DailyTrigger::from_config(&config.reminder)
        .map_err(|e| anyhow::anyhow!("bad reminder config: {e}"))?;

    let store = Arc::new(
        TrackerStore::open(&config.database.path)
            .map_err(|e| anyhow::anyhow!("failed to open store: {e}"))?,
    );

    let directory = Arc::new(StoreOwnerDirectory::new(store.clone()));
    let sender = Arc::new(HttpEmailSender::new(&config.email));
    let dispatcher = Arc::new(NotificationDispatcher::new(
        directory,
        sender,
        trigger.timezone(),
    ));

    let engine = ReminderEngine::new(store, dispatcher, trigger);

    tracing::info!(
        trigger_time = %config.reminder.trigger_time,
        timezone = %config.reminder.timezone,
        "subtrack-daemon starting"
    );

    engine.run().await;
    Ok(())
}

/// Config file path: first CLI argument, else `SUBTRACK_CONFIG`, else
/// none (defaults apply).
fn config_path() -> Option<PathBuf> {
    if let Some(arg) = std::env::args().nth(1) {
        return Some(PathBuf::from(arg));
    }
    std::env::var_os("SUBTRACK_CONFIG").map(PathBuf::from)
}
