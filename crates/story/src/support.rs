use std::path::Path;
use std::time::SystemTime;
use std::{fs, io};

use manos_board_core::{
    Board, BoardConfig, Container, JsonFilePersistence, QueuedScheduler, SaveStatus,
};
use serde::de::DeserializeOwned;
use tracing_subscriber::EnvFilter;

/// Install a fmt subscriber filtered by `RUST_LOG`, defaulting to `info`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

pub fn save_status_label(status: &SaveStatus) -> String {
    match status {
        SaveStatus::Clean => "No changes".to_string(),
        SaveStatus::Pending => "Saving soon...".to_string(),
        SaveStatus::Unsaved => "Unsaved changes".to_string(),
        SaveStatus::Failed { message } => format!("Save failed: {message}"),
        SaveStatus::Saved { at } => {
            let secs = SystemTime::now()
                .duration_since(*at)
                .map(|elapsed| elapsed.as_secs())
                .unwrap_or(0);
            if secs < 5 {
                "Saved just now".to_string()
            } else {
                format!("Saved {secs}s ago")
            }
        }
    }
}

/// Read a [`BoardConfig`] from a JSON file, falling back to the defaults when the file is
/// missing or invalid.
pub fn load_config(path: impl AsRef<Path>) -> BoardConfig {
    let path = path.as_ref();
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return BoardConfig::default(),
        Err(err) => {
            tracing::warn!(%err, path = %path.display(), "could not read board config");
            return BoardConfig::default();
        }
    };

    serde_json::from_str(&text).unwrap_or_else(|err| {
        tracing::warn!(%err, path = %path.display(), "invalid board config; using defaults");
        BoardConfig::default()
    })
}

/// Restore a board from `storage`, or start from `demo` when nothing usable was saved.
pub fn load_board<T>(
    storage: &JsonFilePersistence,
    config: BoardConfig,
    demo: impl FnOnce() -> Vec<Container<T>>,
) -> Board<T, QueuedScheduler>
where
    T: DeserializeOwned + 'static,
{
    let path = storage.path().display().to_string();
    let containers = match storage.load() {
        Ok(Some(containers)) => {
            tracing::info!(%path, "restored board");
            containers
        }
        Ok(None) => demo(),
        Err(err) => {
            tracing::warn!(%err, %path, "could not load board; starting from demo data");
            demo()
        }
    };

    match Board::with_config(containers, config.clone(), QueuedScheduler::new()) {
        Ok(board) => board,
        Err(err) => {
            tracing::warn!(%err, %path, "stored board is inconsistent; starting empty");
            Board::empty(config, QueuedScheduler::new())
        }
    }
}
