//! Viewing history persisted in local storage, most recent first.

use std::sync::Arc;

use log::{debug, info, warn};

use crate::display::DisplaySurface;
use crate::protocol::HistoryEntry;
use crate::render;
use crate::storage::LocalStorage;

/// Well-known storage key holding the JSON-encoded history log.
pub const HISTORY_KEY: &str = "drown-history";

const HISTORY_DATE_FORMAT: &str = "%x %X";

/// Append-only history log. Owns the storage key and repaints the history
/// container after every change.
pub struct HistoryStore {
    storage: LocalStorage,
    display: Arc<dyn DisplaySurface>,
}

impl HistoryStore {
    pub fn new(storage: LocalStorage, display: Arc<dyn DisplaySurface>) -> Self {
        Self { storage, display }
    }

    /// Reads the whole log. Absent, unreadable, or malformed values load as empty.
    pub fn load(&self) -> Vec<HistoryEntry> {
        let stored = match self.storage.get_item(HISTORY_KEY) {
            Ok(Some(stored)) => stored,
            Ok(None) => {
                debug!("History: no stored history");
                return Vec::new();
            }
            Err(error) => {
                warn!("History: failed to read stored history: {}", error);
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<HistoryEntry>>(&stored) {
            Ok(entries) => {
                debug!("History: loaded {} entries", entries.len());
                entries
            }
            Err(error) => {
                warn!("History: stored history is not valid JSON: {}", error);
                Vec::new()
            }
        }
    }

    /// Prepends an entry stamped with the local wall-clock time, writes the
    /// full log back, and repaints. Once the log is written the entry counts as
    /// saved; a failed repaint is only logged.
    pub fn append(&self, name: &str, img: &str) -> Result<HistoryEntry, String> {
        info!("History: saving {}", name);
        let entry = HistoryEntry {
            name: name.to_string(),
            img: img.to_string(),
            date: chrono::Local::now()
                .format(HISTORY_DATE_FORMAT)
                .to_string(),
        };

        let mut entries = self.load();
        entries.insert(0, entry.clone());
        let encoded = serde_json::to_string(&entries)
            .map_err(|error| format!("Failed to encode history: {error}"))?;
        self.storage.set_item(HISTORY_KEY, &encoded)?;

        if let Err(error) = self.repaint_entries(&entries) {
            warn!("History: saved {} but failed to repaint: {}", name, error);
        }
        Ok(entry)
    }

    /// Re-renders the history container from the stored log.
    pub fn repaint(&self) -> Result<(), String> {
        self.repaint_entries(&self.load())
    }

    fn repaint_entries(&self, entries: &[HistoryEntry]) -> Result<(), String> {
        self.display
            .show_history(&render::render_history(entries))
    }
}
