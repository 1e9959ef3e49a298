//! Event-bus protocol and data model shared by all runtime components.
//!
//! This module defines the catalog entities produced per discovery attempt,
//! the persisted history entry, and the messages exchanged between the input
//! binding, the discovery manager, and the main loop.

/// Minimal identity returned by a random draw from the bibliographic index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtistSummary {
    pub name: String,
}

/// Artist record returned by the detail catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtistDetail {
    pub id: String,
    pub name: String,
    /// Portrait image link. A detail record is only usable when this is set.
    pub portrait_url: Option<String>,
}

impl ArtistDetail {
    /// Returns the portrait link when the record carries a usable one.
    pub fn usable_portrait(&self) -> Option<&str> {
        self.portrait_url
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}

/// Album entry from the detail catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Album {
    pub title: String,
}

/// Top-track entry from the detail catalog. Order is rank-significant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub title: String,
    pub video_url: Option<String>,
}

/// Fully assembled artist record handed to the renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredArtist {
    pub detail: ArtistDetail,
    pub albums: Vec<Album>,
    pub top_tracks: Vec<Track>,
}

/// One persisted row of the viewing history.
///
/// Field names match the stored JSON layout (`{ name, img, date }`).
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct HistoryEntry {
    pub name: String,
    pub img: String,
    pub date: String,
}

/// Terminal state of one discovery run.
#[derive(Debug, Clone, PartialEq)]
pub enum DiscoveryOutcome {
    Found(DiscoveredArtist),
    /// No attempt produced a detail record with a portrait.
    NotFound { attempts: u32 },
    /// Unexpected failure, carrying the logged reason.
    Failed(String),
}

/// Top-level envelope for all bus traffic.
#[derive(Debug, Clone)]
pub enum Message {
    Discovery(DiscoveryMessage),
    /// Input binding closed; background services should stop.
    Shutdown,
}

/// Discovery-domain commands and notifications.
#[derive(Debug, Clone)]
pub enum DiscoveryMessage {
    /// User pressed the discovery control.
    Start,
    /// A run finished; `run_id` correlates with the run's log lines.
    Finished {
        run_id: String,
        outcome: DiscoveryOutcome,
    },
}
