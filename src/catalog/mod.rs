//! Catalog abstractions and the online implementation.

pub mod audiodb;
pub mod http;
pub mod musicbrainz;

use crate::catalog::audiodb::AudioDbClient;
use crate::catalog::musicbrainz::MusicBrainzClient;
use crate::config::CatalogConfig;
use crate::protocol::{Album, ArtistDetail, ArtistSummary, Track};

/// Read-only catalog operations used by discovery.
///
/// Every operation fails soft: transport and parse failures are logged and
/// reported as `None` or an empty list.
pub trait ArtistCatalog: Send + Sync {
    fn draw_random_artist_name(&self) -> Option<ArtistSummary>;
    fn lookup_artist_detail(&self, name: &str) -> Option<ArtistDetail>;
    fn list_albums(&self, artist_id: &str) -> Vec<Album>;
    fn list_top_tracks(&self, artist_name: &str) -> Vec<Track>;
}

/// MusicBrainz for random draws, TheAudioDB for everything else.
pub struct OnlineCatalog {
    musicbrainz: MusicBrainzClient,
    audiodb: AudioDbClient,
}

impl OnlineCatalog {
    pub fn new(config: &CatalogConfig) -> Self {
        Self {
            musicbrainz: MusicBrainzClient::new(config),
            audiodb: AudioDbClient::new(config),
        }
    }
}

impl ArtistCatalog for OnlineCatalog {
    fn draw_random_artist_name(&self) -> Option<ArtistSummary> {
        let offset = self.musicbrainz.random_offset();
        self.musicbrainz.artist_at_offset(offset)
    }

    fn lookup_artist_detail(&self, name: &str) -> Option<ArtistDetail> {
        self.audiodb.search_artist(name)
    }

    fn list_albums(&self, artist_id: &str) -> Vec<Album> {
        self.audiodb.albums(artist_id)
    }

    fn list_top_tracks(&self, artist_name: &str) -> Vec<Track> {
        self.audiodb.top_tracks(artist_name)
    }
}
