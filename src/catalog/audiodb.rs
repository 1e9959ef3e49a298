//! TheAudioDB detail catalog: artist records, albums, and top tracks.

use log::{debug, warn};
use serde_json::Value;

use crate::catalog::http::{non_empty_string, request_url, JsonHttpClient};
use crate::config::CatalogConfig;
use crate::protocol::{Album, ArtistDetail, Track};

pub struct AudioDbClient {
    http: JsonHttpClient,
    base_url: String,
}

impl AudioDbClient {
    pub fn new(config: &CatalogConfig) -> Self {
        Self {
            http: JsonHttpClient::new(config),
            base_url: config.audiodb_base_url.clone(),
        }
    }

    fn get_payload(&self, url: &str) -> Option<Value> {
        match self.http.get_json(url) {
            Ok(payload) => payload,
            Err(error) => {
                warn!("TheAudioDB: request failed: {}", error);
                None
            }
        }
    }

    pub fn search_artist(&self, name: &str) -> Option<ArtistDetail> {
        debug!("TheAudioDB: searching artist {:?}", name);
        parse_artist_detail(&self.get_payload(&search_url(&self.base_url, name))?)
    }

    pub fn albums(&self, artist_id: &str) -> Vec<Album> {
        debug!("TheAudioDB: listing albums for artist id {}", artist_id);
        self.get_payload(&albums_url(&self.base_url, artist_id))
            .map(|payload| parse_albums(&payload))
            .unwrap_or_default()
    }

    pub fn top_tracks(&self, artist_name: &str) -> Vec<Track> {
        debug!("TheAudioDB: listing top tracks for {:?}", artist_name);
        self.get_payload(&top_tracks_url(&self.base_url, artist_name))
            .map(|payload| parse_top_tracks(&payload))
            .unwrap_or_default()
    }
}

pub fn search_url(base_url: &str, artist_name: &str) -> String {
    request_url(base_url, "search.php", &[("s", artist_name)])
}

pub fn albums_url(base_url: &str, artist_id: &str) -> String {
    request_url(base_url, "album.php", &[("i", artist_id)])
}

pub fn top_tracks_url(base_url: &str, artist_name: &str) -> String {
    request_url(base_url, "track-top10.php", &[("s", artist_name)])
}

/// First entry of `artists`; `null` or an empty list means no match.
pub fn parse_artist_detail(payload: &Value) -> Option<ArtistDetail> {
    let candidate = payload["artists"].as_array()?.first()?;
    Some(ArtistDetail {
        id: non_empty_string(&candidate["idArtist"])?,
        name: non_empty_string(&candidate["strArtist"])?,
        portrait_url: non_empty_string(&candidate["strArtistThumb"]),
    })
}

/// One album per catalog element, in catalog order. A missing title is kept
/// as an empty string so the first element stays first.
pub fn parse_albums(payload: &Value) -> Vec<Album> {
    let Some(albums) = payload["album"].as_array() else {
        return Vec::new();
    };
    albums
        .iter()
        .map(|album| Album {
            title: non_empty_string(&album["strAlbum"]).unwrap_or_default(),
        })
        .collect()
}

/// Tracks are rank-significant: an untitled entry keeps its position and video.
pub fn parse_top_tracks(payload: &Value) -> Vec<Track> {
    let Some(tracks) = payload["track"].as_array() else {
        return Vec::new();
    };
    tracks
        .iter()
        .map(|track| Track {
            title: non_empty_string(&track["strTrack"]).unwrap_or_default(),
            video_url: non_empty_string(&track["strMusicVid"]),
        })
        .collect()
}
