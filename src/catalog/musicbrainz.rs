//! MusicBrainz artist index: random artist-name draws by offset.

use std::num::NonZeroU32;
use std::time::Duration;

use governor::clock::{Clock, DefaultClock};
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use log::{debug, warn};
use serde_json::Value;

use crate::catalog::http::{non_empty_string, request_url, JsonHttpClient};
use crate::config::CatalogConfig;
use crate::protocol::ArtistSummary;

type DirectLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

pub struct MusicBrainzClient {
    http: JsonHttpClient,
    base_url: String,
    random_offset_bound: u32,
    limiter: Option<DirectLimiter>,
    clock: DefaultClock,
}

impl MusicBrainzClient {
    pub fn new(config: &CatalogConfig) -> Self {
        // A zero interval yields no quota and disables limiting.
        let min_interval = Duration::from_millis(config.musicbrainz_min_interval_ms);
        let limiter = Quota::with_period(min_interval)
            .map(|quota| RateLimiter::direct(quota.allow_burst(NonZeroU32::MIN)));
        Self {
            http: JsonHttpClient::new(config),
            base_url: config.musicbrainz_base_url.clone(),
            random_offset_bound: config.random_offset_bound.max(1),
            limiter,
            clock: DefaultClock::default(),
        }
    }

    /// Blocks until the limiter grants a request slot.
    fn wait_for_rate_limit_slot(&self) {
        let Some(limiter) = &self.limiter else {
            return;
        };
        while let Err(not_until) = limiter.check() {
            let wait = not_until.wait_time_from(self.clock.now());
            debug!("MusicBrainz: waiting {:?} for rate limit slot", wait);
            std::thread::sleep(wait);
        }
    }

    pub fn random_offset(&self) -> u32 {
        rand::random_range(0..self.random_offset_bound)
    }

    /// Requests the single index record at `offset`.
    pub fn artist_at_offset(&self, offset: u32) -> Option<ArtistSummary> {
        let url = artist_offset_url(&self.base_url, offset);
        debug!("MusicBrainz: drawing artist at offset {}", offset);

        self.wait_for_rate_limit_slot();
        match self.http.get_json(&url) {
            Ok(Some(payload)) => parse_artist_summary(&payload),
            Ok(None) => None,
            Err(error) => {
                warn!("MusicBrainz: random draw failed: {}", error);
                None
            }
        }
    }
}

/// Wildcard artist search returning the single record at `offset`.
pub fn artist_offset_url(base_url: &str, offset: u32) -> String {
    let offset_text = offset.to_string();
    request_url(
        base_url,
        "artist",
        &[
            ("query", "artist:*"),
            ("fmt", "json"),
            ("limit", "1"),
            ("offset", offset_text.as_str()),
        ],
    )
}

/// Reads `artists[0].name` from an artist search payload.
pub fn parse_artist_summary(payload: &Value) -> Option<ArtistSummary> {
    let first = payload["artists"].as_array()?.first()?;
    let name = non_empty_string(&first["name"])?;
    Some(ArtistSummary { name })
}
