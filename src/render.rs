//! Markup rendering for the artist panel and the history list.
//!
//! Every function here is pure: it maps data to an HTML fragment. All text that
//! originates from a catalog or from persisted history is escaped.

use log::warn;

use crate::protocol::{Album, DiscoveredArtist, HistoryEntry, Track};

/// Shown in place of the best album when the catalog lists none.
pub const BEST_ALBUM_PLACEHOLDER: &str = "N/A";

const VIDEO_EMBED_BASE_URL: &str = "https://www.youtube.com/embed";
const VIDEO_EMBED_WIDTH: u32 = 300;
const VIDEO_EMBED_HEIGHT: u32 = 150;
const HISTORY_THUMB_WIDTH: u32 = 50;

pub fn render_loading() -> String {
    "⏳ Loading...".to_string()
}

pub fn render_not_found() -> String {
    "❌ No artist found after several attempts.".to_string()
}

pub fn render_error() -> String {
    "❌ Error while loading.".to_string()
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// First album title, or the placeholder when the list is empty.
/// Title of the first album. An empty list or an untitled first album gives
/// the placeholder.
pub fn best_album_title(albums: &[Album]) -> &str {
    albums
        .first()
        .map(|album| album.title.as_str())
        .filter(|title| !title.is_empty())
        .unwrap_or(BEST_ALBUM_PLACEHOLDER)
}

fn is_youtube_host(host: &str) -> bool {
    let host = host.to_ascii_lowercase();
    host == "youtube.com" || host.ends_with(".youtube.com")
}

fn is_well_formed_video_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
}

/// Extracts the `v` identifier from a YouTube watch link.
///
/// Links on other hosts yield `None` silently; malformed YouTube links are
/// logged and also yield `None`.
pub fn youtube_video_id(video_url: &str) -> Option<String> {
    let trimmed = video_url.trim();
    if !trimmed.to_ascii_lowercase().contains("youtube.com") {
        return None;
    }

    let parsed = match url::Url::parse(trimmed) {
        Ok(parsed) => parsed,
        Err(err) => {
            warn!("Invalid video URL {:?}: {}", trimmed, err);
            return None;
        }
    };
    if !parsed.host_str().is_some_and(is_youtube_host) {
        return None;
    }

    let video_id = parsed
        .query_pairs()
        .find(|(key, _)| key == "v")
        .map(|(_, value)| value.into_owned());
    match video_id {
        Some(id) if is_well_formed_video_id(&id) => Some(id),
        Some(id) => {
            warn!("Malformed video id {:?} in {:?}", id, trimmed);
            None
        }
        None => {
            warn!("Video URL without id parameter: {:?}", trimmed);
            None
        }
    }
}

fn render_track(track: &Track) -> String {
    let mut html = format!("<li>{}", escape_html(&track.title));
    if let Some(video_id) = track.video_url.as_deref().and_then(youtube_video_id) {
        html.push_str(&format!(
            "<br><iframe width=\"{VIDEO_EMBED_WIDTH}\" height=\"{VIDEO_EMBED_HEIGHT}\" \
             src=\"{VIDEO_EMBED_BASE_URL}/{video_id}\" frameborder=\"0\" allowfullscreen></iframe>"
        ));
    }
    html.push_str("</li>");
    html
}

/// Renders the artist panel: heading, portrait, best album, ranked tracks.
pub fn render_artist(artist: &DiscoveredArtist) -> String {
    let name = escape_html(&artist.detail.name);
    let portrait = escape_html(artist.detail.usable_portrait().unwrap_or_default());

    let mut html = String::new();
    html.push_str(&format!("<h2>{name}</h2>\n"));
    html.push_str(&format!(
        "<img src=\"{portrait}\" class=\"img-fluid rounded shadow mb-3\" alt=\"{name}\">\n"
    ));
    html.push_str(&format!(
        "<p><strong>Best album:</strong> {}</p>\n",
        escape_html(best_album_title(&artist.albums))
    ));
    html.push_str("<h3>Top 10 Tracks</h3>\n<ul>\n");
    for track in &artist.top_tracks {
        html.push_str(&render_track(track));
        html.push('\n');
    }
    html.push_str("</ul>");
    html
}

/// Renders one list row per entry, in stored order.
pub fn render_history(entries: &[HistoryEntry]) -> String {
    entries
        .iter()
        .map(|entry| {
            format!(
                "<li class=\"list-group-item d-flex align-items-center\">\
                 <img src=\"{}\" width=\"{HISTORY_THUMB_WIDTH}\" class=\"me-2 rounded\">\
                 <strong>{}</strong>\
                 <span class=\"ms-auto text-muted\">{}</span></li>",
                escape_html(&entry.img),
                escape_html(&entry.name),
                escape_html(&entry.date)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
