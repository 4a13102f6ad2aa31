pub mod config;
pub mod error;
pub mod format;
pub mod output;
pub mod subtitle;
pub mod summarize;
pub mod tracks;
pub mod transcript;
pub mod youtube;

use std::sync::OnceLock;

use regex::Regex;

pub use error::{ConnectionError, SummarizationError, TranscriptError};
pub use format::{SubtitleFormat, detect_format, sniff_format};
pub use tracks::{CaptionTrackRef, CaptionTrackSet, SelectionPolicy, TrackKind, TrackListing};
pub use transcript::{Transcript, TranscriptAssembler};

/// Opaque YouTube video identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VideoId(String);

impl VideoId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.0)
    }
}

impl std::fmt::Display for VideoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

const WATCH_MARKER: &str = "watch?v=";
const SHORT_HOST: &str = "youtu.be/";

fn strict_id_regex() -> &'static Regex {
    static STRICT_ID: OnceLock<Regex> = OnceLock::new();
    STRICT_ID.get_or_init(|| Regex::new(r"^[a-zA-Z0-9_-]{11}$").expect("video id regex"))
}

/// Extract the video ID from a `watch?v=` or `youtu.be/` URL.
///
/// The token is returned as-is; see [`extract_video_id_strict`] for charset and length checks.
pub fn extract_video_id(url: &str) -> Result<VideoId, TranscriptError> {
    let url = url.trim();

    let id = if let Some((_, rest)) = url.split_once(WATCH_MARKER) {
        rest.split('&').next().unwrap_or_default()
    } else if url.contains(SHORT_HOST) {
        let last = url.rsplit('/').next().unwrap_or_default();
        last.split('?').next().unwrap_or_default()
    } else {
        return Err(TranscriptError::InvalidUrl(url.to_string()));
    };

    if id.is_empty() {
        return Err(TranscriptError::InvalidUrl(url.to_string()));
    }

    Ok(VideoId(id.to_string()))
}

/// [`extract_video_id`], additionally requiring an 11-character `[A-Za-z0-9_-]` token
pub fn extract_video_id_strict(url: &str) -> Result<VideoId, TranscriptError> {
    let id = extract_video_id(url)?;
    if !strict_id_regex().is_match(id.as_str()) {
        return Err(TranscriptError::InvalidUrl(url.trim().to_string()));
    }
    Ok(id)
}
