use serde::Serialize;

use crate::tracks::CaptionTrackRef;

/// Subtitle payload formats understood by the parsers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubtitleFormat {
    JsonEvents,
    WebVtt,
    Srt,
    TimedTextXml,
    Unknown,
}

impl SubtitleFormat {
    /// Map a yt-dlp `ext` value to a format
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "json3" | "json" => Some(SubtitleFormat::JsonEvents),
            "vtt" => Some(SubtitleFormat::WebVtt),
            "srt" => Some(SubtitleFormat::Srt),
            "srv1" | "srv2" | "srv3" | "xml" => Some(SubtitleFormat::TimedTextXml),
            _ => None,
        }
    }
}

impl std::fmt::Display for SubtitleFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubtitleFormat::JsonEvents => write!(f, "json3"),
            SubtitleFormat::WebVtt => write!(f, "vtt"),
            SubtitleFormat::Srt => write!(f, "srt"),
            SubtitleFormat::TimedTextXml => write!(f, "srv1"),
            SubtitleFormat::Unknown => write!(f, "unknown"),
        }
    }
}

const JSON_SUFFIXES: [&str; 2] = [".json3", ".json"];

fn format_from_url(url: &str) -> Option<SubtitleFormat> {
    if JSON_SUFFIXES.iter().any(|s| url.ends_with(s)) {
        Some(SubtitleFormat::JsonEvents)
    } else if url.ends_with(".vtt") {
        Some(SubtitleFormat::WebVtt)
    } else if url.ends_with(".srt") {
        Some(SubtitleFormat::Srt)
    } else {
        None
    }
}

fn format_from_body(body: &str) -> SubtitleFormat {
    let trimmed = body.trim_start();
    if trimmed.starts_with("WEBVTT") {
        return SubtitleFormat::WebVtt;
    }
    if body.contains("-->") && body.chars().any(|c| c.is_ascii_digit()) {
        return SubtitleFormat::Srt;
    }
    if trimmed.starts_with('<') && (trimmed.contains("<transcript") || trimmed.contains("<timedtext")) {
        return SubtitleFormat::TimedTextXml;
    }
    if serde_json::from_str::<serde_json::Value>(body).is_ok() {
        return SubtitleFormat::JsonEvents;
    }
    SubtitleFormat::Unknown
}

/// Determine the payload format from the URL suffix, falling back to content sniffing.
///
/// Caption delivery URLs frequently carry no usable suffix (YouTube's
/// `timedtext` endpoint uses a `fmt=` query parameter), so the body is
/// inspected whenever the URL is inconclusive.
pub fn sniff_format(url: &str, body: &str) -> SubtitleFormat {
    format_from_url(url).unwrap_or_else(|| format_from_body(body))
}

/// Like [`sniff_format`], but trusts a declared format hint before sniffing content
pub fn detect_format(track: &CaptionTrackRef, body: &str) -> SubtitleFormat {
    format_from_url(&track.url)
        .or(track.format_hint)
        .unwrap_or_else(|| format_from_body(body))
}
