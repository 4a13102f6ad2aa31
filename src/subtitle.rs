use log::debug;

use crate::format::SubtitleFormat;

/// Where the line scanner is relative to a cue's payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CueState {
    OutsideCue,
    InsideCue,
}

/// Classification of a single trimmed subtitle line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind {
    /// `00:00:01.000 --> 00:00:02.000`
    Timing,
    /// Blank line, numeric cue index, or file header
    Boundary,
    /// Comment block line, never emitted
    Comment,
    Text,
}

/// Per-format line rules for the shared cue state machine
#[derive(Debug, Clone, Copy)]
pub struct CueDialect {
    header: Option<&'static str>,
    comment_prefix: Option<&'static str>,
}

pub const WEBVTT: CueDialect = CueDialect {
    header: Some("WEBVTT"),
    comment_prefix: Some("NOTE"),
};

pub const SRT: CueDialect = CueDialect {
    header: None,
    comment_prefix: None,
};

const CUE_TIMING_SEPARATOR: &str = "-->";

impl CueDialect {
    fn classify(&self, line: &str) -> LineKind {
        if line.contains(CUE_TIMING_SEPARATOR) {
            LineKind::Timing
        } else if line.is_empty() || line.chars().all(|c| c.is_ascii_digit()) || self.header == Some(line) {
            LineKind::Boundary
        } else if self.comment_prefix.is_some_and(|p| line.starts_with(p)) {
            LineKind::Comment
        } else {
            LineKind::Text
        }
    }

    /// Next state and whether the line is emitted as a fragment
    fn transition(state: CueState, kind: LineKind) -> (CueState, bool) {
        match (state, kind) {
            (_, LineKind::Timing) => (CueState::InsideCue, false),
            (_, LineKind::Boundary) => (CueState::OutsideCue, false),
            (state, LineKind::Comment) => (state, false),
            (CueState::InsideCue, LineKind::Text) => (CueState::InsideCue, true),
            (CueState::OutsideCue, LineKind::Text) => (CueState::OutsideCue, false),
        }
    }

    /// Run the line scanner over `body`, returning cue text fragments in order
    pub fn parse(&self, body: &str) -> Vec<String> {
        let mut state = CueState::OutsideCue;
        let mut fragments = Vec::new();

        for line in body.split('\n') {
            let line = line.trim();
            let (next, emit) = Self::transition(state, self.classify(line));
            if emit {
                fragments.push(line.to_string());
            }
            state = next;
        }

        fragments
    }
}

pub fn parse_webvtt(body: &str) -> Vec<String> {
    WEBVTT.parse(body)
}

pub fn parse_srt(body: &str) -> Vec<String> {
    SRT.parse(body)
}

/// Parse a YouTube `json3` document: `events[].segs[].utf8`
pub fn parse_json_events(body: &str) -> Vec<String> {
    let json: serde_json::Value = match serde_json::from_str(body) {
        Ok(json) => json,
        Err(e) => {
            debug!("json3 payload is not valid JSON: {e}");
            return Vec::new();
        }
    };

    let Some(events) = json.get("events").and_then(|e| e.as_array()) else {
        return Vec::new();
    };

    events
        .iter()
        .filter_map(|event| event.get("segs")?.as_array())
        .flatten()
        .filter_map(|seg| seg.get("utf8")?.as_str())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse timedtext XML.
///
/// srv1 keeps each caption in `<transcript><text start=".." dur="..">..</text>`;
/// srv3 uses `<timedtext><body><p t=".." d="..">` with optional `<s>` word segments.
pub fn parse_timedtext_xml(xml: &str) -> Vec<String> {
    use quick_xml::Reader;
    use quick_xml::events::Event;

    fn is_caption(name: &[u8]) -> bool {
        name == b"text" || name == b"p"
    }

    let mut reader = Reader::from_str(xml);
    let mut fragments = Vec::new();
    let mut caption: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) if is_caption(e.name().as_ref()) => caption = Some(String::new()),
            Ok(Event::End(ref e)) if is_caption(e.name().as_ref()) => {
                if let Some(raw_text) = caption.take() {
                    let text = html_escape::decode_html_entities(&raw_text);
                    let text = text.trim();
                    if !text.is_empty() {
                        fragments.push(text.to_string());
                    }
                }
            }
            Ok(Event::Text(ref e)) => {
                if let Some(ref mut raw_text) = caption {
                    raw_text.push_str(&e.unescape().unwrap_or_default());
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                debug!("stopping timedtext parse at {}: {e}", reader.buffer_position());
                break;
            }
            _ => {}
        }
    }

    fragments
}

/// Dispatch to the parser for `format`; unknown payloads become a single raw fragment
pub fn parse_fragments(format: SubtitleFormat, body: &str) -> Vec<String> {
    match format {
        SubtitleFormat::JsonEvents => parse_json_events(body),
        SubtitleFormat::WebVtt => parse_webvtt(body),
        SubtitleFormat::Srt => parse_srt(body),
        SubtitleFormat::TimedTextXml => parse_timedtext_xml(body),
        SubtitleFormat::Unknown => {
            let raw = body.trim();
            if raw.is_empty() { Vec::new() } else { vec![raw.to_string()] }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_events_drops_whitespace_segments() {
        let body = r#"{"events":[{"segs":[{"utf8":"Hello"},{"utf8":" "}]},{"segs":[{"utf8":"world"}]}]}"#;
        assert_eq!(parse_json_events(body), vec!["Hello", "world"]);
    }

    #[test]
    fn test_json_events_skips_missing_fields() {
        let body = r#"{"events":[
            {"tStartMs":0,"dDurationMs":1000},
            {"segs":[{"tOffsetMs":10},{"utf8":"\n"},{"utf8":"  kept  "}]},
            {"segs":"not an array"},
            {"segs":[{"utf8":42}]}
        ]}"#;
        assert_eq!(parse_json_events(body), vec!["kept"]);
    }

    #[test]
    fn test_json_events_malformed_is_empty() {
        assert!(parse_json_events("{not json").is_empty());
        assert!(parse_json_events(r#"{"wireMagic":"pb3"}"#).is_empty());
        assert!(parse_json_events("[]").is_empty());
    }

    #[test]
    fn test_webvtt_basic() {
        let body = "WEBVTT\n\n1\n00:00:00.000 --> 00:00:02.000\nHello there\n\n2\n00:00:02.000 --> 00:00:04.000\nworld";
        assert_eq!(parse_webvtt(body), vec!["Hello there", "world"]);
    }

    #[test]
    fn test_webvtt_ignores_header_metadata_and_notes() {
        let body = "WEBVTT\nKind: captions\nLanguage: en\n\nNOTE this is a comment\n\n00:00:00.000 --> 00:00:01.000 align:start\n  first line  \nNOTE inline\nsecond line\n";
        assert_eq!(parse_webvtt(body), vec!["first line", "second line"]);
    }

    #[test]
    fn test_webvtt_handles_crlf() {
        let body = "WEBVTT\r\n\r\n00:00:00.000 --> 00:00:01.000\r\nHi\r\n";
        assert_eq!(parse_webvtt(body), vec!["Hi"]);
    }

    #[test]
    fn test_webvtt_numeric_line_ends_cue() {
        let body = "00:00:00.000 --> 00:00:01.000\nbefore\n42\nafter";
        assert_eq!(parse_webvtt(body), vec!["before"]);
    }

    #[test]
    fn test_srt_basic() {
        let body = "1\n00:00:01,000 --> 00:00:02,000\nHello\nagain\n\n2\n00:00:03,000 --> 00:00:04,000\nworld\n";
        assert_eq!(parse_srt(body), vec!["Hello", "again", "world"]);
    }

    #[test]
    fn test_srt_keeps_lines_webvtt_would_drop() {
        let body = "00:00:01,000 --> 00:00:02,000\nNOTE to self\n";
        assert_eq!(parse_srt(body), vec!["NOTE to self"]);
        assert!(parse_webvtt(body).is_empty());
    }

    #[test]
    fn test_text_outside_cue_is_dropped() {
        assert!(parse_srt("stray text\nmore stray text").is_empty());
        assert!(parse_webvtt("").is_empty());
    }

    #[test]
    fn test_webvtt_join_is_stable() {
        let body = "WEBVTT\n\n00:00:00.000 --> 00:00:02.000\nHello there\n\n00:00:02.000 --> 00:00:04.000\nbig world";
        let fragments = parse_webvtt(body);
        let joined = fragments.join(" ");
        assert_eq!(joined, "Hello there big world");

        let reparsed = parse_webvtt(&format!("WEBVTT\n\n00:00:00.000 --> 00:00:04.000\n{joined}\n"));
        assert_eq!(reparsed.join(" "), joined);
        assert_eq!(parse_webvtt(body), fragments);
    }

    #[test]
    fn test_srt_join_is_stable() {
        let body = "1\n00:00:00,000 --> 00:00:02,000\nHello there\n\n2\n00:00:02,000 --> 00:00:04,000\nbig\nworld\n";
        let fragments = parse_srt(body);
        assert_eq!(fragments, vec!["Hello there", "big", "world"]);
        let joined = fragments.join(" ");
        assert_eq!(joined, "Hello there big world");

        let reparsed = parse_srt(&format!("1\n00:00:00,000 --> 00:00:04,000\n{joined}\n"));
        assert_eq!(reparsed, vec![joined.clone()]);
        assert_eq!(reparsed.join(" "), joined);
    }

    #[test]
    fn test_transition_table() {
        use CueState::*;
        assert_eq!(CueDialect::transition(OutsideCue, LineKind::Timing), (InsideCue, false));
        assert_eq!(CueDialect::transition(InsideCue, LineKind::Boundary), (OutsideCue, false));
        assert_eq!(CueDialect::transition(InsideCue, LineKind::Comment), (InsideCue, false));
        assert_eq!(CueDialect::transition(InsideCue, LineKind::Text), (InsideCue, true));
        assert_eq!(CueDialect::transition(OutsideCue, LineKind::Text), (OutsideCue, false));
    }

    #[test]
    fn test_timedtext_xml_basic() {
        let xml = r#"<?xml version="1.0" encoding="utf-8" ?>
<transcript>
    <text start="0.21" dur="2.34">Hello world</text>
    <text start="2.55" dur="1.50">This is a test</text>
</transcript>"#;
        assert_eq!(parse_timedtext_xml(xml), vec!["Hello world", "This is a test"]);
    }

    #[test]
    fn test_timedtext_xml_html_entities() {
        let xml = r#"<transcript><text start="0.0" dur="1.0">it&amp;#39;s a &amp;quot;test&amp;quot;</text></transcript>"#;
        assert_eq!(parse_timedtext_xml(xml), vec!["it's a \"test\""]);
    }

    #[test]
    fn test_timedtext_srv3_paragraphs() {
        let xml = r#"<?xml version="1.0" encoding="utf-8" ?><timedtext format="3"><body><p t="0" d="1000">Hello world</p><p t="1000" d="500"><s>big</s><s t="200"> day</s></p><p t="1500" d="10">
</p></body></timedtext>"#;
        assert_eq!(parse_timedtext_xml(xml), vec!["Hello world", "big day"]);
    }

    #[test]
    fn test_srv3_track_is_sniffed_and_parsed() {
        let url = "https://www.youtube.com/api/timedtext?v=abc&lang=en&fmt=srv3";
        let body = r#"<?xml version="1.0" encoding="utf-8" ?><timedtext format="3"><body><p t="0" d="1000">Hello world</p></body></timedtext>"#;
        let format = crate::format::sniff_format(url, body);
        assert_eq!(format, SubtitleFormat::TimedTextXml);
        assert_eq!(parse_fragments(format, body), vec!["Hello world"]);
    }

    #[test]
    fn test_timedtext_xml_salvages_before_error() {
        let xml = r#"<transcript><text start="0">kept</text><text start="1">broken</wrong></transcript>"#;
        let fragments = parse_timedtext_xml(xml);
        assert_eq!(fragments.first().map(String::as_str), Some("kept"));
    }

    #[test]
    fn test_unknown_format_is_raw_body() {
        assert_eq!(parse_fragments(SubtitleFormat::Unknown, "  raw words \n"), vec!["raw words"]);
        assert!(parse_fragments(SubtitleFormat::Unknown, "   ").is_empty());
    }
}
