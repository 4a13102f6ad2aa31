use std::path::{Path, PathBuf};

use eyre::{Result, WrapErr};
use log::debug;
use serde::Serialize;

use crate::Transcript;
use crate::youtube::VideoMetadata;

const TITLE_CHARS: usize = 30;
const WORDS_PER_MINUTE: usize = 200;

/// Transcript size figures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TranscriptStats {
    pub chars: usize,
    pub words: usize,
    pub reading_minutes: usize,
}

impl TranscriptStats {
    pub fn of(text: &str) -> Self {
        let words = text.split_whitespace().count();
        Self {
            chars: text.chars().count(),
            words,
            reading_minutes: words / WORDS_PER_MINUTE + 1,
        }
    }
}

/// Everything produced for one video
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub metadata: Option<&'a VideoMetadata>,
    pub transcript: &'a Transcript,
    pub stats: TranscriptStats,
    pub summary: Option<&'a str>,
}

impl<'a> Report<'a> {
    pub fn new(transcript: &'a Transcript, metadata: Option<&'a VideoMetadata>, summary: Option<&'a str>) -> Self {
        Self {
            metadata,
            transcript,
            stats: TranscriptStats::of(&transcript.text),
            summary,
        }
    }
}

/// Render as plain text: optional title header, transcript, then summary
pub fn render_text(report: &Report) -> String {
    let mut out = String::new();
    if let Some(meta) = report.metadata {
        out.push_str(&format!("# {} ({})\n\n", meta.title, meta.duration_display()));
    }
    out.push_str(&report.transcript.text);
    if let Some(summary) = report.summary {
        out.push_str("\n\n--- Summary ---\n");
        out.push_str(summary.trim_end());
    }
    out
}

pub fn render_json(report: &Report) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// `{prefix}_{title}.txt`, title cut to 30 chars with anything but `[A-Za-z0-9_-]` replaced
pub fn download_file_name(prefix: &str, title: &str) -> String {
    let title: String = title
        .chars()
        .take(TITLE_CHARS)
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    format!("{prefix}_{title}.txt")
}

/// Write `contents` as a plain-text download under `dir`
pub fn write_download(dir: &Path, prefix: &str, title: &str, contents: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).wrap_err_with(|| format!("creating {}", dir.display()))?;
    let path = dir.join(download_file_name(prefix, title));
    std::fs::write(&path, contents).wrap_err_with(|| format!("writing {}", path.display()))?;
    debug!("Wrote {}", path.display());
    Ok(path)
}

/// Append one rendered report to `path`, newline-terminated
pub fn append_output(path: &Path, rendered: &str) -> Result<()> {
    use std::io::Write;

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .wrap_err_with(|| format!("opening {}", path.display()))?;
    writeln!(file, "{rendered}").wrap_err_with(|| format!("writing {}", path.display()))?;
    debug!("Appended report to {}", path.display());
    Ok(())
}
