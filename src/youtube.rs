use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use eyre::{Result, WrapErr, bail};
use log::debug;
use serde::{Deserialize, Serialize};
use tokio::process::Command;

use crate::VideoId;
use crate::error::TranscriptError;
use crate::tracks::TrackListing;

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Title, thumbnail and duration shown alongside a summary
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VideoMetadata {
    pub title: String,
    pub thumbnail_url: Option<String>,
    pub duration_seconds: u64,
}

impl VideoMetadata {
    /// `"{m}m {s}s"`
    pub fn duration_display(&self) -> String {
        format!("{}m {}s", self.duration_seconds / 60, self.duration_seconds % 60)
    }
}

/// Caption track enumeration and video metadata lookup
pub trait TrackSource {
    fn enumerate_tracks(&self, video_id: &VideoId) -> impl Future<Output = Result<TrackListing>> + Send;

    fn fetch_metadata(&self, url: &str) -> impl Future<Output = Result<VideoMetadata>> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Plain GET of a caption track URL
pub trait CaptionFetcher {
    fn get(&self, url: &str) -> impl Future<Output = Result<HttpResponse, TranscriptError>> + Send;
}

/// Fields of `yt-dlp -J` output used here
#[derive(Debug, Deserialize)]
struct YtDlpInfo {
    title: Option<String>,
    thumbnail: Option<String>,
    duration: Option<f64>,
}

impl From<YtDlpInfo> for VideoMetadata {
    fn from(info: YtDlpInfo) -> Self {
        Self {
            title: info.title.unwrap_or_else(|| "No title found".to_string()),
            thumbnail_url: info.thumbnail,
            duration_seconds: info.duration.map(|d| d.max(0.0).round() as u64).unwrap_or(0),
        }
    }
}

/// Track and metadata source backed by the `yt-dlp` executable
#[derive(Debug, Clone)]
pub struct YtDlp {
    program: PathBuf,
}

impl Default for YtDlp {
    fn default() -> Self {
        Self {
            program: PathBuf::from("yt-dlp"),
        }
    }
}

impl YtDlp {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self { program: program.into() }
    }

    async fn dump_json(&self, url: &str) -> Result<String> {
        debug!("Running {} -J for {url}", self.program.display());

        let output = Command::new(&self.program)
            .args(["-J", "--skip-download", "--no-playlist", "--no-warnings", url])
            .output()
            .await;

        let output = match output {
            Ok(o) => o,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                bail!(
                    "yt-dlp not found. Install it to enumerate caption tracks:\n  \
                     pip install yt-dlp\n  \
                     or: brew install yt-dlp"
                );
            }
            Err(e) => bail!("failed to run yt-dlp: {e}"),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("yt-dlp exited with status {}: {}", output.status, stderr.trim());
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl TrackSource for YtDlp {
    async fn enumerate_tracks(&self, video_id: &VideoId) -> Result<TrackListing> {
        let json = self.dump_json(&video_id.watch_url()).await?;
        let listing = parse_track_listing(&json)?;
        debug!(
            "Video {video_id}: manual={:?} automatic={} languages",
            listing.manual.languages().take(5).collect::<Vec<_>>(),
            listing.automatic.len(),
        );
        Ok(listing)
    }

    async fn fetch_metadata(&self, url: &str) -> Result<VideoMetadata> {
        let json = self.dump_json(url).await?;
        parse_metadata(&json)
    }
}

/// Tracks plus the title/duration from the same `-J` dump
fn parse_track_listing(json: &str) -> Result<TrackListing> {
    let mut listing: TrackListing =
        serde_json::from_str(json).wrap_err("could not read caption tracks from yt-dlp output")?;
    listing.metadata = match parse_metadata(json) {
        Ok(meta) => Some(meta),
        Err(e) => {
            debug!("No metadata in track listing: {e:#}");
            None
        }
    };
    Ok(listing)
}

fn parse_metadata(json: &str) -> Result<VideoMetadata> {
    let info: YtDlpInfo = serde_json::from_str(json).wrap_err("could not read video metadata from yt-dlp output")?;
    Ok(info.into())
}

/// `reqwest`-backed fetcher with a per-request timeout
#[derive(Debug, Clone)]
pub struct HttpCaptionFetcher {
    client: reqwest::Client,
}

impl HttpCaptionFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }
}

impl CaptionFetcher for HttpCaptionFetcher {
    async fn get(&self, url: &str) -> Result<HttpResponse, TranscriptError> {
        let network = |e: reqwest::Error| TranscriptError::Network {
            url: url.to_string(),
            reason: if e.is_timeout() { "timed out".to_string() } else { e.to_string() },
        };

        let resp = self.client.get(url).send().await.map_err(network)?;
        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(network)?;
        Ok(HttpResponse { status, body })
    }
}
