use log::{debug, info, warn};
use serde::Serialize;

use crate::error::TranscriptError;
use crate::format::{SubtitleFormat, detect_format};
use crate::subtitle::parse_fragments;
use crate::tracks::{Candidate, SelectionPolicy, Tier, TrackKind, plan_candidates};
use crate::youtube::{CaptionFetcher, TrackSource, VideoMetadata};
use crate::{VideoId, extract_video_id, extract_video_id_strict};

/// Plain-text transcript from a single caption track
#[derive(Debug, Clone, Serialize)]
pub struct Transcript {
    pub video_id: String,
    pub language: String,
    pub kind: TrackKind,
    pub tier: Tier,
    pub format: SubtitleFormat,
    pub text: String,
    /// Title and duration reported alongside the track listing
    #[serde(skip)]
    pub metadata: Option<VideoMetadata>,
}

impl std::fmt::Display for Transcript {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

/// Runs track selection, fetching and parsing for one URL at a time
pub struct TranscriptAssembler<S, F> {
    source: S,
    fetcher: F,
    policy: SelectionPolicy,
    strict_ids: bool,
}

impl<S: TrackSource, F: CaptionFetcher> TranscriptAssembler<S, F> {
    pub fn new(source: S, fetcher: F) -> Self {
        Self {
            source,
            fetcher,
            policy: SelectionPolicy::default(),
            strict_ids: false,
        }
    }

    pub fn with_policy(mut self, policy: SelectionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_strict_ids(mut self, strict: bool) -> Self {
        self.strict_ids = strict;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Fetch the best available transcript for a video URL.
    ///
    /// Tracks are tried in tier order; a fetch failure, non-2xx status or empty
    /// parse moves on to the next candidate.
    pub async fn get_transcript(&self, url: &str) -> Result<Transcript, TranscriptError> {
        let video_id = if self.strict_ids {
            extract_video_id_strict(url)?
        } else {
            extract_video_id(url)?
        };

        let listing = self
            .source
            .enumerate_tracks(&video_id)
            .await
            .map_err(|e| TranscriptError::Unexpected(format!("{e:#}")))?;

        let candidates = plan_candidates(&listing, &self.policy);
        debug!("Video {video_id}: {} candidate tracks", candidates.len());

        for candidate in candidates {
            if let Some(mut transcript) = self.try_candidate(&video_id, candidate).await {
                transcript.metadata = listing.metadata;
                return Ok(transcript);
            }
        }

        Err(TranscriptError::NoTranscriptAvailable(video_id.to_string()))
    }

    async fn try_candidate(&self, video_id: &VideoId, candidate: Candidate) -> Option<Transcript> {
        let Candidate { tier, language, track } = candidate;
        debug!("Trying {tier:?} track lang={language}");

        let resp = match self.fetcher.get(&track.url).await {
            Ok(resp) => resp,
            Err(e) => {
                warn!("{e}");
                return None;
            }
        };
        if !resp.is_success() {
            warn!("Caption fetch for lang={language} returned {}", resp.status);
            return None;
        }

        let format = detect_format(&track, &resp.body);
        let text = parse_fragments(format, &resp.body).join(" ");
        if text.is_empty() {
            debug!("{format} track lang={language} yielded no text");
            return None;
        }

        let kind = tier.kind();
        info!("Using {language} {kind} ({format})");
        Some(Transcript {
            video_id: video_id.to_string(),
            language,
            kind,
            tier,
            format,
            text,
            metadata: None,
        })
    }
}
