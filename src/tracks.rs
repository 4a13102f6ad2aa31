use std::fmt;

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};

use crate::error::TranscriptError;
use crate::format::SubtitleFormat;
use crate::youtube::VideoMetadata;

/// A fetchable caption track
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionTrackRef {
    pub url: String,
    pub format_hint: Option<SubtitleFormat>,
}

impl CaptionTrackRef {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            format_hint: None,
        }
    }

    pub fn with_hint(mut self, format: SubtitleFormat) -> Self {
        self.format_hint = Some(format);
        self
    }
}

/// Language code to caption tracks, in the order the source listed them.
///
/// Every language present has at least one track.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptionTrackSet {
    entries: Vec<(String, Vec<CaptionTrackRef>)>,
}

impl CaptionTrackSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append tracks for `lang`; empty track lists are ignored
    pub fn insert(&mut self, lang: impl Into<String>, tracks: Vec<CaptionTrackRef>) {
        if tracks.is_empty() {
            return;
        }
        let lang = lang.into();
        match self.entries.iter_mut().find(|(l, _)| *l == lang) {
            Some((_, existing)) => existing.extend(tracks),
            None => self.entries.push((lang, tracks)),
        }
    }

    pub fn with(mut self, lang: impl Into<String>, tracks: Vec<CaptionTrackRef>) -> Self {
        self.insert(lang, tracks);
        self
    }

    pub fn get(&self, lang: &str) -> Option<&[CaptionTrackRef]> {
        self.entries
            .iter()
            .find(|(l, _)| l == lang)
            .map(|(_, tracks)| tracks.as_slice())
    }

    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(l, _)| l.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// One entry of a yt-dlp `subtitles` / `automatic_captions` list
#[derive(Debug, Deserialize)]
struct YtDlpTrack {
    url: Option<String>,
    ext: Option<String>,
}

impl<'de> Deserialize<'de> for CaptionTrackSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TrackSetVisitor;

        impl<'de> Visitor<'de> for TrackSetVisitor {
            type Value = CaptionTrackSet;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of language code to caption tracks")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut set = CaptionTrackSet::new();
                while let Some((lang, tracks)) = map.next_entry::<String, Vec<YtDlpTrack>>()? {
                    let refs = tracks
                        .into_iter()
                        .filter_map(|t| {
                            let url = t.url?;
                            let format_hint = t.ext.as_deref().and_then(SubtitleFormat::from_extension);
                            Some(CaptionTrackRef { url, format_hint })
                        })
                        .collect();
                    set.insert(lang, refs);
                }
                Ok(set)
            }

            fn visit_unit<E: serde::de::Error>(self) -> Result<Self::Value, E> {
                Ok(CaptionTrackSet::new())
            }
        }

        deserializer.deserialize_any(TrackSetVisitor)
    }
}

/// Manual and automatic caption tracks for one video
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrackListing {
    #[serde(default, rename = "subtitles")]
    pub manual: CaptionTrackSet,
    #[serde(default, rename = "automatic_captions")]
    pub automatic: CaptionTrackSet,
    /// Title and duration, when the listing came with them
    #[serde(skip)]
    pub metadata: Option<VideoMetadata>,
}

impl TrackListing {
    pub fn is_empty(&self) -> bool {
        self.manual.is_empty() && self.automatic.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackKind {
    Manual,
    Automatic,
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackKind::Manual => write!(f, "manual subtitles"),
            TrackKind::Automatic => write!(f, "automatic captions"),
        }
    }
}

/// Priority tiers, tried in declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    PreferredManual,
    PreferredAutomatic,
    OtherManual,
    OtherAutomatic,
}

impl Tier {
    pub fn kind(self) -> TrackKind {
        match self {
            Tier::PreferredManual | Tier::OtherManual => TrackKind::Manual,
            Tier::PreferredAutomatic | Tier::OtherAutomatic => TrackKind::Automatic,
        }
    }
}

/// A track the assembler should try, with where it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub tier: Tier,
    pub language: String,
    pub track: CaptionTrackRef,
}

#[derive(Debug, Clone)]
pub struct SelectionPolicy {
    pub preferred_lang: String,
    pub other_lang_limit: usize,
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self {
            preferred_lang: "en".to_string(),
            other_lang_limit: 3,
        }
    }
}

fn first_ref(set: &CaptionTrackSet, lang: &str) -> Option<CaptionTrackRef> {
    set.get(lang).and_then(|tracks| tracks.first()).cloned()
}

/// Order every track worth trying: preferred language (manual, then automatic),
/// then up to `other_lang_limit` other languages of each kind.
pub fn plan_candidates(listing: &TrackListing, policy: &SelectionPolicy) -> Vec<Candidate> {
    let preferred = policy.preferred_lang.as_str();
    let mut plan = Vec::new();

    for (tier, set) in [
        (Tier::PreferredManual, &listing.manual),
        (Tier::PreferredAutomatic, &listing.automatic),
    ] {
        if let Some(track) = first_ref(set, preferred) {
            plan.push(Candidate {
                tier,
                language: preferred.to_string(),
                track,
            });
        }
    }

    for (tier, set) in [
        (Tier::OtherManual, &listing.manual),
        (Tier::OtherAutomatic, &listing.automatic),
    ] {
        let others = set
            .languages()
            .filter(|lang| *lang != preferred)
            .take(policy.other_lang_limit);
        for lang in others {
            if let Some(track) = first_ref(set, lang) {
                plan.push(Candidate {
                    tier,
                    language: lang.to_string(),
                    track,
                });
            }
        }
    }

    plan
}

/// The policy's first choice, without fetching anything
pub fn select_track(
    video_id: &str,
    listing: &TrackListing,
    policy: &SelectionPolicy,
) -> Result<Candidate, TranscriptError> {
    plan_candidates(listing, policy)
        .into_iter()
        .next()
        .ok_or_else(|| TranscriptError::NoTranscriptAvailable(video_id.to_string()))
}
