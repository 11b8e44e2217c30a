use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Content digest of a video file, used as the cache key.
///
/// Identical bytes always map to the same digest, so re-uploading a renamed
/// copy of a known file is served from cache. This is a deduplication key,
/// not a security boundary.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaDigest(String);

impl MediaDigest {
    pub fn new(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short prefix for display in tables and log lines.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl fmt::Display for MediaDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A timed speech problem reported by the analysis server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedEvent {
    pub start_s: f64,
    pub end_s: f64,
    /// Category label, e.g. "Filler words".
    pub event: String,
    pub description: String,
    /// Display color for timeline markers.
    pub color: String,
}

/// One transcribed sentence with its start time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sentence {
    pub sentence_start: f64,
    pub sentence: String,
}

/// Dominant sentiment of the speech. The server reports a small fixed label
/// set; anything unrecognized normalizes to `Neutral`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sentiment {
    Positive,
    Negative,
    #[default]
    Neutral,
}

impl Sentiment {
    pub fn from_label(label: &str) -> Self {
        match label {
            "positive" => Sentiment::Positive,
            "negative" => Sentiment::Negative,
            _ => Sentiment::Neutral,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
        }
    }
}

impl Serialize for Sentiment {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for Sentiment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(Sentiment::from_label(&label))
    }
}

/// Normalized analysis of one video, exactly as cached.
///
/// The server may omit the extended fields; they default to empty so that
/// report consumers stay total. Created once per upload, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default)]
    pub video_name: String,
    /// Overall speech quality, 0-100.
    pub score: f64,
    #[serde(default)]
    pub detected_events: Vec<DetectedEvent>,
    #[serde(default)]
    pub transcription: Vec<Sentence>,
    /// Words-per-minute samples, paired with `wpm_timestamps`.
    #[serde(default)]
    pub wpm_data: Vec<f64>,
    /// `[start, end]` second pairs for each WPM sample.
    #[serde(default)]
    pub wpm_timestamps: Vec<(f64, f64)>,
    #[serde(default)]
    pub volumes: Vec<f64>,
    #[serde(default)]
    pub volumes_timestamps: Vec<(f64, f64)>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub target_audience: String,
    #[serde(default)]
    pub sentiment: Sentiment,
    #[serde(default)]
    pub named_entities: Vec<String>,
    /// Gunning fog readability index.
    #[serde(default)]
    pub fog_index: Option<f64>,
    #[serde(default)]
    pub questions: Vec<String>,
    #[serde(default)]
    pub readable_transcription: String,
    #[serde(default)]
    pub english_translation: String,
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(default)]
    pub creation_date: String,
}

impl AnalysisResult {
    /// Best-effort media duration in seconds, derived from the latest
    /// timestamp in the result. The report carries no explicit duration;
    /// only an attached player knows the real one.
    pub fn duration_hint(&self) -> f64 {
        let mut duration: f64 = 0.0;
        for event in &self.detected_events {
            duration = duration.max(event.end_s);
        }
        for (_, end) in self.wpm_timestamps.iter().chain(&self.volumes_timestamps) {
            duration = duration.max(*end);
        }
        for sentence in &self.transcription {
            duration = duration.max(sentence.sentence_start);
        }
        duration
    }
}
