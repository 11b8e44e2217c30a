use crate::playback::marker_span;
use crate::types::{AnalysisResult, DetectedEvent};

/// Format seconds as MM:SS timestamp
pub fn format_timestamp(seconds: f64) -> String {
    let mins = (seconds / 60.0) as u32;
    let secs = (seconds % 60.0) as u32;
    format!("{:02}:{:02}", mins, secs)
}

/// Detected events rolled up by category label for the problems view.
#[derive(Debug, Clone, PartialEq)]
pub struct EventBucket {
    pub name: String,
    pub count: usize,
    /// Free-text description from the first occurrence.
    pub description: String,
    /// Start times of every occurrence, in report order.
    pub timestamps: Vec<f64>,
    pub color: String,
}

/// Group events by their `event` label, preserving first-seen order.
pub fn group_events(events: &[DetectedEvent]) -> Vec<EventBucket> {
    let mut buckets: Vec<EventBucket> = Vec::new();

    for event in events {
        match buckets.iter_mut().find(|bucket| bucket.name == event.event) {
            Some(bucket) => {
                bucket.count += 1;
                bucket.timestamps.push(event.start_s);
            }
            None => buckets.push(EventBucket {
                name: event.event.clone(),
                count: 1,
                description: event.description.clone(),
                timestamps: vec![event.start_s],
                color: event.color.clone(),
            }),
        }
    }

    buckets
}

/// One proportional timeline row per event category.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineRow {
    pub name: String,
    pub bar: String,
}

/// Paint detected events onto fixed-width timeline rows, one row per
/// category. Empty while the duration is unknown; nothing is renderable
/// without it.
pub fn render_timeline(
    events: &[DetectedEvent],
    duration_s: f64,
    width: usize,
) -> Vec<TimelineRow> {
    if width == 0 || marker_span(0.0, 0.0, duration_s).is_none() {
        return Vec::new();
    }

    let mut rows: Vec<(String, Vec<&DetectedEvent>)> = Vec::new();
    for event in events {
        match rows.iter_mut().find(|(name, _)| *name == event.event) {
            Some((_, list)) => list.push(event),
            None => rows.push((event.event.clone(), vec![event])),
        }
    }

    rows.into_iter()
        .map(|(name, list)| {
            let mut cells = vec!['─'; width];
            for event in list {
                let Some(span) = marker_span(event.start_s, event.end_s, duration_s) else {
                    continue;
                };
                let left = ((span.left * width as f64) as usize).min(width - 1);
                let cols = ((span.width * width as f64).round() as usize).max(1);
                for cell in cells.iter_mut().skip(left).take(cols) {
                    *cell = '█';
                }
            }
            TimelineRow {
                name,
                bar: cells.into_iter().collect(),
            }
        })
        .collect()
}

/// Format an analysis as a human-readable markdown report
pub fn format_report_readable(result: &AnalysisResult) -> String {
    let mut output = String::new();

    let name = if result.video_name.is_empty() {
        "Video"
    } else {
        &result.video_name
    };
    output.push_str(&format!("# {}\n\n", name));

    output.push_str(&format!(
        "**Score:** {:.0}/100 | **Sentiment:** {}",
        result.score,
        result.sentiment.label()
    ));
    if let Some(fog) = result.fog_index {
        output.push_str(&format!(" | **Fog index:** {:.0}", fog));
    }
    if !result.creation_date.is_empty() {
        output.push_str(&format!(" | **Analyzed:** {}", result.creation_date));
    }
    output.push_str("\n\n");

    output.push_str("## Detected problems\n\n");
    let buckets = group_events(&result.detected_events);
    if buckets.is_empty() {
        output.push_str("No problems detected.\n");
    }
    for bucket in &buckets {
        let stamps = bucket
            .timestamps
            .iter()
            .map(|s| format_timestamp(*s))
            .collect::<Vec<_>>()
            .join(", ");
        output.push_str(&format!(
            "• {} (×{}) — {} [{}]\n",
            bucket.name, bucket.count, bucket.description, stamps
        ));
    }
    output.push('\n');

    if !result.keywords.is_empty() {
        output.push_str("## Keywords\n\n");
        output.push_str(&result.keywords.join(", "));
        output.push_str("\n\n");
    }

    if !result.target_audience.is_empty() {
        output.push_str("## Target audience\n\n");
        output.push_str(&result.target_audience);
        output.push_str("\n\n");
    }

    if !result.named_entities.is_empty() {
        output.push_str("## Named entities\n\n");
        output.push_str(&result.named_entities.join(", "));
        output.push_str("\n\n");
    }

    if !result.questions.is_empty() {
        output.push_str("## Audience questions\n\n");
        for question in &result.questions {
            output.push_str(&format!("• {}\n", question));
        }
        output.push('\n');
    }

    if !result.suggestions.is_empty() {
        output.push_str("## Suggestions\n\n");
        for (i, suggestion) in result.suggestions.iter().enumerate() {
            output.push_str(&format!("{}. {}\n", i + 1, suggestion));
        }
        output.push('\n');
    }

    if !result.transcription.is_empty() {
        output.push_str("## Transcription\n\n");
        for sentence in &result.transcription {
            output.push_str(&format!(
                "[{}] {}\n",
                format_timestamp(sentence.sentence_start),
                sentence.sentence.trim()
            ));
        }
        output.push('\n');
    }

    output
}
