//! Record Summarizer
//!
//! Reduces a batch of raw records to a bounded, line-oriented digest that
//! fits inside a prompt. Only analysis-relevant fields are kept; free text is
//! collapsed to one line and truncated on character boundaries.

use crate::config::SummaryConfig;
use crate::models::RawRecord;

/// Digest of an empty batch
pub const EMPTY_DIGEST: &str = "(no records)";

/// Build the digest of `records`.
///
/// One line per record in input order, at most `max_records` lines, followed
/// by a single `… N more records omitted` line when the batch is longer.
pub fn summarize_records(records: &[RawRecord], config: &SummaryConfig) -> String {
    if records.is_empty() {
        return EMPTY_DIGEST.to_string();
    }

    let mut lines: Vec<String> = records
        .iter()
        .take(config.max_records)
        .enumerate()
        .map(|(i, record)| summarize_record(i + 1, record, config.max_field_chars))
        .collect();

    let omitted = records.len().saturating_sub(config.max_records);
    if omitted > 0 {
        lines.push(format!("… {} more records omitted", omitted));
    }

    lines.join("\n")
}

fn summarize_record(index: usize, record: &RawRecord, max_chars: usize) -> String {
    let mut parts = vec![match &record.id {
        Some(id) => format!("#{} id={}", index, clip(id, max_chars)),
        None => format!("#{}", index),
    }];

    if let Some(ts) = &record.timestamp {
        parts.push(ts.to_rfc3339());
    }
    if let Some(direction) = record.direction {
        parts.push(direction.to_string());
    }
    if let Some(duration) = record.duration_minutes.filter(|d| d.is_finite()) {
        parts.push(format!("{} min", format_minutes(duration)));
    }
    if record.follow_up == Some(true) {
        parts.push("follow-up".to_string());
    }

    for (label, value) in [
        ("subject", &record.subject),
        ("summary", &record.summary_text),
        ("location", &record.location),
        ("content", &record.content),
    ] {
        if let Some(text) = value {
            let text = clip(text, max_chars);
            if !text.is_empty() {
                parts.push(format!("{}: {}", label, text));
            }
        }
    }

    parts.join(" | ")
}

/// Collapse whitespace and cut to `max_chars` characters, marking the cut.
fn clip(text: &str, max_chars: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    truncate_chars(&collapsed, max_chars)
}

/// Cut `text` to at most `max_chars` characters; a cut text ends with `…`.
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(1);
    let mut cut: String = text.chars().take(keep).collect();
    cut.push('…');
    cut
}

fn format_minutes(duration: f64) -> String {
    if duration.fract() == 0.0 {
        format!("{:.0}", duration)
    } else {
        format!("{:.1}", duration)
    }
}
