//! Prometheus text exposition as accepted by `/api/v1/import/prometheus`.
//!
//! Every sample line carries an explicit millisecond timestamp and, when present, a trailing
//! exemplar comment: `name{label="v"} value timestamp # run_id="123"`.

use super::{Exemplar, MetricFamily, MetricSample};
use core::fmt::Write;
use std::collections::BTreeSet;

/// Encode samples as exposition text, with `# HELP`/`# TYPE` emitted once per family.
#[must_use]
pub fn encode(samples: &[MetricSample]) -> String {
    let mut out = String::new();
    let mut described: BTreeSet<MetricFamily> = BTreeSet::new();

    for sample in samples {
        let mut raw = String::new();
        let name = sample.name();

        if described.insert(sample.family()) {
            let _ = writeln!(raw, "# HELP {name} {}", sample.family().help());
            let _ = writeln!(raw, "# TYPE {name} gauge");
        }

        let labels = format_pairs(sample.labels().iter());
        if labels.is_empty() {
            let _ = writeln!(raw, "{name} {}", format_value(sample.value()));
        } else {
            let _ = writeln!(raw, "{name}{{{labels}}} {}", format_value(sample.value()));
        }

        out.push_str(&annotate(&raw, sample.timestamp_millis(), sample.exemplar()));
    }

    out
}

/// Append a timestamp and optional exemplar comment to every sample line of `raw`.
///
/// Comment lines (starting with `#`) and blank lines pass through unchanged.
#[must_use]
pub fn annotate(raw: &str, timestamp_millis: i64, exemplar: Option<&Exemplar>) -> String {
    let exemplar = exemplar.filter(|e| !e.is_empty()).map(|e| format_pairs(e.iter()));

    let mut out = String::with_capacity(raw.len() + 64);
    for line in raw.lines() {
        if line.starts_with('#') || line.trim().is_empty() {
            out.push_str(line);
        } else {
            let _ = write!(out, "{line} {timestamp_millis}");
            if let Some(exemplar) = &exemplar {
                let _ = write!(out, " # {exemplar}");
            }
        }
        out.push('\n');
    }

    out
}

/// Render `k="v"` pairs joined by commas
fn format_pairs<'k, 'v>(pairs: impl Iterator<Item = (&'k str, &'v str)>) -> String {
    let mut out = String::new();
    for (i, (key, value)) in pairs.enumerate() {
        if i > 0 {
            out.push(',');
        }
        let _ = write!(out, "{key}=\"{}\"", escape_label_value(value));
    }
    out
}

fn escape_label_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str(r"\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str(r"\n"),
            c => out.push(c),
        }
    }
    out
}

fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value == f64::INFINITY {
        "+Inf".to_string()
    } else if value == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else {
        value.to_string()
    }
}
