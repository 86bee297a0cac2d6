//! CLI output formatting for batch runs.
//!
//! Each input leads with its positional index and file name; what happened to
//! it follows as indented context lines. The full source path is shown once,
//! as a `Source:` line, so the output reads as a list of images first and a
//! list of files second.
//!
//! # Output Format
//!
//! ## Palette
//!
//! ```text
//! 001 selfie.jpg
//!     Source: shots/selfie.jpg
//!     #1f1a24   41.7%  ########
//!     #d94f7a   22.0%  ####
//!     #f2e6d9   18.3%  ####
//! ```
//!
//! ## Boost
//!
//! ```text
//! 001 selfie.jpg → out/selfie-y2k.png (Y2K Film Mode)
//!     Source: shots/selfie.jpg
//! 002 notes.png
//!     Source: shots/notes.png
//!     Error: Failed to decode image: ...
//!
//! 1 image processed, 1 failed
//! ```
//!
//! # Architecture
//!
//! Every event has a `format_*` function returning `Vec<String>` for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::batch::{BatchEvent, BatchSummary};
use crate::imaging::ColorSwatch;
use std::path::Path;

/// Width of a 100% swatch bar in characters.
const BAR_WIDTH: usize = 20;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// `#rrggbb  pp.p%  ####`, bar length proportional to the percentage.
fn swatch_line(swatch: &ColorSwatch) -> String {
    let cells = ((swatch.percentage / 100.0) * BAR_WIDTH as f64).round() as usize;
    let bar = "#".repeat(cells.min(BAR_WIDTH));
    format!("{}  {:>5.1}%  {}", swatch.hex, swatch.percentage, bar)
        .trim_end()
        .to_string()
}

/// Format one batch event at 1-based position `index`.
pub fn format_batch_event(index: usize, event: &BatchEvent) -> Vec<String> {
    let source = event.source();
    let header = format!("{} {}", format_index(index), file_name(source));
    let source_line = format!("{}Source: {}", indent(1), source.display());

    match event {
        BatchEvent::Analyzed { palette, .. } => {
            let mut lines = vec![header, source_line];
            lines.extend(
                palette
                    .iter()
                    .map(|swatch| format!("{}{}", indent(1), swatch_line(swatch))),
            );
            lines
        }
        BatchEvent::Boosted { output, filter, .. } => vec![
            format!("{} → {} ({})", header, output.display(), filter),
            source_line,
        ],
        BatchEvent::Failed { error, .. } => {
            vec![header, source_line, format!("{}Error: {}", indent(1), error)]
        }
    }
}

/// `3 images processed` or `2 images processed, 1 failed`.
pub fn format_summary(summary: &BatchSummary) -> String {
    let noun = if summary.succeeded == 1 { "image" } else { "images" };
    let mut line = format!("{} {} processed", summary.succeeded, noun);
    if summary.failed > 0 {
        line.push_str(&format!(", {} failed", summary.failed));
    }
    line
}

/// Format all events in order, followed by a blank line and the summary.
pub fn format_batch(events: &[BatchEvent]) -> Vec<String> {
    let mut lines: Vec<String> = events
        .iter()
        .enumerate()
        .flat_map(|(i, event)| format_batch_event(i + 1, event))
        .collect();
    if !lines.is_empty() {
        lines.push(String::new());
    }
    lines.push(format_summary(&BatchSummary::from_events(events)));
    lines
}

pub fn print_batch(events: &[BatchEvent]) {
    for line in format_batch(events) {
        println!("{}", line);
    }
}
