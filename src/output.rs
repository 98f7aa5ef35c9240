//! CLI output formatting for the uploader commands.
//!
//! Output is **file-centric**: every line leads with a positional index and
//! the file name the user picked, with outcomes and destinations shown as
//! indented context lines.
//!
//! # Output Format
//!
//! ## Check
//!
//! ```text
//! Intake (limit 150 KB)
//! 001 cover.png (48.2 KB)
//!     accepted
//! 002 banner.png (212.0 KB)
//!     rejected: File size exceeds 150 KB
//! ```
//!
//! ## Crop
//!
//! ```text
//! 001 cover.png
//!     crop: 90x120 at (15, 20)
//!     accepted (12.4 KB)
//!
//! Selection (1 of 1)
//! 001 cover.png → out/001-cover.png (12.4 KB)
//! ```
//!
//! ## Validate game
//!
//! ```text
//! Draft has 2 errors
//!     name: Name is required
//!     releaseDate: Invalid date or format. Should be YYYY-MM-DD
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::imaging::CropRect;
use crate::intake::IntakeError;
use crate::submission::ValidationReport;
use crate::types::CandidateFile;
use std::path::Path;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Human-readable size in KB with one decimal.
fn format_size(bytes: u64) -> String {
    format!("{:.1} KB", bytes as f64 / 1024.0)
}

/// `001 cover.png (48.2 KB)`
fn file_header(index: usize, file: &CandidateFile) -> String {
    format!(
        "{} {} ({})",
        format_index(index),
        file.name,
        format_size(file.size())
    )
}

// ============================================================================
// Check
// ============================================================================

/// Format the intake verdict for each checked file.
pub fn format_check_output(
    limit_kb: u64,
    results: &[(CandidateFile, Result<(), IntakeError>)],
) -> Vec<String> {
    let mut lines = vec![format!("Intake (limit {limit_kb} KB)")];
    for (i, (file, result)) in results.iter().enumerate() {
        lines.push(file_header(i + 1, file));
        match result {
            Ok(()) => lines.push(format!("{}accepted", indent(1))),
            Err(e) => lines.push(format!("{}rejected: {e}", indent(1))),
        }
    }
    lines
}

pub fn print_check_output(limit_kb: u64, results: &[(CandidateFile, Result<(), IntakeError>)]) {
    for line in format_check_output(limit_kb, results) {
        println!("{line}");
    }
}

// ============================================================================
// Crop
// ============================================================================

/// What happened to one file during a crop run.
#[derive(Debug, Clone)]
pub enum CropEvent {
    /// Intake refused the file.
    Rejected { index: usize, name: String, message: String },
    /// The crop was rendered and added to the selection.
    Accepted {
        index: usize,
        name: String,
        rect: CropRect,
        size: u64,
    },
    /// The render failed; the session message is shown.
    Failed {
        index: usize,
        name: String,
        rect: Option<CropRect>,
        message: String,
    },
}

fn format_rect(rect: &CropRect) -> String {
    format!(
        "crop: {}x{} at ({}, {})",
        rect.width, rect.height, rect.x, rect.y
    )
}

pub fn format_crop_event(event: &CropEvent) -> Vec<String> {
    match event {
        CropEvent::Rejected {
            index,
            name,
            message,
        } => vec![
            format!("{} {}", format_index(*index), name),
            format!("{}rejected: {}", indent(1), message),
        ],
        CropEvent::Accepted {
            index,
            name,
            rect,
            size,
        } => vec![
            format!("{} {}", format_index(*index), name),
            format!("{}{}", indent(1), format_rect(rect)),
            format!("{}accepted ({})", indent(1), format_size(*size)),
        ],
        CropEvent::Failed {
            index,
            name,
            rect,
            message,
        } => {
            let mut lines = vec![format!("{} {}", format_index(*index), name)];
            if let Some(rect) = rect {
                lines.push(format!("{}{}", indent(1), format_rect(rect)));
            }
            lines.push(format!("{}{}", indent(1), message));
            lines
        }
    }
}

pub fn print_crop_event(event: &CropEvent) {
    for line in format_crop_event(event) {
        println!("{line}");
    }
}

/// File name a selected image is written under: its 1-based position in the
/// selection, zero-padded, then the original name. Two selected files with
/// the same name therefore never overwrite each other.
pub fn selection_file_name(pos: usize, name: &str) -> String {
    format!("{}-{}", format_index(pos), name)
}

/// Format the final selection and where each file was written.
pub fn format_selection(files: &[CandidateFile], max_count: usize, out_dir: &Path) -> Vec<String> {
    let mut lines = vec![format!("Selection ({} of {})", files.len(), max_count)];
    if files.is_empty() {
        lines.push(format!("{}(empty)", indent(1)));
    }
    for (i, file) in files.iter().enumerate() {
        lines.push(format!(
            "{} {} → {} ({})",
            format_index(i + 1),
            file.name,
            out_dir.join(selection_file_name(i + 1, &file.name)).display(),
            format_size(file.size())
        ));
    }
    lines
}

pub fn print_selection(files: &[CandidateFile], max_count: usize, out_dir: &Path) {
    println!();
    for line in format_selection(files, max_count, out_dir) {
        println!("{line}");
    }
}

// ============================================================================
// Validate game
// ============================================================================

pub fn format_validation_report(report: &ValidationReport) -> Vec<String> {
    if report.is_valid() {
        return vec!["Draft is valid".to_string()];
    }
    let noun = if report.len() == 1 { "error" } else { "errors" };
    let mut lines = vec![format!("Draft has {} {}", report.len(), noun)];
    for (field, message) in report.errors() {
        lines.push(format!("{}{}: {}", indent(1), field, message.trim_end()));
    }
    lines
}

pub fn print_validation_report(report: &ValidationReport) {
    for line in format_validation_report(report) {
        println!("{line}");
    }
}
