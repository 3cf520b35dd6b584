//! CLI output formatting.
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.
//!
//! ## Render
//!
//! ```text
//! Catalog: 45 books → 3 pages (20 per page)
//! 001 index1.html (20 books)
//! 002 index2.html (20 books)
//! 003 index3.html (5 books)
//!     Output: /site/pages
//! Entry: /site/index.html → pages/index1.html
//! ```
//!
//! Diagnostics (rebuild failures in the watch loop, change notifications)
//! go through `log` instead; this module is only for the summaries a user
//! asked for.

use crate::rebuild::{RebuildReport, RenderedSite};
use crate::watch::ChangeEvent;
use std::num::NonZeroUsize;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

fn catalog_line(book_count: usize, page_count: usize, page_size: NonZeroUsize) -> String {
    format!(
        "Catalog: {} → {} ({} per page)",
        plural(book_count, "book", "books"),
        plural(page_count, "page", "pages"),
        page_size
    )
}

fn page_line(number: usize, file_name: &str, book_count: usize) -> String {
    format!(
        "{} {} ({})",
        format_index(number),
        file_name,
        plural(book_count, "book", "books")
    )
}

/// Summary of a published rebuild.
pub fn format_rebuild_output(report: &RebuildReport, page_size: NonZeroUsize) -> Vec<String> {
    let mut lines = vec![catalog_line(report.book_count, report.pages.len(), page_size)];
    for page in &report.pages {
        let file_name = page
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        lines.push(page_line(page.number, &file_name, page.book_count));
    }
    lines.push(format!("    Output: {}", report.output_dir.display()));
    if let Some((path, target)) = &report.entry {
        lines.push(format!("Entry: {} → {}", path.display(), target.describe()));
    }
    lines
}

pub fn print_rebuild_output(report: &RebuildReport, page_size: NonZeroUsize) {
    for line in format_rebuild_output(report, page_size) {
        println!("{}", line);
    }
}

/// Summary of a `check` run: what would be written.
pub fn format_check_output(site: &RenderedSite, page_size: NonZeroUsize) -> Vec<String> {
    let mut lines = vec![catalog_line(site.book_count, site.total_pages(), page_size)];
    for page in &site.pages {
        lines.push(page_line(page.number, &page.file_name, page.book_count));
    }
    lines
}

pub fn print_check_output(site: &RenderedSite, page_size: NonZeroUsize) {
    for line in format_check_output(site, page_size) {
        println!("{}", line);
    }
}

/// One line per change notification.
pub fn format_change_event(event: &ChangeEvent) -> String {
    let name = event
        .path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| event.path.display().to_string());
    format!("Changed: {name}")
}
