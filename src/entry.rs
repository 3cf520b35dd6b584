//! The top-level entry document.
//!
//! Pages live in their own directory (`pages/` by default), so the site root
//! gets a small `index.html` that forwards visitors to the first page. It is
//! generated with [maud](https://maud.lambda.xyz/) rather than the user
//! template, since there is nothing in it to customize.
//!
//! ## Targets
//!
//! - Catalog with pages: `<meta http-equiv="refresh">` plus a plain link to
//!   `index1.html`, expressed relative to the entry file's directory.
//! - Empty catalog: there is no first page, so the entry document is its own
//!   target. It carries no redirect and says the catalog is empty.
//!
//! Some deployments advertise `pages/index1.html` directly; they turn the
//! entry document off (`entry_point = false`) and nothing is written here.

use crate::paginate::PageRef;
use crate::paths::{relative_path, url_path};
use crate::publish::write_atomic;
use maud::{DOCTYPE, Markup, html};
use std::io;
use std::path::Path;

/// Where the entry document sends visitors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryTarget {
    /// URL of the first page, relative to the entry document.
    FirstPage(String),
    /// No pages; the entry document is the target.
    Empty,
}

impl EntryTarget {
    /// Resolve the target for an entry file at `entry_path` pointing into
    /// `output_dir`. Both paths must be absolute.
    pub fn resolve(entry_path: &Path, output_dir: &Path, total_pages: usize) -> Self {
        if total_pages == 0 {
            return EntryTarget::Empty;
        }
        let first = output_dir.join(PageRef::new(1).file_name());
        let entry_dir = entry_path.parent().unwrap_or(Path::new("/"));
        EntryTarget::FirstPage(url_path(&relative_path(entry_dir, &first)))
    }

    /// Human-readable form for console output.
    pub fn describe(&self) -> &str {
        match self {
            EntryTarget::FirstPage(href) => href,
            EntryTarget::Empty => "(empty catalog)",
        }
    }
}

/// Render the entry document.
pub fn render_entry(target: &EntryTarget) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                @if let EntryTarget::FirstPage(href) = target {
                    meta http-equiv="refresh" content={ "0; url=" (href) };
                }
                title { "Library" }
            }
            body {
                @match target {
                    EntryTarget::FirstPage(href) => {
                        p { a href=(href) { "Go to the library" } }
                    }
                    EntryTarget::Empty => {
                        p.empty-catalog { "The library has no books yet." }
                    }
                }
            }
        }
    }
}

/// Write the entry document atomically and return its target.
pub fn write_entry(entry_path: &Path, output_dir: &Path, total_pages: usize) -> io::Result<EntryTarget> {
    let target = EntryTarget::resolve(entry_path, output_dir, total_pages);
    write_atomic(entry_path, &render_entry(&target).into_string())?;
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn target_is_first_page_relative_to_entry() {
        let target = EntryTarget::resolve(
            &PathBuf::from("/site/index.html"),
            &PathBuf::from("/site/pages"),
            3,
        );
        assert_eq!(target, EntryTarget::FirstPage("pages/index1.html".into()));
    }

    #[test]
    fn target_is_encoded() {
        let target = EntryTarget::resolve(
            &PathBuf::from("/site/index.html"),
            &PathBuf::from("/site/my pages"),
            1,
        );
        assert_eq!(target, EntryTarget::FirstPage("my%20pages/index1.html".into()));
    }

    #[test]
    fn target_for_empty_catalog() {
        let target = EntryTarget::resolve(
            &PathBuf::from("/site/index.html"),
            &PathBuf::from("/site/pages"),
            0,
        );
        assert_eq!(target, EntryTarget::Empty);
    }

    #[test]
    fn redirect_document_has_refresh_and_link() {
        let html = render_entry(&EntryTarget::FirstPage("pages/index1.html".into())).into_string();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains(r#"http-equiv="refresh""#));
        assert!(html.contains("0; url=pages/index1.html"));
        assert!(html.contains(r#"href="pages/index1.html""#));
    }

    #[test]
    fn empty_document_has_no_redirect() {
        let html = render_entry(&EntryTarget::Empty).into_string();
        assert!(!html.contains("refresh"));
        assert!(html.contains("empty-catalog"));
    }

    #[test]
    fn write_entry_writes_file() {
        let tmp = TempDir::new().unwrap();
        let entry = tmp.path().join("index.html");
        let target = write_entry(&entry, &tmp.path().join("pages"), 2).unwrap();
        assert_eq!(target, EntryTarget::FirstPage("pages/index1.html".into()));
        let html = fs::read_to_string(&entry).unwrap();
        assert!(html.contains("pages/index1.html"));
    }
}
