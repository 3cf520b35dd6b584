//! Shared test utilities for the bookshelf test suite.
//!
//! Provides catalog builders and a throwaway site directory wired to a
//! resolved [`RenderConfig`], so rebuild tests read like the scenario they
//! check.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let site = TestSite::new(45);
//! rebuild(&site.config).unwrap();
//! assert_eq!(site.page_files(), vec!["index1.html", "index2.html", "index3.html"]);
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::catalog::{Book, parse_catalog};
use crate::config::{RenderConfig, SiteConfig};

/// The template under `fixtures/site/`.
pub const FIXTURE_TEMPLATE: &str = include_str!("../fixtures/site/template.html");

// =========================================================================
// Catalog builders
// =========================================================================

/// Catalog JSON with `n` books titled `Book 1` .. `Book n`.
pub fn catalog_json(n: usize) -> String {
    let books: Vec<serde_json::Value> = (1..=n)
        .map(|i| {
            serde_json::json!({
                "title": format!("Book {i}"),
                "author": format!("Author {i}"),
                "img_src": format!("images/book {i}.jpg"),
                "book_path": format!("books/Book {i}.txt"),
            })
        })
        .collect();
    serde_json::to_string_pretty(&books).unwrap()
}

/// `n` parsed books, as in [`catalog_json`].
pub fn books(n: usize) -> Vec<Book> {
    parse_catalog(&catalog_json(n)).unwrap()
}

pub fn page_size(n: usize) -> NonZeroUsize {
    NonZeroUsize::new(n).expect("page size must be positive")
}

// =========================================================================
// Site fixture
// =========================================================================

/// A temp directory laid out like a real site:
///
/// ```text
/// <tmp>/
/// ├── template.html
/// ├── media/meta_data.json
/// ├── pages/            (after a rebuild)
/// └── index.html        (after a rebuild)
/// ```
pub struct TestSite {
    tmp: TempDir,
    pub config: RenderConfig,
}

impl TestSite {
    /// Site with `n` generated books and default settings.
    pub fn new(n: usize) -> Self {
        Self::with_catalog(&catalog_json(n))
    }

    /// Site with the given catalog JSON, verbatim.
    pub fn with_catalog(json: &str) -> Self {
        let tmp = TempDir::new().unwrap();
        let config = SiteConfig::default().resolve(tmp.path()).unwrap();
        let site = Self { tmp, config };
        site.write_catalog(json);
        site.write_template(FIXTURE_TEMPLATE);
        site
    }

    pub fn root(&self) -> &Path {
        self.tmp.path()
    }

    pub fn write_catalog(&self, json: &str) {
        let path = &self.config.metadata_path;
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, json).unwrap();
    }

    pub fn write_template(&self, source: &str) {
        fs::write(&self.config.template_path, source).unwrap();
    }

    /// Names of the files in the output directory, sorted. Empty when the
    /// directory does not exist.
    pub fn page_files(&self) -> Vec<String> {
        let Ok(entries) = fs::read_dir(&self.config.output_dir) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    pub fn read_page(&self, number: usize) -> String {
        let path = self.config.output_dir.join(format!("index{number}.html"));
        fs::read_to_string(&path).unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()))
    }

    pub fn read_entry(&self) -> String {
        let path = self.config.entry_path.as_ref().expect("entry point disabled");
        fs::read_to_string(path).unwrap()
    }

    /// Every output file (pages and entry) with its bytes.
    pub fn snapshot(&self) -> BTreeMap<PathBuf, Vec<u8>> {
        let mut files = BTreeMap::new();
        if let Ok(entries) = fs::read_dir(&self.config.output_dir) {
            for entry in entries {
                let path = entry.unwrap().path();
                files.insert(path.clone(), fs::read(&path).unwrap());
            }
        }
        if let Some(entry) = self.config.entry_path.as_ref().filter(|p| p.exists()) {
            files.insert(entry.clone(), fs::read(entry).unwrap());
        }
        files
    }
}
