//! The book catalog: record type, loading, reference normalization.
//!
//! The catalog is a JSON array of objects, usually `media/meta_data.json`:
//!
//! ```json
//! [
//!   {
//!     "title": "Dune",
//!     "author": "Frank Herbert",
//!     "img_src": "images/dune.jpg",
//!     "book_path": "books/Sci Fi/Dune.txt",
//!     "genres": ["Science fiction"]
//!   }
//! ]
//! ```
//!
//! Only `img_src` and `book_path` are interpreted. Every other field is
//! carried through to the template untouched and in file order, so templates
//! can use whatever the catalog author put there.

use crate::paths::{PathRoots, normalize_reference};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One catalog record.
///
/// A book has no identity beyond its position in the catalog; two rebuilds
/// read two independent sets of values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Book {
    /// Cover image reference. Absent stays absent in the output.
    #[serde(rename = "img_src", default, skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
    /// Book file reference, may contain subdirectories.
    #[serde(rename = "book_path", default, skip_serializing_if = "Option::is_none")]
    pub document_ref: Option<String>,
    /// Every other field, in catalog order.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Book {
    /// Rewrite both references through the rooting policy. Missing
    /// references are skipped.
    pub fn normalize(&mut self, roots: &PathRoots) {
        for reference in [&mut self.image_ref, &mut self.document_ref]
            .into_iter()
            .flatten()
        {
            *reference = normalize_reference(reference, roots);
        }
    }

    /// Convenience accessor for string fields such as `title`.
    pub fn field_str(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }
}

/// Parse catalog JSON.
pub fn parse_catalog(json: &str) -> Result<Vec<Book>, CatalogError> {
    Ok(serde_json::from_str(json)?)
}

/// Read and parse the catalog file in full.
pub fn load_catalog(path: &Path) -> Result<Vec<Book>, CatalogError> {
    let content = fs::read_to_string(path)?;
    parse_catalog(&content)
}
