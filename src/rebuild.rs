//! The rebuild: one full, synchronous pass from catalog to pages.
//!
//! ```text
//! Idle → Loading → Normalizing → Paginating → Rendering → Publishing → EntryPoint → Idle
//!   ╰──────────────────────────── any step ──────────────────────────→ Failed
//! ```
//!
//! A rebuild is a function of the current contents of the catalog and
//! template files plus the immutable [`RenderConfig`]. The one-shot `render`
//! command and the `serve` watch loop call exactly the same [`rebuild`].
//!
//! The work is split in two so that `check` can run everything except the
//! writes:
//!
//! - [`render_site`]: load, normalize, paginate, render every page into
//!   memory. Reads files, writes nothing.
//! - [`publish`]: stage the pages, swap them in, write the entry document.
//!
//! Any failure aborts the rebuild. Because pages are staged (see
//! [`crate::publish`]), a failed rebuild leaves the previous output exactly
//! as it was.

use crate::catalog::{self, CatalogError};
use crate::config::RenderConfig;
use crate::entry::{self, EntryTarget};
use crate::paginate::paginate;
use crate::paths::PathRoots;
use crate::publish::StagingDir;
use crate::render::PageTemplate;
use log::debug;
use std::fmt;
use std::fs;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Why an input could not be used.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),
}

impl From<CatalogError> for SourceError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Io(e) => SourceError::Io(e),
            CatalogError::Json(e) => SourceError::Json(e),
        }
    }
}

#[derive(Error, Debug)]
pub enum RebuildError {
    /// Catalog or template missing, unreadable, or unparsable.
    #[error("source unavailable: {}: {source}", path.display())]
    SourceUnavailable { path: PathBuf, source: SourceError },
    /// The template could not be bound to a page's context.
    #[error("failed to render page {page}: {source}")]
    RenderFailure { page: usize, source: minijinja::Error },
    /// Output directory or file could not be written.
    #[error("failed to write {}: {source}", path.display())]
    WriteFailure { path: PathBuf, source: io::Error },
}

/// Rebuild states, logged as the rebuild moves through them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Loading,
    Normalizing,
    Paginating,
    Rendering,
    Publishing,
    EntryPoint,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Loading => "loading",
            Stage::Normalizing => "normalizing",
            Stage::Paginating => "paginating",
            Stage::Rendering => "rendering",
            Stage::Publishing => "publishing",
            Stage::EntryPoint => "entry point",
        };
        f.write_str(name)
    }
}

fn enter(stage: Stage) {
    debug!("rebuild: {stage}");
}

/// One rendered page, not yet on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    pub number: usize,
    pub file_name: String,
    pub book_count: usize,
    pub html: String,
}

/// Every page of one rebuild, in page order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedSite {
    pub book_count: usize,
    pub pages: Vec<RenderedPage>,
}

impl RenderedSite {
    pub fn total_pages(&self) -> usize {
        self.pages.len()
    }
}

/// A page as reported after publishing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSummary {
    pub number: usize,
    pub path: PathBuf,
    pub book_count: usize,
}

/// What a successful rebuild produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebuildReport {
    pub book_count: usize,
    pub output_dir: PathBuf,
    pub pages: Vec<PageSummary>,
    /// Entry document path and its target, when enabled.
    pub entry: Option<(PathBuf, EntryTarget)>,
}

fn template_name(config: &RenderConfig) -> String {
    config
        .template_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "template.html".to_string())
}

/// Load, normalize, paginate, and render every page in memory.
pub fn render_site(config: &RenderConfig) -> Result<RenderedSite, RebuildError> {
    enter(Stage::Loading);
    let mut books = catalog::load_catalog(&config.metadata_path).map_err(|e| {
        RebuildError::SourceUnavailable {
            path: config.metadata_path.clone(),
            source: e.into(),
        }
    })?;
    let template_source = fs::read_to_string(&config.template_path).map_err(|e| {
        RebuildError::SourceUnavailable {
            path: config.template_path.clone(),
            source: e.into(),
        }
    })?;
    let name = template_name(config);
    let template = PageTemplate::new(&name, &template_source).map_err(|e| {
        RebuildError::SourceUnavailable {
            path: config.template_path.clone(),
            source: e.into(),
        }
    })?;
    debug!("loaded {} books", books.len());

    enter(Stage::Normalizing);
    let roots = PathRoots::new(config.catalog_dir(), &config.output_dir);
    for book in &mut books {
        book.normalize(&roots);
    }

    enter(Stage::Paginating);
    let pages = paginate(&books, config.page_size);
    debug!("{} books → {} pages", books.len(), pages.len());

    enter(Stage::Rendering);
    let mut rendered = Vec::with_capacity(pages.len());
    for page in &pages {
        let html = template
            .render(page, &config.assets)
            .map_err(|source| RebuildError::RenderFailure {
                page: page.number,
                source,
            })?;
        rendered.push(RenderedPage {
            number: page.number,
            file_name: page.file_name(),
            book_count: page.item_count(),
            html,
        });
    }

    Ok(RenderedSite {
        book_count: books.len(),
        pages: rendered,
    })
}

/// Write a rendered site: staged pages, swap, then the entry document.
///
/// With the entry document disabled, nothing at any entry path is touched:
/// an `index.html` written by an earlier run stays, since the file may just
/// as well be hand-written.
pub fn publish(site: RenderedSite, config: &RenderConfig) -> Result<RebuildReport, RebuildError> {
    enter(Stage::Publishing);
    let write_failure = |path: PathBuf| move |source: io::Error| RebuildError::WriteFailure { path, source };

    let staging = StagingDir::create(&config.output_dir)
        .map_err(write_failure(config.output_dir.clone()))?;
    let mut pages = Vec::with_capacity(site.pages.len());
    for page in &site.pages {
        let path = staging
            .write(&page.file_name, &page.html)
            .map_err(write_failure(staging.path().join(&page.file_name)))?;
        pages.push(PageSummary {
            number: page.number,
            path,
            book_count: page.book_count,
        });
    }
    staging
        .commit()
        .map_err(write_failure(config.output_dir.clone()))?;

    let entry = match &config.entry_path {
        Some(entry_path) => {
            enter(Stage::EntryPoint);
            let target = entry::write_entry(entry_path, &config.output_dir, site.total_pages())
                .map_err(write_failure(entry_path.clone()))?;
            Some((entry_path.clone(), target))
        }
        None => None,
    };

    Ok(RebuildReport {
        book_count: site.book_count,
        output_dir: config.output_dir.clone(),
        pages,
        entry,
    })
}

/// Render everything from scratch and publish it.
pub fn rebuild(config: &RenderConfig) -> Result<RebuildReport, RebuildError> {
    let site = render_site(config)?;
    publish(site, config)
}
