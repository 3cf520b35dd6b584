//! # Bookshelf
//!
//! Renders a JSON catalog of books into numbered static HTML pages using a
//! Jinja-style template, plus a small entry page that sends visitors to the
//! first page. A development server re-renders the site whenever the
//! catalog or the template changes.
//!
//! # Architecture: One Rebuild, Three Phases
//!
//! Every render, whether from `bookshelf render` or from a file change under
//! `bookshelf serve`, runs the same [`rebuild::rebuild`]:
//!
//! ```text
//! 1. Load       meta_data.json + template.html  →  Vec<Book>, PageTemplate
//! 2. Render     books → pages → pairs            →  Vec<RenderedPage>  (in memory)
//! 3. Publish    staged pages/ swapped in          →  pages/ + index.html
//! ```
//!
//! Nothing touches the output directory until every page rendered. A bad
//! template or a broken catalog leaves the previously published site exactly
//! as it was, which matters under `serve` where the next save fixes it.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`catalog`] | Catalog JSON parsing; `Book` with image/document references and pass-through fields |
//! | [`paths`] | Reference normalization: re-rooting against the output dir, idempotent percent-encoding |
//! | [`paginate`] | Splits books into fixed-size pages and each page into pairs |
//! | [`render`] | The user's page template, loaded into minijinja and rendered per page |
//! | [`publish`] | Staged output directory with swap-on-commit, atomic single-file writes |
//! | [`entry`] | The entry document (`index.html`) pointing at the first page, rendered with Maud |
//! | [`rebuild`] | The full load → render → publish cycle and its error taxonomy |
//! | [`watch`] | Change notifications for the catalog and template files |
//! | [`serve`] | Minimal static HTTP server for previewing the output |
//! | [`config`] | Layered configuration: defaults, `bookshelf.toml`, environment, flags |
//! | [`output`] | CLI output formatting for the render and check commands |
//!
//! # Design Decisions
//!
//! ## User Templates Through Minijinja, Entry Page Through Maud
//!
//! Page markup belongs to the user: the template is a file they edit while
//! `serve` is running, so it is loaded at runtime with
//! [minijinja](https://docs.rs/minijinja). Undefined variables are an error
//! when printed, so a typo in the template fails the rebuild instead of
//! silently rendering blanks. The entry page has no user-facing knobs and is
//! built with Maud at compile time.
//!
//! ## References Are Rewritten Relative to the Output
//!
//! Catalog references (`img_src`, `book_path`) are written relative to the
//! catalog file. Pages live somewhere else, so each reference is re-rooted
//! onto the output directory and percent-encoded segment by segment. The
//! encoding is idempotent: a catalog that already holds `%20` stays as is.
//!
//! ## Configuration Layers
//!
//! ```text
//! stock defaults  <  bookshelf.toml  <  .env  <  environment (PAGE_SIZE, ...)  <  flags (--page-size, ...)
//! ```
//!
//! The file layer is merged as TOML ([`config::merge_toml`]); the environment
//! and flag layers come from clap and arrive as [`config::Overrides`].

pub mod catalog;
pub mod config;
pub mod entry;
pub mod output;
pub mod paginate;
pub mod paths;
pub mod publish;
pub mod rebuild;
pub mod render;
pub mod serve;
pub mod watch;

#[cfg(test)]
pub(crate) mod test_helpers;
