//! Configuration loading, layering, and validation.
//!
//! Every option can come from four places. Later layers win:
//!
//! ```text
//! 1. stock defaults           (SiteConfig::default)
//! 2. bookshelf.toml           (optional, next to where you run the tool)
//! 3. environment variables    (TEMPLATE_PATH, PAGE_SIZE, ...)
//! 4. command-line flags       (--template-path, --page-size, ...)
//! ```
//!
//! Layers 3 and 4 are collapsed by clap into one [`Overrides`] value before
//! they reach this module. The result of merging everything is a
//! [`SiteConfig`], which is validated and then resolved into a
//! [`RenderConfig`]: absolute paths, checked numbers, built once at startup
//! and passed by reference to everything else. Nothing below `main` reads
//! the environment.
//!
//! ## Config File
//!
//! ```toml
//! # All options are optional - defaults shown below
//! template_path = "template.html"
//! metadata_path = "media/meta_data.json"
//! output_dir = "pages"
//! page_size = 20
//! server_port = 5500
//! asset_base_path = "../static"
//! stylesheet = "bootstrap.min.css"
//! script = "bootstrap.bundle.min.js"
//! # bootstrap_path = "..."       (full stylesheet URL, overrides the two above)
//! # bootstrap_js_path = "..."    (full script URL)
//!
//! # Full URLs that replace the two joined paths above, e.g. a CDN copy.
//! # bootstrap_path = "https://cdn.jsdelivr.net/npm/bootstrap@5.3.3/dist/css/bootstrap.min.css"
//! # bootstrap_js_path = "https://cdn.jsdelivr.net/npm/bootstrap@5.3.3/dist/js/bootstrap.bundle.min.js"
//! entry_point = true
//! entry_path = "index.html"
//! serve_root = "."
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::render::AssetPaths;
use serde::{Deserialize, Serialize};
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config file read when `--config` is not given. Missing is fine.
pub const DEFAULT_CONFIG_FILE: &str = "bookshelf.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration as written in `bookshelf.toml`.
///
/// Numbers are kept signed so that `page_size = -1` reaches validation and
/// is reported as such instead of as a type error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Page template (minijinja syntax).
    pub template_path: PathBuf,
    /// Catalog JSON file.
    pub metadata_path: PathBuf,
    /// Directory receiving `index<N>.html`.
    pub output_dir: PathBuf,
    /// Books per page.
    pub page_size: i64,
    /// Port of the development server.
    pub server_port: i64,
    /// Base path for shared static assets, as seen from a page.
    pub asset_base_path: String,
    /// Stylesheet file name under `asset_base_path`.
    pub stylesheet: String,
    /// Script file name under `asset_base_path`.
    pub script: String,
    /// Full stylesheet URL; replaces `asset_base_path` + `stylesheet`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bootstrap_path: Option<String>,
    /// Full script URL; replaces `asset_base_path` + `script`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bootstrap_js_path: Option<String>,
    /// Whether to write the entry document.
    pub entry_point: bool,
    /// Location of the entry document.
    pub entry_path: PathBuf,
    /// Directory served by the development server.
    pub serve_root: PathBuf,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            template_path: PathBuf::from("template.html"),
            metadata_path: PathBuf::from("media/meta_data.json"),
            output_dir: PathBuf::from("pages"),
            page_size: 20,
            server_port: 5500,
            asset_base_path: "../static".to_string(),
            stylesheet: "bootstrap.min.css".to_string(),
            script: "bootstrap.bundle.min.js".to_string(),
            bootstrap_path: None,
            bootstrap_js_path: None,
            entry_point: true,
            entry_path: PathBuf::from("index.html"),
            serve_root: PathBuf::from("."),
        }
    }
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size < 1 {
            return Err(ConfigError::Validation(format!(
                "page_size must be a positive integer, got {}",
                self.page_size
            )));
        }
        if !(1..=i64::from(u16::MAX)).contains(&self.server_port) {
            return Err(ConfigError::Validation(format!(
                "server_port must be between 1 and 65535, got {}",
                self.server_port
            )));
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(ConfigError::Validation("output_dir must not be empty".into()));
        }
        if self.entry_point && self.entry_path.as_os_str().is_empty() {
            return Err(ConfigError::Validation("entry_path must not be empty".into()));
        }
        Ok(())
    }

    /// Resolve into the immutable runtime configuration.
    ///
    /// Relative paths are anchored at `base_dir` (the working directory in
    /// normal use).
    pub fn resolve(&self, base_dir: &Path) -> Result<RenderConfig, ConfigError> {
        self.validate()?;
        let anchor = |p: &Path| -> Result<PathBuf, ConfigError> {
            Ok(std::path::absolute(base_dir.join(p))?)
        };

        let output_dir = anchor(&self.output_dir)?;
        let template_path = anchor(&self.template_path)?;
        let metadata_path = anchor(&self.metadata_path)?;
        let serve_root = anchor(&self.serve_root)?;

        // Publishing replaces output_dir wholesale; nothing it needs may live there.
        for (key, path, resolved) in [
            ("template_path", &self.template_path, &template_path),
            ("metadata_path", &self.metadata_path, &metadata_path),
            ("serve_root", &self.serve_root, &serve_root),
        ] {
            if lexically_within(resolved, &output_dir) {
                return Err(ConfigError::Validation(format!(
                    "{key} {} must not be inside output_dir {}",
                    path.display(),
                    self.output_dir.display()
                )));
            }
        }

        let entry_path = if self.entry_point {
            let entry = anchor(&self.entry_path)?;
            if lexically_within(&entry, &output_dir) {
                return Err(ConfigError::Validation(format!(
                    "entry_path {} must not be inside output_dir {}",
                    self.entry_path.display(),
                    self.output_dir.display()
                )));
            }
            Some(entry)
        } else {
            None
        };

        let page_size = usize::try_from(self.page_size)
            .ok()
            .and_then(NonZeroUsize::new)
            .ok_or_else(|| {
                ConfigError::Validation(format!("page_size {} is out of range", self.page_size))
            })?;
        let server_port = u16::try_from(self.server_port).map_err(|_| {
            ConfigError::Validation(format!("server_port {} is out of range", self.server_port))
        })?;

        let mut assets = AssetPaths::new(&self.asset_base_path, &self.stylesheet, &self.script);
        if let Some(url) = &self.bootstrap_path {
            assets.stylesheet = url.clone();
        }
        if let Some(url) = &self.bootstrap_js_path {
            assets.script = url.clone();
        }

        Ok(RenderConfig {
            template_path,
            metadata_path,
            output_dir,
            page_size,
            server_port,
            assets,
            entry_path,
            serve_root,
        })
    }
}

fn lexically_within(path: &Path, dir: &Path) -> bool {
    crate::paths::relative_path(dir, path)
        .split('/')
        .next()
        .is_some_and(|first| first != "..")
}

/// Validated configuration every stage reads from.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    pub template_path: PathBuf,
    pub metadata_path: PathBuf,
    pub output_dir: PathBuf,
    pub page_size: NonZeroUsize,
    pub server_port: u16,
    pub assets: AssetPaths,
    /// `None` when the entry document is disabled.
    pub entry_path: Option<PathBuf>,
    pub serve_root: PathBuf,
}

impl RenderConfig {
    /// Directory holding the catalog file; references inside it are
    /// relative to this.
    pub fn catalog_dir(&self) -> &Path {
        self.metadata_path.parent().unwrap_or(Path::new("/"))
    }
}

/// Values taken from the command line or the environment.
///
/// `None` means "not given"; the field keeps whatever lower layers set.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub template_path: Option<PathBuf>,
    pub metadata_path: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub page_size: Option<i64>,
    pub server_port: Option<i64>,
    pub asset_base_path: Option<String>,
    pub stylesheet: Option<String>,
    pub script: Option<String>,
    pub bootstrap_path: Option<String>,
    pub bootstrap_js_path: Option<String>,
    pub entry_point: Option<bool>,
    pub entry_path: Option<PathBuf>,
    pub serve_root: Option<PathBuf>,
}

fn path_value(path: PathBuf) -> toml::Value {
    toml::Value::String(path.to_string_lossy().into_owned())
}

impl Overrides {
    /// The given values as a TOML table, ready for [`merge_toml`].
    pub fn to_toml(&self) -> toml::Value {
        let mut table = toml::map::Map::new();
        let mut set = |key: &str, value: Option<toml::Value>| {
            if let Some(value) = value {
                table.insert(key.to_string(), value);
            }
        };
        set("template_path", self.template_path.clone().map(path_value));
        set("metadata_path", self.metadata_path.clone().map(path_value));
        set("output_dir", self.output_dir.clone().map(path_value));
        set("page_size", self.page_size.map(toml::Value::Integer));
        set("server_port", self.server_port.map(toml::Value::Integer));
        set("asset_base_path", self.asset_base_path.clone().map(toml::Value::String));
        set("stylesheet", self.stylesheet.clone().map(toml::Value::String));
        set("script", self.script.clone().map(toml::Value::String));
        set("bootstrap_path", self.bootstrap_path.clone().map(toml::Value::String));
        set("bootstrap_js_path", self.bootstrap_js_path.clone().map(toml::Value::String));
        set("entry_point", self.entry_point.map(toml::Value::Boolean));
        set("entry_path", self.entry_path.clone().map(path_value));
        set("serve_root", self.serve_root.clone().map(path_value));
        toml::Value::Table(table)
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// `required = false` turns a missing file into `Ok(None)`; a file that
/// exists but does not parse is always an error.
pub fn load_raw_config(path: &Path, required: bool) -> Result<Option<toml::Value>, ConfigError> {
    if !required && !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Stack stock defaults, an optional file layer, and overrides, then
/// deserialize and validate.
pub fn resolve_config(
    file: Option<toml::Value>,
    overrides: &Overrides,
) -> Result<SiteConfig, ConfigError> {
    let mut merged = stock_defaults_value();
    if let Some(file) = file {
        merged = merge_toml(merged, file);
    }
    merged = merge_toml(merged, overrides.to_toml());
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the full configuration.
///
/// `config_file = None` reads [`DEFAULT_CONFIG_FILE`] if it exists.
pub fn load_config(config_file: Option<&Path>, overrides: &Overrides) -> Result<SiteConfig, ConfigError> {
    let file = match config_file {
        Some(path) => load_raw_config(path, true)?,
        None => load_raw_config(Path::new(DEFAULT_CONFIG_FILE), false)?,
    };
    resolve_config(file, overrides)
}

/// Returns a fully-commented stock `bookshelf.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Bookshelf Configuration
# =======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Every key can also be set through an environment variable (upper-case
# key name, e.g. PAGE_SIZE) or a command-line flag (--page-size). Flags beat
# environment variables, which beat this file.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Inputs
# ---------------------------------------------------------------------------
# Page template, minijinja (Jinja2) syntax.
template_path = "template.html"

# Catalog: a JSON array of books. img_src and book_path inside it are
# relative to this file's directory.
metadata_path = "media/meta_data.json"

# ---------------------------------------------------------------------------
# Output
# ---------------------------------------------------------------------------
# Directory receiving index1.html, index2.html, ...
# The directory is replaced on every rebuild; keep nothing else in it.
output_dir = "pages"

# Books per page. Must be at least 1.
page_size = 20

# Write a top-level document that redirects to the first page.
entry_point = true
entry_path = "index.html"

# ---------------------------------------------------------------------------
# Assets (as seen from a page in output_dir)
# ---------------------------------------------------------------------------
asset_base_path = "../static"
stylesheet = "bootstrap.min.css"
script = "bootstrap.bundle.min.js"

# ---------------------------------------------------------------------------
# Development server
# ---------------------------------------------------------------------------
server_port = 5500
serve_root = "."
"##
}
