use bookshelf::{config, output, rebuild, serve, watch};
use clap::{Parser, Subcommand};
use log::{error, info};
use std::path::PathBuf;

/// Options shared by every command. Each falls back to an environment
/// variable (a `.env` file in the working directory counts), then to
/// `bookshelf.toml`, then to the stock default.
#[derive(clap::Args, Clone, Debug)]
struct SiteArgs {
    /// Config file [default: bookshelf.toml, if present]
    #[arg(long, env = "BOOKSHELF_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Jinja template rendered once per page
    #[arg(long, env = "TEMPLATE_PATH", global = true)]
    template_path: Option<PathBuf>,

    /// JSON catalog of books
    #[arg(long, env = "METADATA_PATH", global = true)]
    metadata_path: Option<PathBuf>,

    /// Directory the numbered pages are written to
    #[arg(long, env = "OUTPUT_DIR", global = true)]
    output_dir: Option<PathBuf>,

    /// Books per page
    #[arg(long, env = "PAGE_SIZE", global = true, allow_negative_numbers = true)]
    page_size: Option<i64>,

    /// Port for `serve`
    #[arg(long, env = "SERVER_PORT", global = true)]
    server_port: Option<i64>,

    /// Base URL of static assets, as seen from a page
    #[arg(long, env = "ASSET_BASE_PATH", global = true)]
    asset_base_path: Option<String>,

    /// Stylesheet file name under the asset base path
    #[arg(long, env = "STYLESHEET", global = true)]
    stylesheet: Option<String>,

    /// Script file name under the asset base path
    #[arg(long, env = "SCRIPT", global = true)]
    script: Option<String>,

    /// Full stylesheet URL, replacing asset base path + stylesheet
    #[arg(long, env = "BOOTSTRAP_PATH", global = true)]
    bootstrap_path: Option<String>,

    /// Full script URL, replacing asset base path + script
    #[arg(long, env = "BOOTSTRAP_JS_PATH", global = true)]
    bootstrap_js_path: Option<String>,

    /// Do not write the entry document
    #[arg(long, global = true)]
    no_entry_point: bool,

    /// Write the entry document (true/false)
    #[arg(
        long,
        env = "ENTRY_POINT",
        global = true,
        hide = true,
        value_parser = clap::builder::BoolishValueParser::new()
    )]
    entry_point: Option<bool>,

    /// Where the entry document is written
    #[arg(long, env = "ENTRY_PATH", global = true)]
    entry_path: Option<PathBuf>,

    /// Directory served by `serve`
    #[arg(long, env = "SERVE_ROOT", global = true)]
    serve_root: Option<PathBuf>,
}

impl SiteArgs {
    fn overrides(&self) -> config::Overrides {
        config::Overrides {
            template_path: self.template_path.clone(),
            metadata_path: self.metadata_path.clone(),
            output_dir: self.output_dir.clone(),
            page_size: self.page_size,
            server_port: self.server_port,
            asset_base_path: self.asset_base_path.clone(),
            stylesheet: self.stylesheet.clone(),
            script: self.script.clone(),
            bootstrap_path: self.bootstrap_path.clone(),
            bootstrap_js_path: self.bootstrap_js_path.clone(),
            entry_point: if self.no_entry_point {
                Some(false)
            } else {
                self.entry_point
            },
            entry_path: self.entry_path.clone(),
            serve_root: self.serve_root.clone(),
        }
    }
}

#[derive(Parser)]
#[command(name = "bookshelf")]
#[command(about = "Render a JSON book catalog into paginated static HTML")]
#[command(long_about = "\
Render a JSON book catalog into paginated static HTML

The catalog is a JSON array of book objects. `img_src` and `book_path`
are paths relative to the catalog file; every other field is passed to the
template as is.

Site layout (defaults):

  ./
  ├── bookshelf.toml               # Optional config
  ├── template.html                # Jinja template, rendered once per page
  ├── media/
  │   ├── meta_data.json           # The catalog
  │   ├── covers/…                 # Referenced by img_src
  │   └── books/…                  # Referenced by book_path
  ├── pages/                       # Output: index1.html, index2.html, …
  └── index.html                   # Output: redirects to pages/index1.html

Template variables:
  books_pairs                      Books on this page, in pairs
  current_page, total_pages        1-based page number and page count
  prev_page, next_page             Neighbouring page file names, or none
  asset_base_path                  Base URL of static assets
  bootstrap_path, bootstrap_js_path  Stylesheet and script URLs

Settings resolve as: flag > environment variable > .env > bookshelf.toml > default.
Run 'bookshelf gen-config' to generate a documented bookshelf.toml.
Set RUST_LOG=debug to trace each rebuild.")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    site: SiteArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render all pages and the entry document once
    Render,
    /// Render, then serve the site and re-render on every change
    Serve,
    /// Load and render everything in memory without writing
    Check,
    /// Print a stock bookshelf.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Variables already set in the environment win over .env.
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match cli.command {
        Command::Render => {
            let render_config = resolve_config(&cli.site)?;
            let report = rebuild::rebuild(&render_config)?;
            output::print_rebuild_output(&report, render_config.page_size);
        }
        Command::Serve => {
            let render_config = resolve_config(&cli.site)?;
            run_server(&render_config)?;
        }
        Command::Check => {
            let render_config = resolve_config(&cli.site)?;
            let site = rebuild::render_site(&render_config)?;
            output::print_check_output(&site, render_config.page_size);
            println!("==> Catalog and template are valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Layer the config file, environment, and flags, anchored at the working
/// directory.
fn resolve_config(site: &SiteArgs) -> Result<config::RenderConfig, Box<dyn std::error::Error>> {
    let site_config = config::load_config(site.config.as_deref(), &site.overrides())?;
    Ok(site_config.resolve(&std::env::current_dir()?)?)
}

/// Initial render, then serve and rebuild on each change until killed.
///
/// A failed rebuild is logged and the previous output keeps being served.
fn run_server(render_config: &config::RenderConfig) -> Result<(), Box<dyn std::error::Error>> {
    match rebuild::rebuild(render_config) {
        Ok(report) => output::print_rebuild_output(&report, render_config.page_size),
        Err(err) => error!("initial render failed: {err}"),
    }

    let (addr, _server) = serve::spawn(render_config.server_port, render_config.serve_root.clone())?;
    info!(
        "serving {} at http://{addr}/",
        render_config.serve_root.display()
    );

    let watched = [
        render_config.template_path.clone(),
        render_config.metadata_path.clone(),
    ];
    let (_watcher, events) = watch::watch(&watched)?;
    info!("watching {} and {}", watched[0].display(), watched[1].display());

    rebuild_on_changes(render_config, events)
}

/// Rebuild once per change event. The channel only closes when the watcher
/// is gone, so running out of events is an error.
fn rebuild_on_changes(
    render_config: &config::RenderConfig,
    events: impl IntoIterator<Item = watch::ChangeEvent>,
) -> Result<(), Box<dyn std::error::Error>> {
    for event in events {
        info!("{}", output::format_change_event(&event));
        match rebuild::rebuild(render_config) {
            Ok(report) => info!(
                "rebuilt {} books into {} pages",
                report.book_count,
                report.pages.len()
            ),
            Err(err) => error!("rebuild failed: {err}"),
        }
    }
    Err("file watcher stopped; no further changes will be picked up".into())
}
