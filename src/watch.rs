//! Watching the catalog and template for changes.
//!
//! The watcher does not call into the rebuild. It turns filesystem
//! notifications into [`ChangeEvent`] messages on a channel; whoever owns
//! the receiving end decides what to do with them (the `serve` command
//! rebuilds once per message).
//!
//! ## What Counts as a Change
//!
//! Editors rarely modify a file in place. Many write a temp file and rename
//! it over the original, which removes the inode being watched. So the
//! watcher watches the *parent directories* non-recursively and filters
//! events down to the watched file names.
//!
//! Saving one file usually produces a burst of events (truncate, write,
//! metadata). Events are debounced on the trailing edge: a file's message
//! is sent once it has been quiet for [`DEBOUNCE`], so the rebuild reads
//! the file after the last write of the burst, not after the first.

use notify::{RecommendedWatcher, RecursiveMode};
use notify_debouncer_mini::{DebounceEventResult, Debouncer, new_debouncer};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;
use thiserror::Error;

/// Quiet period after the last event for a file before it is reported.
pub const DEBOUNCE: Duration = Duration::from_millis(100);

#[derive(Error, Debug)]
pub enum WatchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("watch error: {0}")]
    Notify(#[from] notify::Error),
}

/// A watched file changed on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub path: PathBuf,
}

/// Keeps the underlying OS watcher alive. Dropping it stops the events.
pub struct ChangeWatcher {
    _debouncer: Debouncer<RecommendedWatcher>,
}

/// Absolute form of `path` with its directory canonicalized, so it compares
/// equal to the paths notify reports.
fn watch_key(path: &Path) -> std::io::Result<PathBuf> {
    let absolute = std::path::absolute(path)?;
    let dir = absolute.parent().unwrap_or(Path::new("/"));
    let dir = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
    Ok(match absolute.file_name() {
        Some(name) => dir.join(name),
        None => dir,
    })
}

/// Turns debounced batches into one [`ChangeEvent`] per watched file.
struct Forwarder {
    targets: Vec<PathBuf>,
    tx: Sender<ChangeEvent>,
}

impl Forwarder {
    fn handle<'a>(&self, paths: impl IntoIterator<Item = &'a Path>) {
        let mut changed: Vec<&PathBuf> = Vec::new();
        for path in paths {
            if let Some(target) = self.targets.iter().find(|t| t.as_path() == path) {
                if !changed.contains(&target) {
                    changed.push(target);
                }
            }
        }
        for target in changed {
            let _ = self.tx.send(ChangeEvent {
                path: target.clone(),
            });
        }
    }
}

/// Start watching `files`. Returns the watcher guard and the receiving end
/// of the event channel.
pub fn watch(files: &[PathBuf]) -> Result<(ChangeWatcher, Receiver<ChangeEvent>), WatchError> {
    let targets = files
        .iter()
        .map(|f| watch_key(f))
        .collect::<Result<Vec<_>, _>>()?;
    let (tx, rx) = mpsc::channel();

    let forwarder = Forwarder {
        targets: targets.clone(),
        tx,
    };
    let mut debouncer = new_debouncer(DEBOUNCE, move |res: DebounceEventResult| match res {
        Ok(events) => forwarder.handle(events.iter().map(|e| e.path.as_path())),
        Err(err) => log::warn!("watch error: {err:?}"),
    })?;

    let mut dirs: Vec<&Path> = targets.iter().filter_map(|t| t.parent()).collect();
    dirs.sort();
    dirs.dedup();
    for dir in dirs {
        debouncer.watcher().watch(dir, RecursiveMode::NonRecursive)?;
        log::debug!("watching {}", dir.display());
    }

    Ok((
        ChangeWatcher {
            _debouncer: debouncer,
        },
        rx,
    ))
}
