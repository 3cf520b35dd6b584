//! Getting rendered files onto disk without exposing half a rebuild.
//!
//! Pages are written into a hidden staging directory next to the output
//! directory. Only when every page is on disk does the staging directory
//! replace the output directory:
//!
//! ```text
//! pages/                 (live, previous rebuild)
//! .pages-staging-Xa9f/   (this rebuild, being written)
//!
//! commit:  pages/               → .pages-retired/
//!          .pages-staging-Xa9f/ → pages/
//!          .pages-retired/      → deleted
//! ```
//!
//! A rebuild that fails before commit drops its staging directory and the
//! previous pages stay live. Pages left over from a larger catalog vanish
//! with the retired directory. The output directory is owned by the
//! generator: anything else placed in it is removed on the next commit.
//!
//! Single files outside the output directory (the entry document) go
//! through [`write_atomic`]: a temp file in the same directory, renamed over
//! the target.

use log::warn;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempDir};

/// A directory collecting one rebuild's pages.
#[derive(Debug)]
pub struct StagingDir {
    dir: TempDir,
    target: PathBuf,
}

fn parent_of(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string())
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}

impl StagingDir {
    /// Create a staging directory beside `target`, creating `target`'s
    /// parent if needed.
    pub fn create(target: &Path) -> io::Result<Self> {
        let parent = parent_of(target);
        fs::create_dir_all(parent)?;
        let dir = tempfile::Builder::new()
            .prefix(&format!(".{}-staging-", dir_name(target)))
            .tempdir_in(parent)?;
        set_mode(dir.path(), 0o755)?;
        Ok(Self {
            dir,
            target: target.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write one file into the staging directory. Returns the path it will
    /// have once committed.
    pub fn write(&self, file_name: &str, contents: &str) -> io::Result<PathBuf> {
        fs::write(self.dir.path().join(file_name), contents)?;
        Ok(self.target.join(file_name))
    }

    /// Swap the staging directory in place of the target directory.
    pub fn commit(self) -> io::Result<()> {
        let retired = parent_of(&self.target).join(format!(".{}-retired", dir_name(&self.target)));
        if retired.exists() {
            fs::remove_dir_all(&retired)?;
        }

        let had_previous = self.target.exists();
        if had_previous {
            fs::rename(&self.target, &retired)?;
        }

        let staged = self.dir.keep();
        if let Err(err) = fs::rename(&staged, &self.target) {
            if had_previous {
                if let Err(restore) = fs::rename(&retired, &self.target) {
                    warn!(
                        "could not restore {} from {}: {restore}",
                        self.target.display(),
                        retired.display()
                    );
                }
            }
            if let Err(cleanup) = fs::remove_dir_all(&staged) {
                warn!("could not remove {}: {cleanup}", staged.display());
            }
            return Err(err);
        }

        if had_previous {
            fs::remove_dir_all(&retired)?;
        }
        Ok(())
    }
}

/// Replace `path` with `contents` in one rename. Creates the parent
/// directory if needed.
pub fn write_atomic(path: &Path, contents: &str) -> io::Result<()> {
    let parent = parent_of(path);
    fs::create_dir_all(parent)?;
    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(contents.as_bytes())?;
    tmp.as_file().sync_all()?;
    set_mode(tmp.path(), 0o644)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
