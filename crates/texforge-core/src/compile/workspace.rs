//! Per-request compilation workspaces.
//!
//! Every compilation gets a uniquely-named directory under the spool
//! dir, exclusively owned for the duration of one request. Nothing is
//! shared between requests, so no locking is needed anywhere in the
//! pipeline.

use std::fs;
use std::path::{Component, Path, PathBuf};
use std::time::{Duration, SystemTime};

use uuid::Uuid;

use crate::error::{Error, Result};

/// Maximum directory depth below the workspace root an entry filename
/// may use (one subdirectory level, e.g. `chapters/intro.tex`).
const MAX_ENTRY_DEPTH: usize = 2;

/// Allocates and sweeps workspaces under a spool directory.
#[derive(Debug, Clone)]
pub struct WorkspaceManager {
    spool_dir: PathBuf,
}

impl WorkspaceManager {
    /// Create a manager rooted at `spool_dir`, creating it if needed.
    pub fn new(spool_dir: impl Into<PathBuf>) -> Result<Self> {
        let spool_dir = spool_dir.into();
        fs::create_dir_all(&spool_dir).map_err(|e| Error::Resource {
            path: spool_dir.clone(),
            message: format!("failed to create spool directory: {}", e),
        })?;
        Ok(Self { spool_dir })
    }

    /// Allocate a fresh, empty workspace.
    pub fn create(&self) -> Result<Workspace> {
        let root = self
            .spool_dir
            .join(format!("compile_{}", Uuid::new_v4().simple()));
        fs::create_dir(&root).map_err(|e| Error::Resource {
            path: root.clone(),
            message: format!("failed to allocate workspace: {}", e),
        })?;

        tracing::debug!(workspace = %root.display(), "allocated workspace");
        Ok(Workspace { root })
    }

    /// Remove orphaned workspaces older than `max_age`.
    ///
    /// Catches workspaces leaked by a crash before their dispose ran.
    /// Returns the number of directories removed.
    pub fn sweep_orphans(&self, max_age: Duration) -> Result<usize> {
        let now = SystemTime::now();
        let mut removed = 0;

        for dent in fs::read_dir(&self.spool_dir)? {
            let dent = dent?;
            let path = dent.path();
            if !path.is_dir() {
                continue;
            }

            let Ok(modified) = dent.metadata().and_then(|m| m.modified()) else {
                continue;
            };
            let age = now.duration_since(modified).unwrap_or(Duration::ZERO);
            if age < max_age {
                continue;
            }

            match fs::remove_dir_all(&path) {
                Ok(()) => {
                    tracing::info!(workspace = %path.display(), "swept orphaned workspace");
                    removed += 1;
                }
                Err(e) => {
                    tracing::warn!(workspace = %path.display(), "failed to sweep: {}", e);
                }
            }
        }

        Ok(removed)
    }

    /// The spool directory workspaces are created under.
    pub fn spool_dir(&self) -> &Path {
        &self.spool_dir
    }
}

/// An exclusively-owned filesystem scope for one compilation attempt.
#[derive(Debug)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// The workspace root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a workspace-relative filename.
    pub fn resolve(&self, filename: &str) -> PathBuf {
        self.root.join(filename)
    }

    /// Write the entry source file, creating one parent level if the
    /// filename contains a subdirectory.
    ///
    /// The filename is validated first; traversal segments and
    /// absolute paths are rejected before any filesystem write.
    pub fn write_entry(&self, filename: &str, content: &str) -> Result<PathBuf> {
        validate_entry_filename(filename)?;

        let path = self.root.join(filename);
        if let Some(parent) = path.parent()
            && parent != self.root
        {
            fs::create_dir_all(parent).map_err(|e| Error::Resource {
                path: parent.to_path_buf(),
                message: format!("failed to create entry parent: {}", e),
            })?;
        }

        fs::write(&path, content)?;
        Ok(path)
    }

    /// Sorted names of every file currently in the workspace root
    /// (and one level of subdirectories, as `dir/name`).
    pub fn file_listing(&self) -> Vec<String> {
        let mut names = Vec::new();
        collect_names(&self.root, None, &mut names);
        names.sort();
        names
    }

    /// Remove the workspace directory tree.
    ///
    /// Idempotent: disposing an already-disposed workspace is a no-op.
    /// Must only be called after any artifact has been fully handed
    /// off to the caller.
    pub fn dispose(&self) {
        match fs::remove_dir_all(&self.root) {
            Ok(()) => {
                tracing::debug!(workspace = %self.root.display(), "disposed workspace");
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(workspace = %self.root.display(), "failed to dispose: {}", e);
            }
        }
    }
}

fn collect_names(dir: &Path, prefix: Option<&str>, names: &mut Vec<String>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for dent in entries.flatten() {
        let name = dent.file_name().to_string_lossy().to_string();
        let full = match prefix {
            Some(prefix) => format!("{}/{}", prefix, name),
            None => name.clone(),
        };
        if dent.path().is_dir() {
            if prefix.is_none() {
                collect_names(&dent.path(), Some(&name), names);
            }
        } else {
            names.push(full);
        }
    }
}

/// Validate an entry filename against the allow-list rules:
/// relative, no `..` or `.` segments, at most one subdirectory level,
/// and a non-empty final component.
pub fn validate_entry_filename(filename: &str) -> Result<()> {
    if filename.is_empty() {
        return Err(Error::InvalidEntryName("empty filename".to_string()));
    }

    let path = Path::new(filename);
    if path.is_absolute() || filename.starts_with('/') || filename.starts_with('\\') {
        return Err(Error::InvalidEntryName(format!(
            "absolute path not allowed: {}",
            filename
        )));
    }

    let mut depth = 0;
    for component in path.components() {
        match component {
            Component::Normal(part) => {
                if part.is_empty() {
                    return Err(Error::InvalidEntryName(filename.to_string()));
                }
                depth += 1;
            }
            _ => {
                return Err(Error::InvalidEntryName(format!(
                    "traversal segment not allowed: {}",
                    filename
                )));
            }
        }
    }

    if depth == 0 || depth > MAX_ENTRY_DEPTH {
        return Err(Error::InvalidEntryName(format!(
            "too many path components: {}",
            filename
        )));
    }

    Ok(())
}
