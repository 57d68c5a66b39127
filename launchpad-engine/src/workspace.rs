//! Per-run staging directory
//!
//! A [`Workspace`] is exclusively owned by one run. It is created empty,
//! filled in batches (application files first, the CI workflow later) and
//! left on disk when the run ends.

use launchpad_core::domain::artifact::GeneratedArtifact;
use launchpad_core::domain::slug::Slug;
use std::collections::{BTreeMap, HashSet};
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Staging errors
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("workspace {0} already holds files from another run")]
    AlreadyPopulated(PathBuf),

    #[error("refusing to overwrite {0}, not written by this run")]
    WouldOverwrite(PathBuf),

    #[error("staged path {0} must be relative and stay inside the workspace")]
    UnsafePath(PathBuf),

    #[error("filesystem error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl WorkspaceError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Directory name of a run's workspace
pub fn workspace_dir_name(slug: &Slug) -> String {
    format!("app-{}", slug)
}

/// Exclusively owned staging directory of one run
#[derive(Debug)]
pub struct Workspace {
    root: PathBuf,
    /// Relative paths written by this run
    written: HashSet<PathBuf>,
}

impl Workspace {
    /// Creates `{parent}/app-{slug}`
    ///
    /// Fails if the directory already exists with content: workspaces are
    /// never merged or reused.
    pub fn create(parent: &Path, slug: &Slug) -> Result<Self, WorkspaceError> {
        std::fs::create_dir_all(parent).map_err(|e| WorkspaceError::io(parent, e))?;

        let root = parent.join(workspace_dir_name(slug));
        match std::fs::create_dir(&root) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                let mut entries = std::fs::read_dir(&root).map_err(|e| WorkspaceError::io(&root, e))?;
                if entries.next().is_some() {
                    return Err(WorkspaceError::AlreadyPopulated(root));
                }
            }
            Err(e) => return Err(WorkspaceError::io(&root, e)),
        }

        debug!(path = %root.display(), "workspace created");
        Ok(Self {
            root,
            written: HashSet::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Relative paths written so far, sorted
    pub fn files(&self) -> Vec<PathBuf> {
        let mut files: Vec<_> = self.written.iter().cloned().collect();
        files.sort();
        files
    }

    /// Writes a batch of files
    ///
    /// Every parent directory is created before the first file is written.
    /// Each file is written to a temporary sibling and renamed into place,
    /// so readers never observe partial content. Files already present on
    /// disk that this run did not write are never replaced.
    ///
    /// # Returns
    /// Relative paths written by this batch, in batch order
    pub fn stage<I, P, C>(&mut self, files: I) -> Result<Vec<PathBuf>, WorkspaceError>
    where
        I: IntoIterator<Item = (P, C)>,
        P: AsRef<Path>,
        C: AsRef<[u8]>,
    {
        let mut batch = Vec::new();
        for (relative, contents) in files {
            let relative = checked_relative(relative.as_ref())?;
            let target = self.root.join(&relative);
            if target.exists() && !self.written.contains(&relative) {
                return Err(WorkspaceError::WouldOverwrite(relative));
            }
            batch.push((relative, target, contents));
        }

        for (_, target, _) in &batch {
            if let Some(dir) = target.parent() {
                std::fs::create_dir_all(dir).map_err(|e| WorkspaceError::io(dir, e))?;
            }
        }

        let mut staged = Vec::with_capacity(batch.len());
        for (relative, target, contents) in batch {
            write_atomic(&target, contents.as_ref())?;
            debug!(file = %relative.display(), "staged");
            self.written.insert(relative.clone());
            staged.push(relative);
        }

        Ok(staged)
    }

    /// Writes the artifact files plus extra descriptors
    pub fn stage_artifact(
        &mut self,
        artifact: &GeneratedArtifact,
        descriptors: &BTreeMap<PathBuf, String>,
    ) -> Result<Vec<PathBuf>, WorkspaceError> {
        let files = artifact
            .files()
            .into_iter()
            .map(|(name, contents)| (PathBuf::from(name), contents.to_string()))
            .chain(descriptors.iter().map(|(p, c)| (p.clone(), c.clone())));

        self.stage(files)
    }
}

/// Normalizes a staged path, rejecting anything that could escape the root
fn checked_relative(path: &Path) -> Result<PathBuf, WorkspaceError> {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => normalized.push(part),
            Component::CurDir => {}
            _ => return Err(WorkspaceError::UnsafePath(path.to_path_buf())),
        }
    }

    if normalized.as_os_str().is_empty() {
        return Err(WorkspaceError::UnsafePath(path.to_path_buf()));
    }
    Ok(normalized)
}

/// Write-then-rename inside the target's directory
fn write_atomic(target: &Path, contents: &[u8]) -> Result<(), WorkspaceError> {
    let dir = target.parent().unwrap_or(Path::new("."));

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| WorkspaceError::io(dir, e))?;
    tmp.write_all(contents)
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|e| WorkspaceError::io(target, e))?;
    tmp.persist(target)
        .map_err(|e| WorkspaceError::io(target, e.error))?;

    Ok(())
}
