//! In-memory output tree and atomic publishing

use anyhow::{Context as _, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::error::BuildError;

/// Prefix of the scratch directories created next to the destination
pub const STAGING_PREFIX: &str = ".blogsmith-";

/// Contents of one output file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputBody {
    Rendered(String),
    /// Copied byte for byte from this source file
    Copy(PathBuf),
}

#[derive(Debug, Clone)]
struct OutputFile {
    origin: String,
    body: OutputBody,
}

/// Every file of a build, keyed by path relative to the destination
#[derive(Debug, Default)]
pub struct SiteOutput {
    files: BTreeMap<PathBuf, OutputFile>,
}

impl SiteOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file; `origin` names what produced it for error messages
    ///
    /// Two producers of the same path is an error, as is a path that
    /// would resolve outside the destination.
    pub fn insert(
        &mut self,
        path: PathBuf,
        origin: impl Into<String>,
        body: OutputBody,
    ) -> Result<(), BuildError> {
        let origin = origin.into();
        if !is_contained(&path) {
            return Err(BuildError::OutputOutsideDestination { path, origin });
        }
        if let Some(existing) = self.files.get(&path) {
            return Err(BuildError::OutputConflict {
                path,
                first: existing.origin.clone(),
                second: origin,
            });
        }
        self.files.insert(path, OutputFile { origin, body });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.files.keys().map(PathBuf::as_path)
    }

    pub fn get(&self, path: impl AsRef<Path>) -> Option<&OutputBody> {
        self.files.get(path.as_ref()).map(|f| &f.body)
    }

    /// Text of a rendered file
    pub fn rendered(&self, path: impl AsRef<Path>) -> Option<&str> {
        match self.get(path)? {
            OutputBody::Rendered(text) => Some(text),
            OutputBody::Copy(_) => None,
        }
    }

    /// Write the tree to `dest`, replacing whatever was there
    ///
    /// Files are written into a staging directory beside `dest` which is
    /// then renamed into place. Until that rename succeeds the previous
    /// tree is untouched.
    pub fn publish(&self, dest: &Path) -> Result<()> {
        let parent = match dest.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;

        let staging = tempfile::Builder::new()
            .prefix(&format!("{}staging", STAGING_PREFIX))
            .tempdir_in(&parent)
            .with_context(|| format!("Failed to create staging directory in {}", parent.display()))?;
        let staged = staging.path().join("site");
        fs::create_dir_all(&staged)?;

        for (relative, file) in &self.files {
            let target = staged.join(relative);
            if let Some(dir) = target.parent() {
                fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create {}", dir.display()))?;
            }
            match &file.body {
                OutputBody::Rendered(text) => fs::write(&target, text)
                    .with_context(|| format!("Failed to write {}", target.display()))?,
                OutputBody::Copy(source) => {
                    fs::copy(source, &target).with_context(|| {
                        format!("Failed to copy {} to {}", source.display(), target.display())
                    })?;
                }
            }
            tracing::debug!("Staged {}", relative.display());
        }

        swap_into_place(&staged, dest, &parent)
    }
}

/// Only plain names, so joining onto the staging root stays inside it
fn is_contained(path: &Path) -> bool {
    let mut components = path.components().peekable();
    components.peek().is_some()
        && components.all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// Rename `staged` to `dest`, moving any previous tree aside first and
/// restoring it if the final rename fails
fn swap_into_place(staged: &Path, dest: &Path, parent: &Path) -> Result<()> {
    if !dest.exists() {
        return fs::rename(staged, dest)
            .with_context(|| format!("Failed to move output into {}", dest.display()));
    }

    let retired = tempfile::Builder::new()
        .prefix(&format!("{}old", STAGING_PREFIX))
        .tempdir_in(parent)?;
    let previous = retired.path().join("site");
    fs::rename(dest, &previous)
        .with_context(|| format!("Failed to move {} aside", dest.display()))?;

    if let Err(e) = fs::rename(staged, dest) {
        fs::rename(&previous, dest)
            .with_context(|| format!("Failed to restore {}", dest.display()))?;
        return Err(e).with_context(|| format!("Failed to move output into {}", dest.display()));
    }

    // `retired` removes the previous tree when dropped
    Ok(())
}
