use crate::checksum;
use crate::error::{Error, Result};
use crate::path;
use once_cell::sync::OnceCell;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::trace;

/// One file discovered in a [`ScannedTree`](crate::ScannedTree).
///
/// Only the relative path is known up front. Everything else is derived on
/// first use and cached; the cells are safe to fill from several threads,
/// and a value is computed at most once per file.
pub struct ScannedFile {
    relative_path: PathBuf,
    root: Option<Arc<Path>>,
    normalized_path: OnceCell<String>,
    absolute_path: OnceCell<PathBuf>,
    size: OnceCell<u64>,
    checksum: OnceCell<u32>,
}

impl ScannedFile {
    pub(crate) fn new(root: Option<Arc<Path>>, relative_path: PathBuf) -> Self {
        debug_assert!(relative_path.is_relative());
        Self {
            relative_path,
            root,
            normalized_path: OnceCell::new(),
            absolute_path: OnceCell::new(),
            size: OnceCell::new(),
            checksum: OnceCell::new(),
        }
    }

    /// Rebuilds a file from snapshot values, which are trusted as-is.
    pub(crate) fn restore(
        root: Option<Arc<Path>>,
        relative_path: PathBuf,
        normalized_path: String,
        size: Option<u64>,
        checksum: Option<u32>,
    ) -> Self {
        let file = Self::new(root, relative_path);
        let _ = file.normalized_path.set(normalized_path);
        if let Some(size) = size {
            let _ = file.size.set(size);
        }
        if let Some(checksum) = checksum {
            let _ = file.checksum.set(checksum);
        }
        file
    }

    pub fn relative_path(&self) -> &Path {
        &self.relative_path
    }

    pub fn normalized_path(&self) -> &str {
        self.normalized_path.get_or_init(|| {
            trace!("Calculating normalized path for {}", self.relative_path.display());
            path::normalize_relative(&self.relative_path.to_string_lossy())
        })
    }

    /// Fails with [`Error::Unresolvable`] for snapshot files that were loaded
    /// without a substitute root.
    pub fn absolute_path(&self) -> Result<&Path> {
        self.absolute_path
            .get_or_try_init(|| {
                let root = self
                    .root
                    .as_deref()
                    .ok_or_else(|| Error::Unresolvable(self.relative_path.clone()))?;
                trace!("Calculating absolute path for {}", self.relative_path.display());
                Ok(path::resolve(root, &self.relative_path))
            })
            .map(PathBuf::as_path)
    }

    /// Absolute path when it can be resolved, otherwise the relative path.
    pub fn display_path(&self) -> &Path {
        self.absolute_path().unwrap_or(self.relative_path.as_path())
    }

    pub fn size(&self) -> Result<u64> {
        self.size
            .get_or_try_init(|| {
                let path = self.absolute_path()?;
                trace!("Fetching size of {}", path.display());
                let metadata = fs::metadata(path).map_err(|e| Error::stat(path, e))?;
                Ok(metadata.len())
            })
            .copied()
    }

    pub fn checksum(&self) -> Result<u32> {
        self.checksum
            .get_or_try_init(|| {
                let path = self.absolute_path()?;
                trace!("Calculating CRC of {}", path.display());
                checksum::compute(path)
            })
            .copied()
    }

    /// Whether this file counts as the same file as `other`.
    ///
    /// Sizes must match. With `use_checksum` the CRCs must match as well; they
    /// are only computed once the sizes agree. Contents are never compared
    /// byte for byte.
    pub fn equivalent_to(&self, other: &ScannedFile, use_checksum: bool) -> Result<bool> {
        if self.size()? != other.size()? {
            return Ok(false);
        }
        if !use_checksum {
            return Ok(true);
        }
        Ok(self.checksum()? == other.checksum()?)
    }

    /// Computes every derived field now so the file no longer needs the
    /// filesystem. The absolute path is skipped when there is no root.
    pub fn populate(&self) -> Result<()> {
        self.normalized_path();
        if self.root.is_some() {
            self.absolute_path()?;
        }
        self.size()?;
        self.checksum()?;
        Ok(())
    }

    pub(crate) fn cached_size(&self) -> Option<u64> {
        self.size.get().copied()
    }

    pub(crate) fn cached_checksum(&self) -> Option<u32> {
        self.checksum.get().copied()
    }
}

impl fmt::Debug for ScannedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScannedFile")
            .field("relative_path", &self.relative_path)
            .field("root", &self.root)
            .field("size", &self.size.get())
            .field("checksum", &self.checksum.get())
            .finish()
    }
}

impl fmt::Display for ScannedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.root {
            Some(root) => write!(
                f,
                "[File '{}' in folder '{}']",
                self.normalized_path(),
                root.display()
            ),
            None => write!(f, "[File '{}' in snapshot]", self.normalized_path()),
        }
    }
}
