use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error(
        "'{}' is not a folder or a file with .{} ending",
        .0.display(),
        crate::tree::SNAPSHOT_EXTENSION
    )]
    InvalidRoot(PathBuf),

    #[error("IO error while {op} '{}': {source}", .path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("'{}' disappeared after it was scanned", .0.display())]
    NotFound(PathBuf),

    #[error("Corrupt snapshot '{}': {reason}", .path.display())]
    CorruptSnapshot { path: PathBuf, reason: String },

    #[error("Could not encode snapshot '{}': {source}", .path.display())]
    SnapshotEncode {
        path: PathBuf,
        #[source]
        source: bincode::Error,
    },

    #[error("No root folder to resolve '{}' against", .0.display())]
    Unresolvable(PathBuf),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl Error {
    pub(crate) fn io(op: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            op,
            path: path.into(),
            source,
        }
    }

    /// Like [`Error::io`], but a missing file becomes [`Error::NotFound`].
    pub(crate) fn stat(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        if source.kind() == io::ErrorKind::NotFound {
            Error::NotFound(path)
        } else {
            Error::io("reading metadata of", path, source)
        }
    }
}
