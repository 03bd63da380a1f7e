use crate::error::{Error, Result};
use crc32fast::Hasher;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

const CHUNK_SIZE: usize = 8 * 1024 * 1024; // 8MB

/// Streams the file at `path` through a CRC-32 (zlib/PNG/gzip polynomial),
/// seeded at 0.
///
/// The file is only ever opened read-only and is closed when this returns,
/// on success or failure. No retries are attempted.
pub fn compute(path: &Path) -> Result<u32> {
    let mut file = File::open(path).map_err(|e| Error::io("opening", path, e))?;
    let mut hasher = Hasher::new();
    let mut buffer = vec![0u8; CHUNK_SIZE];

    loop {
        let bytes_read = match file.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::io("reading", path, e)),
        };
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hasher.finalize())
}
