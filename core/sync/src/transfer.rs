//! Whole-file transfer from source to destination.

use std::path::Path;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use foldersync_common::{Error, Result};

/// Size of each chunk moved from source to destination.
pub const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Copy `source` over `destination`, returning the number of bytes written.
///
/// The destination is created if missing and truncated otherwise. Both
/// handles are dropped before returning, on success and on failure.
///
/// # Errors
/// - Source cannot be opened or read; the error names `source`
/// - Destination cannot be created or written; the error names `destination`
///
/// If the copy fails part-way the destination is left with whatever was
/// written so far; there is no rollback.
pub async fn copy_file(source: &Path, destination: &Path) -> Result<u64> {
    let mut reader = File::open(source)
        .await
        .map_err(|e| Error::transfer(source, e))?;

    let mut writer = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(destination)
        .await
        .map_err(|e| Error::transfer(destination, e))?;

    let mut buf = vec![0u8; COPY_BUFFER_SIZE];
    let mut copied = 0u64;
    loop {
        let n = reader
            .read(&mut buf)
            .await
            .map_err(|e| Error::transfer(source, e))?;
        if n == 0 {
            break;
        }
        writer
            .write_all(&buf[..n])
            .await
            .map_err(|e| Error::transfer(destination, e))?;
        copied += n as u64;
    }

    writer
        .flush()
        .await
        .map_err(|e| Error::transfer(destination, e))?;

    Ok(copied)
}
