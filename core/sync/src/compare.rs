//! Byte-for-byte file equality.

use std::path::Path;
use tokio::fs::{self, File};
use tokio::io::AsyncReadExt;

use foldersync_common::{Error, Result};

/// Size of each chunk read from both files during comparison.
pub const COMPARE_CHUNK_SIZE: usize = 64 * 1024;

/// Check whether two files have identical content.
///
/// Lengths are compared from metadata first, so files of different sizes are
/// rejected without reading any content. Otherwise both files are streamed in
/// lockstep and the comparison stops at the first differing chunk.
///
/// # Errors
/// - Either file cannot be opened, stat'ed or read
pub async fn files_equal(a: &Path, b: &Path) -> Result<bool> {
    let len_a = fs::metadata(a)
        .await
        .map_err(|e| Error::compare(a, e))?
        .len();
    let len_b = fs::metadata(b)
        .await
        .map_err(|e| Error::compare(b, e))?
        .len();

    if len_a != len_b {
        return Ok(false);
    }
    if len_a == 0 {
        return Ok(true);
    }

    let mut file_a = File::open(a).await.map_err(|e| Error::compare(a, e))?;
    let mut file_b = File::open(b).await.map_err(|e| Error::compare(b, e))?;

    let mut buf_a = vec![0u8; COMPARE_CHUNK_SIZE];
    let mut buf_b = vec![0u8; COMPARE_CHUNK_SIZE];

    loop {
        let n_a = fill(&mut file_a, &mut buf_a)
            .await
            .map_err(|e| Error::compare(a, e))?;
        let n_b = fill(&mut file_b, &mut buf_b)
            .await
            .map_err(|e| Error::compare(b, e))?;

        // A file that changed size mid-read is simply unequal.
        if n_a != n_b || buf_a[..n_a] != buf_b[..n_b] {
            return Ok(false);
        }
        if n_a == 0 {
            return Ok(true);
        }
    }
}

/// Read until `buf` is full or the file is exhausted.
async fn fill(file: &mut File, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = file.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::TempDir;

    async fn write_pair(
        temp: &TempDir,
        a: &[u8],
        b: &[u8],
    ) -> (std::path::PathBuf, std::path::PathBuf) {
        let pa = temp.path().join("a.bin");
        let pb = temp.path().join("b.bin");
        fs::write(&pa, a).await.unwrap();
        fs::write(&pb, b).await.unwrap();
        (pa, pb)
    }

    #[tokio::test]
    async fn test_identical_files_equal() {
        let temp = TempDir::new().unwrap();
        let (a, b) = write_pair(&temp, b"hello", b"hello").await;
        assert!(files_equal(&a, &b).await.unwrap());
    }

    #[tokio::test]
    async fn test_empty_files_equal() {
        let temp = TempDir::new().unwrap();
        let (a, b) = write_pair(&temp, b"", b"").await;
        assert!(files_equal(&a, &b).await.unwrap());
    }

    #[tokio::test]
    async fn test_same_length_different_content() {
        let temp = TempDir::new().unwrap();
        let (a, b) = write_pair(&temp, b"hi!", b"bye").await;
        assert!(!files_equal(&a, &b).await.unwrap());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_length_mismatch_does_not_read_content() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let (a, b) = write_pair(&temp, b"short", b"much longer").await;

        // Unreadable content still compares: only metadata is consulted.
        fs::set_permissions(&b, std::fs::Permissions::from_mode(0o000))
            .await
            .unwrap();
        let result = files_equal(&a, &b).await;
        fs::set_permissions(&b, std::fs::Permissions::from_mode(0o644))
            .await
            .unwrap();

        assert!(!result.unwrap());
    }

    #[tokio::test]
    async fn test_difference_past_first_chunk() {
        let temp = TempDir::new().unwrap();
        let mut left = vec![7u8; COMPARE_CHUNK_SIZE * 2 + 10];
        let right = left.clone();
        let (a, b) = write_pair(&temp, &left, &right).await;
        assert!(files_equal(&a, &b).await.unwrap());

        left[COMPARE_CHUNK_SIZE + 3] = 8;
        fs::write(&a, &left).await.unwrap();
        assert!(!files_equal(&a, &b).await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_file_is_error() {
        let temp = TempDir::new().unwrap();
        let (a, _) = write_pair(&temp, b"x", b"x").await;
        let missing = temp.path().join("nope");

        let err = files_equal(&a, &missing).await.unwrap_err();
        assert!(matches!(err, Error::Compare { .. }));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_agrees_with_slice_equality(
            a in proptest::collection::vec(any::<u8>(), 0..512),
            b in proptest::collection::vec(any::<u8>(), 0..512),
        ) {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            let temp = TempDir::new().unwrap();
            let equal = rt.block_on(async {
                let (pa, pb) = write_pair(&temp, &a, &b).await;
                files_equal(&pa, &pb).await.unwrap()
            });
            prop_assert_eq!(equal, a == b);
        }
    }
}
