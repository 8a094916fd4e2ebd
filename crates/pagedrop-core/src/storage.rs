//! Disk I/O and file lifecycle for persisted downloads.
//!
//! Bytes go to `<final>.part` first (preallocated when the size is known),
//! are synced, then renamed onto the final name. A failed write removes the
//! part file, so a failure never leaves a half-written file under the final
//! name.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
#[cfg(unix)]
use std::os::unix::io::AsRawFd;

/// Temporary file suffix used before the final rename.
pub const TEMP_SUFFIX: &str = ".part";

/// `<path>.part`
pub fn temp_path_for(final_path: &Path) -> PathBuf {
    let mut name = final_path.as_os_str().to_owned();
    name.push(TEMP_SUFFIX);
    PathBuf::from(name)
}

/// Failure with the path it happened on.
#[derive(Debug)]
pub struct StorageError {
    pub path: PathBuf,
    pub source: io::Error,
}

impl StorageError {
    fn new(path: &Path, source: io::Error) -> Self {
        Self {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.source)
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Sequential writer for one download. Dropping it without `finalize` removes the part file.
pub struct PartFile {
    file: Option<File>,
    temp_path: PathBuf,
    final_path: PathBuf,
    written: u64,
}

impl PartFile {
    /// Creates (truncating) `<final_path>.part`. The parent directory is created if missing.
    pub fn create(final_path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = final_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::new(parent, e))?;
        }
        let temp_path = temp_path_for(final_path);
        let file = File::options()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)
            .map_err(|e| StorageError::new(&temp_path, e))?;
        Ok(Self {
            file: Some(file),
            temp_path,
            final_path: final_path.to_path_buf(),
            written: 0,
        })
    }

    /// Reserve `size` bytes. On Unix tries `posix_fallocate`; falls back to
    /// nothing (the file grows as written) since the final length is exact anyway.
    pub fn preallocate(&mut self, size: u64) {
        #[cfg(unix)]
        {
            if let Some(file) = &self.file {
                let fd = file.as_raw_fd();
                let r = unsafe { libc::posix_fallocate(fd, 0, size as libc::off_t) };
                if r != 0 {
                    tracing::debug!(errno = r, "posix_fallocate failed, writing without preallocation");
                }
            }
        }
        #[cfg(not(unix))]
        let _ = size;
    }

    pub fn write_all(&mut self, data: &[u8]) -> Result<(), StorageError> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| StorageError::new(&self.temp_path, io::ErrorKind::BrokenPipe.into()))?;
        file.write_all(data)
            .map_err(|e| StorageError::new(&self.temp_path, e))?;
        self.written += data.len() as u64;
        Ok(())
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    /// Truncates to the bytes actually written (undoing preallocation), syncs,
    /// closes, and renames onto the final path. Returns the final path.
    pub fn finalize(mut self) -> Result<PathBuf, StorageError> {
        let file = match self.file.take() {
            Some(f) => f,
            None => return Err(StorageError::new(&self.temp_path, io::ErrorKind::BrokenPipe.into())),
        };
        let synced = file
            .set_len(self.written)
            .and_then(|_| file.sync_all())
            .map_err(|e| StorageError::new(&self.temp_path, e));
        drop(file);
        let renamed = synced.and_then(|_| {
            std::fs::rename(&self.temp_path, &self.final_path)
                .map_err(|e| StorageError::new(&self.final_path, e))
        });
        if renamed.is_err() {
            self.remove_temp();
        }
        renamed.map(|_| self.final_path.clone())
    }

    fn remove_temp(&mut self) {
        if self.file.take().is_some() || self.temp_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.temp_path) {
                if e.kind() != io::ErrorKind::NotFound {
                    tracing::warn!(path = %self.temp_path.display(), "could not remove partial file: {}", e);
                }
            }
        }
    }
}

impl Drop for PartFile {
    fn drop(&mut self) {
        if self.file.is_some() {
            self.remove_temp();
        }
    }
}

/// Writes `bytes` to `dir/filename` through a part file. On any failure the
/// part file is removed and nothing exists under the final name.
pub fn persist_bytes(dir: &Path, filename: &str, bytes: &[u8]) -> Result<PathBuf, StorageError> {
    let final_path = dir.join(filename);
    let mut part = PartFile::create(&final_path)?;
    part.preallocate(bytes.len() as u64);
    part.write_all(bytes)?;
    part.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_path_appends_suffix() {
        assert_eq!(
            temp_path_for(Path::new("/d/report.pdf")),
            PathBuf::from("/d/report.pdf.part")
        );
    }

    #[test]
    fn persist_writes_exact_bytes_and_no_part_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = persist_bytes(dir.path(), "a.pdf", b"%PDF-1.7").unwrap();
        assert_eq!(path, dir.path().join("a.pdf"));
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.7");
        assert!(!temp_path_for(&path).exists());
    }

    #[test]
    fn creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("Downloads");
        let path = persist_bytes(&nested, "b.pdf", b"x").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn dropped_part_file_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        let final_path = dir.path().join("c.pdf");
        let temp;
        {
            let mut part = PartFile::create(&final_path).unwrap();
            part.write_all(b"half").unwrap();
            temp = part.temp_path().to_path_buf();
            assert!(temp.exists());
        }
        assert!(!temp.exists());
        assert!(!final_path.exists());
    }

    #[test]
    fn finalize_trims_preallocation() {
        let dir = tempfile::tempdir().unwrap();
        let final_path = dir.path().join("d.pdf");
        let mut part = PartFile::create(&final_path).unwrap();
        part.preallocate(4096);
        part.write_all(b"abc").unwrap();
        let path = part.finalize().unwrap();
        assert_eq!(std::fs::read(path).unwrap(), b"abc");
    }

    #[test]
    fn unwritable_target_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where a directory is expected.
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"").unwrap();
        let err = persist_bytes(&blocker, "e.pdf", b"x").unwrap_err();
        assert!(err.path.starts_with(&blocker));
    }
}
