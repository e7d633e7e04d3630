//! Read-only file tree abstraction.
//!
//! # Responsibilities
//! - `FileSystem`: the stat/read/list contract used by file transfers and
//!   template loading
//! - `OsFileSystem`: the real disk
//! - `MemoryFileSystem`: an in-memory tree that records every call, for
//!   tests that must prove a path was never touched
//!
//! # Design Decisions
//! - Synchronous: handlers run synchronously and files are read whole

use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::SystemTime;

/// What a `stat` call reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub is_dir: bool,
    pub len: u64,
    pub modified: Option<SystemTime>,
}

/// A read-only file tree.
pub trait FileSystem: Send + Sync + fmt::Debug {
    fn stat(&self, path: &Path) -> io::Result<Metadata>;

    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Every regular file below `root`, recursively, relative to `root`.
    fn list_files(&self, root: &Path) -> io::Result<Vec<PathBuf>>;
}

/// The host file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn stat(&self, path: &Path) -> io::Result<Metadata> {
        let meta = std::fs::metadata(path)?;
        Ok(Metadata {
            is_dir: meta.is_dir(),
            len: meta.len(),
            modified: meta.modified().ok(),
        })
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }

    fn list_files(&self, root: &Path) -> io::Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        let mut pending = vec![root.to_path_buf()];
        while let Some(dir) = pending.pop() {
            for entry in std::fs::read_dir(&dir)? {
                let entry = entry?;
                let path = entry.path();
                if entry.file_type()?.is_dir() {
                    pending.push(path);
                } else if let Ok(relative) = path.strip_prefix(root) {
                    files.push(relative.to_path_buf());
                }
            }
        }
        files.sort();
        Ok(files)
    }
}

/// A call observed by `MemoryFileSystem`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FsCall {
    Stat(PathBuf),
    Read(PathBuf),
    List(PathBuf),
}

/// In-memory file tree. Directories exist implicitly above their files.
#[derive(Debug, Default)]
pub struct MemoryFileSystem {
    files: BTreeMap<PathBuf, (Vec<u8>, SystemTime)>,
    calls: Mutex<Vec<FsCall>>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) -> Self {
        self.insert(path, contents, SystemTime::UNIX_EPOCH);
        self
    }

    pub fn insert(
        &mut self,
        path: impl Into<PathBuf>,
        contents: impl Into<Vec<u8>>,
        modified: SystemTime,
    ) {
        self.files.insert(path.into(), (contents.into(), modified));
    }

    /// Calls recorded so far, in order.
    pub fn calls(&self) -> Vec<FsCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, call: FsCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.files
            .keys()
            .any(|file| file != path && file.starts_with(path))
    }
}

impl FileSystem for MemoryFileSystem {
    fn stat(&self, path: &Path) -> io::Result<Metadata> {
        self.record(FsCall::Stat(path.to_path_buf()));
        if let Some((contents, modified)) = self.files.get(path) {
            return Ok(Metadata {
                is_dir: false,
                len: contents.len() as u64,
                modified: Some(*modified),
            });
        }
        if self.is_dir(path) {
            return Ok(Metadata {
                is_dir: true,
                len: 0,
                modified: None,
            });
        }
        Err(io::Error::new(io::ErrorKind::NotFound, path.display().to_string()))
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.record(FsCall::Read(path.to_path_buf()));
        self.files
            .get(path)
            .map(|(contents, _)| contents.clone())
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.display().to_string()))
    }

    fn list_files(&self, root: &Path) -> io::Result<Vec<PathBuf>> {
        self.record(FsCall::List(root.to_path_buf()));
        Ok(self
            .files
            .keys()
            .filter_map(|file| file.strip_prefix(root).ok())
            .filter(|relative| !relative.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_fs_stat_and_read() {
        let fs = MemoryFileSystem::new().with_file("/srv/docs/a.txt", "hello");

        let meta = fs.stat(Path::new("/srv/docs/a.txt")).unwrap();
        assert!(!meta.is_dir);
        assert_eq!(meta.len, 5);
        assert!(fs.stat(Path::new("/srv/docs")).unwrap().is_dir);
        assert_eq!(
            fs.stat(Path::new("/srv/missing")).unwrap_err().kind(),
            io::ErrorKind::NotFound
        );
        assert_eq!(fs.read(Path::new("/srv/docs/a.txt")).unwrap(), b"hello");

        assert_eq!(
            fs.calls(),
            vec![
                FsCall::Stat("/srv/docs/a.txt".into()),
                FsCall::Stat("/srv/docs".into()),
                FsCall::Stat("/srv/missing".into()),
                FsCall::Read("/srv/docs/a.txt".into()),
            ]
        );
    }

    #[test]
    fn test_memory_fs_list_is_relative() {
        let fs = MemoryFileSystem::new()
            .with_file("views/index.html", "")
            .with_file("views/includes/nav.html", "")
            .with_file("other/x.html", "");
        assert_eq!(
            fs.list_files(Path::new("views")).unwrap(),
            vec![PathBuf::from("includes/nav.html"), PathBuf::from("index.html")]
        );
    }

    #[test]
    fn test_os_fs_lists_recursively() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("top.txt"), "1").unwrap();
        std::fs::write(dir.path().join("nested/deep.txt"), "22").unwrap();

        let fs = OsFileSystem;
        assert_eq!(
            fs.list_files(dir.path()).unwrap(),
            vec![PathBuf::from("nested/deep.txt"), PathBuf::from("top.txt")]
        );
        assert_eq!(fs.stat(&dir.path().join("nested/deep.txt")).unwrap().len, 2);
        assert!(fs.stat(&dir.path().join("nested")).unwrap().is_dir);
    }
}
