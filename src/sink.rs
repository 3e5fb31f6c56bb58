//! File sink for the in-progress recording.
//!
//! The sink owns the file the audio stream is appended to. Opening is
//! create-new-exclusive so two players racing for the same song can never
//! clobber each other: exactly one of them gets the file, the other gets
//! `Error::FileExists` and skips recording.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::os::unix::fs::{DirBuilderExt, OpenOptionsExt};
use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};

/// An open, append-only audio file.
#[derive(Debug)]
pub struct Sink {
    file: BufWriter<File>,
}

impl Sink {
    /// Create the file at `path` and open it for writing.
    ///
    /// Missing parent directories are created (mode 0755). The leaf is
    /// opened with create-new semantics (mode 0664); if it already exists
    /// the error is `Error::FileExists`, which callers treat as "already
    /// recorded". Opens interrupted by a signal are retried.
    pub fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                let mut dirs = fs::DirBuilder::new();
                dirs.recursive(true).mode(0o755);
                dirs.create(parent)?;
            }
        }

        let file = loop {
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .mode(0o664)
                .open(path)
            {
                Ok(file) => break file,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    return Err(Error::FileExists(path.to_path_buf()));
                }
                Err(e) => return Err(e.into()),
            }
        };

        Ok(Self {
            file: BufWriter::new(file),
        })
    }

    /// Append a block of audio to the file. Short writes are an error.
    pub fn append(&mut self, data: &[u8]) -> Result<()> {
        self.file.write_all(data)?;
        Ok(())
    }

    /// Flush buffered bytes and release the file.
    pub fn close(mut self) -> Result<()> {
        self.file.flush()?;
        Ok(())
    }
}

/// Delete a partially recorded file along with any parent directories it
/// leaves empty.
///
/// After unlinking, each ancestor directory is removed in turn until one is
/// non-empty or no longer exists. The walk never removes a directory equal
/// to or outside `root`, so the recording root itself always survives.
pub fn delete_with_empty_parents(path: &Path, root: &Path) -> Result<()> {
    debug!(path = %path.display(), "deleting partially recorded file");
    fs::remove_file(path)?;

    for dir in path.ancestors().skip(1) {
        if dir.as_os_str().is_empty() || dir == root || !dir.starts_with(root) {
            break;
        }

        match fs::remove_dir(dir) {
            Ok(()) => {}
            Err(e) => match e.kind() {
                io::ErrorKind::DirectoryNotEmpty
                | io::ErrorKind::AlreadyExists
                | io::ErrorKind::NotFound => break,
                _ => return Err(e.into()),
            },
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};
    use std::thread;

    #[test]
    fn create_makes_missing_parents() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("artist/album/song.mp3");

        let mut sink = Sink::create(&path).unwrap();
        sink.append(b"abc").unwrap();
        sink.close().unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"abc");
    }

    #[test]
    fn create_refuses_existing_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("song.mp3");
        fs::write(&path, b"earlier recording").unwrap();

        match Sink::create(&path) {
            Err(Error::FileExists(p)) => assert_eq!(p, path),
            other => panic!("expected FileExists, got {other:?}"),
        }
        // The earlier file is untouched.
        assert_eq!(fs::read(&path).unwrap(), b"earlier recording");
    }

    #[test]
    fn concurrent_creates_yield_one_winner() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = Arc::new(tmp.path().join("contested.mp3"));
        let barrier = Arc::new(Barrier::new(2));

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let path = Arc::clone(&path);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    Sink::create(&path).map(drop)
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let wins = results.iter().filter(|r| r.is_ok()).count();
        let exists = results
            .iter()
            .filter(|r| matches!(r, Err(Error::FileExists(_))))
            .count();
        assert_eq!((wins, exists), (1, 1));
    }

    #[test]
    fn delete_removes_empty_parents_up_to_root() {
        let tmp = tempfile::TempDir::new().unwrap();
        let root = tmp.path().to_path_buf();
        let path = root.join("artist/album/song.mp3");

        Sink::create(&path).unwrap().close().unwrap();
        delete_with_empty_parents(&path, &root).unwrap();

        assert!(!root.join("artist").exists());
        assert!(root.exists());
    }

    #[test]
    fn delete_stops_at_first_nonempty_parent() {
        let tmp = tempfile::TempDir::new().unwrap();
        let root = tmp.path().to_path_buf();
        let path = root.join("artist/album/song.mp3");
        let sibling = root.join("artist/other.mp3");

        Sink::create(&path).unwrap().close().unwrap();
        fs::write(&sibling, b"keep me").unwrap();
        delete_with_empty_parents(&path, &root).unwrap();

        assert!(!root.join("artist/album").exists());
        assert!(sibling.exists());
    }

    #[test]
    fn delete_never_crosses_the_root() {
        let tmp = tempfile::TempDir::new().unwrap();
        let root = tmp.path().join("library");
        let path = root.join("song.mp3");

        Sink::create(&path).unwrap().close().unwrap();
        delete_with_empty_parents(&path, &root).unwrap();

        // The file's only ancestor inside the walk is the root itself,
        // which must survive even though it is now empty.
        assert!(root.exists());
    }

    #[test]
    fn delete_outside_root_touches_nothing_above() {
        let tmp = tempfile::TempDir::new().unwrap();
        let root = tmp.path().join("library");
        fs::create_dir(&root).unwrap();
        let stray = tmp.path().join("elsewhere/song.mp3");

        Sink::create(&stray).unwrap().close().unwrap();
        delete_with_empty_parents(&stray, &root).unwrap();

        // Not under the root: the file goes, its directory stays.
        assert!(!stray.exists());
        assert!(tmp.path().join("elsewhere").exists());
    }
}
