//! tags/util.rs
//! Shared file plumbing for the tag writers.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::{Error, Result};

/// Number of bytes moved per block when copying audio between files.
pub(crate) const COPY_BLOCK_SIZE: usize = 100 * 1024;

/// Copy exactly `len` bytes from `reader` to `writer` in blocks.
pub(crate) fn copy_exact(
    reader: &mut impl Read,
    writer: &mut impl Write,
    mut len: u64,
) -> io::Result<()> {
    let mut buf = vec![0u8; COPY_BLOCK_SIZE];

    while len > 0 {
        let want = len.min(COPY_BLOCK_SIZE as u64) as usize;
        reader.read_exact(&mut buf[..want])?;
        writer.write_all(&buf[..want])?;
        len -= want as u64;
    }

    Ok(())
}

/// Copy from `reader` until end of file, returning the byte count.
pub(crate) fn copy_to_end(reader: &mut impl Read, writer: &mut impl Write) -> io::Result<u64> {
    let mut buf = vec![0u8; COPY_BLOCK_SIZE];
    let mut total = 0u64;

    loop {
        let count = match reader.read(&mut buf) {
            Ok(0) => return Ok(total),
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        writer.write_all(&buf[..count])?;
        total += count as u64;
    }
}

/// Replace `target` with freshly written contents.
///
/// The new contents go to a temporary file in the same directory, are
/// synced to disk, and only then renamed over the target. On any failure
/// the temporary file is removed and the target is left exactly as it was.
pub(crate) fn replace_file<F>(target: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut File) -> Result<()>,
{
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    write(tmp.as_file_mut())?;
    tmp.as_file().sync_all()?;
    tmp.persist(target).map_err(|e| Error::Io(e.error))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Cursor;

    #[test]
    fn copy_exact_moves_only_the_requested_range() {
        let mut src = Cursor::new(vec![7u8; 300 * 1024]);
        let mut dst = Vec::new();
        copy_exact(&mut src, &mut dst, 250 * 1024).unwrap();
        assert_eq!(dst.len(), 250 * 1024);
    }

    #[test]
    fn copy_exact_fails_on_short_input() {
        let mut src = Cursor::new(vec![0u8; 10]);
        let mut dst = Vec::new();
        assert!(copy_exact(&mut src, &mut dst, 11).is_err());
    }

    #[test]
    fn replace_file_swaps_contents_atomically() {
        let tmp = tempfile::TempDir::new().unwrap();
        let target = tmp.path().join("audio.mp3");
        fs::write(&target, b"old").unwrap();

        replace_file(&target, |file| {
            file.write_all(b"new contents")?;
            Ok(())
        })
        .unwrap();

        assert_eq!(fs::read(&target).unwrap(), b"new contents");
    }

    #[test]
    fn replace_file_failure_leaves_target_untouched() {
        let tmp = tempfile::TempDir::new().unwrap();
        let target = tmp.path().join("audio.mp3");
        fs::write(&target, b"original").unwrap();

        let result = replace_file(&target, |file| {
            file.write_all(b"half written")?;
            Err(Error::TagTooLarge(usize::MAX))
        });

        assert!(result.is_err());
        assert_eq!(fs::read(&target).unwrap(), b"original");
        // No temporary file is left behind.
        let leftovers = fs::read_dir(tmp.path()).unwrap().count();
        assert_eq!(leftovers, 1);
    }
}
