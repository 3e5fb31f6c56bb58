//! Error types for the recorder pipeline.
//!
//! One crate-wide enum so callers can tell the recoverable cases apart:
//! `FileExists` means "skip this song, keep the file that's there", while
//! most of the rest ends the current song's pipeline.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// The output file already exists. Recoverable: the recorder marks the
    /// song complete and leaves the existing file alone.
    #[error("audio file already exists: {0}")]
    FileExists(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The HTTP client (or its proxy) could not be constructed.
    #[error("HTTP client setup failed: {0}")]
    Http(#[source] reqwest::Error),

    #[error("fetch failed ({url}): {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The two tag render passes disagreed about the byte length.
    #[error("tag render size mismatch (measured {measured}, rendered {rendered})")]
    TagSizeMismatch { measured: usize, rendered: usize },

    #[error("tag too large ({0} bytes)")]
    TagTooLarge(usize),

    /// The file is not laid out the way the editor requires.
    #[error("invalid MP4 layout: {0}")]
    Mp4Layout(String),

    /// An atom the editor does not know how to classify. Also covers
    /// `co64` chunk-offset tables, which would be silently corrupted if
    /// the rewrite went ahead.
    #[error("unknown atom '{0}' in the moov tree")]
    Mp4UnknownAtom(String),

    #[error("invalid size {size} for atom '{name}'")]
    Mp4AtomSize { name: String, size: u64 },

    #[error("malformed '{0}' payload")]
    Mp4Payload(&'static str),

    #[error("no atom at path '{0}'")]
    Mp4NoSuchPath(String),

    /// A rendered size or chunk offset no longer fits the container's
    /// 32-bit fields.
    #[error("atom tree too large for 32-bit container fields")]
    Mp4Overflow,

    /// Payload growth after an atom joined the tag would desynchronize the
    /// chunk-offset table.
    #[error("cannot append data to an atom already attached to the tag")]
    AppendAfterAttach,
}
