//! tags/mod.rs
//!
//! Metadata tag writing (format dispatch + container backends).
//!
//! Public surface area is intentionally small:
//! - `write_tag(path, format, ...)` picks the backend for the container
//! - `id3::Id3Tag` writes an ID3v2 tag onto an MP3
//! - `mp4::Mp4Tag` edits the atom tree of an MP4/AAC file
//!
//! Everything below this layer is container-specific binary work. The rest
//! of the crate should treat this as a pluggable backend.

pub mod id3;
pub mod mp4;

mod art;
mod util;

use std::path::Path;

use crate::error::Result;
use crate::types::{AudioFormat, TrackMeta};

use self::id3::Id3Tag;
use self::mp4::Mp4Tag;

/// Write the metadata tag for a finished recording.
///
/// MP3 recordings get an ID3v2 tag prepended; AAC recordings get an
/// iTunes-style atom subtree spliced into their MP4 container. Numeric
/// fields equal to zero are treated as unknown and left out.
pub fn write_tag(
    path: &Path,
    format: AudioFormat,
    artist: &str,
    album: &str,
    title: &str,
    meta: &TrackMeta,
    cover: Option<Vec<u8>>,
) -> Result<()> {
    match format {
        AudioFormat::Mp3 | AudioFormat::Mp3Hi => write_id3(path, artist, album, title, meta, cover),
        AudioFormat::Aac => write_mp4(path, artist, album, title, meta, cover),
    }
}

fn write_id3(
    path: &Path,
    artist: &str,
    album: &str,
    title: &str,
    meta: &TrackMeta,
    cover: Option<Vec<u8>>,
) -> Result<()> {
    let mut tag = Id3Tag::new();

    tag.add_text(b"TPE1", artist);
    tag.add_text(b"TALB", album);
    tag.add_text(b"TIT2", title);
    if meta.year != 0 {
        tag.add_text(b"TYER", &meta.year.to_string());
    }
    if meta.track != 0 {
        tag.add_text(b"TRCK", &meta.track.to_string());
    }
    if meta.disc != 0 {
        tag.add_text(b"TPOS", &meta.disc.to_string());
    }
    if let Some(cover) = cover {
        tag.add_cover(cover);
    }

    tag.write_to(path)
}

fn write_mp4(
    path: &Path,
    artist: &str,
    album: &str,
    title: &str,
    meta: &TrackMeta,
    cover: Option<Vec<u8>>,
) -> Result<()> {
    let mut tag = Mp4Tag::open(path)?;

    tag.add_artist(artist)?;
    tag.add_album(album)?;
    tag.add_title(title)?;
    if meta.year != 0 {
        tag.add_year(meta.year)?;
    }
    if meta.track != 0 {
        tag.add_track(meta.track)?;
    }
    if meta.disc != 0 {
        tag.add_disc(meta.disc)?;
    }
    if let Some(cover) = cover {
        tag.add_cover(&cover)?;
    }

    tag.write()
}
