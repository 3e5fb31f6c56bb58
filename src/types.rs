//! Core data types shared across the recording pipeline.
//!
//! Rule of thumb:
//! - These structs should be “boring bags of data”
//! - No filesystem code
//! - No network code
//! - No tag rendering code
//!
//! `Song` is what the player hands us when a track starts playing;
//! `TrackMeta` is what we manage to scrape about it along the way.

/// Audio container formats the recorder knows how to tag.
///
/// The player reports the stream format when a song starts; everything
/// downstream (file extension, tag writer) dispatches on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    /// MPEG audio, standard bitrate.
    Mp3,
    /// MPEG audio, high bitrate.
    Mp3Hi,
    /// AAC in an MP4 container.
    Aac,
}

impl AudioFormat {
    /// File extension for the container this format is stored in.
    pub fn extension(self) -> &'static str {
        match self {
            AudioFormat::Mp3 | AudioFormat::Mp3Hi => ".mp3",
            AudioFormat::Aac => ".m4a",
        }
    }
}

/// Per-song context supplied by the player for one track.
///
/// The artist/album/title strings are kept exactly as the service sent
/// them; sanitization only happens when they are turned into a file path.
#[derive(Debug, Clone)]
pub struct Song {
    pub artist: String,
    pub album: String,
    pub title: String,
    pub format: AudioFormat,

    /// Album detail page; scraped for the release year and cover art URL.
    pub album_detail_url: String,

    /// Album explorer page; scraped for the track and disc numbers.
    pub album_explorer_url: String,
}

/// Metadata scraped best-effort while a song is being opened.
///
/// We use zero for "unknown" on the numeric fields because that is how the
/// rest of the pipeline decides whether to emit the matching tag frame:
/// - `0` = could not be found, leave it out of the tag
/// - anything else = write it
#[derive(Debug, Clone, Default)]
pub struct TrackMeta {
    /// Release year, 0 when unknown.
    pub year: u16,

    /// Track number, 0 when unknown.
    pub track: u16,

    /// Disc number, 0 when unknown.
    pub disc: u16,

    /// Cover art URL. `None` means the album has no art or the lookup
    /// failed; either way the tag is written without a picture.
    pub cover_url: Option<String>,
}
