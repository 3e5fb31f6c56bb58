//! Player-facing settings consumed by the recorder core.
//!
//! Parsing a config file is the host player's job; this crate only reads
//! the handful of fields below.

use std::path::PathBuf;

/// Recording settings, filled in by the host player.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Recording root. The recorder changes into this directory at init
    /// time and never deletes it or anything above it.
    pub audio_file_dir: PathBuf,

    /// Path template for recorded songs, relative to the recording root.
    /// Substitution tokens: `%artist`, `%album`, `%title`, `%year`,
    /// `%track` (two digits, zero padded), `%disc`. The extension is
    /// appended automatically based on the audio format.
    pub audio_file_name: String,

    /// Keep spaces in file names instead of replacing them with `_`.
    pub use_spaces: bool,

    /// Embed the album cover into the tag when one can be fetched.
    pub embed_cover: bool,

    /// HTTP(S) proxy for the metadata fetches.
    pub proxy: Option<String>,

    /// Proxy for control traffic; takes precedence over `proxy`.
    pub control_proxy: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            audio_file_dir: PathBuf::from("."),
            audio_file_name: String::from("%artist/%album/%title"),
            use_spaces: false,
            embed_cover: true,
            proxy: None,
            control_proxy: None,
        }
    }
}
