//! tapedeck
//!
//! # What this crate is
//! The record-and-tag core of a streaming music player: every played song
//! is captured to disk as it streams and, once it finishes, stamped with a
//! metadata tag (ID3v2 for MP3, an iTunes-style atom subtree for MP4/AAC).
//!
//! # Per-song flow
//! - [`Recorder::open`] scrapes the album pages for the year, cover art
//!   URL, and track/disc numbers, renders the output path from the user's
//!   template, and creates the audio file (create-new-exclusive; an
//!   existing file means the song was recorded before and is skipped).
//! - [`Recorder::write`] appends each decoded audio block.
//! - [`Recorder::tag`] closes the stream and writes the container tag.
//! - [`Recorder::close`] deletes the partial file (plus any directories it
//!   left empty) when the song did not play to the end.
//!
//! # Architecture constraints (on purpose)
//! - The host player owns authentication, playlists, decoding, and the UI;
//!   this crate only ever sees one song's context and its decoded bytes.
//! - Tag writers never rewrite audio in place. Both build the new file in
//!   a temporary next to the target and rename it into place last, so a
//!   crash can't leave a half-tagged file.
//! - Scrape and cover fetches degrade, never abort: the worst outcome of a
//!   missing page is a sparser tag.
//!
//! # Concurrency model
//! Single threaded and blocking, by design. The player calls in from its
//! playback loop; the only waiting is network and filesystem I/O. The one
//! process-wide resource is the [`HttpFetcher`] built by [`init`], which
//! lives until shutdown and is passed by reference wherever it is needed.

pub mod error;
pub mod fetch;
pub mod naming;
pub mod recorder;
pub mod scrape;
pub mod settings;
pub mod sink;
pub mod tags;
pub mod types;

pub use error::{Error, Result};
pub use fetch::{Fetch, HttpFetcher};
pub use recorder::{init, status_string, Recorder, Status};
pub use settings::Settings;
pub use types::{AudioFormat, Song, TrackMeta};
