//! Per-song recording lifecycle.
//!
//! One `Recorder` exists per played song. The player opens it when the
//! song starts, feeds it every decoded audio block, then either finishes
//! (the file gets its metadata tag) or aborts (the partial file and any
//! directories it created are removed).
//!
//! Metadata scraping is strictly best effort: a missing year or cover
//! never stops a recording, it just leaves that field out of the tag.

use std::env;
use std::fs;
use std::os::unix::fs::DirBuilderExt;
use std::path::{Path, PathBuf};

use tracing::{debug, error};

use crate::error::{Error, Result};
use crate::fetch::{Fetch, HttpFetcher};
use crate::naming;
use crate::scrape;
use crate::settings::Settings;
use crate::sink::{self, Sink};
use crate::tags;
use crate::types::{AudioFormat, Song, TrackMeta};

/// What the recorder is doing right now, as shown in the player UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    NotRecording,
    NotRecordingExist,
    Recording,
    Deleting,
    Tagging,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::NotRecording => "Not Recording",
            Status::NotRecordingExist => "Not Recording (file exists)",
            Status::Recording => "Recording",
            Status::Deleting => "Deleting (partial file)",
            Status::Tagging => "Tagging",
        }
    }
}

/// Status line for the player UI. `None` stands for a song with no
/// recorder at all.
pub fn status_string(recorder: Option<&Recorder>) -> &'static str {
    recorder.map_or("Unknown", |r| r.status().as_str())
}

/// Prepare the recording module: build the shared fetcher, create the
/// recording root, and change into it.
///
/// The returned fetcher is the one process-wide resource; pass it to every
/// [`Recorder::open`] and [`Recorder::tag`] call and drop it at shutdown.
/// A proxy that cannot be applied is reported and skipped rather than
/// blocking recording.
pub fn init(settings: &Settings) -> Result<HttpFetcher> {
    let proxy = settings.control_proxy.as_deref().or(settings.proxy.as_deref());

    let fetcher = match HttpFetcher::new(proxy) {
        Ok(fetcher) => fetcher,
        Err(err) => {
            error!(%err, proxy = proxy.unwrap_or(""), "could not set the proxy");
            HttpFetcher::new(None)?
        }
    };

    if !settings.audio_file_dir.as_os_str().is_empty() {
        let mut dirs = fs::DirBuilder::new();
        dirs.recursive(true).mode(0o755);
        dirs.create(&settings.audio_file_dir)?;
        env::set_current_dir(&settings.audio_file_dir)?;
    }

    Ok(fetcher)
}

/// Records one song to disk and tags it when it finishes.
pub struct Recorder {
    path: PathBuf,
    /// Directory the delete walk must never remove or escape.
    root: PathBuf,
    sink: Option<Sink>,
    format: AudioFormat,
    artist: String,
    album: String,
    title: String,
    meta: TrackMeta,
    /// Set once the file on disk is worth keeping: either the song was
    /// fully recorded (tagged or not) or the file existed beforehand.
    completed: bool,
    closed: bool,
    status: Status,
}

impl Recorder {
    /// Start recording `song`.
    ///
    /// Scrapes the album pages for the year, cover URL, and track/disc
    /// numbers (all best effort), renders the output path, and creates the
    /// audio file. If the file already exists the recorder comes back in
    /// the NotRecordingExist state with nothing to do; that is success.
    pub fn open(song: &Song, fetcher: &dyn Fetch, settings: &Settings) -> Result<Self> {
        let mut meta = TrackMeta::default();

        // Album detail page: release year and cover art URL.
        match fetcher.fetch(&song.album_detail_url) {
            Ok(body) => {
                let html = String::from_utf8_lossy(&body);
                match scrape::extract_year(&html) {
                    Some(year) => meta.year = year,
                    None => debug!(album = %song.album, "no release year for the tag"),
                }
                match scrape::extract_cover_url(&html) {
                    Some(url) => meta.cover_url = Some(url),
                    None => debug!(album = %song.album, "no cover art for the tag"),
                }
            }
            Err(err) => {
                debug!(%err, "couldn't get the album detail page; year and cover art will be missing from the tag");
            }
        }

        // Album explorer page: track and disc numbers.
        match fetcher.fetch(&song.album_explorer_url) {
            Ok(body) => {
                let xml = String::from_utf8_lossy(&body);
                match scrape::extract_track_disc(&song.title, &xml) {
                    Some((track, disc)) => {
                        meta.track = track;
                        meta.disc = disc;
                    }
                    None => debug!(title = %song.title, "no track/disc numbers for the tag"),
                }
            }
            Err(err) => {
                debug!(%err, "couldn't get the album explorer page; track and disc numbers will be missing from the tag");
            }
        }

        let path = naming::render(
            &song.artist,
            &song.album,
            &song.title,
            &meta,
            song.format,
            &settings.audio_file_name,
            settings.use_spaces,
        );
        let root = if path.is_absolute() {
            settings.audio_file_dir.clone()
        } else {
            // Relative to the recording root we changed into at init; the
            // delete walk stops at the first empty ancestor.
            PathBuf::new()
        };

        let mut recorder = Self {
            path,
            root,
            sink: None,
            format: song.format,
            artist: song.artist.clone(),
            album: song.album.clone(),
            title: song.title.clone(),
            meta,
            completed: false,
            closed: false,
            status: Status::NotRecording,
        };

        match Sink::create(&recorder.path) {
            Ok(sink) => {
                recorder.sink = Some(sink);
                recorder.status = Status::Recording;
                Ok(recorder)
            }
            Err(Error::FileExists(_)) => {
                debug!(path = %recorder.path.display(), "the audio file already exists; it will not be recorded");
                recorder.completed = true;
                recorder.status = Status::NotRecordingExist;
                Ok(recorder)
            }
            Err(err) => {
                error!(%err, path = %recorder.path.display(), "error opening the audio file for writing");
                Err(err)
            }
        }
    }

    /// Append a block of decoded audio. Does nothing once the song is
    /// complete (including the file-already-existed case).
    pub fn write(&mut self, data: &[u8]) -> Result<()> {
        if self.completed {
            return Ok(());
        }
        match self.sink.as_mut() {
            Some(sink) => sink.append(data),
            None => Ok(()),
        }
    }

    /// Close the audio stream and write the metadata tag.
    ///
    /// Call this only when the song played to the end. The song counts as
    /// complete afterwards even if tagging failed, so a tag-less recording
    /// is kept rather than deleted.
    pub fn tag(&mut self, fetcher: &dyn Fetch, settings: &Settings) -> Result<()> {
        if self.completed {
            return Ok(());
        }
        self.status = Status::Tagging;

        let mut result = Ok(());
        if let Some(sink) = self.sink.take() {
            result = sink.close();
        }

        if result.is_ok() {
            let cover = self.fetch_cover(fetcher, settings);
            result = tags::write_tag(
                &self.path,
                self.format,
                &self.artist,
                &self.album,
                &self.title,
                &self.meta,
                cover,
            );
            if let Err(err) = &result {
                error!(%err, path = %self.path.display(), "failed to write the tag");
            }
        }

        self.completed = true;
        result
    }

    /// Close the recorder. A song that never completed leaves a partial
    /// file behind; it is removed here together with any parent
    /// directories that are now empty. Calling close again is a no-op.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.sink = None;

        if self.completed {
            return Ok(());
        }

        self.status = Status::Deleting;
        sink::delete_with_empty_parents(&self.path, &self.root)
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// Where the recording is (or would have been) written.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn completed(&self) -> bool {
        self.completed
    }

    /// Metadata gathered for this song so far.
    pub fn meta(&self) -> &TrackMeta {
        &self.meta
    }

    fn fetch_cover(&self, fetcher: &dyn Fetch, settings: &Settings) -> Option<Vec<u8>> {
        if !settings.embed_cover {
            return None;
        }
        let url = self.meta.cover_url.as_deref()?;

        match fetcher.fetch(url) {
            Ok(bytes) => Some(bytes),
            Err(err) => {
                debug!(%err, url, "could not get the cover art; the tag will be written without it");
                None
            }
        }
    }
}
