//! tags/id3.rs
//!
//! ID3v2.4 tag construction and on-disk prepend.
//!
//! The tag is assembled in memory frame by frame and rendered twice: once
//! against a null sink to learn the exact byte length, then into a buffer
//! of that length. Both passes share one walk, and a disagreement between
//! them fails the write.
//!
//! Prepending to an already recorded MP3 without rewriting it in place
//! works through a temporary file: the tag goes in first, the audio stream
//! is copied after it block by block, and a rename swaps the result over
//! the original. If anything goes wrong before the rename the original is
//! left byte for byte as it was.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::{Error, Result};

use super::art;
use super::util::{copy_to_end, replace_file};

/// "ID3" marker, version 2.4.0.
const TAG_MAGIC: &[u8] = b"ID3";
const TAG_VERSION: [u8; 2] = [0x04, 0x00];
const TAG_HEADER_LEN: usize = 10;

/// Tag header flag: unsynchronisation applied to all frames.
const TAG_FLAG_UNSYNC: u8 = 0x80;
/// Frame format flag: the frame body is unsynchronised.
const FRAME_FLAG_UNSYNC: u8 = 0x02;

/// Text encoding byte for Latin-1 string fields.
const ENCODING_LATIN1: u8 = 0x00;
/// APIC picture type for the front cover.
const PICTURE_TYPE_FRONT_COVER: u8 = 0x03;

/// Largest value a 28-bit syncsafe integer can hold.
const SYNCSAFE_MAX: usize = 0x0FFF_FFFF;

enum FrameBody {
    /// A text information frame holding one string-list entry.
    Text(String),
    /// An attached picture frame (APIC).
    Picture { mime: &'static str, data: Vec<u8> },
}

struct Frame {
    id: [u8; 4],
    body: FrameBody,
}

/// An ID3v2.4 tag under construction. Frames render in insertion order.
pub struct Id3Tag {
    frames: Vec<Frame>,
}

impl Id3Tag {
    pub fn new() -> Self {
        Self { frames: Vec::new() }
    }

    /// Add a text frame. The value's bytes are written verbatim into the
    /// frame's Latin-1 string field; no transcoding is attempted.
    pub fn add_text(&mut self, id: &[u8; 4], value: &str) {
        self.frames.push(Frame {
            id: *id,
            body: FrameBody::Text(value.to_string()),
        });
    }

    /// Add the front cover picture. The MIME type is sniffed from the
    /// image's magic bytes; unrecognized data is stored with an empty one.
    pub fn add_cover(&mut self, data: Vec<u8>) {
        self.frames.push(Frame {
            id: *b"APIC",
            body: FrameBody::Picture {
                mime: art::mime_type(&data),
                data,
            },
        });
    }

    /// Render the tag, returning its total byte length. With `out` set to
    /// `None` the size is computed without producing output.
    fn render(&self, out: Option<&mut Vec<u8>>) -> usize {
        let mut body = Vec::new();
        for frame in &self.frames {
            render_frame(frame, &mut body);
        }

        let total = TAG_HEADER_LEN + body.len();
        if let Some(out) = out {
            out.extend_from_slice(TAG_MAGIC);
            out.extend_from_slice(&TAG_VERSION);
            out.push(TAG_FLAG_UNSYNC);
            out.extend_from_slice(&syncsafe(body.len()));
            out.extend_from_slice(&body);
        }

        total
    }

    /// Prepend the rendered tag to the finished audio file at `path`.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let measured = self.render(None);
        if measured - TAG_HEADER_LEN > SYNCSAFE_MAX {
            return Err(Error::TagTooLarge(measured));
        }

        let mut tag_bytes = Vec::with_capacity(measured);
        let rendered = self.render(Some(&mut tag_bytes));
        if rendered != measured {
            return Err(Error::TagSizeMismatch { measured, rendered });
        }

        let mut audio = File::open(path)?;
        replace_file(path, |tmp| {
            tmp.write_all(&tag_bytes)?;
            copy_to_end(&mut audio, tmp)?;
            Ok(())
        })
    }
}

fn render_frame(frame: &Frame, out: &mut Vec<u8>) {
    let mut body = Vec::new();

    match &frame.body {
        FrameBody::Text(value) => {
            body.push(ENCODING_LATIN1);
            body.extend_from_slice(value.as_bytes());
        }
        FrameBody::Picture { mime, data } => {
            body.push(ENCODING_LATIN1);
            body.extend_from_slice(mime.as_bytes());
            body.push(0x00);
            body.push(PICTURE_TYPE_FRONT_COVER);
            body.push(0x00); // empty description
            body.extend_from_slice(data);
        }
    }

    let body = unsynchronise(&body);

    out.extend_from_slice(&frame.id);
    out.extend_from_slice(&syncsafe(body.len()));
    out.push(0x00);
    out.push(FRAME_FLAG_UNSYNC);
    out.extend_from_slice(&body);
}

/// Apply the unsynchronisation scheme: a zero byte is inserted after every
/// `FF` that precedes `00` or a byte of `E0` and above, and after a
/// trailing `FF`.
fn unsynchronise(body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(body.len());
    let mut bytes = body.iter().copied().peekable();

    while let Some(b) = bytes.next() {
        out.push(b);
        if b == 0xFF {
            match bytes.peek() {
                Some(&next) if next == 0x00 || next >= 0xE0 => out.push(0x00),
                None => out.push(0x00),
                _ => {}
            }
        }
    }

    out
}

/// Encode a length as a 28-bit syncsafe integer (7 bits per byte).
fn syncsafe(len: usize) -> [u8; 4] {
    let len = len as u32;
    [
        ((len >> 21) & 0x7F) as u8,
        ((len >> 14) & 0x7F) as u8,
        ((len >> 7) & 0x7F) as u8,
        (len & 0x7F) as u8,
    ]
}
