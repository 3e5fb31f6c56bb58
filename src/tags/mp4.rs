//! tags/mp4.rs
//!
//! iTunes-style MP4 metadata editing.
//!
//! This is not a general MP4 handler; it does exactly what tagging a fresh
//! recording needs. Opening a tag parses the `moov` atom tree into memory
//! (payloads stay in the file until they are actually touched), metadata
//! atoms are spliced in under `moov.udta.meta.ilst`, and writing streams a
//! new file together from three pieces: everything before `moov`, the
//! rebuilt `moov`, and everything after it.
//!
//! Assumptions about the input file:
//! - the first atom is `ftyp` and the second is `moov`
//! - no `udta` atom (or any of its children) exists yet
//! - chunk offsets live in a 32-bit `stco` table; files carrying `co64`
//!   are rejected when the unknown atom is hit
//!
//! Growing `moov` shifts everything behind it, so every `stco` entry is
//! raised by the size of each atom spliced in. That accounting is why
//! atoms must be fully built before they are attached to the tag.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

use super::util::{copy_exact, copy_to_end, replace_file};

/// Size field plus name field.
const ATOM_HEADER_LEN: u64 = 8;

/// Atoms that hold only child atoms.
const CONTAINER_ATOMS: [&[u8; 4]; 6] = [b"dinf", b"mdia", b"minf", b"moov", b"stbl", b"trak"];

/// Atoms that hold only a payload.
const PAYLOAD_ATOMS: [&[u8; 4]; 12] = [
    b"dref", b"esds", b"hdlr", b"iods", b"mdhd", b"mvhd", b"smhd", b"stco", b"stsc", b"stsz",
    b"stts", b"tkhd",
];

/// Version and flags block of a fresh `meta` atom.
const META_PAYLOAD: [u8; 4] = [0x00; 4];

/// `hdlr` payload marking the subtree as an iTunes metadata directory.
const HDLR_PAYLOAD: [u8; 25] = [
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, b'm', b'd', b'i', b'r', b'a', b'p', b'p',
    b'l', 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

/// Data atom classes: UTF-8 text, opaque binary, JPEG/PNG image.
const CLASS_TEXT: [u8; 4] = [0x00, 0x00, 0x00, 0x01];
const CLASS_BINARY: [u8; 4] = [0x00, 0x00, 0x00, 0x00];
const CLASS_IMAGE: [u8; 4] = [0x00, 0x00, 0x00, 0x15];

/// Where the `stco` table lives when the file has one.
const STCO_PATH: &str = "moov.trak.mdia.minf.stbl.stco";

type AtomId = usize;

#[derive(Debug)]
enum Payload {
    /// Payload bytes still live in the source file.
    InFile { offset: u64, len: u64 },
    /// Payload bytes held (or freshly created) in memory.
    InMemory(Vec<u8>),
}

impl Payload {
    fn len(&self) -> u64 {
        match self {
            Payload::InFile { len, .. } => *len,
            Payload::InMemory(buf) => buf.len() as u64,
        }
    }
}

#[derive(Debug)]
struct Atom {
    name: [u8; 4],
    /// Total rendered size: header plus payload plus children.
    size: u64,
    parent: Option<AtomId>,
    children: Vec<AtomId>,
    payload: Payload,
}

/// An MP4 file opened for metadata insertion.
///
/// Holds the parsed `moov` tree plus a read handle on the source file for
/// payloads that were never pulled into memory.
#[derive(Debug)]
pub struct Mp4Tag {
    path: PathBuf,
    file: File,
    atoms: Vec<Atom>,
    /// Top-level atoms owned by the tag; only `moov` in practice.
    top: Vec<AtomId>,
    /// Where `moov` starts in the source file.
    moov_offset: u64,
    /// Its size in the source file, before any edits.
    moov_source_size: u64,
}

impl Mp4Tag {
    /// Parse the atom tree of the file at `path`.
    ///
    /// Only the `ftyp` header and the `moov` tree are examined; any other
    /// layout is refused and nothing is modified.
    pub fn open(path: &Path) -> Result<Self> {
        let mut file = File::open(path)?;

        let (ftyp_size, ftyp_name) = read_atom_header(&mut file)?;
        if &ftyp_name != b"ftyp" {
            return Err(Error::Mp4Layout("the first atom is not 'ftyp'".into()));
        }
        if ftyp_size < ATOM_HEADER_LEN {
            return Err(Error::Mp4AtomSize {
                name: name_str(&ftyp_name),
                size: ftyp_size,
            });
        }

        let mut tag = Self {
            path: path.to_path_buf(),
            file,
            atoms: Vec::new(),
            top: Vec::new(),
            moov_offset: ftyp_size,
            moov_source_size: 0,
        };

        let (moov, moov_size) = tag.parse_atom(tag.moov_offset)?;
        if &tag.atoms[moov].name != b"moov" {
            return Err(Error::Mp4Layout("the second atom is not 'moov'".into()));
        }
        tag.moov_source_size = moov_size;
        tag.top.push(moov);

        Ok(tag)
    }

    /// Add the artist name to the tag.
    pub fn add_artist(&mut self, artist: &str) -> Result<()> {
        self.add_meta_atom(b"\xA9ART", &CLASS_TEXT, artist.as_bytes())
    }

    /// Add the album name to the tag.
    pub fn add_album(&mut self, album: &str) -> Result<()> {
        self.add_meta_atom(b"\xA9alb", &CLASS_TEXT, album.as_bytes())
    }

    /// Add the song title to the tag.
    pub fn add_title(&mut self, title: &str) -> Result<()> {
        self.add_meta_atom(b"\xA9nam", &CLASS_TEXT, title.as_bytes())
    }

    /// Add the release year to the tag.
    pub fn add_year(&mut self, year: u16) -> Result<()> {
        self.add_meta_atom(b"\xA9day", &CLASS_TEXT, year.to_string().as_bytes())
    }

    /// Add the track number to the tag.
    pub fn add_track(&mut self, track: u16) -> Result<()> {
        let mut value = [0u8; 8];
        value[2..4].copy_from_slice(&track.to_be_bytes());
        self.add_meta_atom(b"trkn", &CLASS_BINARY, &value)
    }

    /// Add the disc number to the tag.
    pub fn add_disc(&mut self, disc: u16) -> Result<()> {
        let mut value = [0u8; 8];
        value[2..4].copy_from_slice(&disc.to_be_bytes());
        self.add_meta_atom(b"disk", &CLASS_BINARY, &value)
    }

    /// Add the cover image to the tag, bytes verbatim.
    pub fn add_cover(&mut self, image: &[u8]) -> Result<()> {
        self.add_meta_atom(b"covr", &CLASS_IMAGE, image)
    }

    /// Rewrite the file with the updated `moov` tree.
    ///
    /// Writes a temporary file from three pieces (head copy, rebuilt
    /// `moov`, tail copy) and renames it over the source. Any failure
    /// before the rename leaves the source untouched.
    pub fn write(mut self) -> Result<()> {
        let moov = self
            .find("moov")
            .ok_or_else(|| Error::Mp4Layout("the tag holds no 'moov' atom".into()))?;

        let path = self.path.clone();
        let tail_offset = self.moov_offset + self.moov_source_size;

        replace_file(&path, move |tmp| {
            self.file.seek(SeekFrom::Start(0))?;
            copy_exact(&mut self.file, tmp, self.moov_offset)?;

            self.render_atom(moov, tmp)?;

            self.file.seek(SeekFrom::Start(tail_offset))?;
            copy_to_end(&mut self.file, tmp)?;
            Ok(())
        })
    }

    fn alloc(&mut self, atom: Atom) -> AtomId {
        self.atoms.push(atom);
        self.atoms.len() - 1
    }

    /// A freshly constructed atom: empty payload, no file position.
    fn new_atom(&mut self, name: &[u8; 4]) -> AtomId {
        self.alloc(Atom {
            name: *name,
            size: ATOM_HEADER_LEN,
            parent: None,
            children: Vec::new(),
            payload: Payload::InMemory(Vec::new()),
        })
    }

    /// Parse the atom starting at `offset`, recursing into its children.
    /// Returns the new atom and its size as declared in the file.
    fn parse_atom(&mut self, offset: u64) -> Result<(AtomId, u64)> {
        self.file.seek(SeekFrom::Start(offset))?;
        let (declared, name) = read_atom_header(&mut self.file)?;
        if declared < ATOM_HEADER_LEN {
            return Err(Error::Mp4AtomSize {
                name: name_str(&name),
                size: declared,
            });
        }

        // Classify by name: children only, payload only, or a fixed-width
        // payload followed by children.
        let payload_len = if CONTAINER_ATOMS.contains(&&name) {
            0
        } else if PAYLOAD_ATOMS.contains(&&name) {
            declared - ATOM_HEADER_LEN
        } else if &name == b"stsd" {
            8
        } else if &name == b"mp4a" {
            28
        } else {
            return Err(Error::Mp4UnknownAtom(name_str(&name)));
        };

        if payload_len > declared - ATOM_HEADER_LEN {
            return Err(Error::Mp4AtomSize {
                name: name_str(&name),
                size: declared,
            });
        }

        let payload = if payload_len > 0 {
            Payload::InFile {
                offset: offset + ATOM_HEADER_LEN,
                len: payload_len,
            }
        } else {
            Payload::InMemory(Vec::new())
        };

        let id = self.alloc(Atom {
            name,
            size: ATOM_HEADER_LEN + payload_len,
            parent: None,
            children: Vec::new(),
            payload,
        });

        let mut child_offset = offset + ATOM_HEADER_LEN + payload_len;
        let mut remaining = declared - ATOM_HEADER_LEN - payload_len;
        while remaining > 0 {
            let (child, child_size) = self.parse_atom(child_offset)?;
            if child_size > remaining {
                return Err(Error::Mp4Layout(
                    "child atom sizes are larger than their parent".into(),
                ));
            }
            remaining -= child_size;
            child_offset += child_size;
            self.attach_child(id, child);
        }

        Ok((id, declared))
    }

    /// Append `child` to `parent`'s children, bumping every ancestor's
    /// size. The child belongs to the parent from here on.
    fn attach_child(&mut self, parent: AtomId, child: AtomId) {
        let delta = self.atoms[child].size as i64;
        self.atoms[child].parent = Some(parent);
        self.atoms[parent].children.push(child);
        self.bump_size(parent, delta);
    }

    /// Propagate a size change up the parent chain.
    fn bump_size(&mut self, mut id: AtomId, delta: i64) {
        loop {
            let atom = &mut self.atoms[id];
            atom.size = (atom.size as i64 + delta) as u64;
            match atom.parent {
                Some(parent) => id = parent,
                None => break,
            }
        }
    }

    /// True once the atom is reachable from the tag's top level.
    fn attached(&self, id: AtomId) -> bool {
        self.atoms[id].parent.is_some() || self.top.contains(&id)
    }

    /// Ensure the payload is held in memory and return it for mutation.
    fn materialize(&mut self, id: AtomId) -> Result<&mut Vec<u8>> {
        if let Payload::InFile { offset, len } = self.atoms[id].payload {
            let mut buf = vec![0u8; len as usize];
            self.file.seek(SeekFrom::Start(offset))?;
            self.file.read_exact(&mut buf)?;
            self.atoms[id].payload = Payload::InMemory(buf);
        }

        match &mut self.atoms[id].payload {
            Payload::InMemory(buf) => Ok(buf),
            Payload::InFile { .. } => Err(Error::Mp4Payload("atom")),
        }
    }

    /// Append bytes to an atom's payload, bumping sizes up the chain.
    ///
    /// Refused once the atom is attached to the tag: in-place growth after
    /// that would slip past the chunk-offset accounting.
    fn append_data(&mut self, id: AtomId, data: &[u8]) -> Result<()> {
        if data.is_empty() {
            return Ok(());
        }
        if self.attached(id) {
            return Err(Error::AppendAfterAttach);
        }

        self.materialize(id)?.extend_from_slice(data);
        self.bump_size(id, data.len() as i64);
        Ok(())
    }

    /// Look up an atom by a '.'-separated name path from the top level.
    fn find(&self, path: &str) -> Option<AtomId> {
        let mut parts = path.split('.');

        let first = parts.next()?;
        let mut current = *self
            .top
            .iter()
            .find(|&&id| self.atoms[id].name == first.as_bytes())?;

        for part in parts {
            current = self.atoms[current]
                .children
                .iter()
                .copied()
                .find(|&child| self.atoms[child].name == part.as_bytes())?;
        }

        Some(current)
    }

    /// Attach an atom to the tag under `parent_path` (empty for top level).
    ///
    /// With `update_offsets` set, every `stco` entry is raised by the
    /// atom's size so the media chunks stay addressable after the insert.
    /// Atoms parsed from the file are attached without the update.
    fn add_atom(&mut self, parent_path: &str, atom: AtomId, update_offsets: bool) -> Result<()> {
        if parent_path.is_empty() {
            self.top.push(atom);
        } else {
            let parent = self
                .find(parent_path)
                .ok_or_else(|| Error::Mp4NoSuchPath(parent_path.to_string()))?;
            self.attach_child(parent, atom);
        }

        if update_offsets {
            let delta = self.atoms[atom].size;
            self.update_chunk_offsets(delta)?;
        }

        Ok(())
    }

    /// Raise every 32-bit `stco` entry by `delta`. A file without an
    /// `stco` table is left alone.
    fn update_chunk_offsets(&mut self, delta: u64) -> Result<()> {
        let stco = match self.find(STCO_PATH) {
            Some(id) => id,
            None => return Ok(()),
        };

        let buf = self.materialize(stco)?;
        if buf.len() < 8 {
            return Err(Error::Mp4Payload("stco"));
        }

        let count = u32::from_be_bytes([buf[4], buf[5], buf[6], buf[7]]) as usize;
        if buf.len() < 8 + count * 4 {
            return Err(Error::Mp4Payload("stco"));
        }

        for i in 0..count {
            let at = 8 + i * 4;
            let entry = u32::from_be_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]]);
            let shifted =
                u32::try_from(entry as u64 + delta).map_err(|_| Error::Mp4Overflow)?;
            buf[at..at + 4].copy_from_slice(&shifted.to_be_bytes());
        }

        Ok(())
    }

    /// Create `moov.udta.meta.{hdlr,ilst}` if the chain is not there yet.
    fn ensure_ilst(&mut self) -> Result<()> {
        if self.find("moov.udta.meta.ilst").is_some() {
            return Ok(());
        }

        if self.find("moov.udta").is_none() {
            let udta = self.new_atom(b"udta");
            self.add_atom("moov", udta, true)?;
        }

        if self.find("moov.udta.meta").is_none() {
            let meta = self.new_atom(b"meta");
            self.append_data(meta, &META_PAYLOAD)?;
            self.add_atom("moov.udta", meta, true)?;
        }

        if self.find("moov.udta.meta.hdlr").is_none() {
            let hdlr = self.new_atom(b"hdlr");
            self.append_data(hdlr, &HDLR_PAYLOAD)?;
            self.add_atom("moov.udta.meta", hdlr, true)?;
        }

        let ilst = self.new_atom(b"ilst");
        self.add_atom("moov.udta.meta", ilst, true)
    }

    /// Add one metadata value: `<name>` wrapping a `data` atom whose
    /// payload is the class, four zero bytes, then the value.
    fn add_meta_atom(&mut self, name: &[u8; 4], class: &[u8; 4], value: &[u8]) -> Result<()> {
        self.ensure_ilst()?;

        let item = self.new_atom(name);
        let data = self.new_atom(b"data");
        self.append_data(data, class)?;
        self.append_data(data, &[0x00; 4])?;
        self.append_data(data, value)?;
        self.attach_child(item, data);

        self.add_atom("moov.udta.meta.ilst", item, true)
    }

    /// Write one atom and its children: size, name, payload (streamed from
    /// the source file when it was never pulled into memory), children.
    fn render_atom(&mut self, id: AtomId, out: &mut File) -> Result<()> {
        let size = u32::try_from(self.atoms[id].size).map_err(|_| Error::Mp4Overflow)?;
        out.write_all(&size.to_be_bytes())?;
        out.write_all(&self.atoms[id].name)?;

        match self.atoms[id].payload {
            Payload::InFile { offset, len } => {
                self.file.seek(SeekFrom::Start(offset))?;
                copy_exact(&mut self.file, out, len)?;
            }
            Payload::InMemory(ref buf) => {
                out.write_all(buf)?;
            }
        }

        let children = self.atoms[id].children.clone();
        for child in children {
            self.render_atom(child, out)?;
        }

        Ok(())
    }
}

fn read_atom_header(file: &mut File) -> Result<(u64, [u8; 4])> {
    let mut header = [0u8; 8];
    file.read_exact(&mut header)?;

    let size = u32::from_be_bytes([header[0], header[1], header[2], header[3]]) as u64;
    let name = [header[4], header[5], header[6], header[7]];
    Ok((size, name))
}

fn name_str(name: &[u8; 4]) -> String {
    String::from_utf8_lossy(name).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// Serialize one atom with the given payload and children.
    fn atom(name: &[u8; 4], payload: &[u8], children: &[Vec<u8>]) -> Vec<u8> {
        let size = 8 + payload.len() + children.iter().map(Vec::len).sum::<usize>();
        let mut out = Vec::with_capacity(size);
        out.extend_from_slice(&(size as u32).to_be_bytes());
        out.extend_from_slice(name);
        out.extend_from_slice(payload);
        for child in children {
            out.extend_from_slice(child);
        }
        out
    }

    /// An stco payload: version/flags, entry count, entries.
    fn stco_payload(entries: &[u32]) -> Vec<u8> {
        let mut out = vec![0u8; 4];
        out.extend_from_slice(&(entries.len() as u32).to_be_bytes());
        for entry in entries {
            out.extend_from_slice(&entry.to_be_bytes());
        }
        out
    }

    /// A minimal valid file: ftyp, moov(mvhd, trak(mdia(minf(stbl(stco))))),
    /// then raw trailing media bytes.
    fn sample_file(stco_entries: &[u32], tail: &[u8]) -> Vec<u8> {
        let stco = atom(b"stco", &stco_payload(stco_entries), &[]);
        let stbl = atom(b"stbl", &[], &[stco]);
        let minf = atom(b"minf", &[], &[stbl]);
        let mdia = atom(b"mdia", &[], &[minf]);
        let trak = atom(b"trak", &[], &[mdia]);
        let mvhd = atom(b"mvhd", &vec![0u8; 100], &[]);
        let moov = atom(b"moov", &[], &[mvhd, trak]);

        let mut file = atom(b"ftyp", b"M4A \x00\x00\x02\x00M4A mp42isom", &[]);
        file.extend_from_slice(&moov);
        file.extend_from_slice(tail);
        file
    }

    fn write_sample(dir: &tempfile::TempDir, bytes: &[u8]) -> PathBuf {
        let path = dir.path().join("song.m4a");
        fs::write(&path, bytes).unwrap();
        path
    }

    fn be32(bytes: &[u8], at: usize) -> u32 {
        u32::from_be_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
    }

    fn find(haystack: &[u8], needle: &[u8]) -> usize {
        haystack
            .windows(needle.len())
            .position(|w| w == needle)
            .expect("pattern present")
    }

    #[test]
    fn open_requires_ftyp_then_moov() {
        let dir = tempfile::TempDir::new().unwrap();

        let not_ftyp = atom(b"mdat", b"xxxx", &[]);
        let path = write_sample(&dir, &not_ftyp);
        assert!(matches!(Mp4Tag::open(&path), Err(Error::Mp4Layout(_))));

        let mut ftyp_only = atom(b"ftyp", b"M4A ", &[]);
        ftyp_only.extend_from_slice(&atom(b"mdat", b"xxxx", &[]));
        let path = write_sample(&dir, &ftyp_only);
        assert!(Mp4Tag::open(&path).is_err());
    }

    #[test]
    fn open_rejects_unknown_atoms_such_as_co64() {
        let dir = tempfile::TempDir::new().unwrap();

        let co64 = atom(b"co64", &[0u8; 12], &[]);
        let stbl = atom(b"stbl", &[], &[co64]);
        let minf = atom(b"minf", &[], &[stbl]);
        let mdia = atom(b"mdia", &[], &[minf]);
        let trak = atom(b"trak", &[], &[mdia]);
        let moov = atom(b"moov", &[], &[trak]);
        let mut file = atom(b"ftyp", b"M4A ", &[]);
        file.extend_from_slice(&moov);

        let path = write_sample(&dir, &file);
        match Mp4Tag::open(&path) {
            Err(Error::Mp4UnknownAtom(name)) => assert_eq!(name, "co64"),
            other => panic!("expected Mp4UnknownAtom, got {other:?}"),
        }
    }

    #[test]
    fn open_rejects_children_larger_than_parent() {
        let dir = tempfile::TempDir::new().unwrap();

        // A trak whose declared size is smaller than its child's.
        let mdia = atom(b"mdia", &[], &[]);
        let mut trak = atom(b"trak", &[], &[mdia]);
        trak[..4].copy_from_slice(&12u32.to_be_bytes());
        let mut moov = atom(b"moov", &[], &[trak]);
        // Keep moov's declared size consistent with the truncated trak.
        moov[..4].copy_from_slice(&20u32.to_be_bytes());
        let mut file = atom(b"ftyp", b"M4A ", &[]);
        file.extend_from_slice(&moov);

        let path = write_sample(&dir, &file);
        assert!(Mp4Tag::open(&path).is_err());
    }

    #[test]
    fn sizes_account_for_payload_and_children() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = write_sample(&dir, &sample_file(&[500, 900], b"mdat-tail"));

        let mut tag = Mp4Tag::open(&path).unwrap();
        tag.add_artist("A").unwrap();
        tag.add_track(3).unwrap();

        for atom in &tag.atoms {
            let children: u64 = atom.children.iter().map(|&c| tag.atoms[c].size).sum();
            assert_eq!(
                atom.size,
                8 + atom.payload.len() + children,
                "size accounting broken for {:?}",
                name_str(&atom.name)
            );
        }
    }

    #[test]
    fn append_after_attach_is_refused() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = write_sample(&dir, &sample_file(&[500], b""));

        let mut tag = Mp4Tag::open(&path).unwrap();
        let udta = tag.new_atom(b"udta");
        tag.add_atom("moov", udta, true).unwrap();

        assert!(matches!(
            tag.append_data(udta, b"late"),
            Err(Error::AppendAfterAttach)
        ));
    }

    #[test]
    fn write_preserves_bytes_outside_moov_and_shifts_stco() {
        let dir = tempfile::TempDir::new().unwrap();
        let tail = b"mdat pretend media bytes";
        let input = sample_file(&[500, 900], tail);
        let path = write_sample(&dir, &input);

        let moov_offset = {
            let tag = Mp4Tag::open(&path).unwrap();
            tag.moov_offset as usize
        };
        let old_moov_size = be32(&input, moov_offset) as usize;

        let mut tag = Mp4Tag::open(&path).unwrap();
        tag.add_artist("A").unwrap();
        tag.write().unwrap();

        let output = fs::read(&path).unwrap();
        let new_moov_size = be32(&output, moov_offset) as usize;
        let growth = (new_moov_size - old_moov_size) as u32;
        assert!(growth > 0);

        // Head and tail are byte-identical, shifted only by moov's growth.
        assert_eq!(&output[..moov_offset], &input[..moov_offset]);
        assert_eq!(
            &output[moov_offset + new_moov_size..],
            &input[moov_offset + old_moov_size..]
        );
        assert_eq!(output.len(), input.len() + growth as usize);

        // Every stco entry moved by exactly the growth.
        let stco_at = find(&output, b"stco");
        assert_eq!(be32(&output, stco_at + 8), 2);
        assert_eq!(be32(&output, stco_at + 12), 500 + growth);
        assert_eq!(be32(&output, stco_at + 16), 900 + growth);
    }

    #[test]
    fn write_builds_the_ilst_subtree() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = write_sample(&dir, &sample_file(&[500], b"mdat"));

        let mut tag = Mp4Tag::open(&path).unwrap();
        tag.add_artist("A").unwrap();
        tag.add_year(1998).unwrap();
        tag.add_track(3).unwrap();
        tag.write().unwrap();

        let output = fs::read(&path).unwrap();

        // hdlr carries the iTunes marker.
        let hdlr_at = find(&output, b"hdlr");
        assert_eq!(&output[hdlr_at + 12..hdlr_at + 20], b"mdirappl");

        // The artist atom wraps a text-class data atom holding "A".
        let artist_at = find(&output, b"\xA9ART");
        let expected: &[u8] = &[
            0x00, 0x00, 0x00, 0x11, b'd', b'a', b't', b'a', 0x00, 0x00, 0x00, 0x01, 0x00, 0x00,
            0x00, 0x00, b'A',
        ];
        assert_eq!(&output[artist_at + 4..artist_at + 4 + expected.len()], expected);

        // The track atom's value is big-endian at offset 2 of 8 bytes.
        let trkn_at = find(&output, b"trkn");
        let data = &output[trkn_at + 4..];
        assert_eq!(&data[..4], &[0x00, 0x00, 0x00, 0x14]);
        assert_eq!(&data[4..8], b"data");
        assert_eq!(&data[8..12], &[0x00, 0x00, 0x00, 0x00]);
        assert_eq!(&data[16..24], &[0, 0, 0, 3, 0, 0, 0, 0]);

        // The year renders as a decimal string.
        let day_at = find(&output, b"\xA9day");
        let day_data = &output[day_at + 4..];
        assert_eq!(&day_data[16..20], b"1998");
    }

    #[test]
    fn metadata_is_appended_after_existing_moov_children() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = write_sample(&dir, &sample_file(&[500], b""));

        let mut tag = Mp4Tag::open(&path).unwrap();
        tag.add_title("T").unwrap();
        tag.write().unwrap();

        let output = fs::read(&path).unwrap();
        let trak_at = find(&output, b"trak");
        let udta_at = find(&output, b"udta");
        assert!(udta_at > trak_at);
    }

    #[test]
    fn failed_write_leaves_the_source_alone() {
        let dir = tempfile::TempDir::new().unwrap();

        // stco whose declared entry count overruns its payload.
        let mut bad_stco_payload = vec![0u8; 4];
        bad_stco_payload.extend_from_slice(&100u32.to_be_bytes());
        let stco = atom(b"stco", &bad_stco_payload, &[]);
        let stbl = atom(b"stbl", &[], &[stco]);
        let minf = atom(b"minf", &[], &[stbl]);
        let mdia = atom(b"mdia", &[], &[minf]);
        let trak = atom(b"trak", &[], &[mdia]);
        let moov = atom(b"moov", &[], &[trak]);
        let mut input = atom(b"ftyp", b"M4A ", &[]);
        input.extend_from_slice(&moov);

        let path = write_sample(&dir, &input);
        let mut tag = Mp4Tag::open(&path).unwrap();
        assert!(tag.add_artist("A").is_err());

        assert_eq!(fs::read(&path).unwrap(), input);
        // No stray temp file next to the source.
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
