//! Audio file naming: template substitution and filesystem-safe names.
//!
//! Pure string work, no I/O. The player's template decides the directory
//! layout; this module only guarantees that whatever the service called an
//! artist or album can actually be used as a path component.

use std::path::PathBuf;

use crate::types::{AudioFormat, TrackMeta};

/// Longest sanitized name we will emit for a single field, in bytes.
const NAME_MAX: usize = 255;

/// Make one metadata field safe to use inside a file path.
///
/// - `/ \ | : ; * `` ` `` ` become `-`
/// - `<` becomes `(`, `>` becomes `)`
/// - a space becomes `_` unless `use_spaces` is set
/// - `"` and `?` are dropped
/// - everything else is preserved byte for byte
///
/// The result is capped at 255 bytes. Multibyte characters are never split
/// by the cap, but no normalization or validation is attempted beyond that.
pub fn translate_name(src: &str, use_spaces: bool) -> String {
    let mut out = String::with_capacity(src.len().min(NAME_MAX));

    for ch in src.chars() {
        let mapped = match ch {
            '/' | '\\' | '|' | ':' | ';' | '*' | '`' => Some('-'),
            '<' => Some('('),
            '>' => Some(')'),
            ' ' if !use_spaces => Some('_'),
            '"' | '?' => None,
            other => Some(other),
        };

        if let Some(c) = mapped {
            if out.len() + c.len_utf8() > NAME_MAX {
                break;
            }
            out.push(c);
        }
    }

    out
}

/// Render the output path for a song from the player's template.
///
/// Tokens `%artist`, `%album`, and `%title` substitute the sanitized
/// names; `%year` and `%disc` render as plain decimal; `%track` is zero
/// padded to two digits. A `%` that starts no known token is dropped
/// together with the byte that follows it. The container extension is
/// appended last.
pub fn render(
    artist: &str,
    album: &str,
    title: &str,
    meta: &TrackMeta,
    format: AudioFormat,
    template: &str,
    use_spaces: bool,
) -> PathBuf {
    let artist = translate_name(artist, use_spaces);
    let album = translate_name(album, use_spaces);
    let title = translate_name(title, use_spaces);

    let mut path = String::with_capacity(template.len() + 32);
    let mut rest = template;

    while let Some(pos) = rest.find('%') {
        path.push_str(&rest[..pos]);
        rest = &rest[pos + 1..];

        if let Some(after) = rest.strip_prefix("artist") {
            path.push_str(&artist);
            rest = after;
        } else if let Some(after) = rest.strip_prefix("album") {
            path.push_str(&album);
            rest = after;
        } else if let Some(after) = rest.strip_prefix("title") {
            path.push_str(&title);
            rest = after;
        } else if let Some(after) = rest.strip_prefix("year") {
            path.push_str(&meta.year.to_string());
            rest = after;
        } else if let Some(after) = rest.strip_prefix("track") {
            path.push_str(&format!("{:02}", meta.track));
            rest = after;
        } else if let Some(after) = rest.strip_prefix("disc") {
            path.push_str(&meta.disc.to_string());
            rest = after;
        } else {
            // Unknown token: skip the character after the '%' as well.
            let mut chars = rest.chars();
            chars.next();
            rest = chars.as_str();
        }
    }
    path.push_str(rest);
    path.push_str(format.extension());

    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(year: u16, track: u16, disc: u16) -> TrackMeta {
        TrackMeta {
            year,
            track,
            disc,
            cover_url: None,
        }
    }

    #[test]
    fn renders_template_with_underscores() {
        let path = render(
            "A/B",
            "C?D",
            "E F",
            &meta(0, 3, 0),
            AudioFormat::Mp3,
            "%artist/%album/%track-%title",
            false,
        );
        assert_eq!(path, PathBuf::from("A-B/CD/03-E_F.mp3"));
    }

    #[test]
    fn renders_template_with_spaces() {
        let path = render(
            "A/B",
            "C?D",
            "E F",
            &meta(0, 3, 0),
            AudioFormat::Mp3,
            "%artist/%album/%track-%title",
            true,
        );
        assert_eq!(path, PathBuf::from("A-B/CD/03-E F.mp3"));
    }

    #[test]
    fn aac_gets_m4a_extension() {
        let path = render(
            "a",
            "b",
            "c",
            &meta(1999, 1, 2),
            AudioFormat::Aac,
            "%artist/%album/%disc-%track %title (%year)",
            true,
        );
        assert_eq!(path, PathBuf::from("a/b/2-01 c (1999).m4a"));
    }

    #[test]
    fn unknown_token_drops_percent_and_next_byte() {
        let path = render(
            "a",
            "b",
            "c",
            &meta(0, 0, 0),
            AudioFormat::Mp3,
            "%artist/%xfile",
            false,
        );
        assert_eq!(path, PathBuf::from("a/file.mp3"));
    }

    #[test]
    fn trailing_percent_is_dropped() {
        let path = render(
            "a",
            "b",
            "c",
            &meta(0, 0, 0),
            AudioFormat::Mp3,
            "%title%",
            false,
        );
        assert_eq!(path, PathBuf::from("c.mp3"));
    }

    #[test]
    fn translate_covers_every_special_character() {
        let out = translate_name(r#"a/b\c|d:e;f*g`h<i>j k"l?m"#, false);
        assert_eq!(out, "a-b-c-d-e-f-g-h(i)j_klm");
    }

    #[test]
    fn translate_preserves_multibyte_text() {
        assert_eq!(translate_name("Sigur Rós", true), "Sigur Rós");
        assert_eq!(translate_name("宇多田ヒカル", false), "宇多田ヒカル");
    }

    #[test]
    fn translate_caps_output_without_splitting_characters() {
        let long = "é".repeat(300);
        let out = translate_name(&long, false);
        assert!(out.len() <= 255);
        // 'é' is two bytes; the cap lands on a character boundary.
        assert_eq!(out.len(), 254);
        assert!(out.chars().all(|c| c == 'é'));
    }

    #[test]
    fn rendered_name_has_no_reserved_characters() {
        let nasty = r#"We/Are\The|Best:Band;Ever*`"?<>"#;
        let out = translate_name(nasty, false);
        for banned in ['/', '\\', '|', ':', ';', '*', '`', '"', '?', '<', '>', ' '] {
            assert!(!out.contains(banned), "found {banned:?} in {out:?}");
        }
    }
}
