//! Best-effort metadata extraction from album web pages.
//!
//! The album detail page (HTML) carries the release year and the cover art
//! URL; the album explorer page (XML) carries the track and disc numbers.
//! Neither page is a stable API, so every extractor returns `Option` and a
//! miss simply leaves the matching tag field out.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// Cover art URL: the first quoted string following the album art marker.
static COVER_ART: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"id *= *"album_art"[^"]*"([^"]+)"#).unwrap());

/// Release year: the first four-digit run after the release_year class.
static RELEASE_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"class *= *"release_year"[^0-9]*([0-9]{4})"#).unwrap());

/// Extract the cover art URL from the album detail page.
///
/// The stock "no album art" image counts as no cover. That check is done
/// against the URL itself rather than the page, since the similar-albums
/// list elsewhere on the page may legitimately use that image.
pub fn extract_cover_url(album_html: &str) -> Option<String> {
    let url = COVER_ART.captures(album_html)?.get(1)?.as_str();

    if url.contains("no_album_art.jpg") {
        debug!("this album does not have cover art");
        return None;
    }

    Some(url.to_string())
}

/// Extract the release year from the album detail page.
pub fn extract_year(album_html: &str) -> Option<u16> {
    let caps = RELEASE_YEAR.captures(album_html)?;
    caps.get(1)?.as_str().parse().ok()
}

/// Extract the track and disc numbers for `title` from the album explorer
/// page. Returns `(track, disc)`.
///
/// The song's entry is found by matching its title attribute, so the title
/// itself has to be defanged before it can be spliced into a pattern.
pub fn extract_track_disc(title: &str, album_xml: &str) -> Option<(u16, u16)> {
    let pattern = format!(
        r#"songTitle *= *"{}"[^>]+discNum *= *"([0-9]+)"[^>]+trackNum *= *"([0-9]+)""#,
        escape_title(title)
    );

    let re = match Regex::new(&pattern) {
        Ok(re) => re,
        Err(err) => {
            debug!(%err, title, "could not build the track/disc pattern");
            return None;
        }
    };

    let caps = re.captures(album_xml)?;
    let disc = caps.get(1)?.as_str().parse().ok()?;
    let track = caps.get(2)?.as_str().parse().ok()?;
    Some((track, disc))
}

/// Neutralize pattern metacharacters in a song title.
///
/// Metacharacters become `.` rather than being escaped, and `?` is dropped
/// entirely because the explorer page leaves it out of its titles.
fn escape_title(title: &str) -> String {
    let mut out = String::with_capacity(title.len());

    for ch in title.chars() {
        match ch {
            '^' | '$' | '(' | ')' | '>' | '<' | '[' | '{' | '\\' | '|' | '.' | '*' | '+'
            | '&' => out.push('.'),
            '?' => {}
            other => out.push(other),
        }
    }

    out
}
