//! YouTube video-id extraction and thumbnail derivation.
//!
//! Pure string parsing; whether the thumbnail actually exists is never
//! verified here. A `None` from either function tells the caller to fall
//! back to a plain hyperlink.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Tried in priority order: watch-style URLs (`v=` query parameter or a
    // path segment immediately followed by the id), then the youtu.be
    // short-link form. The id is exactly 11 characters of [0-9A-Za-z_-].
    static ref WATCH_RE: Regex =
        Regex::new(r"(?:v=|/)([0-9A-Za-z_-]{11})(?:\?|&|/|$)").expect("static regex");
    static ref SHORT_RE: Regex =
        Regex::new(r"youtu\.be/([0-9A-Za-z_-]{11})").expect("static regex");
}

/// Extracts the 11-character video id from a YouTube URL.
///
/// Recognises the common share-link and watch-link shapes; anything else
/// (including empty input) yields `None`.
///
/// ```
/// use labelkiosk::video::extract_video_id;
///
/// assert_eq!(
///     extract_video_id("https://youtu.be/7xmgRLTjxIw?si=abc").as_deref(),
///     Some("7xmgRLTjxIw")
/// );
/// assert_eq!(extract_video_id("not a url"), None);
/// ```
pub fn extract_video_id(url: &str) -> Option<String> {
    if url.is_empty() {
        return None;
    }
    for pattern in [&*WATCH_RE, &*SHORT_RE] {
        if let Some(captures) = pattern.captures(url) {
            return Some(captures[1].to_string());
        }
    }
    None
}

/// Derives the deterministic thumbnail URL for a YouTube video link, or
/// `None` if no id can be extracted.
pub fn thumbnail_url(url: &str) -> Option<String> {
    extract_video_id(url).map(|id| format!("https://img.youtube.com/vi/{}/hqdefault.jpg", id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_link_with_query() {
        assert_eq!(
            extract_video_id("https://youtu.be/7xmgRLTjxIw?si=uUQTp3M3C1rCmJrW").as_deref(),
            Some("7xmgRLTjxIw")
        );
    }

    #[test]
    fn test_watch_link() {
        assert_eq!(
            extract_video_id("https://youtube.com/watch?v=5QH8tlJBY74").as_deref(),
            Some("5QH8tlJBY74")
        );
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=5QH8tlJBY74&t=30s").as_deref(),
            Some("5QH8tlJBY74")
        );
    }

    #[test]
    fn test_unrecognized_inputs() {
        assert_eq!(extract_video_id(""), None);
        assert_eq!(extract_video_id("not a url"), None);
        assert_eq!(extract_video_id("https://example.com/page"), None);
        // Ten characters, one short of a valid id
        assert_eq!(extract_video_id("https://youtu.be/abcdefghij"), None);
    }

    #[test]
    fn test_thumbnail_url_contains_id() {
        let thumb = thumbnail_url("https://youtu.be/7xmgRLTjxIw").unwrap();
        assert!(thumb.contains("7xmgRLTjxIw"));
        assert_eq!(thumb, "https://img.youtube.com/vi/7xmgRLTjxIw/hqdefault.jpg");
    }

    #[test]
    fn test_thumbnail_url_fallback() {
        assert_eq!(thumbnail_url("not a url"), None);
        assert_eq!(thumbnail_url(""), None);
    }
}
