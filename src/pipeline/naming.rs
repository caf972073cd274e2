//! Output file naming
//!
//! `<genre_slug>_<unix_timestamp>_<request_id8>.wav`, with the video at
//! `<same stem>_with_video.mp4`. The request id suffix keeps two requests
//! started in the same second from overwriting each other.

use chrono::{DateTime, Utc};

use crate::asset::RequestId;

/// File stem shared by a request's WAV and video
pub fn output_stem(genre: &str, at: DateTime<Utc>, request_id: &RequestId) -> String {
    format!("{}_{}_{}", slugify(genre), at.timestamp(), request_id.short())
}

/// Lowercase, with anything other than ascii alphanumerics collapsed to `_`
pub fn slugify(genre: &str) -> String {
    let mut out = String::with_capacity(genre.len());
    for c in genre.trim().chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('_') && !out.is_empty() {
            out.push('_');
        }
    }
    let trimmed = out.trim_end_matches('_');
    if trimmed.is_empty() {
        "track".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::video_path_for;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use std::path::{Path, PathBuf};

    #[test]
    fn test_output_stem() {
        let at = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let id = RequestId::new();
        let stem = output_stem("City Pop", at, &id);

        assert_eq!(stem, format!("city_pop_1700000000_{}", id.short()));
        assert_eq!(
            video_path_for(&Path::new("/out").join(format!("{stem}.wav"))),
            PathBuf::from(format!("/out/{stem}_with_video.mp4"))
        );
    }

    #[test]
    fn test_same_second_requests_differ() {
        let at = Utc::now();
        let a = output_stem("house", at, &RequestId::new());
        let b = output_stem("house", at, &RequestId::new());
        assert_ne!(a, b);
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("City Pop"), "city_pop");
        assert_eq!(slugify("Lo-Fi"), "lo_fi");
        assert_eq!(slugify("  ../etc "), "etc");
        assert_eq!(slugify("///"), "track");
    }
}
