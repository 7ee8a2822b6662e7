//! Mine a browser network-capture blob for a stable bulletin image URL.
//!
//! The page serves the monthly table as an image through a Drive viewer;
//! the automation run logs every response body, and somewhere in there is
//! a direct image URL worth OCR-ing.

use std::sync::LazyLock;

use regex::Regex;

// Preference order: the lh3 drive-storage host is the stable one the viewer
// uses; other googleusercontent hosts come next; any googleusercontent
// raster is the last resort.
static LH3_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(https://lh3\.googleusercontent\.com/drive-storage/[^\s"'<>]+)"#).unwrap()
});
static DRIVE_STORAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(https://[a-z0-9\-]+\.googleusercontent\.com/drive-storage/[^\s"'<>]+)"#)
        .unwrap()
});
static ANY_RASTER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)(https://[^\s"'<>]*googleusercontent\.com[^\s"'<>]*\.(?:png|jpg|jpeg|webp)[^\s"'<>]*)"#,
    )
    .unwrap()
});

/// Best image URL found in the blob, or None if nothing usable appears.
pub fn best_image_url(blob: &str) -> Option<String> {
    if blob.is_empty() {
        return None;
    }
    for re in [&*LH3_RE, &*DRIVE_STORAGE_RE, &*ANY_RASTER_RE] {
        if let Some(caps) = re.captures(blob) {
            return Some(caps[1].to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_lh3_drive_storage() {
        let blob = r#"{"img":"https://doc-01.googleusercontent.com/drive-storage/abc.png",
                      "other":"https://lh3.googleusercontent.com/drive-storage/xyz=w1600"}"#;
        assert_eq!(
            best_image_url(blob).unwrap(),
            "https://lh3.googleusercontent.com/drive-storage/xyz=w1600"
        );
    }

    #[test]
    fn falls_back_to_other_drive_storage_hosts() {
        let blob = r#"src="https://doc-01.googleusercontent.com/drive-storage/abc123""#;
        assert_eq!(
            best_image_url(blob).unwrap(),
            "https://doc-01.googleusercontent.com/drive-storage/abc123"
        );
    }

    #[test]
    fn raster_url_as_last_resort() {
        let blob = "see https://whatever.googleusercontent.com/view/table.PNG?w=1200 here";
        assert_eq!(
            best_image_url(blob).unwrap(),
            "https://whatever.googleusercontent.com/view/table.PNG?w=1200"
        );
    }

    #[test]
    fn nothing_usable() {
        assert_eq!(best_image_url(""), None);
        assert_eq!(best_image_url("plain html without drive links"), None);
    }
}
