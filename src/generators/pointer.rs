//! Pointer (`.strm`) locators.
//!
//! A pointer file holds one line: the URL a player opens to stream the
//! source file.

use crate::models::config::LocatorFlavor;

/// Percent-encode each segment of a storage path, keeping the slashes.
pub fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Locator of `path` on a remote service.
pub fn build_locator(base_url: &str, flavor: LocatorFlavor, path: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let path = crate::utils::path::normalize(path);
    let prefix = match flavor {
        LocatorFlavor::Alist => "/d",
        LocatorFlavor::Webdav => "/dav",
        LocatorFlavor::Raw => "",
    };
    format!("{}{}{}", base, prefix, encode_path(&path))
}

/// Pointer file name for a video stem.
pub fn pointer_filename(stem: &str) -> String {
    format!("{}.strm", stem)
}

/// Pointer file body: the locator alone, no trailing newline.
pub fn pointer_content(locator: &str) -> String {
    locator.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_locator_flavors() {
        assert_eq!(
            build_locator("http://nas:5244/", LocatorFlavor::Alist, "/tv/Show S01E01.mkv"),
            "http://nas:5244/d/tv/Show%20S01E01.mkv"
        );
        assert_eq!(
            build_locator("http://nas:5244", LocatorFlavor::Webdav, "/tv/a.mkv"),
            "http://nas:5244/dav/tv/a.mkv"
        );
        assert_eq!(
            build_locator("https://cdn", LocatorFlavor::Raw, "media/剧.mkv"),
            "https://cdn/media/%E5%89%A7.mkv"
        );
    }

    #[test]
    fn test_pointer_file() {
        assert_eq!(pointer_filename("Show S01E01"), "Show S01E01.strm");
        assert_eq!(pointer_content(" http://x/d/a.mkv\n"), "http://x/d/a.mkv");
    }
}
