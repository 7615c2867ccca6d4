use crate::core::error::{ClientError, ClientResult};
use reqwest::Url;
use std::fmt;

/// File sub-resource of a torrent
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileRef {
    /// A payload file by id
    Id(u64),
    /// The `.torrent` metainfo the torrent was created from
    TorrentFile,
}

impl fmt::Display for FileRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileRef::Id(id) => write!(f, "{}", id),
            FileRef::TorrentFile => f.write_str("torrent"),
        }
    }
}

/// Builds `/api/...` URLs from the configured base address
#[derive(Clone, Debug)]
pub struct Endpoints {
    base: Url,
}

impl Endpoints {
    pub fn new(base_url: &str) -> ClientResult<Self> {
        let base: Url = base_url
            .trim()
            .parse()
            .map_err(|e| ClientError::validation(format!("invalid API URL '{}': {}", base_url, e)))?;

        if base.cannot_be_a_base() || !matches!(base.scheme(), "http" | "https") {
            return Err(ClientError::validation(format!(
                "API URL '{}' must be an http(s) address",
                base_url
            )));
        }

        Ok(Self { base })
    }

    pub fn info(&self) -> Url {
        self.api(&["info"])
    }

    pub fn torrents(&self) -> Url {
        self.api(&["torrent"])
    }

    pub fn torrent(&self, id: u64) -> Url {
        self.api(&["torrent", &id.to_string()])
    }

    pub fn file(&self, torrent_id: u64, file: FileRef) -> Url {
        self.api(&["torrent", &torrent_id.to_string(), "file", &file.to_string()])
    }

    pub fn trackers(&self) -> Url {
        self.api(&["tracker"])
    }

    pub fn tracker(&self, id: u64) -> Url {
        self.api(&["tracker", &id.to_string()])
    }

    pub fn settings(&self) -> Url {
        self.api(&["settings"])
    }

    fn api(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        url.set_query(None);
        url.set_fragment(None);
        // cannot_be_a_base was ruled out in new()
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push("api").extend(segments);
        }
        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_and_item_urls() {
        let endpoints = Endpoints::new("http://127.0.0.1:8000").unwrap();
        assert_eq!(endpoints.torrents().as_str(), "http://127.0.0.1:8000/api/torrent");
        assert_eq!(endpoints.torrent(12).as_str(), "http://127.0.0.1:8000/api/torrent/12");
        assert_eq!(endpoints.trackers().as_str(), "http://127.0.0.1:8000/api/tracker");
        assert_eq!(endpoints.tracker(3).as_str(), "http://127.0.0.1:8000/api/tracker/3");
        assert_eq!(endpoints.settings().as_str(), "http://127.0.0.1:8000/api/settings");
        assert_eq!(endpoints.info().as_str(), "http://127.0.0.1:8000/api/info");
    }

    #[test]
    fn test_file_urls() {
        let endpoints = Endpoints::new("http://localhost:8000/").unwrap();
        assert_eq!(
            endpoints.file(4, FileRef::Id(9)).as_str(),
            "http://localhost:8000/api/torrent/4/file/9"
        );
        assert_eq!(
            endpoints.file(4, FileRef::TorrentFile).as_str(),
            "http://localhost:8000/api/torrent/4/file/torrent"
        );
    }

    #[test]
    fn test_base_with_path_prefix() {
        let endpoints = Endpoints::new("https://example.org/bittorrent/").unwrap();
        assert_eq!(endpoints.torrents().as_str(), "https://example.org/bittorrent/api/torrent");
    }

    #[test]
    fn test_rejects_bad_base() {
        assert!(Endpoints::new("not a url").is_err());
        assert!(Endpoints::new("ftp://example.org").is_err());
        assert!(Endpoints::new("mailto:someone@example.org").is_err());
    }
}
