use crate::models::{null_as_default, Identified, Validate};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle state of a torrent as reported by the server
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TorrentState {
    NotStartedYet,
    Running,
    Completed,
    Failed,
    Cancelled,
    Seeding,
}

impl TorrentState {
    pub const ALL: [TorrentState; 6] = [
        TorrentState::NotStartedYet,
        TorrentState::Running,
        TorrentState::Completed,
        TorrentState::Failed,
        TorrentState::Cancelled,
        TorrentState::Seeding,
    ];

    /// Everything except seeding; the "downloads" list
    pub const NON_SEEDING: [TorrentState; 5] = [
        TorrentState::NotStartedYet,
        TorrentState::Running,
        TorrentState::Completed,
        TorrentState::Failed,
        TorrentState::Cancelled,
    ];

    /// Wire tag
    pub fn as_str(&self) -> &'static str {
        match self {
            TorrentState::NotStartedYet => "not_started_yet",
            TorrentState::Running => "running",
            TorrentState::Completed => "completed",
            TorrentState::Failed => "failed",
            TorrentState::Cancelled => "cancelled",
            TorrentState::Seeding => "seeding",
        }
    }

    /// The server only accepts deletion of finished torrents
    pub fn is_finished(&self) -> bool {
        matches!(
            self,
            TorrentState::Completed
                | TorrentState::Failed
                | TorrentState::Cancelled
                | TorrentState::Seeding
        )
    }

    /// Value of the `wantedStates` query parameter
    pub fn join(states: &[TorrentState]) -> String {
        states
            .iter()
            .map(TorrentState::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl fmt::Display for TorrentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TorrentState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TorrentState::ALL
            .iter()
            .copied()
            .find(|state| state.as_str() == s.trim())
            .ok_or_else(|| {
                format!(
                    "unknown torrent state '{}' (expected one of: {})",
                    s,
                    TorrentState::join(&TorrentState::ALL)
                )
            })
    }
}

/// Live transfer metrics, only meaningful while running
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TorrentMetrics {
    /// Bytes per second received
    #[serde(default)]
    pub rx: u64,
    /// Bytes per second sent
    #[serde(default)]
    pub tx: u64,
    #[serde(default)]
    pub num_conns: u64,
    #[serde(default)]
    pub num_paths: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TorrentFile {
    pub id: u64,
    pub path: String,
    /// Size in bytes
    pub length: u64,
    /// Bytes downloaded (or uploaded, for seeds)
    #[serde(default)]
    pub progress: u64,
}

impl TorrentFile {
    pub fn progress_percent(&self) -> f64 {
        if self.length == 0 {
            return 0.0;
        }
        self.progress as f64 / self.length as f64 * 100.0
    }

    /// Fully transferred files can be downloaded from the server
    pub fn is_complete(&self) -> bool {
        self.length > 0 && self.progress >= self.length
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Torrent {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    pub state: TorrentState,
    /// Server diagnostic, absent when empty
    #[serde(default, deserialize_with = "empty_as_none")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub peers: Vec<String>,
    #[serde(default)]
    pub seed_on_completion: bool,
    /// 0 lets the server pick a port
    #[serde(default)]
    pub seed_port: u16,
    /// Only populated once seeding
    #[serde(default)]
    pub seed_addr: String,
    #[serde(default)]
    pub enable_dht: bool,
    #[serde(default)]
    pub enable_trackers: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub files: Vec<TorrentFile>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub metrics: TorrentMetrics,
    #[serde(default)]
    pub num_pieces: u64,
    #[serde(default)]
    pub num_downloaded_pieces: u64,
    /// Bytes per piece
    #[serde(default)]
    pub piece_length: u64,
}

impl Torrent {
    pub fn first_file(&self) -> Option<&TorrentFile> {
        self.files.first()
    }

    pub fn file(&self, file_id: u64) -> Option<&TorrentFile> {
        self.files.iter().find(|file| file.id == file_id)
    }
}

impl Identified for Torrent {
    fn id(&self) -> u64 {
        self.id
    }
}

impl Validate for Torrent {
    fn validate(&self) -> Result<(), String> {
        if self.num_downloaded_pieces > self.num_pieces {
            return Err(format!(
                "torrent {} reports {} downloaded pieces out of {}",
                self.id, self.num_downloaded_pieces, self.num_pieces
            ));
        }
        for file in &self.files {
            if file.progress > file.length {
                return Err(format!(
                    "file {} of torrent {} reports progress {} beyond length {}",
                    file.id, self.id, file.progress, file.length
                ));
            }
        }
        Ok(())
    }
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ClientError;
    use crate::models::decode;
    use std::collections::BTreeMap;

    const RUNNING: &str = r#"{
        "id": 7,
        "name": "ubuntu.iso",
        "state": "running",
        "status": "",
        "peers": ["19-ffaa:1:106d,[127.0.0.1]:43000"],
        "seedOnCompletion": true,
        "seedPort": 0,
        "seedAddr": "",
        "enableDht": false,
        "enableTrackers": true,
        "files": [{"id": 1, "path": "ubuntu.iso", "length": 4096, "progress": 1024}],
        "metrics": {"rx": 2048, "tx": 512, "numConns": 3, "numPaths": 2},
        "numPieces": 4,
        "numDownloadedPieces": 1,
        "pieceLength": 1024
    }"#;

    #[test]
    fn test_decode_full_torrent() {
        let torrent: Torrent = decode(RUNNING.as_bytes()).expect("valid torrent");
        assert_eq!(torrent.id, 7);
        assert_eq!(torrent.state, TorrentState::Running);
        assert_eq!(torrent.status, None);
        assert_eq!(torrent.peers.len(), 1);
        assert!(torrent.seed_on_completion);
        assert!(torrent.enable_trackers);
        assert_eq!(torrent.metrics.num_conns, 3);
        assert_eq!(torrent.files[0].progress, 1024);
        assert_eq!(torrent.file(torrent.files[0].id), torrent.files.first());
        assert!(torrent.file(999).is_none());
    }

    #[test]
    fn test_decode_tolerates_null_slices() {
        let body = r#"{"id": 1, "name": "x", "state": "not_started_yet", "peers": null, "files": null, "metrics": null}"#;
        let torrent: Torrent = decode(body.as_bytes()).expect("nulls default to empty");
        assert!(torrent.peers.is_empty());
        assert!(torrent.files.is_empty());
        assert_eq!(torrent.metrics, TorrentMetrics::default());
    }

    #[test]
    fn test_decode_rejects_unknown_state() {
        let body = r#"{"id": 1, "name": "x", "state": "paused"}"#;
        let result: Result<Torrent, _> = decode(body.as_bytes());
        assert!(matches!(result, Err(ClientError::Parse(_))));
    }

    #[test]
    fn test_decode_rejects_piece_overflow() {
        let body = r#"{"id": 1, "name": "x", "state": "running", "numPieces": 2, "numDownloadedPieces": 3}"#;
        let result: Result<Torrent, _> = decode(body.as_bytes());
        assert!(matches!(result, Err(ClientError::Parse(_))));
    }

    #[test]
    fn test_decode_rejects_file_progress_overflow() {
        let body = r#"{"id": 1, "name": "x", "state": "completed",
            "files": [{"id": 1, "path": "a", "length": 10, "progress": 11}]}"#;
        let result: Result<Torrent, _> = decode(body.as_bytes());
        assert!(matches!(result, Err(ClientError::Parse(_))));
    }

    #[test]
    fn test_decode_collection_keyed_by_id() {
        let body = format!(r#"{{"7": {}}}"#, RUNNING);
        let torrents: BTreeMap<u64, Torrent> = decode(body.as_bytes()).expect("valid collection");
        assert_eq!(torrents.keys().copied().collect::<Vec<_>>(), vec![7]);
    }

    #[test]
    fn test_state_tags() {
        assert_eq!(TorrentState::NotStartedYet.as_str(), "not_started_yet");
        assert_eq!("seeding".parse::<TorrentState>(), Ok(TorrentState::Seeding));
        assert!("paused".parse::<TorrentState>().is_err());
        assert_eq!(
            TorrentState::join(&[TorrentState::Running, TorrentState::Seeding]),
            "running,seeding"
        );
        let json = serde_json::to_string(&TorrentState::Cancelled).unwrap();
        assert_eq!(json, "\"cancelled\"");
    }

    #[test]
    fn test_is_finished() {
        assert!(!TorrentState::NotStartedYet.is_finished());
        assert!(!TorrentState::Running.is_finished());
        assert!(TorrentState::Completed.is_finished());
        assert!(TorrentState::Failed.is_finished());
        assert!(TorrentState::Cancelled.is_finished());
        assert!(TorrentState::Seeding.is_finished());
    }

    #[test]
    fn test_file_progress() {
        let file = TorrentFile { id: 1, path: "a".into(), length: 200, progress: 50 };
        assert_eq!(file.progress_percent(), 25.0);
        assert!(!file.is_complete());

        let empty = TorrentFile { id: 2, path: "b".into(), length: 0, progress: 0 };
        assert_eq!(empty.progress_percent(), 0.0);
        assert!(!empty.is_complete());

        let done = TorrentFile { id: 3, path: "c".into(), length: 10, progress: 10 };
        assert!(done.is_complete());
    }
}
