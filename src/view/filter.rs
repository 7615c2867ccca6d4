use crate::classify::{classify, TorrentView};
use crate::models::{Torrent, TorrentState};
use crate::stores::torrent_store::Snapshot;

/// What a torrent list should show
#[derive(Debug, PartialEq)]
pub enum ListView<'a> {
    /// Nothing has been fetched yet
    Loading,
    /// Loaded, but no torrent matches
    Empty,
    /// Matching torrents in snapshot order
    Populated(Vec<(u64, &'a Torrent)>),
}

impl<'a> ListView<'a> {
    pub fn len(&self) -> usize {
        match self {
            ListView::Populated(entries) => entries.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entries paired with their classification
    pub fn rows(&self) -> Vec<(&'a Torrent, TorrentView)> {
        match self {
            ListView::Populated(entries) => entries
                .iter()
                .map(|(_, torrent)| (*torrent, classify(torrent)))
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Restrict a snapshot to `wanted` states; an empty slice keeps everything
pub fn filter<'a>(snapshot: &'a Snapshot, wanted: &[TorrentState]) -> ListView<'a> {
    if !snapshot.loaded {
        return ListView::Loading;
    }

    let entries: Vec<(u64, &Torrent)> = snapshot
        .torrents
        .iter()
        .filter(|(_, torrent)| wanted.is_empty() || wanted.contains(&torrent.state))
        .map(|(id, torrent)| (*id, torrent))
        .collect();

    if entries.is_empty() {
        ListView::Empty
    } else {
        ListView::Populated(entries)
    }
}
