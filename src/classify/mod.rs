//! Derived view facts for a torrent.
//!
//! [`classify`] is the one place that decides what a torrent's state means for
//! presentation: progress, color, status line and which actions are allowed.
//! List and detail renderers both go through it.

use crate::models::{Torrent, TorrentState};
use crate::utils::format::format_bits;
use std::fmt;

/// Progress indicator
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Progress {
    /// 0..=100
    Percent(f64),
    /// Seeding replaces the percentage with a fixed label
    Seed,
}

impl Progress {
    pub fn percent(&self) -> Option<f64> {
        match self {
            Progress::Percent(value) => Some(*value),
            Progress::Seed => None,
        }
    }

    pub fn label(&self) -> String {
        match self {
            Progress::Percent(value) => format!("{}%", value.round() as u64),
            Progress::Seed => "SEED".to_string(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorTag {
    Primary,
    Info,
    Success,
    Error,
}

impl ColorTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColorTag::Primary => "primary",
            ColorTag::Info => "info",
            ColorTag::Success => "success",
            ColorTag::Error => "error",
        }
    }
}

/// User actions a torrent currently permits
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Action {
    SeedToggle,
    DownloadFirstFile,
    Cancel,
    Retry,
    Delete,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::SeedToggle => "seed-toggle",
            Action::DownloadFirstFile => "download",
            Action::Cancel => "cancel",
            Action::Retry => "retry",
            Action::Delete => "delete",
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TorrentView {
    pub progress: Progress,
    pub color: ColorTag,
    /// Empty when there is nothing to say
    pub status_text: String,
    /// In display order
    pub actions: Vec<Action>,
}

impl TorrentView {
    pub fn allows(&self, action: Action) -> bool {
        self.actions.contains(&action)
    }
}

/// Downloaded share of the pieces; 0 when the piece count is unknown
pub fn piece_percent(num_downloaded_pieces: u64, num_pieces: u64) -> f64 {
    if num_pieces == 0 {
        return 0.0;
    }
    num_downloaded_pieces as f64 / num_pieces as f64 * 100.0
}

pub fn classify(torrent: &Torrent) -> TorrentView {
    let ratio = piece_percent(torrent.num_downloaded_pieces, torrent.num_pieces);
    let pieces = format!("{}/{} pieces", torrent.num_downloaded_pieces, torrent.num_pieces);
    let has_file = torrent.first_file().is_some();

    match torrent.state {
        TorrentState::NotStartedYet => TorrentView {
            progress: Progress::Percent(0.0),
            color: ColorTag::Primary,
            status_text: String::new(),
            actions: vec![Action::Delete],
        },
        TorrentState::Running => {
            let metrics = &torrent.metrics;
            TorrentView {
                progress: Progress::Percent(ratio),
                color: ColorTag::Info,
                status_text: format!(
                    "{} | rx: {}/s | tx: {}/s | #conns: {} | #paths: {}",
                    pieces,
                    format_bits(metrics.rx),
                    format_bits(metrics.tx),
                    metrics.num_conns,
                    metrics.num_paths
                ),
                actions: vec![Action::Cancel],
            }
        }
        TorrentState::Completed => {
            let status_text = match &torrent.status {
                Some(status) => status.clone(),
                None => {
                    let files = torrent.files.len();
                    format!("{} | {}/{} files", pieces, files, files)
                }
            };
            TorrentView {
                progress: Progress::Percent(100.0),
                color: ColorTag::Success,
                status_text,
                actions: finished_actions(has_file),
            }
        }
        TorrentState::Failed => TorrentView {
            progress: Progress::Percent(ratio),
            color: ColorTag::Error,
            status_text: format!(
                "Downloading torrent failed: {}",
                torrent.status.as_deref().unwrap_or("unknown error")
            ),
            actions: vec![Action::Retry, Action::Delete],
        },
        TorrentState::Cancelled => TorrentView {
            progress: Progress::Percent(ratio),
            color: ColorTag::Error,
            status_text: "Cancelled by user".to_string(),
            actions: vec![Action::Retry, Action::Delete],
        },
        TorrentState::Seeding => TorrentView {
            progress: Progress::Seed,
            color: ColorTag::Success,
            status_text: format!("Seeding at {}", torrent.seed_addr),
            actions: finished_actions(has_file),
        },
    }
}

fn finished_actions(has_file: bool) -> Vec<Action> {
    let mut actions = vec![Action::SeedToggle];
    if has_file {
        actions.push(Action::DownloadFirstFile);
    }
    actions.push(Action::Delete);
    actions
}
