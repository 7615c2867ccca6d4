//! Write path: user-initiated commands against the torrent API.
//!
//! Commands never touch the [`TorrentStore`](crate::stores::torrent_store::TorrentStore);
//! their effect shows up on the next successful poll.

pub mod dispatcher;
pub mod forms;
pub mod requests;

use crate::core::error::ClientResult;
use std::fmt;

pub use dispatcher::CommandDispatcher;
pub use forms::Upload;
pub use requests::{AddTorrent, SeedTorrent};

/// Every mutating operation the dispatcher can issue
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    AddTorrent,
    SeedTorrent,
    DeleteTorrent,
    CancelTorrent,
    RetryTorrent,
    EnableSeeding,
    DisableSeeding,
    AddTracker,
    DeleteTracker,
    SaveSetting,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::AddTorrent => "add_torrent",
            Command::SeedTorrent => "seed_torrent",
            Command::DeleteTorrent => "delete_torrent",
            Command::CancelTorrent => "cancel_torrent",
            Command::RetryTorrent => "retry_torrent",
            Command::EnableSeeding => "enable_seeding",
            Command::DisableSeeding => "disable_seeding",
            Command::AddTracker => "add_tracker",
            Command::DeleteTracker => "delete_tracker",
            Command::SaveSetting => "save_setting",
        }
    }

    pub fn toggle_seed(enabled: bool) -> Self {
        if enabled {
            Command::EnableSeeding
        } else {
            Command::DisableSeeding
        }
    }

    /// Prefix for failure messages. Form submissions report errors inline
    /// next to the form, so they carry none.
    pub fn failure_prefix(&self) -> Option<&'static str> {
        match self {
            Command::AddTorrent | Command::SeedTorrent | Command::AddTracker => None,
            Command::DeleteTorrent => Some("Deleting torrent failed"),
            Command::CancelTorrent => Some("Cancelling torrent failed"),
            Command::RetryTorrent => Some("Retrying torrent failed"),
            Command::EnableSeeding => Some("Enabling seeding on completion failed"),
            Command::DisableSeeding => Some("Disabling seeding on completion failed"),
            Command::DeleteTracker => Some("Deleting tracker failed"),
            Command::SaveSetting => Some("Saving setting failed"),
        }
    }

    pub fn success_message(&self) -> &'static str {
        match self {
            Command::AddTorrent | Command::SeedTorrent => "Successfully added torrent!",
            Command::DeleteTorrent => "Successfully deleted torrent!",
            Command::CancelTorrent => "Successfully cancelled torrent!",
            Command::RetryTorrent => "Successfully enqueued torrent again!",
            Command::EnableSeeding => "Successfully enabled seeding on completion!",
            Command::DisableSeeding => "Successfully disabled seeding on completion!",
            Command::AddTracker => "Successfully added tracker!",
            Command::DeleteTracker => "Successfully deleted tracker!",
            Command::SaveSetting => "Saved!",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Error,
}

/// What the user is told after a command completes
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn from_outcome<T>(command: Command, outcome: &ClientResult<T>) -> Self {
        match outcome {
            Ok(_) => Self {
                level: NotificationLevel::Success,
                message: command.success_message().to_string(),
            },
            Err(e) => {
                let detail = e.display_message();
                let message = match command.failure_prefix() {
                    Some(prefix) if !e.is_validation() => format!("{}: {}", prefix, detail),
                    _ => detail,
                };
                Self {
                    level: NotificationLevel::Error,
                    message,
                }
            }
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == NotificationLevel::Error
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}
