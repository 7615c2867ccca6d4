use crate::commands::forms::{FormFields, Upload};
use crate::core::error::{ClientError, ClientResult};

/// Download a torrent from remote peers
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AddTorrent {
    pub torrent_file: Option<Upload>,
    /// Peer addresses; may be empty when DHT or trackers are enabled
    pub peers: Vec<String>,
    pub seed_on_completion: bool,
    /// 0 lets the server choose
    pub seed_port: u16,
    pub enable_dht: bool,
    pub enable_trackers: bool,
}

impl AddTorrent {
    fn peer_list(&self) -> Vec<String> {
        self.peers
            .iter()
            .map(|peer| peer.trim().to_string())
            .filter(|peer| !peer.is_empty())
            .collect()
    }

    pub fn validate(&self) -> ClientResult<()> {
        require_torrent_file(&self.torrent_file)?;
        if self.peer_list().is_empty() && !self.enable_dht && !self.enable_trackers {
            return Err(ClientError::validation("Peer field needs to be filled out!"));
        }
        Ok(())
    }

    pub fn to_form(&self) -> ClientResult<FormFields> {
        self.validate()?;
        let mut form = FormFields::new()
            .texts("peers", self.peer_list())
            .flag("seedOnCompletion", self.seed_on_completion)
            .text("seedPort", self.seed_port.to_string())
            .flag("enableDht", self.enable_dht)
            .flag("enableTrackers", self.enable_trackers);
        if let Some(upload) = &self.torrent_file {
            form = form.file("torrentFile", upload.clone());
        }
        Ok(form)
    }
}

/// Seed local files described by a torrent file
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SeedTorrent {
    pub torrent_file: Option<Upload>,
    /// Payload files, uploaded alongside the metainfo
    pub files: Vec<Upload>,
    pub seed_immediately: bool,
    pub seed_port: u16,
}

impl SeedTorrent {
    pub fn validate(&self) -> ClientResult<()> {
        require_torrent_file(&self.torrent_file)?;
        if self.files.is_empty() || self.files.iter().all(Upload::is_empty) {
            return Err(ClientError::validation(
                "A file you want to seed needs to be selected!",
            ));
        }
        Ok(())
    }

    pub fn to_form(&self) -> ClientResult<FormFields> {
        self.validate()?;
        let mut form = FormFields::new()
            .flag("seedOnCompletion", self.seed_immediately)
            .text("seedPort", self.seed_port.to_string());
        if let Some(upload) = &self.torrent_file {
            form = form.file("torrentFile", upload.clone());
        }
        for file in &self.files {
            form = form.file("files", file.clone());
        }
        Ok(form)
    }
}

fn require_torrent_file(torrent_file: &Option<Upload>) -> ClientResult<()> {
    match torrent_file {
        Some(upload) if !upload.is_empty() => Ok(()),
        _ => Err(ClientError::validation("Torrent file needs to be selected!")),
    }
}
