use crate::api::client::ApiClient;
use crate::api::endpoints::FileRef;
use crate::commands::forms::FormFields;
use crate::commands::requests::{AddTorrent, SeedTorrent};
use crate::commands::{Command, Notification};
use crate::core::error::{ClientError, ClientResult};
use crate::models::{ServerInfo, SettingUpdate, Settings, Torrent, Tracker};
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Issues commands against the torrent API.
///
/// Required input is checked before anything goes over the wire. Failures are
/// returned once and never retried; callers turn them into a [`Notification`].
#[derive(Clone)]
pub struct CommandDispatcher {
    client: ApiClient,
}

impl CommandDispatcher {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn add_torrent(&self, request: &AddTorrent) -> ClientResult<()> {
        let result = match request.to_form() {
            Ok(form) => self.post(self.client.endpoints().torrents(), form).await,
            Err(e) => Err(e),
        };
        log_outcome(Command::AddTorrent, None, &result);
        result
    }

    pub async fn seed_torrent(&self, request: &SeedTorrent) -> ClientResult<()> {
        let result = match request.to_form() {
            Ok(form) => self.post(self.client.endpoints().torrents(), form).await,
            Err(e) => Err(e),
        };
        log_outcome(Command::SeedTorrent, None, &result);
        result
    }

    /// Sent even when `id` is not in the current snapshot; the server decides.
    pub async fn delete_torrent(&self, id: u64, delete_files: bool) -> ClientResult<()> {
        let query = if delete_files {
            vec![("deleteFiles", "1".to_string())]
        } else {
            Vec::new()
        };
        let result = self
            .client
            .delete(self.client.endpoints().torrent(id), &query)
            .await;
        log_outcome(Command::DeleteTorrent, Some(id), &result);
        result
    }

    pub async fn cancel_torrent(&self, id: u64) -> ClientResult<()> {
        let result = self.post(self.client.endpoints().torrent(id), action_form("cancel")).await;
        log_outcome(Command::CancelTorrent, Some(id), &result);
        result
    }

    pub async fn retry_torrent(&self, id: u64) -> ClientResult<()> {
        let result = self.post(self.client.endpoints().torrent(id), action_form("retry")).await;
        log_outcome(Command::RetryTorrent, Some(id), &result);
        result
    }

    /// Affects future completions; a seeding torrent keeps its state
    pub async fn toggle_seed(&self, id: u64, enabled: bool) -> ClientResult<()> {
        let result = self
            .post(self.client.endpoints().torrent(id), seed_toggle_form(enabled))
            .await;
        log_outcome(Command::toggle_seed(enabled), Some(id), &result);
        result
    }

    /// Callers refresh the tracker list themselves afterwards
    pub async fn add_tracker(&self, url: &str) -> ClientResult<()> {
        let result = match tracker_form(url) {
            Ok(form) => self.post(self.client.endpoints().trackers(), form).await,
            Err(e) => Err(e),
        };
        log_outcome(Command::AddTracker, None, &result);
        result
    }

    pub async fn delete_tracker(&self, id: u64) -> ClientResult<()> {
        let result = self
            .client
            .delete(self.client.endpoints().tracker(id), &[])
            .await;
        log_outcome(Command::DeleteTracker, Some(id), &result);
        result
    }

    /// Returns the saved update so the caller can echo it into its
    /// [`Settings`] copy without refetching.
    pub async fn update_setting(&self, update: SettingUpdate) -> ClientResult<SettingUpdate> {
        let result = self
            .post(self.client.endpoints().settings(), setting_form(&update))
            .await
            .map(|_| update);
        log_outcome(Command::SaveSetting, None, &result);
        result
    }

    pub async fn list_trackers(&self) -> ClientResult<BTreeMap<u64, Tracker>> {
        self.client.list_trackers().await
    }

    pub async fn get_tracker(&self, id: u64) -> ClientResult<Tracker> {
        self.client.get_tracker(id).await
    }

    pub async fn get_settings(&self) -> ClientResult<Settings> {
        self.client.get_settings().await
    }

    pub async fn get_torrent(&self, id: u64) -> ClientResult<Torrent> {
        self.client.get_torrent(id).await
    }

    pub async fn server_info(&self) -> ClientResult<ServerInfo> {
        self.client.server_info().await
    }

    pub async fn download_file(&self, torrent_id: u64, file: FileRef) -> ClientResult<Vec<u8>> {
        self.client.download_file(torrent_id, file).await
    }

    /// The download action offered for completed and seeding torrents
    pub async fn download_first_file(&self, torrent: &Torrent) -> ClientResult<Vec<u8>> {
        let file = torrent
            .first_file()
            .ok_or_else(|| ClientError::validation("Torrent has no files to download!"))?;
        self.download_file(torrent.id, FileRef::Id(file.id)).await
    }

    /// Only fully transferred files can be fetched; anything else is
    /// rejected before the file request goes out.
    pub async fn download_payload_file(&self, torrent_id: u64, file_id: u64) -> ClientResult<Vec<u8>> {
        let torrent = self.client.get_torrent(torrent_id).await?;
        let file = torrent.file(file_id).ok_or_else(|| {
            ClientError::validation(format!("Torrent has no file with id {}!", file_id))
        })?;
        if !file.is_complete() {
            return Err(ClientError::validation(format!(
                "File {} is not downloaded yet ({:.0}%)!",
                file.path,
                file.progress_percent()
            )));
        }
        self.download_file(torrent_id, FileRef::Id(file_id)).await
    }

    async fn post(&self, url: reqwest::Url, form: FormFields) -> ClientResult<()> {
        self.client.post_form(url, form.into_multipart()).await
    }
}

fn log_outcome<T>(command: Command, id: Option<u64>, result: &ClientResult<T>) {
    match result {
        Ok(_) => info!(command = %command, torrent_or_tracker = ?id, "Command succeeded"),
        Err(e) => {
            let note = Notification::from_outcome(command, result);
            warn!(
                command = %command,
                torrent_or_tracker = ?id,
                error = %e,
                notification = %note,
                "Command failed"
            );
        }
    }
}

pub(crate) fn action_form(action: &str) -> FormFields {
    FormFields::new().text("action", action)
}

pub(crate) fn seed_toggle_form(enabled: bool) -> FormFields {
    FormFields::new().flag("seedOnCompletion", enabled)
}

pub(crate) fn tracker_form(url: &str) -> ClientResult<FormFields> {
    let url = url.trim();
    if url.is_empty() {
        return Err(ClientError::validation("Tracker URL needs to be filled out!"));
    }
    if reqwest::Url::parse(url).is_err() {
        return Err(ClientError::validation("Tracker URL is not a valid URL!"));
    }
    Ok(FormFields::new().text("url", url))
}

pub(crate) fn setting_form(update: &SettingUpdate) -> FormFields {
    match update {
        SettingUpdate::DhtPort(port) => FormFields::new().text(update.key(), port.to_string()),
        // An empty list still needs the key present, or the server sees no change
        SettingUpdate::DhtBootstrapNodes(nodes) if nodes.is_empty() => {
            FormFields::new().text(update.key(), "")
        }
        SettingUpdate::DhtBootstrapNodes(nodes) => {
            FormFields::new().texts(update.key(), nodes.iter().cloned())
        }
    }
}
