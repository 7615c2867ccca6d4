use crate::output;
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tokio::signal;
use torrent_remote::api::client::ApiClient;
use torrent_remote::api::endpoints::FileRef;
use torrent_remote::commands::{
    AddTorrent, Command as ApiCommand, CommandDispatcher, Notification, SeedTorrent, Upload,
};
use torrent_remote::core::config::Config;
use torrent_remote::core::error::ClientResult;
use torrent_remote::models::{SettingUpdate, TorrentState};
use torrent_remote::stores::torrent_store::TorrentStore;
use torrent_remote::view::filter::filter;
use tracing::{error, info};

const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Parser)]
#[command(name = "torrent-remote", about = "Remote control for a torrent daemon's HTTP API")]
pub struct Cli {
    #[arg(long, global = true, env = "TORRENT_REMOTE_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,
    /// Overrides `api.base_url`; enough to run without a config file
    #[arg(long, global = true, env = "TORRENT_REMOTE_API_URL")]
    pub api_url: Option<String>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Poll the torrent list and redraw on every change until Ctrl+C
    Watch {
        #[arg(long = "state", value_parser = parse_state)]
        states: Vec<TorrentState>,
    },
    /// Print the torrent list once
    List {
        #[arg(long = "state", value_parser = parse_state)]
        states: Vec<TorrentState>,
    },
    Show {
        id: u64,
    },
    /// Download a torrent from peers
    Add {
        torrent_file: PathBuf,
        #[arg(long = "peer")]
        peers: Vec<String>,
        /// Keep seeding once the download completes
        #[arg(long)]
        seed: bool,
        #[arg(long, default_value_t = 0)]
        seed_port: u16,
        #[arg(long)]
        dht: bool,
        #[arg(long)]
        trackers: bool,
    },
    /// Seed local files
    Seed {
        torrent_file: PathBuf,
        #[arg(long = "file")]
        files: Vec<PathBuf>,
        #[arg(long)]
        now: bool,
        #[arg(long, default_value_t = 0)]
        seed_port: u16,
    },
    Cancel {
        id: u64,
    },
    Retry {
        id: u64,
    },
    Delete {
        id: u64,
        #[arg(long)]
        delete_files: bool,
    },
    /// Toggle seeding on completion
    Seeding {
        id: u64,
        #[arg(value_enum)]
        toggle: Toggle,
    },
    Download {
        id: u64,
        /// File id; defaults to the torrent file itself
        #[arg(long)]
        file: Option<u64>,
        #[arg(long)]
        out: PathBuf,
    },
    Trackers,
    TrackerAdd {
        url: String,
    },
    TrackerDelete {
        id: u64,
    },
    Settings,
    SetDhtPort {
        port: u16,
    },
    SetBootstrapNodes {
        nodes: Vec<String>,
    },
    Info,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

fn parse_state(value: &str) -> Result<TorrentState, String> {
    value.parse()
}

/// A config file wins when present; `--api-url` then only replaces the URL
pub fn load_config(cli: &Cli) -> Result<Config> {
    match &cli.api_url {
        Some(url) if cli.config.exists() => Config::from_file(&cli.config)?.with_base_url(url),
        Some(url) => Config::from_base_url(url),
        None => Config::from_file(&cli.config).context(format!(
            "Failed to load configuration from '{}'. \
            Copy config.example.toml to config.toml or pass --api-url.",
            cli.config.display()
        )),
    }
}

pub async fn run(cli: Cli, config: Config) -> Result<()> {
    let client = ApiClient::new(&config.api.base_url, config.request_timeout())?;
    let dispatcher = CommandDispatcher::new(client.clone());

    match cli.command {
        Command::Watch { states } => watch(&config, client, states).await,
        Command::List { states } => {
            let wanted = wanted_or_configured(states, &config);
            let store = TorrentStore::new(client, wanted.clone());
            if !store.refresh().await {
                bail!("Failed to load torrents, see log for details");
            }
            let snapshot = store.snapshot();
            println!("{}", output::render_list(&filter(&snapshot, &wanted), &snapshot));
            Ok(())
        }
        Command::Show { id } => {
            let torrent = dispatcher.get_torrent(id).await.map_err(user_error)?;
            println!("{}", output::render_detail(&torrent));
            Ok(())
        }
        Command::Add { torrent_file, peers, seed, seed_port, dht, trackers } => {
            let request = AddTorrent {
                torrent_file: Some(read_upload(&torrent_file).await?),
                peers,
                seed_on_completion: seed,
                seed_port,
                enable_dht: dht,
                enable_trackers: trackers,
            };
            report(ApiCommand::AddTorrent, dispatcher.add_torrent(&request).await)
        }
        Command::Seed { torrent_file, files, now, seed_port } => {
            let mut uploads = Vec::with_capacity(files.len());
            for path in &files {
                uploads.push(read_upload(path).await?);
            }
            let request = SeedTorrent {
                torrent_file: Some(read_upload(&torrent_file).await?),
                files: uploads,
                seed_immediately: now,
                seed_port,
            };
            report(ApiCommand::SeedTorrent, dispatcher.seed_torrent(&request).await)
        }
        Command::Cancel { id } => report(ApiCommand::CancelTorrent, dispatcher.cancel_torrent(id).await),
        Command::Retry { id } => report(ApiCommand::RetryTorrent, dispatcher.retry_torrent(id).await),
        Command::Delete { id, delete_files } => report(
            ApiCommand::DeleteTorrent,
            dispatcher.delete_torrent(id, delete_files).await,
        ),
        Command::Seeding { id, toggle } => {
            let enabled = toggle == Toggle::On;
            report(
                ApiCommand::toggle_seed(enabled),
                dispatcher.toggle_seed(id, enabled).await,
            )
        }
        Command::Download { id, file, out } => {
            let bytes = match file {
                Some(file_id) => dispatcher.download_payload_file(id, file_id).await,
                None => dispatcher.download_file(id, FileRef::TorrentFile).await,
            }
            .map_err(user_error)?;
            let file = file.map_or(FileRef::TorrentFile, FileRef::Id);
            tokio::fs::write(&out, &bytes)
                .await
                .context(format!("Failed to write {}", out.display()))?;
            info!(torrent_id = id, file = %file, bytes = bytes.len(), path = %out.display(), "File downloaded");
            println!("Saved {} to {}", file, out.display());
            Ok(())
        }
        Command::Trackers => {
            let trackers = dispatcher.list_trackers().await.map_err(user_error)?;
            println!("{}", output::render_trackers(&trackers));
            Ok(())
        }
        Command::TrackerAdd { url } => report(ApiCommand::AddTracker, dispatcher.add_tracker(&url).await),
        Command::TrackerDelete { id } => report(ApiCommand::DeleteTracker, dispatcher.delete_tracker(id).await),
        Command::Settings => {
            let settings = dispatcher.get_settings().await.map_err(user_error)?;
            println!("{}", output::render_settings(&settings));
            Ok(())
        }
        Command::SetDhtPort { port } => save_setting(&dispatcher, SettingUpdate::DhtPort(port)).await,
        Command::SetBootstrapNodes { nodes } => {
            save_setting(&dispatcher, SettingUpdate::bootstrap_nodes(nodes)).await
        }
        Command::Info => {
            let info = dispatcher.server_info().await.map_err(user_error)?;
            println!("{}", output::render_info(&info));
            Ok(())
        }
    }
}

async fn watch(config: &Config, client: ApiClient, states: Vec<TorrentState>) -> Result<()> {
    let wanted = wanted_or_configured(states, config);
    let mut store = TorrentStore::new(client, wanted.clone());
    let mut updates = store.subscribe();
    store.start(config.poll_interval())?;

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                let age = output::age_secs(&snapshot).unwrap_or(0);
                println!("--- refreshed {}s ago ---", age);
                println!("{}", output::render_list(&filter(&snapshot, &wanted), &snapshot));
            }
        }
    }

    store.stop();
    Ok(())
}

fn wanted_or_configured(states: Vec<TorrentState>, config: &Config) -> Vec<TorrentState> {
    if states.is_empty() {
        config.polling.wanted_states.clone()
    } else {
        states
    }
}

async fn save_setting(dispatcher: &CommandDispatcher, update: SettingUpdate) -> Result<()> {
    let saved = report(ApiCommand::SaveSetting, dispatcher.update_setting(update).await)?;
    let mut settings = dispatcher.get_settings().await.map_err(user_error)?;
    settings.apply(&saved);
    println!("{}", output::render_settings(&settings));
    Ok(())
}

async fn read_upload(path: &Path) -> Result<Upload> {
    let bytes = tokio::fs::read(path)
        .await
        .context(format!("Failed to read {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(Upload::new(file_name, bytes))
}

/// Prints the success message, or turns the failure into the error the user sees
fn report<T>(command: ApiCommand, outcome: ClientResult<T>) -> Result<T> {
    let note = Notification::from_outcome(command, &outcome);
    match outcome {
        Ok(value) => {
            println!("{}", note);
            Ok(value)
        }
        Err(_) => bail!("{}", note),
    }
}

fn user_error(e: torrent_remote::core::error::ClientError) -> anyhow::Error {
    anyhow::anyhow!(e.display_message())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_add() {
        let cli = Cli::try_parse_from([
            "torrent-remote",
            "--api-url",
            "http://127.0.0.1:8000",
            "add",
            "debian.torrent",
            "--peer",
            "1-ff00:0:110,[10.0.0.1]:43000",
            "--dht",
        ])
        .unwrap();
        assert_eq!(cli.api_url.as_deref(), Some("http://127.0.0.1:8000"));
        match cli.command {
            Command::Add { peers, dht, trackers, seed_port, .. } => {
                assert_eq!(peers.len(), 1);
                assert!(dht);
                assert!(!trackers);
                assert_eq!(seed_port, 0);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_states_and_toggle() {
        let cli = Cli::try_parse_from(["torrent-remote", "list", "--state", "seeding", "--state", "failed"]).unwrap();
        match cli.command {
            Command::List { states } => assert_eq!(states, vec![TorrentState::Seeding, TorrentState::Failed]),
            other => panic!("unexpected command {:?}", other),
        }

        assert!(Cli::try_parse_from(["torrent-remote", "list", "--state", "paused"]).is_err());

        let cli = Cli::try_parse_from(["torrent-remote", "seeding", "4", "off"]).unwrap();
        assert!(matches!(cli.command, Command::Seeding { id: 4, toggle: Toggle::Off }));
    }

    #[test]
    fn test_api_url_without_config_file() {
        let cli = Cli::try_parse_from([
            "torrent-remote",
            "--config",
            "/nonexistent/torrent-remote.toml",
            "--api-url",
            "http://10.0.0.5:8000",
            "info",
        ])
        .unwrap();
        let config = load_config(&cli).unwrap();
        assert_eq!(config.api.base_url, "http://10.0.0.5:8000");

        let missing = Cli::try_parse_from(["torrent-remote", "--config", "/nonexistent/torrent-remote.toml", "info"]).unwrap();
        assert!(load_config(&missing).is_err());
    }

    #[test]
    fn test_report_failure_becomes_error() {
        let outcome: ClientResult<()> = Err(torrent_remote::core::error::ClientError::Connection("refused".into()));
        let err = report(ApiCommand::RetryTorrent, outcome).unwrap_err();
        assert_eq!(err.to_string(), "Retrying torrent failed: Connection error! API offline?");
    }
}
