//! Plain-text rendering for the CLI. Every function returns the text so it
//! can be printed or checked as-is.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use torrent_remote::classify::{classify, TorrentView};
use torrent_remote::models::{ServerInfo, Settings, Torrent, Tracker};
use torrent_remote::stores::torrent_store::Snapshot;
use torrent_remote::utils::format::format_bytes;
use torrent_remote::utils::time::current_timestamp_millis;
use torrent_remote::view::filter::ListView;

pub const EMPTY_LIST: &str = "No torrents yet. Add one with `torrent-remote add` or `torrent-remote seed`.";
pub const STALE_NOTICE: &str = "(data may be stale, last refresh failed)";

pub fn render_list(view: &ListView<'_>, snapshot: &Snapshot) -> String {
    let mut out = String::new();
    match view {
        ListView::Loading => out.push_str("Loading..."),
        ListView::Empty => out.push_str(EMPTY_LIST),
        ListView::Populated(_) => {
            let _ = write!(out, "{:>5}  {:<15}  {:>6}  {:<7}  NAME", "ID", "STATE", "PROG", "COLOR");
            for (torrent, view) in view.rows() {
                let _ = write!(
                    out,
                    "\n{:>5}  {:<15}  {:>6}  {:<7}  {}",
                    torrent.id,
                    torrent.state.as_str(),
                    view.progress.label(),
                    view.color.as_str(),
                    torrent.name
                );
                if !view.status_text.is_empty() {
                    let _ = write!(out, "\n{:>5}  {}", "", view.status_text);
                }
            }
        }
    }
    if snapshot.stale {
        let _ = write!(out, "\n{}", STALE_NOTICE);
    }
    out
}

pub fn render_detail(torrent: &Torrent) -> String {
    let view: TorrentView = classify(torrent);
    let mut out = String::new();
    let _ = writeln!(out, "id: {}", torrent.id);
    let _ = writeln!(out, "name: {}", torrent.name);
    let _ = writeln!(out, "state: {}", torrent.state);
    let _ = writeln!(out, "progress: {}", view.progress.label());
    let _ = writeln!(
        out,
        "pieces: {}/{} ({} each)",
        torrent.num_downloaded_pieces,
        torrent.num_pieces,
        format_bytes(torrent.piece_length)
    );
    if !view.status_text.is_empty() {
        let _ = writeln!(out, "status: {}", view.status_text);
    }
    if !torrent.peers.is_empty() {
        let _ = writeln!(out, "peers: {}", torrent.peers.join(", "));
    }
    let _ = writeln!(out, "seed on completion: {}", yes_no(torrent.seed_on_completion));
    if !torrent.seed_addr.is_empty() {
        let _ = writeln!(out, "seeding at: {}", torrent.seed_addr);
    }
    let _ = writeln!(out, "dht: {}  trackers: {}", yes_no(torrent.enable_dht), yes_no(torrent.enable_trackers));
    let _ = writeln!(
        out,
        "connections: {}  paths: {}",
        torrent.metrics.num_conns, torrent.metrics.num_paths
    );
    for file in &torrent.files {
        let _ = writeln!(
            out,
            "file {}: {} ({}, {:.0}%){}",
            file.id,
            file.path,
            format_bytes(file.length),
            file.progress_percent(),
            if file.is_complete() { " [downloadable]" } else { "" }
        );
    }
    let actions: Vec<String> = view.actions.iter().map(ToString::to_string).collect();
    let _ = write!(out, "actions: {}", actions.join(", "));
    out
}

pub fn render_trackers(trackers: &BTreeMap<u64, Tracker>) -> String {
    if trackers.is_empty() {
        return "No trackers configured.".to_string();
    }
    trackers
        .values()
        .map(|tracker| format!("{:>5}  {}", tracker.id, tracker.url))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_settings(settings: &Settings) -> String {
    let mut out = format!("dht port: {}\nbootstrap nodes:", settings.dht_port);
    if settings.dht_bootstrap_nodes.is_empty() {
        out.push_str(" none");
    }
    for node in &settings.dht_bootstrap_nodes {
        let _ = write!(out, "\n  {}", node);
    }
    out
}

pub fn render_info(info: &ServerInfo) -> String {
    format!("server version: {}", info.version)
}

/// Seconds since the snapshot was fetched, for the watch header
pub fn age_secs(snapshot: &Snapshot) -> Option<i64> {
    snapshot
        .fetched_at
        .map(|at| (current_timestamp_millis() - at).max(0) / 1000)
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use torrent_remote::models::{TorrentFile, TorrentMetrics, TorrentState};
    use torrent_remote::view::filter::filter;

    fn torrent(id: u64, state: TorrentState) -> Torrent {
        Torrent {
            id,
            name: format!("ubuntu-{}.iso", id),
            state,
            status: None,
            peers: vec!["1-ff00:0:110,[10.0.0.1]:43000".into()],
            seed_on_completion: true,
            seed_port: 0,
            seed_addr: String::new(),
            enable_dht: false,
            enable_trackers: false,
            files: vec![TorrentFile {
                id: 1,
                path: format!("ubuntu-{}.iso", id),
                length: 2048,
                progress: 1024,
            }],
            metrics: TorrentMetrics::default(),
            num_pieces: 4,
            num_downloaded_pieces: 2,
            piece_length: 512,
        }
    }

    fn snapshot(torrents: Vec<Torrent>) -> Snapshot {
        Snapshot {
            torrents: torrents.into_iter().map(|t| (t.id, t)).collect(),
            loaded: true,
            sequence: 1,
            fetched_at: None,
            stale: false,
        }
    }

    #[test]
    fn test_loading_and_empty_lists() {
        let unloaded = Snapshot::default();
        assert_eq!(render_list(&filter(&unloaded, &[]), &unloaded), "Loading...");

        let empty = snapshot(Vec::new());
        assert_eq!(render_list(&filter(&empty, &[]), &empty), EMPTY_LIST);
    }

    #[test]
    fn test_list_rows_and_stale_notice() {
        let mut snap = snapshot(vec![torrent(3, TorrentState::Running)]);
        snap.stale = true;
        let text = render_list(&filter(&snap, &[]), &snap);
        assert!(text.contains("ubuntu-3.iso"));
        assert!(text.contains("50%"));
        assert!(text.ends_with(STALE_NOTICE));
    }

    #[test]
    fn test_detail_lists_actions() {
        let text = render_detail(&torrent(3, TorrentState::Running));
        assert!(text.contains("state: running"));
        assert!(text.contains("pieces: 2/4 (512 B each)"));
        assert!(text.ends_with("actions: cancel"));
    }

    #[test]
    fn test_detail_marks_only_complete_files_downloadable() {
        let mut torrent = torrent(3, TorrentState::Running);
        torrent.files.push(TorrentFile {
            id: 2,
            path: "ubuntu-3.sig".into(),
            length: 512,
            progress: 512,
        });
        let text = render_detail(&torrent);
        assert!(text.contains("file 1: ubuntu-3.iso (2 KiB, 50%)\n"));
        assert!(text.contains("file 2: ubuntu-3.sig (512 B, 100%) [downloadable]\n"));
    }

    #[test]
    fn test_trackers_and_settings() {
        assert_eq!(render_trackers(&BTreeMap::new()), "No trackers configured.");
        let trackers = BTreeMap::from([(2, Tracker { id: 2, url: "http://t.example/announce".into() })]);
        assert_eq!(render_trackers(&trackers), "    2  http://t.example/announce");

        let settings = Settings {
            dht_port: 7000,
            dht_bootstrap_nodes: Vec::new(),
        };
        assert_eq!(render_settings(&settings), "dht port: 7000\nbootstrap nodes: none");
    }
}
