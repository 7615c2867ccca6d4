use crate::api::client::ApiClient;
use crate::core::error::{ClientError, ClientResult};
use crate::models::{Torrent, TorrentState};
use crate::utils::time::current_timestamp_millis;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Point-in-time copy of the server's torrent collection
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Snapshot {
    /// Ascending id order
    pub torrents: BTreeMap<u64, Torrent>,
    /// False until the first successful fetch
    pub loaded: bool,
    /// Sequence number of the response this snapshot came from
    pub sequence: u64,
    /// Unix millis of the applied response
    pub fetched_at: Option<i64>,
    /// The most recent fetch failed; `torrents` may be out of date
    pub stale: bool,
}

impl Snapshot {
    pub fn get(&self, id: u64) -> Option<&Torrent> {
        self.torrents.get(&id)
    }

    pub fn len(&self) -> usize {
        self.torrents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.torrents.is_empty()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Idle,
    Running,
    Stopped,
}

struct StoreState {
    phase: Phase,
    /// Bumped on every start/stop; responses from another epoch are dropped
    epoch: u64,
    last_applied: u64,
    /// Highest sequence that ended in failure
    last_failed: u64,
}

/// Identifies one outgoing fetch
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct FetchTicket {
    sequence: u64,
    epoch: u64,
}

struct Shared {
    client: ApiClient,
    wanted: Vec<TorrentState>,
    next_sequence: AtomicU64,
    state: Mutex<StoreState>,
    snapshot: watch::Sender<Arc<Snapshot>>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn issue(&self) -> FetchTicket {
        let epoch = self.lock().epoch;
        let sequence = self.next_sequence.fetch_add(1, Ordering::SeqCst) + 1;
        FetchTicket { sequence, epoch }
    }

    async fn fetch(self: Arc<Self>, ticket: FetchTicket) {
        debug!(sequence = ticket.sequence, "Fetching torrents");
        let outcome = self.client.list_torrents(&self.wanted).await;
        self.apply(ticket, outcome);
    }

    /// Applies a completed fetch. Returns true if the snapshot was replaced.
    fn apply(&self, ticket: FetchTicket, outcome: ClientResult<BTreeMap<u64, Torrent>>) -> bool {
        let mut state = self.lock();

        if state.phase == Phase::Stopped || ticket.epoch != state.epoch {
            debug!(sequence = ticket.sequence, "Discarding response after stop");
            return false;
        }

        match outcome {
            Ok(torrents) => {
                if ticket.sequence <= state.last_applied {
                    debug!(
                        sequence = ticket.sequence,
                        last_applied = state.last_applied,
                        "Discarding out-of-order response"
                    );
                    return false;
                }

                let first_load = state.last_applied == 0;
                state.last_applied = ticket.sequence;
                let snapshot = Snapshot {
                    stale: ticket.sequence < state.last_failed,
                    torrents,
                    loaded: true,
                    sequence: ticket.sequence,
                    fetched_at: Some(current_timestamp_millis()),
                };

                if first_load {
                    info!(torrents = snapshot.len(), "Torrent list loaded");
                } else {
                    debug!(
                        sequence = ticket.sequence,
                        torrents = snapshot.len(),
                        "Torrent snapshot replaced"
                    );
                }

                self.snapshot.send_replace(Arc::new(snapshot));
                true
            }
            Err(e) => {
                warn!(
                    sequence = ticket.sequence,
                    error = %e,
                    "Failed to refresh torrents, keeping previous snapshot"
                );

                state.last_failed = state.last_failed.max(ticket.sequence);
                let current = self.snapshot.borrow().clone();
                if current.loaded && !current.stale && ticket.sequence > state.last_applied {
                    let mut stale = (*current).clone();
                    stale.stale = true;
                    self.snapshot.send_replace(Arc::new(stale));
                }
                false
            }
        }
    }
}

/// Periodically refreshed view of the remote torrent collection.
///
/// Each tick issues an independent request; responses are applied only when
/// they are newer than everything applied so far, so a slow request can never
/// overwrite a faster, later one. After [`TorrentStore::stop`] every
/// in-flight response is discarded.
pub struct TorrentStore {
    shared: Arc<Shared>,
    ticker: Option<JoinHandle<()>>,
}

impl TorrentStore {
    /// `wanted` restricts the server-side listing; empty means everything
    pub fn new(client: ApiClient, wanted: Vec<TorrentState>) -> Self {
        let (snapshot, _) = watch::channel(Arc::new(Snapshot::default()));

        Self {
            shared: Arc::new(Shared {
                client,
                wanted,
                next_sequence: AtomicU64::new(0),
                state: Mutex::new(StoreState {
                    phase: Phase::Idle,
                    epoch: 0,
                    last_applied: 0,
                    last_failed: 0,
                }),
                snapshot,
            }),
            ticker: None,
        }
    }

    /// Current snapshot; cheap to call
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.shared.snapshot.borrow().clone()
    }

    /// Receiver notified on every snapshot replacement
    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.shared.snapshot.subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.ticker.is_some()
    }

    /// Begin polling every `interval`, starting immediately.
    /// Fails when called outside a tokio runtime.
    pub fn start(&mut self, interval: Duration) -> ClientResult<()> {
        if interval.is_zero() {
            return Err(ClientError::validation("Polling interval must be greater than 0"));
        }
        if self.ticker.is_some() {
            return Ok(());
        }
        let runtime = Handle::try_current()
            .map_err(|e| ClientError::validation(format!("Polling needs a tokio runtime: {}", e)))?;

        {
            let mut state = self.shared.lock();
            state.phase = Phase::Running;
            state.epoch += 1;
        }

        info!(
            interval_ms = interval.as_millis() as u64,
            wanted_states = %TorrentState::join(&self.shared.wanted),
            "Torrent polling started"
        );

        let shared = Arc::clone(&self.shared);
        self.ticker = Some(runtime.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // Dropped with this task, which aborts whatever is still in flight
            let mut in_flight = JoinSet::new();

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let ticket = shared.issue();
                        in_flight.spawn(Arc::clone(&shared).fetch(ticket));
                    }
                    Some(_) = in_flight.join_next(), if !in_flight.is_empty() => {}
                }
            }
        }));

        Ok(())
    }

    /// Cancel polling. Responses still in flight become no-ops.
    pub fn stop(&mut self) {
        {
            let mut state = self.shared.lock();
            if state.phase != Phase::Stopped {
                state.phase = Phase::Stopped;
                state.epoch += 1;
            }
        }

        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
            info!("Torrent polling stopped");
        }
    }

    /// One fetch outside the timer. Returns whether the snapshot was replaced;
    /// fetch failures are logged and leave the snapshot untouched.
    pub async fn refresh(&self) -> bool {
        let ticket = self.shared.issue();
        let outcome = self.shared.client.list_torrents(&self.shared.wanted).await;
        self.shared.apply(ticket, outcome)
    }

    #[cfg(test)]
    pub(crate) fn issue(&self) -> FetchTicket {
        self.shared.issue()
    }

    #[cfg(test)]
    pub(crate) fn apply(&self, ticket: FetchTicket, outcome: ClientResult<BTreeMap<u64, Torrent>>) -> bool {
        self.shared.apply(ticket, outcome)
    }
}

impl Drop for TorrentStore {
    fn drop(&mut self) {
        self.stop();
    }
}
