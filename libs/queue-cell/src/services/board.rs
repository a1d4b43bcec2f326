use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{broadcast::error::RecvError, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_database::{ChangeFeed, Table};

use crate::error::QueueError;
use crate::models::{QueueItem, QueueScope, QueueStatus};
use crate::services::projection::QueueProjection;
use crate::services::queue::{QueueService, StartPolicy};

#[derive(Debug, Clone, Copy)]
enum Transition {
    Set(QueueStatus),
    Start(StartPolicy),
    Complete,
}

#[derive(Debug, Default)]
struct BoardEntry {
    projection: QueueProjection,
    stale: bool,
}

/// Shared projections per scope. Change signals mark scopes stale and the
/// next read refetches them in full.
///
/// Fetches and confirmed writes draw snapshot numbers from one counter, so a
/// fetch that started before a write can never overwrite it. Remote calls
/// are made without holding the projection lock; transitions are serialised
/// among themselves only.
#[derive(Clone)]
pub struct QueueBoard {
    service: Arc<QueueService>,
    entries: Arc<RwLock<HashMap<QueueScope, BoardEntry>>>,
    versions: Arc<AtomicU64>,
    transitions: Arc<Mutex<()>>,
}

impl QueueBoard {
    pub fn new(service: Arc<QueueService>) -> Self {
        Self {
            service,
            entries: Arc::new(RwLock::new(HashMap::new())),
            versions: Arc::new(AtomicU64::new(0)),
            transitions: Arc::new(Mutex::new(())),
        }
    }

    pub fn service(&self) -> &QueueService {
        &self.service
    }

    fn next_version(&self) -> u64 {
        self.versions.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Current projection for `scope`, refetched when missing or stale.
    pub async fn snapshot(&self, scope: QueueScope, auth_token: &str) -> Result<QueueProjection, QueueError> {
        {
            let entries = self.entries.read().await;
            if let Some(entry) = entries.get(&scope).filter(|e| !e.stale) {
                return Ok(entry.projection.clone());
            }
        }
        self.reload(scope, auth_token).await
    }

    async fn reload(&self, scope: QueueScope, auth_token: &str) -> Result<QueueProjection, QueueError> {
        let version = self.next_version();
        let items = self.service.store().fetch_queue(scope, auth_token).await?;

        let mut entries = self.entries.write().await;
        let entry = entries.entry(scope).or_default();
        if entry.projection.apply_snapshot(version, items) {
            entry.stale = false;
            debug!("Queue {:?} refreshed to snapshot {}", scope, version);
        }
        Ok(entry.projection.clone())
    }

    pub async fn invalidate_all(&self) {
        let mut entries = self.entries.write().await;
        for entry in entries.values_mut() {
            entry.stale = true;
        }
    }

    pub async fn update_status(
        &self,
        scope: QueueScope,
        item_id: Uuid,
        status: QueueStatus,
        auth_token: &str,
    ) -> Result<QueueItem, QueueError> {
        self.apply(scope, item_id, Transition::Set(status), auth_token).await
    }

    pub async fn start(
        &self,
        scope: QueueScope,
        item_id: Uuid,
        policy: StartPolicy,
        auth_token: &str,
    ) -> Result<QueueItem, QueueError> {
        self.apply(scope, item_id, Transition::Start(policy), auth_token).await
    }

    pub async fn complete(
        &self,
        scope: QueueScope,
        item_id: Uuid,
        auth_token: &str,
    ) -> Result<QueueItem, QueueError> {
        self.apply(scope, item_id, Transition::Complete, auth_token).await
    }

    /// Run a transition for an item of `scope`, making sure the item is
    /// loaded first. An item missing from a cached projection triggers one
    /// refetch before giving up. The transition is validated and written
    /// against a copy; the board only takes the confirmed result.
    async fn apply(
        &self,
        scope: QueueScope,
        item_id: Uuid,
        transition: Transition,
        auth_token: &str,
    ) -> Result<QueueItem, QueueError> {
        let _serial = self.transitions.lock().await;

        let mut working = self.snapshot(scope, auth_token).await?;
        if working.get(item_id).is_none() {
            working = self.reload(scope, auth_token).await?;
        }

        let item = match transition {
            Transition::Set(status) => {
                self.service.update_status(&mut working, item_id, status, auth_token).await?
            }
            Transition::Start(policy) => {
                self.service.start(&mut working, item_id, policy, auth_token).await?
            }
            Transition::Complete => {
                self.service.complete(&mut working, item_id, auth_token).await?
            }
        };

        let version = self.next_version();
        let mut entries = self.entries.write().await;
        let entry = entries.entry(scope).or_default();
        if !entry.projection.apply_local(version, &item) {
            debug!("Queue {:?} no longer holds item {}, refetching on next read", scope, item_id);
            entry.stale = true;
        }
        Ok(item)
    }

    /// Mark every scope stale whenever queue items or appointments change.
    pub async fn listen(&self, feed: &ChangeFeed) -> JoinHandle<()> {
        let mut queue_rx = feed.subscribe(Table::QueueItems).await;
        let mut appointment_rx = feed.subscribe(Table::Appointments).await;
        let board = self.clone();

        tokio::spawn(async move {
            info!("Queue board listening for changes");
            loop {
                let received = tokio::select! {
                    r = queue_rx.recv() => r,
                    r = appointment_rx.recv() => r,
                };

                match received {
                    Ok(signal) => {
                        debug!("{} changed, queue projections are stale", signal.table);
                        board.invalidate_all().await;
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Queue board skipped {} change signals", skipped);
                        board.invalidate_all().await;
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}
