use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, RwLock};
use tracing::debug;
use uuid::Uuid;

pub type ChangeSender = broadcast::Sender<ChangeSignal>;
pub type ChangeReceiver = broadcast::Receiver<ChangeSignal>;

/// Tables whose changes dashboards refresh on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Appointments,
    QueueItems,
    Notifications,
    Doctors,
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Table::Appointments => "appointments",
            Table::QueueItems => "queue_items",
            Table::Notifications => "notifications",
            Table::Doctors => "doctors",
        };
        f.write_str(name)
    }
}

/// "Something changed in this table." Carries no row data: receivers
/// refetch the whole collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeSignal {
    pub table: Table,
    /// Owning identity the change is filtered by, when there is one.
    pub owner_id: Option<Uuid>,
    pub at: DateTime<Utc>,
}

/// In-process stand-in for the Supabase realtime channels: one broadcast
/// channel per table.
pub struct ChangeFeed {
    channels: Arc<RwLock<HashMap<Table, ChangeSender>>>,
    capacity: usize,
}

impl ChangeFeed {
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            channels: Arc::new(RwLock::new(HashMap::new())),
            capacity,
        }
    }

    async fn sender(&self, table: Table) -> ChangeSender {
        if let Some(sender) = self.channels.read().await.get(&table) {
            return sender.clone();
        }

        let mut channels = self.channels.write().await;
        channels
            .entry(table)
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }

    pub async fn subscribe(&self, table: Table) -> ChangeReceiver {
        let receiver = self.sender(table).await.subscribe();
        debug!("New subscriber on {} changes", table);
        receiver
    }

    /// Announce a change. Returns how many subscribers were told.
    pub async fn publish(&self, table: Table, owner_id: Option<Uuid>) -> usize {
        let signal = ChangeSignal { table, owner_id, at: Utc::now() };

        match self.sender(table).await.send(signal) {
            Ok(receivers) => {
                debug!("Published {} change to {} subscribers", table, receivers);
                receivers
            }
            Err(_) => {
                debug!("No subscribers for {} change", table);
                0
            }
        }
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for ChangeFeed {
    fn clone(&self) -> Self {
        Self {
            channels: Arc::clone(&self.channels),
            capacity: self.capacity,
        }
    }
}
