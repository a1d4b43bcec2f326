use tracing::debug;
use uuid::Uuid;

use crate::models::{QueueCounts, QueueItem, QueueStatus, WaitingEntry};

/// In-memory view of the queue items for one scope, kept in fetch order.
///
/// Every full fetch is applied as a numbered snapshot. A snapshot older than
/// the one already held is dropped, so when two refreshes race the later
/// fetch wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueueProjection {
    items: Vec<QueueItem>,
    version: u64,
}

impl QueueProjection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_items(items: Vec<QueueItem>) -> Self {
        Self { items, version: 0 }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn items(&self) -> &[QueueItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Replace the items with a fetched snapshot. Returns false when the
    /// snapshot is older than what is held.
    pub fn apply_snapshot(&mut self, version: u64, items: Vec<QueueItem>) -> bool {
        if version < self.version {
            debug!("Discarding stale queue snapshot {} (holding {})", version, self.version);
            return false;
        }
        self.items = items;
        self.version = version;
        true
    }

    /// Record a confirmed write as snapshot `version`, so that fetches which
    /// started before it can no longer replace it. Returns false when the
    /// item is not held or a newer snapshot is already in place.
    pub fn apply_local(&mut self, version: u64, item: &QueueItem) -> bool {
        if version < self.version {
            return false;
        }
        let Some(held) = self.items.iter_mut().find(|held| held.id == item.id) else {
            return false;
        };
        *held = item.clone();
        self.version = version;
        true
    }

    pub fn get(&self, id: Uuid) -> Option<&QueueItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Set the status of one item in place. Only called once the store has
    /// confirmed the write.
    pub(crate) fn set_status(&mut self, id: Uuid, status: QueueStatus) -> Option<&QueueItem> {
        let item = self.items.iter_mut().find(|item| item.id == id)?;
        item.status = status;
        Some(item)
    }

    pub fn with_status(&self, status: QueueStatus) -> impl Iterator<Item = &QueueItem> {
        self.items.iter().filter(move |item| item.status == status)
    }

    pub fn waiting(&self) -> Vec<&QueueItem> {
        self.with_status(QueueStatus::Waiting).collect()
    }

    /// Waiting list with 1-based positions in fetch order.
    pub fn waiting_entries(&self) -> Vec<WaitingEntry> {
        self.with_status(QueueStatus::Waiting)
            .enumerate()
            .map(|(index, item)| WaitingEntry { position: index + 1, item: item.clone() })
            .collect()
    }

    /// The patient currently with the doctor, if any.
    pub fn current(&self) -> Option<&QueueItem> {
        self.with_status(QueueStatus::InProgress).next()
    }

    pub fn has_consultation_in_progress(&self) -> bool {
        self.current().is_some()
    }

    pub fn counts(&self) -> QueueCounts {
        let mut counts = QueueCounts { total: self.items.len(), ..QueueCounts::default() };
        for item in &self.items {
            match item.status {
                QueueStatus::Waiting => counts.waiting += 1,
                QueueStatus::InProgress => counts.in_progress += 1,
                QueueStatus::Completed => counts.completed += 1,
            }
        }
        counts
    }

    /// Case-insensitive substring match on the patient name. An empty term
    /// matches everything.
    pub fn filter_by_search_term(&self, term: &str) -> Vec<&QueueItem> {
        let needle = term.trim().to_lowercase();
        self.items
            .iter()
            .filter(|item| needle.is_empty() || item.patient_name.to_lowercase().contains(&needle))
            .collect()
    }
}
