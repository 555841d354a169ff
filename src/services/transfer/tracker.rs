use super::progress::ProgressObserver;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, ToSchema, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum TransferKind {
    Upload,
    Archive,
}

/// Human-readable stage of a running transfer.
#[derive(Debug, Clone, Copy, Serialize, ToSchema, PartialEq)]
pub enum TransferPhase {
    #[serde(rename = "uploading files")]
    Uploading,
    #[serde(rename = "listing files")]
    ListingFiles,
    #[serde(rename = "creating archive")]
    CreatingArchive,
    #[serde(rename = "download starting")]
    DownloadStarting,
}

impl std::fmt::Display for TransferPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            TransferPhase::Uploading => "uploading files",
            TransferPhase::ListingFiles => "listing files",
            TransferPhase::CreatingArchive => "creating archive",
            TransferPhase::DownloadStarting => "download starting",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TransferSnapshot {
    pub id: String,
    pub kind: TransferKind,
    pub phase: TransferPhase,
    pub percent: u8,
    pub completed: usize,
    pub total: usize,
    /// Set once the transfer has outlived the slow-notice threshold
    pub slow: bool,
    pub started_at: DateTime<Utc>,
}

#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("Transfer '{0}' is already running")]
    AlreadyActive(String),
}

struct TrackedTransfer {
    run: Uuid,
    snapshot: TransferSnapshot,
}

/// Live view of in-flight transfers, keyed by transfer id.
///
/// An entry belongs to exactly one run: `begin` refuses an id that is still
/// live, and only the `TransferHandle` returned by `begin` can update or
/// remove it. Dropping the handle removes the entry, so a run that is
/// abandoned midway (client gone, future dropped) leaves nothing behind.
#[derive(Clone, Default)]
pub struct TransferTracker {
    transfers: Arc<DashMap<String, TrackedTransfer>>,
}

impl TransferTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(
        &self,
        id: &str,
        kind: TransferKind,
        phase: TransferPhase,
        total: usize,
    ) -> Result<TransferHandle, TrackerError> {
        let run = Uuid::new_v4();
        match self.transfers.entry(id.to_string()) {
            Entry::Occupied(_) => {
                tracing::warn!("⛔ Transfer {} is already running", id);
                Err(TrackerError::AlreadyActive(id.to_string()))
            }
            Entry::Vacant(slot) => {
                slot.insert(TrackedTransfer {
                    run,
                    snapshot: TransferSnapshot {
                        id: id.to_string(),
                        kind,
                        phase,
                        percent: 0,
                        completed: 0,
                        total,
                        slow: false,
                        started_at: Utc::now(),
                    },
                });
                Ok(TransferHandle {
                    tracker: self.clone(),
                    id: id.to_string(),
                    run,
                    slow_notice: None,
                })
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<TransferSnapshot> {
        self.transfers
            .get(id)
            .map(|entry| entry.value().snapshot.clone())
    }

    pub fn active_count(&self) -> usize {
        self.transfers.len()
    }

    /// Applies `update` only if `id` is still owned by `run`.
    fn update_run(&self, id: &str, run: Uuid, update: impl FnOnce(&mut TransferSnapshot)) {
        if let Some(mut entry) = self.transfers.get_mut(id).filter(|entry| entry.run == run) {
            update(&mut entry.snapshot);
        }
    }

    fn release(&self, id: &str, run: Uuid) {
        self.transfers.remove_if(id, |_, tracked| tracked.run == run);
    }
}

fn apply_progress(snapshot: &mut TransferSnapshot, completed: usize, total: usize, percent: u8) {
    snapshot.completed = completed;
    snapshot.total = total;
    // Observers can race on a multi-threaded runtime; keep the max.
    snapshot.percent = snapshot.percent.max(percent);
}

/// Ownership of one tracker entry for the lifetime of a transfer.
pub struct TransferHandle {
    tracker: TransferTracker,
    id: String,
    run: Uuid,
    slow_notice: Option<tokio::task::JoinHandle<()>>,
}

impl TransferHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_phase(&self, phase: TransferPhase) {
        self.tracker
            .update_run(&self.id, self.run, |snapshot| snapshot.phase = phase);
        tracing::info!("🔄 Transfer {}: {}", self.id, phase);
    }

    pub fn update_progress(&self, completed: usize, total: usize, percent: u8) {
        self.tracker.update_run(&self.id, self.run, |snapshot| {
            apply_progress(snapshot, completed, total, percent)
        });
    }

    /// Feeds batch progress into this run's entry.
    pub fn progress_observer(&self) -> ProgressObserver {
        let tracker = self.tracker.clone();
        let id = self.id.clone();
        let run = self.run;
        Arc::new(move |completed, total, percent| {
            tracker.update_run(&id, run, |snapshot| {
                apply_progress(snapshot, completed, total, percent)
            })
        })
    }

    /// Schedules the slow-transfer notice; it is cancelled when the handle drops.
    pub fn arm_slow_notice(&mut self, after: Duration) {
        let tracker = self.tracker.clone();
        let id = self.id.clone();
        let run = self.run;
        let task = tokio::spawn(async move {
            tokio::time::sleep(after).await;
            tracing::warn!(
                "🐢 Transfer {} still running after {}s, large transfers may take a while",
                id,
                after.as_secs()
            );
            tracker.update_run(&id, run, |snapshot| snapshot.slow = true);
        });
        if let Some(previous) = self.slow_notice.replace(task) {
            previous.abort();
        }
    }
}

impl Drop for TransferHandle {
    fn drop(&mut self) {
        if let Some(task) = self.slow_notice.take() {
            task.abort();
        }
        self.tracker.release(&self.id, self.run);
    }
}
