pub mod batch;
pub mod progress;
pub mod selection;
pub mod tracker;

pub use batch::{BatchResult, BatchRunner, TransferFailure};
pub use progress::TransferProgress;
pub use selection::{SelectedFile, Selection, SelectionError, SelectionLimits, SelectionSummary};
pub use tracker::{
    TrackerError, TransferHandle, TransferKind, TransferPhase, TransferSnapshot, TransferTracker,
};
