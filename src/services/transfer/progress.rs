use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Receives `(completed, total, percent)` after every settled item.
pub type ProgressObserver = Arc<dyn Fn(usize, usize, u8) + Send + Sync>;

/// Completed-over-total counter for one transfer.
///
/// Created at zero when a transfer starts and dropped when it ends. Only the
/// batch loop advances it, and items settle one at a time on that task, so the
/// reported percentage never decreases.
pub struct TransferProgress {
    total: usize,
    completed: AtomicUsize,
    observer: Option<ProgressObserver>,
}

impl TransferProgress {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            completed: AtomicUsize::new(0),
            observer: None,
        }
    }

    pub fn with_observer(total: usize, observer: ProgressObserver) -> Self {
        Self {
            observer: Some(observer),
            ..Self::new(total)
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn percent(&self) -> u8 {
        percent_of(self.completed(), self.total)
    }

    /// Counts one settled item, success or failure, and notifies the observer.
    pub fn record_completion(&self) -> u8 {
        let completed = (self.completed.fetch_add(1, Ordering::SeqCst) + 1).min(self.total);
        let percent = percent_of(completed, self.total);
        if let Some(observer) = &self.observer {
            observer(completed, self.total, percent);
        }
        percent
    }
}

/// `round(completed / total * 100)`; an empty transfer counts as done.
pub fn percent_of(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    let ratio = completed.min(total) as f64 / total as f64;
    (ratio * 100.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_percent_rounding() {
        assert_eq!(percent_of(0, 3), 0);
        assert_eq!(percent_of(1, 3), 33);
        assert_eq!(percent_of(2, 3), 67);
        assert_eq!(percent_of(3, 3), 100);
        assert_eq!(percent_of(100, 250), 40);
        assert_eq!(percent_of(0, 0), 100);
    }

    #[test]
    fn test_observer_sees_every_completion() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let progress = TransferProgress::with_observer(
            4,
            Arc::new(move |_, _, percent| sink.lock().unwrap().push(percent)),
        );
        for _ in 0..4 {
            progress.record_completion();
        }
        assert_eq!(*seen.lock().unwrap(), vec![25, 50, 75, 100]);
        assert_eq!(progress.completed(), 4);
    }
}
