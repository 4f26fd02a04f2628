//! Background batch processing.
//!
//! A batch loads a list of files in order on one background thread with a
//! fresh [`Session`], reporting progress over a channel. Cancellation is
//! checked between files.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender, unbounded};
use tracing::{info, warn};

use crate::error::{Result, TabforgeError};
use crate::input::file_name;
use crate::session::{Session, SessionConfig};

/// Message sent from the worker thread.
#[derive(Debug)]
pub enum BatchEvent {
    /// About to process a file.
    Progress { percent: u8, message: String },
    /// Every file was processed.
    Completed(BatchOutcome),
    /// A file failed; the remaining files were skipped.
    Failed(String),
    /// The batch was cancelled between files.
    Cancelled,
}

/// Result of a successful batch: the session holding every loaded table and
/// the finished run metadata.
#[derive(Debug)]
pub struct BatchOutcome {
    pub session: Session,
}

/// Shared cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Handle to a running batch.
pub struct BatchWorker {
    events: Receiver<BatchEvent>,
    cancel: CancelToken,
    handle: JoinHandle<()>,
}

impl BatchWorker {
    /// Start processing `files` on a background thread.
    pub fn spawn(files: Vec<PathBuf>, config: SessionConfig) -> Result<Self> {
        let (sender, events) = unbounded();
        let cancel = CancelToken::new();
        let token = cancel.clone();

        let handle = thread::Builder::new()
            .name("tabforge-batch".to_string())
            .spawn(move || run_batch(&files, config, &token, &sender))
            .map_err(|e| TabforgeError::Worker(format!("failed to start worker: {}", e)))?;

        Ok(Self {
            events,
            cancel,
            handle,
        })
    }

    /// Events from the worker, ending when the worker exits.
    pub fn events(&self) -> &Receiver<BatchEvent> {
        &self.events
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Request cancellation. Takes effect before the next file.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait for the batch to end, discarding progress events.
    pub fn wait(self) -> Result<Session> {
        let mut result = None;
        for event in self.events.iter() {
            match event {
                BatchEvent::Progress { .. } => {}
                BatchEvent::Completed(outcome) => result = Some(Ok(outcome.session)),
                BatchEvent::Failed(message) => result = Some(Err(TabforgeError::Worker(message))),
                BatchEvent::Cancelled => {
                    result = Some(Err(TabforgeError::Worker("batch cancelled".to_string())))
                }
            }
        }

        self.handle
            .join()
            .map_err(|_| TabforgeError::Worker("worker thread panicked".to_string()))?;

        result.unwrap_or_else(|| {
            Err(TabforgeError::Worker(
                "worker exited without a result".to_string(),
            ))
        })
    }
}

/// Process `files` in order on the current thread, reporting through `sender`.
///
/// Send failures are ignored: a dropped receiver only means nobody is
/// listening any more.
pub fn run_batch(
    files: &[PathBuf],
    config: SessionConfig,
    cancel: &CancelToken,
    sender: &Sender<BatchEvent>,
) {
    let mut session = Session::with_config(config);
    session.begin_run();

    let total = files.len();
    for (index, path) in files.iter().enumerate() {
        if cancel.is_cancelled() {
            info!(processed = index, total, "batch cancelled");
            sender.send(BatchEvent::Cancelled).ok();
            return;
        }

        let name = file_name(path);
        sender
            .send(BatchEvent::Progress {
                percent: (index * 100 / total) as u8,
                message: format!("Processing {}...", name),
            })
            .ok();

        if let Err(e) = session.load_file(path) {
            warn!(file = %name, error = %e, "batch aborted");
            sender.send(BatchEvent::Failed(e.to_string())).ok();
            return;
        }
    }

    session.finish_run();
    sender
        .send(BatchEvent::Progress {
            percent: 100,
            message: "Processing complete".to_string(),
        })
        .ok();
    sender.send(BatchEvent::Completed(BatchOutcome { session })).ok();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn collect(files: &[PathBuf], cancel: &CancelToken) -> Vec<BatchEvent> {
        let (sender, receiver) = unbounded();
        run_batch(files, SessionConfig::default(), cancel, &sender);
        drop(sender);
        receiver.iter().collect()
    }

    #[test]
    fn test_progress_then_completion() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.csv");
        let b = dir.path().join("b.csv");
        fs::write(&a, "x,y\n1,2\n1,2\n").unwrap();
        fs::write(&b, "z\nfoo\n").unwrap();

        let events = collect(&[a, b], &CancelToken::new());

        let percents: Vec<u8> = events
            .iter()
            .filter_map(|e| match e {
                BatchEvent::Progress { percent, .. } => Some(*percent),
                _ => None,
            })
            .collect();
        assert_eq!(percents, vec![0, 50, 100]);

        match events.last() {
            Some(BatchEvent::Completed(outcome)) => {
                let metadata = outcome.session.metadata();
                assert_eq!(metadata.files_processed, vec!["a.csv", "b.csv"]);
                assert_eq!(metadata.duplicates_removed, 1);
                assert_eq!(metadata.total_records, 2);
                assert!(metadata.finished_at.is_some());
            }
            other => panic!("expected completion, got {:?}", other),
        }
    }

    #[test]
    fn test_failure_aborts_batch() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.csv");
        let later = dir.path().join("later.csv");
        fs::write(&good, "x\n1\n").unwrap();
        fs::write(&later, "x\n2\n").unwrap();
        let missing = dir.path().join("missing.csv");

        let events = collect(&[good, missing, later], &CancelToken::new());

        assert_eq!(events.len(), 3);
        match &events[2] {
            BatchEvent::Failed(message) => assert!(message.contains("missing.csv")),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_cancel_before_start() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.csv");
        fs::write(&a, "x\n1\n").unwrap();

        let cancel = CancelToken::new();
        cancel.cancel();
        let events = collect(&[a], &cancel);

        assert!(matches!(events.as_slice(), [BatchEvent::Cancelled]));
    }

    #[test]
    fn test_worker_thread() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("clientes.csv");
        fs::write(&a, "nome,idade\nAna,30\n").unwrap();

        let worker = BatchWorker::spawn(vec![a], SessionConfig::default()).unwrap();
        let session = worker.wait().unwrap();

        assert!(session.table("clientes").is_some());
    }

    #[test]
    fn test_empty_batch_completes() {
        let events = collect(&[], &CancelToken::new());
        assert!(matches!(events.last(), Some(BatchEvent::Completed(_))));
    }
}
