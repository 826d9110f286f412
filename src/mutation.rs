use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
#[cfg(test)]
use std::time::Duration;

use crate::error::{BlogError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationStatus {
    Idle,
    Pending,
    Success,
    Error,
}

/// Tracks one background write at a time.
///
/// The write runs on a worker thread; its result is handed back exactly once
/// through [`Mutation::poll`] on the owning thread.
pub struct Mutation<T> {
    status: MutationStatus,
    error: Option<BlogError>,
    receiver: Option<Receiver<Result<T>>>,
}

impl<T> Default for Mutation<T> {
    fn default() -> Self {
        Self {
            status: MutationStatus::Idle,
            error: None,
            receiver: None,
        }
    }
}

impl<T: Send + 'static> Mutation<T> {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn status(&self) -> MutationStatus {
        self.status
    }

    pub fn is_pending(&self) -> bool {
        self.status == MutationStatus::Pending
    }

    pub fn error(&self) -> Option<&BlogError> {
        self.error.as_ref()
    }

    /// Starts `write` unless another write is still pending.
    pub fn start<F>(&mut self, write: F) -> bool
    where
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        if self.is_pending() {
            return false;
        }

        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let _ = tx.send(write());
        });

        self.status = MutationStatus::Pending;
        self.error = None;
        self.receiver = Some(rx);
        true
    }

    /// Returns the write's result once it has finished, and `None` before
    /// that or after it has already been reported.
    pub fn poll(&mut self) -> Option<Result<T>> {
        let rx = self.receiver.as_ref()?;
        let result = match rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => Err(BlogError::Transport(
                "write worker exited without a result".to_string(),
            )),
        };
        Some(self.finish(result))
    }

    /// Blocking variant of [`poll`](Self::poll).
    #[cfg(test)]
    pub fn wait(&mut self, timeout: Duration) -> Option<Result<T>> {
        let rx = self.receiver.as_ref()?;
        let result = match rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(mpsc::RecvTimeoutError::Timeout) => return None,
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(BlogError::Transport(
                "write worker exited without a result".to_string(),
            )),
        };
        Some(self.finish(result))
    }

    /// Forgets a finished write's outcome. A pending write keeps running but
    /// its result will never be reported.
    pub fn reset(&mut self) {
        self.status = MutationStatus::Idle;
        self.error = None;
        self.receiver = None;
    }

    fn finish(&mut self, result: Result<T>) -> Result<T> {
        self.receiver = None;
        match &result {
            Ok(_) => {
                self.status = MutationStatus::Success;
                self.error = None;
            }
            Err(err) => {
                self.status = MutationStatus::Error;
                self.error = Some(err.clone());
            }
        }
        result
    }
}
