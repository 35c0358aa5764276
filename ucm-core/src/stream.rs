//! Cancellable log subscriptions
//!
//! A [`LogSubscription`] is the consumer end of a bounded line channel. While
//! paused the consumer simply stops draining; lines keep accumulating in the
//! channel until it is full, after which the producer blocks. Nothing is lost.
//! Cancelling (or dropping) the subscription signals the producer and kills
//! the attached process, if any.

use std::process::Child;
use std::sync::mpsc::{self, Receiver, SyncSender, TryRecvError};

use tracing::debug;

use crate::execute::CancelHandle;

/// Producer end of a log subscription
#[derive(Debug, Clone)]
pub struct LogSender {
    sender: SyncSender<String>,
    cancel: CancelHandle,
}

impl LogSender {
    /// Delivers one line, blocking while the buffer is full
    ///
    /// Returns false once the subscription is cancelled or gone; the
    /// producer should stop.
    pub fn send(&self, line: String) -> bool {
        if self.cancel.is_cancelled() {
            return false;
        }
        self.sender.send(line).is_ok()
    }

    /// Returns true once the consumer cancelled
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Consumer end of a bounded log line stream
#[derive(Debug)]
pub struct LogSubscription {
    receiver: Receiver<String>,
    cancel: CancelHandle,
    child: Option<Child>,
    paused: bool,
    finished: bool,
}

impl LogSubscription {
    /// Creates a connected sender/subscription pair
    #[must_use]
    pub fn channel(capacity: usize) -> (LogSender, Self) {
        let (sender, receiver) = mpsc::sync_channel(capacity.max(1));
        let cancel = CancelHandle::new();
        (
            LogSender {
                sender,
                cancel: cancel.clone(),
            },
            Self {
                receiver,
                cancel,
                child: None,
                paused: false,
                finished: false,
            },
        )
    }

    /// Attaches the process producing the lines so cancel can stop it
    #[must_use]
    pub fn with_child(mut self, child: Child) -> Self {
        self.child = Some(child);
        self
    }

    /// Stops consuming; buffered lines are kept
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Continues consuming from where the pause left off
    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Flips between paused and running; returns true if now paused
    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        self.paused
    }

    /// Returns true while paused
    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    /// Returns true once the producer is gone and every line was drained
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.finished
    }

    /// Returns true once cancelled
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Takes up to `max` buffered lines without blocking
    ///
    /// Returns nothing while paused or cancelled.
    pub fn drain(&mut self, max: usize) -> Vec<String> {
        let mut lines = Vec::new();
        if self.paused || self.is_cancelled() {
            return lines;
        }

        while lines.len() < max {
            match self.receiver.try_recv() {
                Ok(line) => lines.push(line),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.finished = true;
                    break;
                }
            }
        }
        lines
    }

    /// Ends the subscription and stops the producer
    pub fn cancel(&mut self) {
        if self.is_cancelled() {
            return;
        }
        self.cancel.cancel();

        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill() {
                debug!(error = %e, "Log process already exited");
            }
            let _ = child.wait();
        }

        // Unblock a producer waiting on a full buffer
        while self.receiver.try_recv().is_ok() {}
        self.finished = true;
        debug!("Log subscription cancelled");
    }
}

impl Drop for LogSubscription {
    fn drop(&mut self) {
        self.cancel();
    }
}
