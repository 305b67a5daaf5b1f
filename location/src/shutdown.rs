//! Stop signal for provider threads.
//!
//! The signal is a closed channel: the handle closes it, the polling thread
//! observes the closure between fixes and while sleeping.

use std::pin::pin;
use std::time::Duration;

use async_channel::{Receiver, Sender};
use futures::future::{Either, select};
use futures_timer::Delay;

/// Closes the paired [`ShutdownReceiver`] when shut down or dropped.
#[derive(Debug)]
pub struct ShutdownHandle {
    sender: Sender<()>,
}

impl ShutdownHandle {
    /// Create a new shutdown handle and receiver pair.
    #[must_use]
    pub fn new() -> (Self, ShutdownReceiver) {
        let (sender, receiver) = async_channel::bounded(1);
        (Self { sender }, ShutdownReceiver { receiver })
    }

    /// Signal shutdown. Returns `true` only for the call that closed the channel.
    pub fn shutdown(&self) -> bool {
        self.sender.close()
    }
}

impl Drop for ShutdownHandle {
    fn drop(&mut self) {
        self.sender.close();
    }
}

/// Observes the shutdown signal from a background thread.
#[derive(Debug, Clone)]
pub struct ShutdownReceiver {
    receiver: Receiver<()>,
}

impl ShutdownReceiver {
    /// Check if shutdown was signaled (non-blocking).
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        self.receiver.is_closed()
    }

    /// Wait until shutdown is signaled.
    pub async fn wait(&self) {
        // Nothing is ever sent; recv only returns once the channel closes.
        let _ = self.receiver.recv().await;
    }

    /// Sleep for `period` unless shutdown arrives first.
    ///
    /// Returns `false` if the sleep was cut short by shutdown.
    pub async fn sleep(&self, period: Duration) -> bool {
        let delay = pin!(Delay::new(period));
        let stop = pin!(self.wait());
        match select(delay, stop).await {
            Either::Left(((), _)) => !self.is_shutdown(),
            Either::Right(((), _)) => false,
        }
    }
}
