//! Resend Countdown
//!
//! Display-only: the remaining seconds shown next to the resend action.
//! Whether a resend is actually allowed is decided from the recorded
//! resend instant, never from this value.

use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};

pub struct Countdown {
    sender: watch::Sender<u64>,
    task: Option<JoinHandle<()>>,
}

impl Countdown {
    /// Start counting down from `secs`, one step per second.
    ///
    /// Must be called inside a tokio runtime.
    pub fn start(secs: u64) -> Self {
        let (sender, _) = watch::channel(secs);
        let mut countdown = Self { sender, task: None };
        countdown.restart(secs);
        countdown
    }

    /// Replace the current countdown
    pub fn restart(&mut self, secs: u64) {
        self.stop();
        self.sender.send_replace(secs);
        if secs == 0 {
            return;
        }

        let sender = self.sender.clone();
        self.task = Some(tokio::spawn(async move {
            let period = Duration::from_secs(1);
            let mut ticker = interval_at(Instant::now() + period, period);
            loop {
                ticker.tick().await;
                if tick(&sender) == 0 {
                    break;
                }
            }
        }));
    }

    pub fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    pub fn remaining(&self) -> u64 {
        *self.sender.borrow()
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.sender.subscribe()
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.stop();
    }
}

/// One countdown step; saturates at zero. Returns the new value.
pub fn tick(sender: &watch::Sender<u64>) -> u64 {
    let mut remaining = 0;
    sender.send_modify(|secs| {
        *secs = secs.saturating_sub(1);
        remaining = *secs;
    });
    remaining
}
