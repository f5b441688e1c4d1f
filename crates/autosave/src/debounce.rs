//! Trailing-edge debounce timer.
//!
//! Each `arm` aborts the running timer task and spawns a fresh one. A timer
//! that fires sends a [`QuietPeriodElapsed`] tagged with its generation; the
//! owner hands it back to [`Debouncer::accept`], which drops anything a later
//! `arm` or `cancel` superseded (an abort can race a send already queued).

use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuietPeriodElapsed {
    pub generation: u64,
}

pub struct Debouncer<E> {
    quiet_period: Duration,
    events: UnboundedSender<E>,
    generation: u64,
    timer: Option<JoinHandle<()>>,
}

impl<E> Debouncer<E>
where
    E: From<QuietPeriodElapsed> + Send + 'static,
{
    pub fn new(quiet_period: Duration, events: UnboundedSender<E>) -> Self {
        Self {
            quiet_period,
            events,
            generation: 0,
            timer: None,
        }
    }

    pub fn quiet_period(&self) -> Duration {
        self.quiet_period
    }

    /// Restarts the quiet period. Returns the generation of the new timer.
    pub fn arm(&mut self) -> u64 {
        self.cancel();
        self.generation += 1;

        let generation = self.generation;
        let delay = self.quiet_period;
        let events = self.events.clone();
        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if events.send(QuietPeriodElapsed { generation }.into()).is_err() {
                trace!("debounce receiver gone, dropping generation {generation}");
            }
        }));
        generation
    }

    pub fn cancel(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }

    /// True from `arm` until the matching fire is accepted or the timer is cancelled.
    pub fn is_armed(&self) -> bool {
        self.timer.is_some()
    }

    /// Consumes a fired event, returning false when it is stale.
    pub fn accept(&mut self, fired: QuietPeriodElapsed) -> bool {
        if self.timer.is_none() || fired.generation != self.generation {
            trace!(
                "ignoring stale debounce fire (generation {}, current {})",
                fired.generation,
                self.generation
            );
            return false;
        }
        self.timer = None;
        true
    }
}

impl<E> Drop for Debouncer<E> {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}
