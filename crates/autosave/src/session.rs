//! The autosave session: one task per editing session that watches the
//! document, debounces edits, and drives the save controller.
//!
//! The caller keeps the `watch::Sender<ResumeDocument>` and edits through
//! it. Dropping that sender ends the session.

use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::config::AutosaveConfig;
use crate::controller::{SaveController, SaveOutcome, SaveRequest, SaveState, Trigger};
use crate::debounce::{Debouncer, QuietPeriodElapsed};
use crate::models::{PersistedResume, ResumeDocument, ResumeId};
use crate::notify::{NotificationChannel, RetryAction, RetryBridge, TracingNotifier};
use crate::persistence::{PersistenceClient, PersistenceError};
use crate::reconciler::{AddressableReference, IdentityReconciler};

#[derive(Debug)]
enum SessionEvent {
    QuietPeriodElapsed(QuietPeriodElapsed),
    Retry,
    Shutdown,
}

impl From<QuietPeriodElapsed> for SessionEvent {
    fn from(fired: QuietPeriodElapsed) -> Self {
        SessionEvent::QuietPeriodElapsed(fired)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AutosaveStatus {
    pub state: SaveState,
    pub identity: Option<ResumeId>,
    /// The document differs from what was last saved. Drives unload warnings.
    pub has_unsaved_changes: bool,
}

/// Builder for an autosave session.
pub struct AutosaveSession {
    config: AutosaveConfig,
    document: watch::Receiver<ResumeDocument>,
    identity: Option<ResumeId>,
    client: Arc<dyn PersistenceClient>,
    notifier: Arc<dyn NotificationChannel>,
    reference: Option<Arc<dyn AddressableReference>>,
}

impl AutosaveSession {
    pub fn new(document: watch::Receiver<ResumeDocument>, client: Arc<dyn PersistenceClient>) -> Self {
        Self {
            config: AutosaveConfig::default(),
            document,
            identity: None,
            client,
            notifier: Arc::new(TracingNotifier::default()),
            reference: None,
        }
    }

    pub fn with_config(mut self, config: AutosaveConfig) -> Self {
        self.config = config;
        self
    }

    /// The identity of the resume being edited, when it was loaded from the backend.
    pub fn with_identity(mut self, identity: Option<ResumeId>) -> Self {
        self.identity = identity;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn NotificationChannel>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_reference(mut self, reference: Arc<dyn AddressableReference>) -> Self {
        self.reference = Some(reference);
        self
    }

    /// Starts the session task. The document's value at this moment becomes
    /// the baseline. Must be called from within a tokio runtime.
    pub fn spawn(mut self) -> AutosaveHandle {
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let retry_tx = events_tx.clone();
        let retry = RetryAction::new(move || {
            if retry_tx.send(SessionEvent::Retry).is_err() {
                debug!("retry requested after the autosave session ended");
            }
        });

        let baseline = self.document.borrow_and_update().clone();
        let controller = SaveController::new(
            baseline,
            IdentityReconciler::new(self.identity, self.reference),
            RetryBridge::new(self.notifier, retry.clone()),
            self.client,
        );

        let (status_tx, status_rx) = watch::channel(AutosaveStatus {
            state: controller.state(),
            identity: controller.identity(),
            has_unsaved_changes: false,
        });

        info!(
            "autosave session started (quiet period {}ms)",
            self.config.quiet_period.as_millis()
        );

        let session = SessionLoop {
            controller,
            debouncer: Debouncer::new(self.config.quiet_period, events_tx.clone()),
            document: self.document,
            status: status_tx,
            in_flight: None,
            deferred: None,
        };
        let task = tokio::spawn(session.run(events_rx));

        AutosaveHandle {
            events: events_tx,
            retry,
            status: status_rx,
            task,
        }
    }
}

/// Handle to a running session.
pub struct AutosaveHandle {
    events: mpsc::UnboundedSender<SessionEvent>,
    retry: RetryAction,
    status: watch::Receiver<AutosaveStatus>,
    task: JoinHandle<()>,
}

impl AutosaveHandle {
    pub fn status(&self) -> AutosaveStatus {
        *self.status.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<AutosaveStatus> {
        self.status.clone()
    }

    /// Saves the current document now, bypassing the debounce and any error
    /// suspension. Same as pressing the retry button on a failure notification.
    pub fn retry(&self) {
        self.retry.invoke();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stops the session. A save already in flight is allowed to settle first.
    pub async fn shutdown(self) {
        if self.events.send(SessionEvent::Shutdown).is_err() {
            trace!("autosave session already stopped");
        }
        if let Err(e) = self.task.await {
            warn!("autosave session task ended abnormally: {e}");
        }
    }
}

type SaveResult = Result<PersistedResume, PersistenceError>;

struct InFlight {
    request: SaveRequest,
    future: BoxFuture<'static, SaveResult>,
}

struct SessionLoop {
    controller: SaveController,
    debouncer: Debouncer<SessionEvent>,
    document: watch::Receiver<ResumeDocument>,
    status: watch::Sender<AutosaveStatus>,
    in_flight: Option<InFlight>,
    /// A save requested while another was in flight. Replayed once it settles.
    deferred: Option<Trigger>,
}

impl SessionLoop {
    async fn run(mut self, mut events: mpsc::UnboundedReceiver<SessionEvent>) {
        loop {
            tokio::select! {
                changed = self.document.changed() => {
                    if changed.is_err() {
                        info!("document closed, ending autosave session");
                        break;
                    }
                    self.on_edit();
                }
                Some(event) = events.recv() => match event {
                    SessionEvent::QuietPeriodElapsed(fired) => self.on_quiet_period(fired),
                    SessionEvent::Retry => self.on_retry(),
                    SessionEvent::Shutdown => {
                        info!("autosave session shutting down");
                        break;
                    }
                },
                result = settle(&mut self.in_flight), if self.in_flight.is_some() => {
                    self.on_settled(result);
                }
            }
            self.publish_status();
        }

        self.debouncer.cancel();
        if let Some(in_flight) = self.in_flight.take() {
            debug!("waiting for in-flight save before ending session");
            let result = in_flight.future.await;
            let outcome = self.controller.complete_save(in_flight.request, result);
            report(outcome);
            self.publish_status();
        }
    }

    fn on_edit(&mut self) {
        trace!("document changed");
        self.controller.note_edit();
        // the re-armed timer now owns this edit; a manual retry still stands
        if self.deferred == Some(Trigger::QuietPeriod) {
            self.deferred = None;
        }
        self.debouncer.arm();
    }

    fn on_quiet_period(&mut self, fired: QuietPeriodElapsed) {
        if !self.debouncer.accept(fired) {
            return;
        }
        if self.in_flight.is_some() {
            debug!("quiet period elapsed during a save; deferring");
            self.defer(Trigger::QuietPeriod);
            return;
        }
        self.start_save(Trigger::QuietPeriod);
    }

    fn on_retry(&mut self) {
        if self.in_flight.is_some() {
            debug!("retry requested during a save; deferring");
            self.defer(Trigger::Manual);
            return;
        }
        self.start_save(Trigger::Manual);
    }

    fn on_settled(&mut self, result: SaveResult) {
        let Some(in_flight) = self.in_flight.take() else {
            return;
        };
        let outcome = self.controller.complete_save(in_flight.request, result);
        report(outcome);

        if let Some(trigger) = self.deferred.take() {
            self.start_save(trigger);
        }
    }

    fn defer(&mut self, trigger: Trigger) {
        // a deferred manual retry outranks a deferred quiet period
        if self.deferred != Some(Trigger::Manual) {
            self.deferred = Some(trigger);
        }
    }

    fn start_save(&mut self, trigger: Trigger) {
        // read at the moment of the save, never a copy captured earlier
        let current = self.document.borrow().clone();
        let request = match self.controller.begin_save(&current, trigger) {
            Ok(request) => request,
            Err(reason) => {
                debug!("save skipped: {reason:?}");
                return;
            }
        };
        if trigger == Trigger::Manual {
            self.debouncer.cancel();
        }

        let client = self.controller.client();
        let payload = request.payload().clone();
        let future = async move { client.save(&payload).await }.boxed();
        self.in_flight = Some(InFlight { request, future });
    }

    fn publish_status(&self) {
        let status = AutosaveStatus {
            state: self.controller.state(),
            identity: self.controller.identity(),
            has_unsaved_changes: self
                .controller
                .has_unsaved_changes(&self.document.borrow()),
        };
        self.status.send_if_modified(|current| {
            if *current == status {
                return false;
            }
            *current = status;
            true
        });
    }
}

fn report(outcome: SaveOutcome) {
    match outcome {
        SaveOutcome::Saved { id, reconciliation } => {
            debug!("save settled: {id} ({reconciliation:?})")
        }
        SaveOutcome::Failed(err) => debug!("save settled with failure: {err}"),
        SaveOutcome::Skipped(reason) => debug!("save skipped: {reason:?}"),
    }
}

async fn settle(in_flight: &mut Option<InFlight>) -> SaveResult {
    match in_flight {
        Some(in_flight) => (&mut in_flight.future).await,
        None => std::future::pending().await,
    }
}
