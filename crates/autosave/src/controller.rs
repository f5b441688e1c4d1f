//! Single-flight save controller.
//!
//! Owns the baseline snapshot, the identity, and the save state machine:
//!
//! ```text
//!   Idle ──edit──> Pending ──quiet period──> Saving ──ok──> Idle
//!                    ^                         │
//!                    └──────edit──── Error <───┘ failure
//!                                      │
//!                                      └──manual retry──> Saving
//! ```
//!
//! A save is split into `begin_save` and `complete_save` so the caller can
//! keep handling edits while the request is in flight. `attempt_save` runs
//! both back to back for callers without their own event loop.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::comparator::{changed_fields, is_dirty, photo_unchanged};
use crate::models::{PersistedResume, Photo, ResumeDocument, ResumeId, SaveResumeRequest};
use crate::notify::RetryBridge;
use crate::persistence::{PersistenceClient, PersistenceError};
use crate::reconciler::{IdentityReconciler, Reconciliation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveState {
    Idle,
    /// Edited; waiting for the quiet period to elapse.
    Pending,
    Saving,
    /// Last attempt failed. Automatic saves are suspended until the next edit.
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    QuietPeriod,
    /// User-initiated retry. Bypasses the error suspension.
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Clean,
    InFlight,
    Suspended,
}

#[derive(Debug)]
pub enum SaveOutcome {
    Saved {
        id: ResumeId,
        reconciliation: Reconciliation,
    },
    Failed(PersistenceError),
    Skipped(SkipReason),
}

/// A save the controller has committed to. Hand it back to
/// [`SaveController::complete_save`] with the client's result.
#[derive(Debug, Clone)]
pub struct SaveRequest {
    payload: SaveResumeRequest,
    snapshot: ResumeDocument,
    edit_seq: u64,
}

impl SaveRequest {
    /// What goes over the wire.
    pub fn payload(&self) -> &SaveResumeRequest {
        &self.payload
    }

    /// The full document state being saved; becomes the baseline on success.
    pub fn snapshot(&self) -> &ResumeDocument {
        &self.snapshot
    }
}

pub struct SaveController {
    state: SaveState,
    baseline: ResumeDocument,
    reconciler: IdentityReconciler,
    bridge: RetryBridge,
    client: Arc<dyn PersistenceClient>,
    edit_seq: u64,
}

impl SaveController {
    pub fn new(
        baseline: ResumeDocument,
        reconciler: IdentityReconciler,
        bridge: RetryBridge,
        client: Arc<dyn PersistenceClient>,
    ) -> Self {
        Self {
            state: SaveState::Idle,
            baseline,
            reconciler,
            bridge,
            client,
            edit_seq: 0,
        }
    }

    pub fn state(&self) -> SaveState {
        self.state
    }

    pub fn baseline(&self) -> &ResumeDocument {
        &self.baseline
    }

    pub fn identity(&self) -> Option<ResumeId> {
        self.reconciler.identity()
    }

    pub fn client(&self) -> Arc<dyn PersistenceClient> {
        Arc::clone(&self.client)
    }

    pub fn has_unsaved_changes(&self, current: &ResumeDocument) -> bool {
        is_dirty(current, &self.baseline)
    }

    /// Records that the document changed. Lifts an error suspension.
    pub fn note_edit(&mut self) {
        self.edit_seq += 1;
        match self.state {
            SaveState::Idle | SaveState::Error => self.transition(SaveState::Pending),
            SaveState::Pending | SaveState::Saving => {}
        }
    }

    /// Gates a save and, if it should go ahead, moves to `Saving` and builds
    /// the request. The photo is sent only when its content changed.
    pub fn begin_save(
        &mut self,
        current: &ResumeDocument,
        trigger: Trigger,
    ) -> Result<SaveRequest, SkipReason> {
        match (self.state, trigger) {
            (SaveState::Saving, _) => {
                debug!("save requested while another is in flight");
                return Err(SkipReason::InFlight);
            }
            (SaveState::Error, Trigger::QuietPeriod) => {
                debug!("autosave suspended after failure; waiting for an edit or retry");
                return Err(SkipReason::Suspended);
            }
            _ => {}
        }

        if trigger == Trigger::Manual {
            self.bridge.clear();
        }

        let changed = changed_fields(current, &self.baseline);
        if changed.is_empty() {
            debug!("document matches baseline, nothing to save");
            self.bridge.clear();
            self.transition(SaveState::Idle);
            return Err(SkipReason::Clean);
        }

        let photo = if photo_unchanged(current, &self.baseline) {
            Photo::Unchanged
        } else {
            current.photo.clone()
        };
        let payload = SaveResumeRequest {
            id: self.reconciler.identity(),
            document: ResumeDocument {
                content: current.content.clone(),
                photo,
            },
        };

        info!(
            "saving resume {} ({trigger:?}), changed: {changed:?}",
            payload
                .id
                .map(|id| id.to_string())
                .unwrap_or_else(|| "<new>".to_string()),
        );
        self.transition(SaveState::Saving);

        Ok(SaveRequest {
            payload,
            snapshot: current.clone(),
            edit_seq: self.edit_seq,
        })
    }

    /// Applies the result of a save started with `begin_save`.
    ///
    /// Success replaces the baseline and adopts the returned identity. Failure
    /// leaves the baseline alone and raises a retry notification. Either way,
    /// an edit made while the request was in flight leaves the controller
    /// `Pending` so that edit gets its own save.
    pub fn complete_save(
        &mut self,
        request: SaveRequest,
        result: Result<PersistedResume, PersistenceError>,
    ) -> SaveOutcome {
        if self.state != SaveState::Saving {
            warn!("save completed while controller was {:?}", self.state);
        }
        let edited_in_flight = self.edit_seq != request.edit_seq;

        match result {
            Ok(record) => {
                let reconciliation = self.reconciler.reconcile(record.id);
                self.baseline = request.snapshot;
                self.bridge.clear();
                self.transition(if edited_in_flight {
                    SaveState::Pending
                } else {
                    SaveState::Idle
                });
                info!("resume {} saved", record.id);
                SaveOutcome::Saved {
                    id: record.id,
                    reconciliation,
                }
            }
            Err(err) => {
                self.bridge.report_failure(&err);
                self.transition(if edited_in_flight {
                    SaveState::Pending
                } else {
                    SaveState::Error
                });
                SaveOutcome::Failed(err)
            }
        }
    }

    /// Gate, send, and settle one save without yielding control in between.
    pub async fn attempt_save(&mut self, current: &ResumeDocument, trigger: Trigger) -> SaveOutcome {
        let request = match self.begin_save(current, trigger) {
            Ok(request) => request,
            Err(reason) => return SaveOutcome::Skipped(reason),
        };
        let client = self.client();
        let result = client.save(request.payload()).await;
        self.complete_save(request, result)
    }

    fn transition(&mut self, next: SaveState) {
        if self.state != next {
            debug!("save state {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }
}
