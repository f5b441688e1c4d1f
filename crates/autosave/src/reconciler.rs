//! Folds a backend-assigned identity back into the editing session.

use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Context, Result};
use reqwest::Url;
use tracing::{debug, info};

use crate::models::ResumeId;

/// Query parameter that carries the resume id in an editor address.
pub const RESUME_ID_PARAM: &str = "resumeId";

/// Somewhere the user can see (and bookmark) the identity of the document
/// being edited. Updated in place; implementations must not reload or reset
/// the editor.
pub trait AddressableReference: Send + Sync {
    fn replace(&self, id: &ResumeId);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    Unchanged,
    Assigned,
    Replaced { previous: ResumeId },
}

pub struct IdentityReconciler {
    identity: Option<ResumeId>,
    reference: Option<Arc<dyn AddressableReference>>,
}

impl IdentityReconciler {
    pub fn new(identity: Option<ResumeId>, reference: Option<Arc<dyn AddressableReference>>) -> Self {
        Self {
            identity,
            reference,
        }
    }

    pub fn identity(&self) -> Option<ResumeId> {
        self.identity
    }

    /// Adopts the identity a successful save returned. The external reference
    /// is touched only when the identity actually changes.
    pub fn reconcile(&mut self, returned: ResumeId) -> Reconciliation {
        let outcome = match self.identity {
            Some(current) if current == returned => {
                debug!("resume identity {returned} unchanged");
                return Reconciliation::Unchanged;
            }
            Some(previous) => Reconciliation::Replaced { previous },
            None => Reconciliation::Assigned,
        };

        self.identity = Some(returned);
        if let Some(reference) = &self.reference {
            reference.replace(&returned);
        }
        info!("resume identity reconciled to {returned} ({outcome:?})");
        outcome
    }
}

/// An editor URL whose `resumeId` parameter tracks the saved resume.
pub struct EditorLocation {
    url: Mutex<Url>,
}

impl EditorLocation {
    pub fn new(url: Url) -> Self {
        Self {
            url: Mutex::new(url),
        }
    }

    pub fn parse(url: &str) -> Result<Self> {
        let url = Url::parse(url).with_context(|| format!("invalid editor URL '{url}'"))?;
        Ok(Self::new(url))
    }

    pub fn url(&self) -> Url {
        self.lock().clone()
    }

    pub fn resume_id(&self) -> Option<ResumeId> {
        self.lock()
            .query_pairs()
            .find(|(key, _)| *key == RESUME_ID_PARAM)
            .and_then(|(_, value)| value.parse().ok())
    }

    fn lock(&self) -> MutexGuard<'_, Url> {
        self.url.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl AddressableReference for EditorLocation {
    /// Sets `resumeId` where it already sits (dropping duplicates) or appends
    /// it, leaving every other parameter in place.
    fn replace(&self, id: &ResumeId) {
        let value = id.to_string();
        let mut url = self.lock();

        let mut replaced = false;
        let mut pairs: Vec<(String, String)> = Vec::new();
        for (key, existing) in url.query_pairs() {
            if key == RESUME_ID_PARAM {
                if !replaced {
                    pairs.push((key.into_owned(), value.clone()));
                    replaced = true;
                }
            } else {
                pairs.push((key.into_owned(), existing.into_owned()));
            }
        }
        if !replaced {
            pairs.push((RESUME_ID_PARAM.to_string(), value));
        }

        url.query_pairs_mut().clear().extend_pairs(pairs);
        debug!("editor location now {}", url.as_str());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::CountingReference;

    #[test]
    fn test_first_identity_is_assigned_once() {
        let reference = Arc::new(CountingReference::default());
        let mut reconciler = IdentityReconciler::new(None, Some(reference.clone()));
        let id = ResumeId::new();

        assert_eq!(reconciler.reconcile(id), Reconciliation::Assigned);
        assert_eq!(reconciler.reconcile(id), Reconciliation::Unchanged);
        assert_eq!(reconciler.identity(), Some(id));
        assert_eq!(reference.calls(), 1);
    }

    #[test]
    fn test_different_identity_replaces() {
        let reference = Arc::new(CountingReference::default());
        let first = ResumeId::new();
        let mut reconciler = IdentityReconciler::new(Some(first), Some(reference.clone()));
        let second = ResumeId::new();

        assert_eq!(
            reconciler.reconcile(second),
            Reconciliation::Replaced { previous: first }
        );
        assert_eq!(reference.calls(), 1);
    }

    #[test]
    fn test_without_reference_still_tracks_identity() {
        let mut reconciler = IdentityReconciler::new(None, None);
        let id = ResumeId::new();
        reconciler.reconcile(id);
        assert_eq!(reconciler.identity(), Some(id));
    }

    #[test]
    fn test_editor_location_appends_resume_id() {
        let location = EditorLocation::parse("https://app.example/editor?step=Skills").unwrap();
        let id = ResumeId::new();
        location.replace(&id);

        assert_eq!(location.resume_id(), Some(id));
        assert_eq!(
            location.url().as_str(),
            format!("https://app.example/editor?step=Skills&resumeId={id}")
        );
    }

    #[test]
    fn test_editor_location_replaces_in_place() {
        let old = ResumeId::new();
        let location = EditorLocation::parse(&format!(
            "https://app.example/editor?resumeId={old}&step=Summary&resumeId={old}"
        ))
        .unwrap();
        let id = ResumeId::new();
        location.replace(&id);

        assert_eq!(
            location.url().as_str(),
            format!("https://app.example/editor?resumeId={id}&step=Summary")
        );
    }
}
