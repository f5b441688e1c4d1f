//! Test doubles shared by the module tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Semaphore;

use crate::models::{PersistedResume, Photo, ResumeId, SaveResumeRequest};
use crate::notify::{Notification, NotificationChannel, NotificationId};
use crate::persistence::{PersistenceClient, PersistenceError};
use crate::reconciler::AddressableReference;

#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(NotificationId, Notification)>>,
    dismissed: Mutex<Vec<NotificationId>>,
}

impl RecordingNotifier {
    pub fn active(&self) -> Vec<Notification> {
        let dismissed = self.dismissed.lock().unwrap();
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| !dismissed.contains(id))
            .map(|(_, n)| n.clone())
            .collect()
    }

    pub fn total_sent(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    pub fn dismissed(&self) -> usize {
        self.dismissed.lock().unwrap().len()
    }
}

impl NotificationChannel for RecordingNotifier {
    fn notify(&self, notification: Notification) -> NotificationId {
        let mut sent = self.sent.lock().unwrap();
        let id = NotificationId(sent.len() as u64);
        sent.push((id, notification));
        id
    }

    fn dismiss(&self, id: NotificationId) {
        self.dismissed.lock().unwrap().push(id);
    }
}

#[derive(Default)]
pub struct CountingReference {
    calls: AtomicUsize,
    last: Mutex<Option<ResumeId>>,
}

impl CountingReference {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last(&self) -> Option<ResumeId> {
        *self.last.lock().unwrap()
    }
}

impl AddressableReference for CountingReference {
    fn replace(&self, id: &ResumeId) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap() = Some(*id);
    }
}

pub enum Reply {
    Succeed,
    SucceedWith(ResumeId),
    Fail(&'static str),
}

/// Persistence client that records every call and answers from a script.
/// With a gate, each call blocks until [`ScriptedClient::release`] grants it.
#[derive(Default)]
pub struct ScriptedClient {
    requests: Mutex<Vec<SaveResumeRequest>>,
    replies: Mutex<VecDeque<Reply>>,
    gate: Option<Semaphore>,
}

impl ScriptedClient {
    pub fn gated() -> Self {
        Self {
            gate: Some(Semaphore::new(0)),
            ..Default::default()
        }
    }

    pub fn reply(self, reply: Reply) -> Self {
        self.replies.lock().unwrap().push_back(reply);
        self
    }

    pub fn release(&self, calls: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(calls);
        }
    }

    pub fn requests(&self) -> Vec<SaveResumeRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl PersistenceClient for ScriptedClient {
    async fn save(&self, request: &SaveResumeRequest) -> Result<PersistedResume, PersistenceError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }

        let reply = self.replies.lock().unwrap().pop_front().unwrap_or(Reply::Succeed);
        let id = match reply {
            Reply::Succeed => request.id.unwrap_or_default(),
            Reply::SucceedWith(id) => id,
            Reply::Fail(message) => return Err(PersistenceError::new(message)),
        };
        let now = Utc::now();
        Ok(PersistedResume {
            id,
            content: request.document.content.clone(),
            photo_url: match &request.document.photo {
                Photo::Upload(a) => Some(format!("https://cdn.test/{}", a.fingerprint())),
                _ => None,
            },
            created_at: now,
            updated_at: now,
        })
    }
}
