//! In-memory stores for handler and service tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use autosave::{Attachment, PersistedResume, ResumeContent, ResumeId};
use chrono::Utc;
use uuid::Uuid;

use crate::errors::AppError;
use crate::resumes::photos::{photo_key, PhotoStore};
use crate::resumes::store::ResumeStore;

#[derive(Default)]
pub struct MemoryResumeStore {
    rows: Mutex<HashMap<ResumeId, (Uuid, PersistedResume)>>,
    fail_upserts: AtomicBool,
}

impl MemoryResumeStore {
    pub fn fail_upserts(&self) {
        self.fail_upserts.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ResumeStore for MemoryResumeStore {
    async fn find(&self, user_id: Uuid, id: ResumeId) -> Result<Option<PersistedResume>, AppError> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .get(&id)
            .filter(|(owner, _)| *owner == user_id)
            .map(|(_, resume)| resume.clone()))
    }

    async fn list(&self, user_id: Uuid) -> Result<Vec<PersistedResume>, AppError> {
        let rows = self.rows.lock().unwrap();
        let mut resumes: Vec<PersistedResume> = rows
            .values()
            .filter(|(owner, _)| *owner == user_id)
            .map(|(_, resume)| resume.clone())
            .collect();
        resumes.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(resumes)
    }

    async fn upsert(
        &self,
        user_id: Uuid,
        id: ResumeId,
        content: &ResumeContent,
        photo_url: Option<&str>,
    ) -> Result<PersistedResume, AppError> {
        if self.fail_upserts.load(Ordering::SeqCst) {
            return Err(AppError::Internal(anyhow::anyhow!("upsert of {id} refused")));
        }
        let mut rows = self.rows.lock().unwrap();
        let now = Utc::now();
        let created_at = match rows.get(&id) {
            Some((owner, _)) if *owner != user_id => {
                return Err(AppError::NotFound(format!("Resume {id} not found")))
            }
            Some((_, existing)) => existing.created_at,
            None => now,
        };
        let resume = PersistedResume {
            id,
            content: content.clone(),
            photo_url: photo_url.map(str::to_string),
            created_at,
            updated_at: now,
        };
        rows.insert(id, (user_id, resume.clone()));
        Ok(resume)
    }

    async fn delete(&self, user_id: Uuid, id: ResumeId) -> Result<bool, AppError> {
        let mut rows = self.rows.lock().unwrap();
        match rows.get(&id) {
            Some((owner, _)) if *owner == user_id => {
                rows.remove(&id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[derive(Default)]
pub struct MemoryPhotoStore {
    objects: Mutex<Vec<String>>,
    fail_deletes: AtomicBool,
}

impl MemoryPhotoStore {
    /// URLs currently stored, in upload order.
    pub fn stored(&self) -> Vec<String> {
        self.objects.lock().unwrap().clone()
    }

    pub fn fail_deletes(&self) {
        self.fail_deletes.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl PhotoStore for MemoryPhotoStore {
    async fn put(&self, resume_id: ResumeId, photo: &Attachment) -> Result<String, AppError> {
        let url = format!("memory://{}", photo_key(resume_id, photo));
        let mut objects = self.objects.lock().unwrap();
        if !objects.contains(&url) {
            objects.push(url.clone());
        }
        Ok(url)
    }

    async fn delete(&self, url: &str) -> Result<(), AppError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(AppError::S3(format!("delete of {url} refused")));
        }
        self.objects.lock().unwrap().retain(|u| u != url);
        Ok(())
    }
}
