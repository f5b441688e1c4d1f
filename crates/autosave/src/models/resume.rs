use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::photo::Photo;

/// Backend-assigned identifier of a persisted resume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResumeId(Uuid);

impl ResumeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ResumeId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for ResumeId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for ResumeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for ResumeId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkExperience {
    pub position: Option<String>,
    pub company: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Education {
    pub degree: Option<String>,
    pub school: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Every editable field of a resume except the photo.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResumeContent {
    pub title: Option<String>,
    pub description: Option<String>,
    pub color_hex: Option<String>,
    pub border_style: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub job_title: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub summary: Option<String>,
    pub work_experiences: Vec<WorkExperience>,
    pub educations: Vec<Education>,
    pub skills: Vec<String>,
}

/// The in-memory document an editor mutates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeDocument {
    #[serde(flatten)]
    pub content: ResumeContent,
    #[serde(default, skip_serializing_if = "Photo::is_unchanged")]
    pub photo: Photo,
}

impl ResumeDocument {
    /// Seeds an editor from a stored record. The stored photo stays on the
    /// backend, so the document starts with `Photo::Unchanged`.
    pub fn from_persisted(record: &PersistedResume) -> Self {
        Self {
            content: record.content.clone(),
            photo: Photo::Unchanged,
        }
    }
}

/// Body of `POST /api/v1/resumes`. A missing `id` asks the backend to create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveResumeRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ResumeId>,
    #[serde(flatten)]
    pub document: ResumeDocument,
}

/// A resume as stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedResume {
    pub id: ResumeId,
    #[serde(flatten)]
    pub content: ResumeContent,
    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::photo::Attachment;

    #[test]
    fn test_first_save_request_omits_id_and_unchanged_photo() {
        let request = SaveResumeRequest {
            id: None,
            document: ResumeDocument {
                content: ResumeContent {
                    title: Some("Backend engineer".into()),
                    skills: vec!["Rust".into()],
                    ..Default::default()
                },
                photo: Photo::Unchanged,
            },
        };
        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("id").is_none());
        assert!(value.get("photo").is_none());
        assert_eq!(value["title"], "Backend engineer");
        assert_eq!(value["skills"][0], "Rust");
    }

    #[test]
    fn test_request_parses_with_photo_upload() {
        let id = ResumeId::new();
        let value = serde_json::json!({
            "id": id.to_string(),
            "first_name": "Ada",
            "photo": { "action": "upload", "content_type": "image/png", "data": "AAEC" }
        });
        let request: SaveResumeRequest = serde_json::from_value(value).unwrap();
        assert_eq!(request.id, Some(id));
        assert_eq!(request.document.content.first_name.as_deref(), Some("Ada"));
        assert_eq!(
            request.document.photo,
            Photo::Upload(Attachment::new(vec![0u8, 1, 2], "image/png"))
        );
    }

    #[test]
    fn test_seeded_document_keeps_stored_photo() {
        let now = Utc::now();
        let record = PersistedResume {
            id: ResumeId::new(),
            content: ResumeContent {
                city: Some("Lisbon".into()),
                ..Default::default()
            },
            photo_url: Some("https://cdn.example/p.png".into()),
            created_at: now,
            updated_at: now,
        };
        let document = ResumeDocument::from_persisted(&record);
        assert_eq!(document.content, record.content);
        assert!(document.photo.is_unchanged());
    }

    #[test]
    fn test_resume_id_parses_from_string() {
        let id = ResumeId::new();
        assert_eq!(id.to_string().parse::<ResumeId>().unwrap(), id);
        assert!("not-a-uuid".parse::<ResumeId>().is_err());
    }
}
