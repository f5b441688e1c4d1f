use autosave::{Education, PersistedResume, ResumeContent, WorkExperience};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ResumeRow {
    pub id: Uuid,
    pub user_id: Uuid,
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
    pub skills: Vec<String>,
    pub photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WorkExperienceRow {
    pub resume_id: Uuid,
    pub sort_order: i32,
    pub position: Option<String>,
    pub company: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EducationRow {
    pub resume_id: Uuid,
    pub sort_order: i32,
    pub degree: Option<String>,
    pub school: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl From<WorkExperienceRow> for WorkExperience {
    fn from(row: WorkExperienceRow) -> Self {
        WorkExperience {
            position: row.position,
            company: row.company,
            start_date: row.start_date,
            end_date: row.end_date,
            description: row.description,
        }
    }
}

impl From<EducationRow> for Education {
    fn from(row: EducationRow) -> Self {
        Education {
            degree: row.degree,
            school: row.school,
            start_date: row.start_date,
            end_date: row.end_date,
        }
    }
}

impl ResumeRow {
    /// Joins the row with its child entries, which must already be in `sort_order`.
    pub fn into_persisted(
        self,
        work_experiences: Vec<WorkExperience>,
        educations: Vec<Education>,
    ) -> PersistedResume {
        PersistedResume {
            id: self.id.into(),
            content: ResumeContent {
                title: self.title,
                description: self.description,
                color_hex: self.color_hex,
                border_style: self.border_style,
                first_name: self.first_name,
                last_name: self.last_name,
                job_title: self.job_title,
                city: self.city,
                country: self.country,
                phone: self.phone,
                email: self.email,
                summary: self.summary,
                work_experiences,
                educations,
                skills: self.skills,
            },
            photo_url: self.photo_url,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_joins_children_in_given_order() {
        let now = Utc::now();
        let id = Uuid::new_v4();
        let row = ResumeRow {
            id,
            user_id: Uuid::new_v4(),
            title: Some("Data engineer".into()),
            description: None,
            color_hex: Some("#000000".into()),
            border_style: None,
            first_name: None,
            last_name: None,
            job_title: None,
            city: None,
            country: None,
            phone: None,
            email: None,
            summary: None,
            skills: vec!["SQL".into()],
            photo_url: None,
            created_at: now,
            updated_at: now,
        };
        let work = vec![
            WorkExperience {
                company: Some("First".into()),
                ..Default::default()
            },
            WorkExperience {
                company: Some("Second".into()),
                ..Default::default()
            },
        ];

        let record = row.into_persisted(work.clone(), Vec::new());
        assert_eq!(record.id.as_uuid(), id);
        assert_eq!(record.content.work_experiences, work);
        assert_eq!(record.content.skills, vec!["SQL".to_string()]);
    }
}
