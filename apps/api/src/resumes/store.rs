//! Resume persistence. `AppState` holds an `Arc<dyn ResumeStore>`;
//! production uses `PgResumeStore`.

use std::collections::HashMap;

use async_trait::async_trait;
use autosave::{Education, PersistedResume, ResumeContent, ResumeId, WorkExperience};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::resume::{EducationRow, ResumeRow, WorkExperienceRow};

#[async_trait]
pub trait ResumeStore: Send + Sync {
    async fn find(&self, user_id: Uuid, id: ResumeId) -> Result<Option<PersistedResume>, AppError>;

    /// Most recently updated first.
    async fn list(&self, user_id: Uuid) -> Result<Vec<PersistedResume>, AppError>;

    /// Creates the resume or replaces all of its content. Returns `NotFound`
    /// if `id` exists but belongs to another user.
    async fn upsert(
        &self,
        user_id: Uuid,
        id: ResumeId,
        content: &ResumeContent,
        photo_url: Option<&str>,
    ) -> Result<PersistedResume, AppError>;

    /// Returns false when there was nothing to delete.
    async fn delete(&self, user_id: Uuid, id: ResumeId) -> Result<bool, AppError>;
}

pub struct PgResumeStore {
    pool: PgPool,
}

impl PgResumeStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_children(
        &self,
        resume_ids: &[Uuid],
    ) -> Result<(HashMap<Uuid, Vec<WorkExperience>>, HashMap<Uuid, Vec<Education>>), AppError> {
        let work_rows = sqlx::query_as::<_, WorkExperienceRow>(
            r#"
            SELECT resume_id, sort_order, position, company, start_date, end_date, description
            FROM work_experiences
            WHERE resume_id = ANY($1)
            ORDER BY resume_id, sort_order
            "#,
        )
        .bind(resume_ids)
        .fetch_all(&self.pool)
        .await?;

        let education_rows = sqlx::query_as::<_, EducationRow>(
            r#"
            SELECT resume_id, sort_order, degree, school, start_date, end_date
            FROM educations
            WHERE resume_id = ANY($1)
            ORDER BY resume_id, sort_order
            "#,
        )
        .bind(resume_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut work: HashMap<Uuid, Vec<WorkExperience>> = HashMap::new();
        for row in work_rows {
            work.entry(row.resume_id).or_default().push(row.into());
        }
        let mut educations: HashMap<Uuid, Vec<Education>> = HashMap::new();
        for row in education_rows {
            educations.entry(row.resume_id).or_default().push(row.into());
        }
        Ok((work, educations))
    }
}

#[async_trait]
impl ResumeStore for PgResumeStore {
    async fn find(&self, user_id: Uuid, id: ResumeId) -> Result<Option<PersistedResume>, AppError> {
        let row: Option<ResumeRow> =
            sqlx::query_as("SELECT * FROM resumes WHERE id = $1 AND user_id = $2")
                .bind(id.as_uuid())
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let (mut work, mut educations) = self.load_children(&[row.id]).await?;
        let (work, educations) = (
            work.remove(&row.id).unwrap_or_default(),
            educations.remove(&row.id).unwrap_or_default(),
        );
        Ok(Some(row.into_persisted(work, educations)))
    }

    async fn list(&self, user_id: Uuid) -> Result<Vec<PersistedResume>, AppError> {
        let rows: Vec<ResumeRow> =
            sqlx::query_as("SELECT * FROM resumes WHERE user_id = $1 ORDER BY updated_at DESC")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?;

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let (mut work, mut educations) = self.load_children(&ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let w = work.remove(&row.id).unwrap_or_default();
                let e = educations.remove(&row.id).unwrap_or_default();
                row.into_persisted(w, e)
            })
            .collect())
    }

    async fn upsert(
        &self,
        user_id: Uuid,
        id: ResumeId,
        content: &ResumeContent,
        photo_url: Option<&str>,
    ) -> Result<PersistedResume, AppError> {
        let mut tx = self.pool.begin().await?;

        // The WHERE clause turns an update of another user's resume into "no row".
        let row: Option<ResumeRow> = sqlx::query_as(
            r#"
            INSERT INTO resumes
                (id, user_id, title, description, color_hex, border_style, first_name,
                 last_name, job_title, city, country, phone, email, summary, skills, photo_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            ON CONFLICT (id) DO UPDATE SET
                title = EXCLUDED.title,
                description = EXCLUDED.description,
                color_hex = EXCLUDED.color_hex,
                border_style = EXCLUDED.border_style,
                first_name = EXCLUDED.first_name,
                last_name = EXCLUDED.last_name,
                job_title = EXCLUDED.job_title,
                city = EXCLUDED.city,
                country = EXCLUDED.country,
                phone = EXCLUDED.phone,
                email = EXCLUDED.email,
                summary = EXCLUDED.summary,
                skills = EXCLUDED.skills,
                photo_url = EXCLUDED.photo_url,
                updated_at = now()
            WHERE resumes.user_id = EXCLUDED.user_id
            RETURNING *
            "#,
        )
        .bind(id.as_uuid())
        .bind(user_id)
        .bind(&content.title)
        .bind(&content.description)
        .bind(&content.color_hex)
        .bind(&content.border_style)
        .bind(&content.first_name)
        .bind(&content.last_name)
        .bind(&content.job_title)
        .bind(&content.city)
        .bind(&content.country)
        .bind(&content.phone)
        .bind(&content.email)
        .bind(&content.summary)
        .bind(&content.skills)
        .bind(photo_url)
        .fetch_optional(&mut *tx)
        .await?;

        let row = row.ok_or_else(|| AppError::NotFound(format!("Resume {id} not found")))?;

        replace_children(&mut tx, row.id, content).await?;
        tx.commit().await?;

        info!(
            "Saved resume {id} for user {user_id} ({} work, {} education entries)",
            content.work_experiences.len(),
            content.educations.len()
        );

        Ok(row.into_persisted(content.work_experiences.clone(), content.educations.clone()))
    }

    async fn delete(&self, user_id: Uuid, id: ResumeId) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        let owned: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM resumes WHERE id = $1 AND user_id = $2 FOR UPDATE")
                .bind(id.as_uuid())
                .bind(user_id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(resume_id) = owned else {
            return Ok(false);
        };

        sqlx::query("DELETE FROM work_experiences WHERE resume_id = $1")
            .bind(resume_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM educations WHERE resume_id = $1")
            .bind(resume_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM resumes WHERE id = $1")
            .bind(resume_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        info!("Deleted resume {id} for user {user_id}");
        Ok(true)
    }
}

/// Child entries are replaced wholesale so their order always matches the request.
async fn replace_children(
    tx: &mut Transaction<'_, Postgres>,
    resume_id: Uuid,
    content: &ResumeContent,
) -> Result<(), AppError> {
    sqlx::query("DELETE FROM work_experiences WHERE resume_id = $1")
        .bind(resume_id)
        .execute(&mut **tx)
        .await?;
    for (order, entry) in content.work_experiences.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO work_experiences
                (resume_id, sort_order, position, company, start_date, end_date, description)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(resume_id)
        .bind(order as i32)
        .bind(&entry.position)
        .bind(&entry.company)
        .bind(&entry.start_date)
        .bind(&entry.end_date)
        .bind(&entry.description)
        .execute(&mut **tx)
        .await?;
    }

    sqlx::query("DELETE FROM educations WHERE resume_id = $1")
        .bind(resume_id)
        .execute(&mut **tx)
        .await?;
    for (order, entry) in content.educations.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO educations (resume_id, sort_order, degree, school, start_date, end_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(resume_id)
        .bind(order as i32)
        .bind(&entry.degree)
        .bind(&entry.school)
        .bind(&entry.start_date)
        .bind(&entry.end_date)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}
