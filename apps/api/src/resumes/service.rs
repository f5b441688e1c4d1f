//! Save and delete flows, independent of the storage backends.

use autosave::{PersistedResume, Photo, ResumeId, SaveResumeRequest};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::resumes::photos::{validate_photo, PhotoStore};
use crate::resumes::store::ResumeStore;

/// Creates or updates a resume.
///
/// A request without `id` creates a new resume with a fresh id. A request
/// with `id` must name an existing resume of this user. The photo is
/// uploaded, removed, or left alone according to the request's photo action.
pub async fn save_resume(
    resumes: &dyn ResumeStore,
    photos: &dyn PhotoStore,
    user_id: Uuid,
    request: SaveResumeRequest,
) -> Result<PersistedResume, AppError> {
    let existing = match request.id {
        Some(id) => Some(
            resumes
                .find(user_id, id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Resume {id} not found")))?,
        ),
        None => None,
    };
    let id = existing.as_ref().map(|r| r.id).unwrap_or_else(ResumeId::new);
    let previous_url = existing.and_then(|r| r.photo_url);

    // Old objects are only deleted once the row no longer points at them.
    let (photo_url, uploaded, stale) = match &request.document.photo {
        Photo::Unchanged => (previous_url, None, None),
        Photo::Removed => (None, None, previous_url),
        Photo::Upload(attachment) => {
            validate_photo(attachment)?;
            let url = photos.put(id, attachment).await?;
            match previous_url {
                Some(old) if old == url => (Some(url), None, None),
                old => (Some(url.clone()), Some(url), old),
            }
        }
    };

    let saved = match resumes
        .upsert(user_id, id, &request.document.content, photo_url.as_deref())
        .await
    {
        Ok(saved) => saved,
        Err(e) => {
            if let Some(url) = uploaded {
                if let Err(cleanup) = photos.delete(&url).await {
                    warn!("Could not delete unreferenced photo {url}: {cleanup}");
                }
            }
            return Err(e);
        }
    };

    if let Some(old) = stale {
        if let Err(e) = photos.delete(&old).await {
            warn!("Could not delete replaced photo {old}: {e}");
        }
    }
    Ok(saved)
}

/// Deletes a resume and its photo. A photo that cannot be deleted aborts the
/// whole operation so no orphaned object is left behind.
pub async fn delete_resume(
    resumes: &dyn ResumeStore,
    photos: &dyn PhotoStore,
    user_id: Uuid,
    id: ResumeId,
) -> Result<(), AppError> {
    let resume = resumes
        .find(user_id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Resume {id} not found")))?;

    if let Some(url) = &resume.photo_url {
        photos.delete(url).await?;
    }

    if !resumes.delete(user_id, id).await? {
        return Err(AppError::NotFound(format!("Resume {id} not found")));
    }
    info!("Resume {id} deleted");
    Ok(())
}
