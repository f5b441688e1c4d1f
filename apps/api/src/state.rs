use std::sync::Arc;

use crate::resumes::photos::PhotoStore;
use crate::resumes::store::ResumeStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Resume rows and their ordered child entries. Default: `PgResumeStore`.
    pub resumes: Arc<dyn ResumeStore>,
    /// Photo object storage. Default: `S3PhotoStore`.
    pub photos: Arc<dyn PhotoStore>,
}
