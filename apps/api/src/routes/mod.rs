pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::get,
    Router,
};

use crate::resumes::handlers;
use crate::state::AppState;

/// Request body cap for resume saves. Covers the largest allowed photo after
/// base64 expansion plus the text content.
const SAVE_BODY_LIMIT: usize = 8 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/api/v1/resumes",
            get(handlers::handle_list_resumes)
                .post(handlers::handle_save_resume)
                .layer(DefaultBodyLimit::max(SAVE_BODY_LIMIT)),
        )
        .route(
            "/api/v1/resumes/:id",
            get(handlers::handle_get_resume).delete(handlers::handle_delete_resume),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::resumes::testing::{MemoryPhotoStore, MemoryResumeStore};

    fn app() -> Router {
        build_router(AppState {
            resumes: Arc::new(MemoryResumeStore::default()),
            photos: Arc::new(MemoryPhotoStore::default()),
        })
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(&app(), Request::get("/health").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_save_then_load_list_and_delete() {
        let app = app();
        let user = Uuid::new_v4();
        let base = format!("/api/v1/resumes?user_id={user}");

        let (status, created) = send(
            &app,
            post_json(&base, json!({ "title": "Backend", "skills": ["rust"] })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let id = created["id"].as_str().unwrap().to_string();
        assert_eq!(created["title"], "Backend");

        let (status, updated) = send(
            &app,
            post_json(&base, json!({ "id": id, "title": "Backend v2" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["id"], id.as_str());

        let one = format!("/api/v1/resumes/{id}?user_id={user}");
        let (status, loaded) = send(&app, Request::get(&one).body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(loaded["title"], "Backend v2");

        let (_, list) = send(&app, Request::get(&base).body(Body::empty()).unwrap()).await;
        assert_eq!(list.as_array().unwrap().len(), 1);

        let (status, _) = send(&app, Request::delete(&one).body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, body) = send(&app, Request::get(&one).body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_save_with_unknown_id_is_404() {
        let uri = format!("/api/v1/resumes?user_id={}", Uuid::new_v4());
        let (status, body) = send(
            &app(),
            post_json(&uri, json!({ "id": Uuid::new_v4(), "title": "x" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_resumes_are_scoped_to_user() {
        let app = app();
        let owner = Uuid::new_v4();
        let (_, created) = send(
            &app,
            post_json(&format!("/api/v1/resumes?user_id={owner}"), json!({ "title": "t" })),
        )
        .await;
        let id = created["id"].as_str().unwrap();

        let stranger = format!("/api/v1/resumes/{id}?user_id={}", Uuid::new_v4());
        let (status, _) = send(&app, Request::get(&stranger).body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
