//! Route handlers for the query API.

pub mod health;
pub mod query;

use std::collections::HashMap;
use std::path::Path;

use axum::extract::{Query, State};
use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::state::AppState;

/// Build the full application: API routes, the `/files` mount for stored
/// attachments, and permissive CORS so browser clients on any origin can call
/// the API.
pub fn app(state: AppState, files_dir: impl AsRef<Path>) -> Router {
    router()
        .nest_service("/files", ServeDir::new(files_dir))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Build the router with all routes.
pub fn router() -> Router<AppState> {
    let mut router = Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health));

    for endpoint in query::ENDPOINTS {
        router = router.route(
            &endpoint.path(),
            get(
                move |state: State<AppState>, params: Query<HashMap<String, String>>| {
                    query::run(endpoint, state, params)
                },
            ),
        );
    }

    router
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use mock_responder::{MemoryStore, ScriptedReply, ScriptedTransport};
    use query_core::{async_trait, QueryResult};
    use query_engine::{EngineConfig, QueryOrchestrator};
    use tower::ServiceExt;

    use crate::state::QueryRunner;

    #[derive(Default)]
    struct RecordingRunner {
        commands: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl QueryRunner for RecordingRunner {
        async fn run_query(&self, command: &str) -> QueryResult {
            self.commands.lock().unwrap().push(command.to_string());
            QueryResult::Success {
                text: format!("ok {}", command),
                files: vec![],
            }
        }
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let req = Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn app_with(runner: Arc<dyn QueryRunner>) -> Router {
        router().with_state(AppState::new(runner))
    }

    #[tokio::test]
    async fn test_root_banner() {
        let app = app_with(Arc::new(RecordingRunner::default()));
        let (status, json) = get_json(app, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "API Active");
        assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_health() {
        let app = app_with(Arc::new(RecordingRunner::default()));
        let (status, json) = get_json(app, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn test_valid_query_runs_command() {
        let runner = Arc::new(RecordingRunner::default());
        let app = app_with(runner.clone());

        let (status, json) = get_json(app, "/bdir?direccion=Av.%20Lima%20123").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "success");
        assert_eq!(json["text"], "ok /bdir Av. Lima 123");
        assert_eq!(
            *runner.commands.lock().unwrap(),
            vec!["/bdir Av. Lima 123".to_string()]
        );
    }

    #[tokio::test]
    async fn test_invalid_query_is_rejected() {
        let runner = Arc::new(RecordingRunner::default());
        let app = app_with(runner.clone());

        let (status, json) = get_json(app, "/cla?dni=123").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json, serde_json::json!({ "error": "DNI inválido" }));
        assert!(runner.commands.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_param_is_rejected() {
        let app = app_with(Arc::new(RecordingRunner::default()));
        let (status, json) = get_json(app, "/dencl").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Clave inválida");
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_through_engine() {
        let transport = ScriptedTransport::new();
        transport.script(
            "@primary",
            vec![ScriptedReply::text(
                Duration::from_millis(100),
                "[⚠️] No se encontró información",
            )],
        );
        let orchestrator = QueryOrchestrator::new(
            EngineConfig::new("@primary", "@backup"),
            Arc::new(transport.clone()),
            Arc::new(MemoryStore::new()),
        );
        let app = app_with(Arc::new(orchestrator));

        let (status, json) = get_json(app, "/sbs?dni=12345678").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json,
            serde_json::json!({ "status": "error", "message": "No se encontraron resultados." })
        );
        assert_eq!(transport.sent_to("@primary"), vec!["/sbs 12345678".to_string()]);
    }

    #[tokio::test]
    async fn test_cors_allows_any_origin() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(
            AppState::new(Arc::new(RecordingRunner::default())),
            dir.path(),
        );

        let req = Request::builder()
            .method("GET")
            .uri("/cla?dni=12345678")
            .header(header::ORIGIN, "https://panel.example.com")
            .body(Body::empty())
            .unwrap();
        let res = app.oneshot(req).await.unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(
            res.headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .and_then(|v| v.to_str().ok()),
            Some("*")
        );
    }

    #[tokio::test]
    async fn test_cors_preflight() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(
            AppState::new(Arc::new(RecordingRunner::default())),
            dir.path(),
        );

        let req = Request::builder()
            .method("OPTIONS")
            .uri("/afp?dni=12345678")
            .header(header::ORIGIN, "https://panel.example.com")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
            .body(Body::empty())
            .unwrap();
        let res = app.oneshot(req).await.unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        assert!(res
            .headers()
            .contains_key(header::ACCESS_CONTROL_ALLOW_METHODS));
    }

    #[tokio::test]
    async fn test_stored_files_are_served() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("cla/abc")).unwrap();
        std::fs::write(dir.path().join("cla/abc/file_1.jpg"), b"jpeg-bytes").unwrap();
        let app = app(
            AppState::new(Arc::new(RecordingRunner::default())),
            dir.path(),
        );

        let req = Request::builder()
            .uri("/files/cla/abc/file_1.jpg")
            .body(Body::empty())
            .unwrap();
        let res = app.oneshot(req).await.unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"jpeg-bytes");
    }
}
