use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use bytes::Bytes;
use http_body_util::BodyExt;
use tower::ServiceExt;
use uuid::Uuid;

use admitdoc_pipeline::{PipelineConfig, RenderPipeline};
use admitdoc_records::{AdmissionRecord, InMemoryRecordStore, RecordStore};
use admitdoc_render::{RenderError, Renderer};
use admitdoc_server::build_router;
use admitdoc_server::state::AppState;

/// Renders the record's current data into a fake PDF body.
struct EchoRenderer {
    records: Arc<dyn RecordStore>,
}

#[admitdoc_render::async_trait]
impl Renderer for EchoRenderer {
    async fn render(&self, id: Uuid) -> Result<Bytes, RenderError> {
        let record = self
            .records
            .get(id)
            .await
            .map_err(|e| RenderError::Store(e.to_string()))?
            .ok_or(RenderError::RecordNotFound(id))?;
        Ok(Bytes::from(format!(
            "%PDF-1.7\n{} / {}",
            record.applicant_name, record.program
        )))
    }
}

/// Always fails like a broken browser install.
struct FailRenderer;

#[admitdoc_render::async_trait]
impl Renderer for FailRenderer {
    async fn render(&self, _id: Uuid) -> Result<Bytes, RenderError> {
        Err(RenderError::Browser("font missing".to_string()))
    }
}

/// Produces bytes that are not a PDF.
struct RawRenderer;

#[admitdoc_render::async_trait]
impl Renderer for RawRenderer {
    async fn render(&self, _id: Uuid) -> Result<Bytes, RenderError> {
        Ok(Bytes::from_static(b"<html>not a pdf</html>"))
    }
}

/// Takes longer than the retrieval wait ceiling.
struct SlowRenderer {
    delay: Duration,
}

#[admitdoc_render::async_trait]
impl Renderer for SlowRenderer {
    async fn render(&self, _id: Uuid) -> Result<Bytes, RenderError> {
        tokio::time::sleep(self.delay).await;
        Ok(Bytes::from_static(b"%PDF-1.7\nslow"))
    }
}

fn pipeline_config() -> PipelineConfig {
    PipelineConfig {
        workers: 1,
        queue_capacity: 8,
        wait_timeout: Duration::from_secs(5),
        poll_interval: Duration::from_millis(25),
    }
}

fn build_app(
    renderer: Arc<dyn Renderer>,
    wait_timeout: Duration,
) -> (axum::Router, Arc<InMemoryRecordStore>, Arc<RenderPipeline>) {
    let records = Arc::new(InMemoryRecordStore::new());
    let pipeline = Arc::new(RenderPipeline::start(renderer, pipeline_config()));
    let state = AppState::new(records.clone(), pipeline.clone(), wait_timeout);
    (build_router(Arc::new(state)), records, pipeline)
}

fn echo_app() -> (axum::Router, Arc<InMemoryRecordStore>, Arc<RenderPipeline>) {
    let records = Arc::new(InMemoryRecordStore::new());
    let renderer = Arc::new(EchoRenderer {
        records: records.clone(),
    });
    let pipeline = Arc::new(RenderPipeline::start(renderer, pipeline_config()));
    let state = AppState::new(records.clone(), pipeline.clone(), Duration::from_secs(5));
    (build_router(Arc::new(state)), records, pipeline)
}

async fn create_record(app: &axum::Router, name: &str, program: &str) -> serde_json::Value {
    let body = serde_json::json!({
        "applicant_name": name,
        "program": program,
        "fields": {"essay": "..."},
    });
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/records")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CREATED);
    let bytes = response.into_body().collect().await.expect("body").to_bytes();
    serde_json::from_slice(&bytes).expect("json")
}

async fn get_document(app: &axum::Router, id: &str) -> axum::http::Response<Body> {
    app.clone()
        .oneshot(
            Request::builder()
                .uri(format!("/records/{id}/document"))
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response")
}

#[tokio::test]
async fn download_returns_rendered_pdf_after_create() {
    let (app, _records, pipeline) = echo_app();

    let record = create_record(&app, "Ada Lovelace", "mathematics").await;
    let id = record["id"].as_str().expect("id");

    let response = get_document(&app, id).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"].to_str().expect("header"),
        "application/pdf"
    );
    assert!(response.headers()["content-disposition"]
        .to_str()
        .expect("header")
        .starts_with("attachment"));

    let bytes = response.into_body().collect().await.expect("body").to_bytes();
    assert!(bytes.starts_with(b"%PDF"));
    assert!(bytes.ends_with(b"Ada Lovelace / mathematics"));

    pipeline.shutdown().await;
}

#[tokio::test]
async fn download_self_heals_when_no_job_was_ever_submitted() {
    let (app, records, pipeline) = echo_app();

    // Insert the record behind the API's back: no render job exists.
    let record = AdmissionRecord::new("Grace Hopper", "compilers", serde_json::Value::Null);
    let id = record.id;
    records.upsert(record).await.expect("upsert");
    assert!(pipeline.status(id).await.is_none());

    let response = get_document(&app, &id.to_string()).await;
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.expect("body").to_bytes();
    assert!(bytes.starts_with(b"%PDF"));

    pipeline.shutdown().await;
}

#[tokio::test]
async fn unknown_record_is_404_with_code() {
    let (app, _records, pipeline) = echo_app();

    let response = get_document(&app, &Uuid::new_v4().to_string()).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let bytes = response.into_body().collect().await.expect("body").to_bytes();
    let payload: serde_json::Value = serde_json::from_slice(&bytes).expect("json");
    assert_eq!(payload["code"], "not_found");

    pipeline.shutdown().await;
}

#[tokio::test]
async fn render_failure_surfaces_as_render_failed() {
    let (app, _records, pipeline) = build_app(Arc::new(FailRenderer), Duration::from_secs(5));

    let record = create_record(&app, "Alan Turing", "computing").await;
    let id = record["id"].as_str().expect("id");

    let response = get_document(&app, id).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let bytes = response.into_body().collect().await.expect("body").to_bytes();
    let payload: serde_json::Value = serde_json::from_slice(&bytes).expect("json");
    assert_eq!(payload["code"], "render_failed");
    assert!(payload["error"]
        .as_str()
        .expect("error")
        .contains("font missing"));

    pipeline.shutdown().await;
}

#[tokio::test]
async fn non_pdf_artifact_surfaces_as_invalid_artifact() {
    let (app, _records, pipeline) = build_app(Arc::new(RawRenderer), Duration::from_secs(5));

    let record = create_record(&app, "Margaret Hamilton", "avionics").await;
    let id = record["id"].as_str().expect("id");

    let response = get_document(&app, id).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let bytes = response.into_body().collect().await.expect("body").to_bytes();
    let payload: serde_json::Value = serde_json::from_slice(&bytes).expect("json");
    assert_eq!(payload["code"], "invalid_artifact");

    pipeline.shutdown().await;
}

#[tokio::test]
async fn slow_render_times_out_then_succeeds_on_retry() {
    let renderer = Arc::new(SlowRenderer {
        delay: Duration::from_millis(400),
    });
    let (app, _records, pipeline) = build_app(renderer, Duration::from_millis(100));

    let record = create_record(&app, "Katherine Johnson", "orbital mechanics").await;
    let id = record["id"].as_str().expect("id");

    let response = get_document(&app, id).await;
    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    let bytes = response.into_body().collect().await.expect("body").to_bytes();
    let payload: serde_json::Value = serde_json::from_slice(&bytes).expect("json");
    assert_eq!(payload["code"], "timeout");

    // The render was not cancelled; once it lands a retry sees the document.
    tokio::time::sleep(Duration::from_millis(500)).await;
    let response = get_document(&app, id).await;
    assert_eq!(response.status(), StatusCode::OK);

    pipeline.shutdown().await;
}
