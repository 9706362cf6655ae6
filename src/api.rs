//! REST API server for the KYC orchestrator
//!
//! Receives call transcripts from the meeting-bot webhook and exposes a
//! synchronous extraction endpoint for testing.

use axum::{extract::State, http::StatusCode, routing::get, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::error::KycError;
use crate::models::FormType;
use crate::pipeline::{Pipeline, PipelineJob};

/// =============================
/// Request Models
/// =============================

#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptRequest {
    pub transcript: String,
    pub source_language: Option<String>,
    pub client_id: Option<String>,
    pub dealing_rep: Option<String>,
    pub call_date: Option<String>,
    pub form_type: Option<String>,
}

/// =============================
/// Response Models
/// =============================

#[derive(Debug, Serialize, Deserialize)]
pub struct ExtractionResponse {
    pub status: String,
    pub client_name: Option<String>,
    pub form_type: String,
    pub job_id: String,
    pub fields_extracted: usize,
    pub missing_fields: Vec<String>,
    pub red_flags: Vec<String>,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub timestamp: String,
}

impl ApiResponse {
    pub fn success<T: Serialize>(data: T) -> Self {
        Self {
            success: true,
            data: serde_json::to_value(data).ok(),
            error: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub pipeline: Arc<Pipeline>,
}

/// =============================
/// Health Endpoint
/// =============================

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "KYC Orchestrator",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// =============================
/// Webhook Endpoint
/// =============================

fn job_from_request(req: &TranscriptRequest, pipeline: &Pipeline) -> PipelineJob {
    let defaults = pipeline.config();
    PipelineJob {
        transcript: req.transcript.clone(),
        language: req
            .source_language
            .clone()
            .unwrap_or_else(|| defaults.default_language.clone()),
        form_type: req
            .form_type
            .as_deref()
            .map(FormType::parse)
            .unwrap_or(defaults.default_form_type),
        dealing_rep: req
            .dealing_rep
            .clone()
            .unwrap_or_else(|| defaults.default_representative.clone()),
        client_id: req.client_id.clone(),
    }
}

/// Receive a transcript from the meeting bot and queue full processing.
/// Returns immediately with a name-only acknowledgment.
async fn receive_transcript(
    State(state): State<ApiState>,
    Json(req): Json<TranscriptRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    if req.transcript.trim().chars().count() < 50 {
        let err = KycError::InvalidRequest("Transcript too short or empty".into());
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(err.to_string())),
        );
    }

    let job = job_from_request(&req, &state.pipeline);
    info!(
        form_type = %job.form_type,
        client_id = ?job.client_id,
        "Received transcript webhook"
    );

    // Quick extraction for the acknowledgment; any failure degrades to an
    // anonymous response, it never blocks queueing.
    let quick = match state.pipeline.extractor().quick_extract(&req.transcript).await {
        Ok(quick) => quick,
        Err(e) => {
            warn!("Quick extraction failed: {}", e);
            Default::default()
        }
    };

    let client_name = quick.full_name();
    let form_type = job.form_type;
    let job_id = state.pipeline.spawn(job, client_name.clone()).await;

    let response = ExtractionResponse {
        status: "processing".to_string(),
        client_name,
        form_type: form_type.to_string(),
        job_id: job_id.to_string(),
        fields_extracted: quick.fields_extracted(),
        missing_fields: quick.missing_fields,
        red_flags: Vec::new(),
        message: "KYC extraction started. You will receive an email when complete.".to_string(),
    };

    (StatusCode::OK, Json(ApiResponse::success(response)))
}

/// =============================
/// Synchronous Extraction Endpoint
/// =============================

async fn extract_sync(
    State(state): State<ApiState>,
    Json(req): Json<TranscriptRequest>,
) -> (StatusCode, Json<ApiResponse>) {
    let job = job_from_request(&req, &state.pipeline);
    info!(form_type = %job.form_type, "Synchronous extraction requested");

    match state
        .pipeline
        .extract_and_validate(&job.transcript, &job.language, job.form_type)
        .await
    {
        Ok((record, report)) => (
            StatusCode::OK,
            Json(ApiResponse::success(serde_json::json!({
                "status": "success",
                "extracted_data": record,
                "validation": report,
            }))),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!("Extraction failed: {}", e))),
        ),
    }
}

/// =============================
/// Router
/// =============================

pub fn create_router(pipeline: Arc<Pipeline>) -> Router {
    let state = ApiState { pipeline };

    Router::new()
        .route("/health", get(health))
        .route("/webhook/transcript", post(receive_transcript))
        .route("/extract/sync", post(extract_sync))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    pipeline: Arc<Pipeline>,
    port: u16,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let router = create_router(pipeline);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}
