use axum::{
    Router,
    extract::{DefaultBodyLimit, FromRequest, Multipart, Query, Request, State},
    http::header::CONTENT_TYPE,
    response::Json,
    routing::get,
};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

use crate::{
    config::ServerConfig,
    error::{AMBIGUOUS_INPUT, AnalysisError, INVALID_PDF, PROMPT_REQUIRED},
    models::{AnalysisInput, AnalysisOutcome, PromptRequest, UploadedDocument, media_type_is_pdf},
    tasks::StagedUpload,
    workflow::{AnalysisWorkflow, create_workflow},
};

type ApiResult = Result<Json<AnalysisOutcome>, AnalysisError>;

pub const LIVENESS_MESSAGE: &str = "AntiPlag API is running....";

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub workflow: AnalysisWorkflow,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        let workflow = create_workflow(&config);
        Self {
            config: Arc::new(config),
            workflow,
        }
    }
}

pub fn create_app(config: ServerConfig) -> Router {
    build_router(AppState::new(config))
}

pub fn build_router(app_state: AppState) -> Router {
    let body_limit = app_state.config.max_upload_bytes;

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/check", get(check_prompt).post(check_submission))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(app_state)
}

async fn root() -> &'static str {
    LIVENESS_MESSAGE
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// `GET /check?prompt=...`
async fn check_prompt(
    State(state): State<AppState>,
    Query(params): Query<PromptRequest>,
) -> ApiResult {
    let span = info_span!("analysis", request_id = %Uuid::new_v4(), shape = "query");
    analyze_prompt(&state, params.prompt).instrument(span).await
}

/// `POST /check` with either a multipart `file` upload or a JSON `{"prompt": ...}` body.
async fn check_submission(State(state): State<AppState>, request: Request) -> ApiResult {
    let span = info_span!("analysis", request_id = %Uuid::new_v4(), shape = "post");
    analyze_submission(&state, request).instrument(span).await
}

async fn analyze_prompt(state: &AppState, prompt: Option<String>) -> ApiResult {
    let prompt = non_blank(prompt).ok_or_else(|| AnalysisError::validation(PROMPT_REQUIRED))?;
    analyze(state, AnalysisInput::DirectPrompt(prompt), None).await
}

async fn analyze_submission(state: &AppState, request: Request) -> ApiResult {
    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();

    if content_type.starts_with("multipart/form-data") {
        let multipart = Multipart::from_request(request, state)
            .await
            .map_err(|e| AnalysisError::validation(e.body_text()))?;
        let (input, staged) = read_multipart(&state.config, multipart).await?;
        analyze(state, input, staged).await
    } else if content_type.starts_with("application/json") {
        let Json(body) = Json::<PromptRequest>::from_request(request, state)
            .await
            .map_err(|e| AnalysisError::validation(e.body_text()))?;
        analyze_prompt(state, body.prompt).await
    } else {
        Err(AnalysisError::validation(PROMPT_REQUIRED))
    }
}

async fn analyze(
    state: &AppState,
    input: AnalysisInput,
    staged: Option<StagedUpload>,
) -> ApiResult {
    let result = state.workflow.run(input).await;

    if let Some(staged) = staged {
        staged.discard();
    }

    let verdict = result?;
    info!("Analysis completed ({} characters)", verdict.as_str().len());
    Ok(Json(AnalysisOutcome::Success(verdict)))
}

/// Reads the form into exactly one input shape. An uploaded file is staged
/// on disk; the returned guard removes it.
async fn read_multipart(
    config: &ServerConfig,
    mut multipart: Multipart,
) -> Result<(AnalysisInput, Option<StagedUpload>), AnalysisError> {
    let mut upload: Option<(StagedUpload, String, String)> = None;
    let mut prompt: Option<String> = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| AnalysisError::validation(e.body_text()))?
    {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("file") => {
                if upload.is_some() {
                    return Err(AnalysisError::validation(
                        "only one file can be analyzed per request",
                    ));
                }

                let filename = field.file_name().unwrap_or("upload.pdf").to_string();
                let media_type = field.content_type().unwrap_or_default().to_string();
                if !media_type_is_pdf(&media_type) {
                    warn!("Rejected upload '{}' with media type '{}'", filename, media_type);
                    return Err(AnalysisError::validation(INVALID_PDF));
                }

                let mut staged = StagedUpload::create(&config.upload_dir)?;
                while let Some(chunk) = field
                    .chunk()
                    .await
                    .map_err(|e| AnalysisError::validation(e.body_text()))?
                {
                    staged.append(&chunk).await?;
                }
                upload = Some((staged, filename, media_type));
            }
            Some("prompt") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AnalysisError::validation(e.body_text()))?;
                prompt = non_blank(Some(text));
            }
            other => {
                warn!("Ignoring unexpected form field {:?}", other);
            }
        }
    }

    match (upload, prompt) {
        (Some(_), Some(_)) => Err(AnalysisError::validation(AMBIGUOUS_INPUT)),
        (None, None) => Err(AnalysisError::validation(PROMPT_REQUIRED)),
        (None, Some(prompt)) => Ok((AnalysisInput::DirectPrompt(prompt), None)),
        (Some((mut staged, filename, media_type)), None) => {
            if staged.is_empty() {
                return Err(AnalysisError::validation(INVALID_PDF));
            }
            let bytes = staged.contents().await?;
            let document = UploadedDocument {
                filename,
                media_type,
                bytes,
            };
            Ok((AnalysisInput::FileUpload(document), Some(staged)))
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}
