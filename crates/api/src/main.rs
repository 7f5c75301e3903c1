use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tradewatch_core::catalog::{self, ParamKind};
use tradewatch_core::domain::setup::GenerationRequest;
use tradewatch_core::domain::webhook::WebhookMessage;
use tradewatch_core::storage::webhook_log::WebhookLog;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = tradewatch_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let state = AppState {
        log: Arc::new(WebhookLog::new()),
    };

    let static_dir = settings
        .static_dir
        .clone()
        .unwrap_or_else(|| "static".to_string());

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/api/triggers", get(list_triggers))
        .route("/api/generate", post(generate_setup))
        .route("/api/webhook", post(ingest_webhook))
        .route("/api/webhook-messages", get(list_webhook_messages))
        .fallback_service(ServeDir::new(static_dir))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Debug, Clone)]
struct AppState {
    log: Arc<WebhookLog>,
}

#[derive(Debug, Serialize)]
struct TriggerSummary {
    id: &'static str,
    display_name: &'static str,
    explanation: &'static str,
    params: Vec<ParamSummary>,
}

#[derive(Debug, Serialize)]
struct ParamSummary {
    name: &'static str,
    label: &'static str,
    kind: &'static str,
    default: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    min: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<Vec<&'static str>>,
}

#[derive(Debug, Serialize)]
struct GenerateResponse {
    script: String,
    payload: String,
    explanation: &'static str,
}

async fn list_triggers() -> Json<Vec<TriggerSummary>> {
    let summaries = catalog::catalog()
        .iter()
        .map(|def| TriggerSummary {
            id: def.id,
            display_name: def.display_name,
            explanation: def.explanation,
            params: def.params.iter().map(param_summary).collect(),
        })
        .collect();
    Json(summaries)
}

fn param_summary(spec: &catalog::ParamSpec) -> ParamSummary {
    match spec.kind {
        ParamKind::Int { min, max, default } => ParamSummary {
            name: spec.name,
            label: spec.label,
            kind: "int",
            default: json!(default),
            min: Some(min),
            max: Some(max),
            options: None,
        },
        ParamKind::Choice { options, default } => ParamSummary {
            name: spec.name,
            label: spec.label,
            kind: "choice",
            default: json!(default),
            min: None,
            max: None,
            options: Some(options.to_vec()),
        },
        ParamKind::Session { default } => ParamSummary {
            name: spec.name,
            label: spec.label,
            kind: "session",
            default: json!(default),
            min: None,
            max: None,
            options: None,
        },
    }
}

async fn generate_setup(
    Json(request): Json<GenerationRequest>,
) -> Result<Json<GenerateResponse>, StatusCode> {
    // The page populates its select from /api/triggers, so an unknown id here
    // means a hand-crafted request.
    let Some(def) = catalog::find(&request.trigger) else {
        return Err(StatusCode::BAD_REQUEST);
    };

    let result = catalog::generate(&request).map_err(|_| StatusCode::BAD_REQUEST)?;

    Ok(Json(GenerateResponse {
        script: result.script,
        payload: result.payload,
        explanation: def.explanation,
    }))
}

async fn ingest_webhook(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Value>, StatusCode> {
    let payload: Value = serde_json::from_slice(&body).map_err(|_| StatusCode::BAD_REQUEST)?;
    if !payload.is_object() {
        return Err(StatusCode::BAD_REQUEST);
    }

    let message = state.log.ingest(payload);
    tracing::info!(id = %message.id, "webhook received");

    Ok(Json(json!({
        "status": "received",
        "time": message.received_at.to_rfc3339(),
    })))
}

async fn list_webhook_messages(State(state): State<AppState>) -> Json<Vec<WebhookMessage>> {
    Json(state.log.list())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &tradewatch_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
