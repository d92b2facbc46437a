use crate::export::{write_control_csv, write_records_csv};
use crate::models::{DistributionOutcome, QuotaConfiguration, VoucherRecord};
use crate::service::{Distributor, LatestOutcome, QuotaPublisher};
use axum::{
    extract::{Json, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Shared state of the HTTP surface
#[derive(Clone)]
pub struct AppState {
    pub distributor: Arc<Distributor>,
    pub publisher: QuotaPublisher,
    pub latest: LatestOutcome,
}

/// Request body: a pre-loaded voucher batch plus the quotas to apply
#[derive(Debug, Deserialize)]
pub struct BatchDistributionRequest {
    pub rows: Vec<VoucherRecord>,
    pub quotas: QuotaConfiguration,
}

/// Response body for rejected or queued requests
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

fn message(status: StatusCode, success: bool, text: String) -> Response {
    let body = MessageResponse {
        success,
        message: text,
    };
    (status, Json(body)).into_response()
}

/// Health check
pub async fn health_check() -> &'static str {
    "OK"
}

/// Synchronous run over an uploaded batch
pub async fn distribute_batch(
    State(state): State<AppState>,
    Json(req): Json<BatchDistributionRequest>,
) -> Response {
    if let Err(e) = req.quotas.validate() {
        return message(StatusCode::UNPROCESSABLE_ENTITY, false, e.to_string());
    }

    let distributor = Arc::clone(&state.distributor);
    let BatchDistributionRequest { rows, quotas } = req;
    match tokio::task::spawn_blocking(move || distributor.run(rows, &quotas)).await {
        Ok(outcome) => {
            let outcome = Arc::new(outcome);
            *state.latest.write().await = Some(Arc::clone(&outcome));
            (StatusCode::OK, Json(outcome.as_ref().clone())).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "batch distribution panicked");
            message(StatusCode::INTERNAL_SERVER_ERROR, false, format!("Error: {}", e))
        }
    }
}

/// Publish a quota message; the worker re-runs the distribution over a fresh snapshot
pub async fn publish_quotas(
    State(state): State<AppState>,
    Path(queue): Path<String>,
    Json(quotas): Json<QuotaConfiguration>,
) -> Response {
    if queue != state.publisher.queue_name() {
        return message(StatusCode::NOT_FOUND, false, format!("Unknown queue {}", queue));
    }
    if let Err(e) = quotas.validate() {
        return message(StatusCode::UNPROCESSABLE_ENTITY, false, e.to_string());
    }

    let facilities = quotas.facilities.len();
    if state.publisher.publish(quotas).await {
        message(
            StatusCode::ACCEPTED,
            true,
            format!("Queued quota configuration for {} facilities", facilities),
        )
    } else {
        message(StatusCode::SERVICE_UNAVAILABLE, false, "Worker is not running".to_string())
    }
}

async fn latest(state: &AppState) -> Option<Arc<DistributionOutcome>> {
    state.latest.read().await.clone()
}

fn no_run_yet() -> Response {
    message(StatusCode::NOT_FOUND, false, "No distribution has run yet".to_string())
}

pub async fn latest_outcome(State(state): State<AppState>) -> Response {
    match latest(&state).await {
        Some(outcome) => (StatusCode::OK, Json(outcome.as_ref().clone())).into_response(),
        None => no_run_yet(),
    }
}

fn csv_response(rendered: Result<(), csv::Error>, body: Vec<u8>) -> Response {
    match rendered {
        Ok(()) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/csv; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => message(StatusCode::INTERNAL_SERVER_ERROR, false, format!("Error: {}", e)),
    }
}

pub async fn latest_records_csv(State(state): State<AppState>) -> Response {
    let Some(outcome) = latest(&state).await else {
        return no_run_yet();
    };
    let mut body = Vec::new();
    let rendered = write_records_csv(&outcome.distributed, &mut body);
    csv_response(rendered, body)
}

pub async fn latest_leftover_csv(State(state): State<AppState>) -> Response {
    let Some(outcome) = latest(&state).await else {
        return no_run_yet();
    };
    let mut body = Vec::new();
    let rendered = write_records_csv(&outcome.leftover, &mut body);
    csv_response(rendered, body)
}

pub async fn latest_control_csv(State(state): State<AppState>) -> Response {
    let Some(outcome) = latest(&state).await else {
        return no_run_yet();
    };
    let tables: Vec<_> = outcome.control_tables().collect();
    let mut body = Vec::new();
    let rendered = write_control_csv(&tables, &mut body);
    csv_response(rendered, body)
}
