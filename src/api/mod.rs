pub mod handlers;

pub use handlers::*;

use axum::{
    routing::{get, post},
    Router,
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/distribution", post(distribute_batch))
        .route("/api/distribution/latest", get(latest_outcome))
        .route("/api/distribution/latest/records.csv", get(latest_records_csv))
        .route("/api/distribution/latest/leftover.csv", get(latest_leftover_csv))
        .route("/api/distribution/latest/control.csv", get(latest_control_csv))
        .route("/api/queues/:queue", post(publish_quotas))
        .with_state(state)
}
