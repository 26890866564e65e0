use std::sync::Arc;

use axum::{extract::State, Json};

use crate::{
    models::stats::DashboardResponse,
    services::{attempt_service::AttemptService, stats_service::compute_stats, AppState},
};

/// Dashboard. A failed read still renders, with empty figures and the error.
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<DashboardResponse> {
    let service = AttemptService::new(state.store.clone());
    let (records, load_error) = match service.list().await {
        Ok(records) => (records, None),
        Err(e) => {
            tracing::warn!(error = %e, "Dashboard falling back to an empty history");
            (Vec::new(), Some(e.to_string()))
        }
    };

    let stats = compute_stats(&records, state.config.stats_recent_window);
    let recent_entries = records
        .into_iter()
        .take(state.config.stats_recent_entries)
        .collect();

    Json(DashboardResponse {
        stats,
        recent_entries,
        load_error,
    })
}
