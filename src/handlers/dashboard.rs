use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;

use crate::errors::AppError;
use crate::services::reporting::{self, DashboardReport};
use crate::state::AppState;

use super::require_admin;

#[derive(Deserialize)]
pub struct DashboardQuery {
    pub days: Option<i64>,
}

// GET /api/admin/dashboard
pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<DashboardReport>, AppError> {
    require_admin(&headers, &state.config.admin_token)?;

    let report = {
        let db = state.db.lock().unwrap();
        reporting::build_dashboard(&db, query.days.unwrap_or(reporting::DEFAULT_WINDOW_DAYS))?
    };

    Ok(Json(report))
}
