use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::Tour;
use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TourResponse {
    pub id: String,
    pub name: String,
    pub category: Option<String>,
    pub price: f64,
    pub capacity: Option<i64>,
    pub is_active: bool,
    pub created_at: String,
}

impl From<Tour> for TourResponse {
    fn from(t: Tour) -> Self {
        TourResponse {
            id: t.id,
            name: t.name,
            category: t.category,
            price: t.price,
            capacity: t.capacity,
            is_active: t.is_active,
            created_at: queries::fmt_ts(&t.created_at),
        }
    }
}

// GET /api/tours
pub async fn list_tours(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<TourResponse>>, AppError> {
    let db = state.db.lock().unwrap();
    let tours: Vec<TourResponse> = queries::list_active_tours(&db)?
        .into_iter()
        .map(TourResponse::from)
        .collect();
    Ok(Json(tours))
}

// GET /api/tours/:id
pub async fn get_tour(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<TourResponse>, AppError> {
    let db = state.db.lock().unwrap();
    let tour = queries::get_tour_by_id(&db, &id)?
        .ok_or_else(|| AppError::NotFound("tour not found".to_string()))?;
    Ok(Json(tour.into()))
}
