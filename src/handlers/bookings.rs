use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Booking, BookingSource, Participant, PaymentMethod};
use crate::services::booking as booking_service;
use crate::state::AppState;

use super::require_admin;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingResponse {
    pub booking_number: String,
    pub booking_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingResponse {
    pub id: String,
    pub booking_number: String,
    pub customer_name: String,
    pub email: String,
    pub phone: String,
    pub nationality: String,
    pub passport_number: Option<String>,
    pub tour_id: Option<String>,
    pub tour_name: String,
    pub tour_date: String,
    pub duration: Option<String>,
    pub group_size: i64,
    pub participants: Vec<Participant>,
    pub total_amount: f64,
    pub currency: String,
    pub deposit_paid: bool,
    pub payment_method: PaymentMethod,
    pub status: String,
    pub source: BookingSource,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Booking> for BookingResponse {
    fn from(b: Booking) -> Self {
        BookingResponse {
            id: b.id,
            booking_number: b.booking_number,
            customer_name: b.customer_name,
            email: b.email,
            phone: b.phone,
            nationality: b.nationality,
            passport_number: b.passport_number,
            tour_id: b.tour_id,
            tour_name: b.tour_name,
            tour_date: b.tour_date.format("%Y-%m-%d %H:%M:%S").to_string(),
            duration: b.duration,
            group_size: b.group_size,
            participants: b.participants,
            total_amount: b.total_amount,
            currency: b.currency,
            deposit_paid: b.deposit_paid,
            payment_method: b.payment_method,
            status: b.status,
            source: b.source,
            created_at: queries::fmt_ts(&b.created_at),
            updated_at: queries::fmt_ts(&b.updated_at),
        }
    }
}

// POST /api/bookings
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<serde_json::Value>,
) -> Result<(StatusCode, Json<CreateBookingResponse>), AppError> {
    let new = booking_service::validate_booking_request(&payload)?;

    let booking = {
        let db = state.db.lock().unwrap();
        booking_service::create_booking(&db, new)?
    };

    tracing::info!(
        booking_number = %booking.booking_number,
        tour = %booking.tour_name,
        "booking created"
    );

    // Confirmation is dispatched after the commit and never awaited by the
    // caller; its outcome is only logged.
    let notifier = Arc::clone(&state.notifier);
    let snapshot = booking.clone();
    tokio::spawn(async move {
        match notifier.send_confirmation(&snapshot).await {
            Ok(()) => {
                tracing::info!(booking_number = %snapshot.booking_number, "confirmation dispatched")
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    booking_number = %snapshot.booking_number,
                    "confirmation delivery failed"
                )
            }
        }
    });

    Ok((
        StatusCode::CREATED,
        Json(CreateBookingResponse {
            booking_number: booking.booking_number,
            booking_id: booking.id,
        }),
    ))
}

// GET /api/bookings?number= | ?email= | unscoped (admin)
#[derive(Deserialize)]
pub struct BookingLookupQuery {
    pub number: Option<String>,
    pub email: Option<String>,
    pub limit: Option<i64>,
}

pub async fn lookup_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<BookingLookupQuery>,
) -> Result<Response, AppError> {
    let db = state.db.lock().unwrap();

    if let Some(number) = query.number.as_deref() {
        let booking = queries::get_booking_by_number(&db, number)?
            .ok_or_else(|| AppError::NotFound("booking not found".to_string()))?;
        return Ok(Json(BookingResponse::from(booking)).into_response());
    }

    if let Some(email) = query.email.as_deref() {
        let bookings: Vec<BookingResponse> = queries::get_bookings_by_email(&db, email)?
            .into_iter()
            .map(BookingResponse::from)
            .collect();
        return Ok(Json(bookings).into_response());
    }

    // Listing everything is a back-office capability.
    require_admin(&headers, &state.config.admin_token)?;

    let limit = query.limit.unwrap_or(50);
    let bookings: Vec<BookingResponse> = queries::get_recent_bookings(&db, limit)?
        .into_iter()
        .map(BookingResponse::from)
        .collect();
    Ok(Json(bookings).into_response())
}

// GET /api/bookings/:id
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<BookingResponse>, AppError> {
    let db = state.db.lock().unwrap();
    let booking = queries::get_booking_by_id(&db, &id)?
        .ok_or_else(|| AppError::NotFound("booking not found".to_string()))?;
    Ok(Json(booking.into()))
}

// PUT /api/bookings/:id
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBookingRequest {
    pub customer_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub nationality: Option<String>,
    pub passport_number: Option<String>,
    pub tour_id: Option<String>,
    pub tour_name: Option<String>,
    pub tour_date: Option<String>,
    pub duration: Option<String>,
    pub group_size: Option<i64>,
    pub participants: Option<serde_json::Value>,
    pub total_amount: Option<f64>,
    pub currency: Option<String>,
    pub deposit_paid: Option<bool>,
    pub payment_method: Option<String>,
    pub status: Option<String>,
    pub source: Option<String>,
}

pub async fn update_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<UpdateBookingRequest>,
) -> Result<Json<BookingResponse>, AppError> {
    require_admin(&headers, &state.config.admin_token)?;

    let db = state.db.lock().unwrap();
    let mut booking = queries::get_booking_by_id(&db, &id)?
        .ok_or_else(|| AppError::NotFound("booking not found".to_string()))?;

    if let Some(name) = body.customer_name {
        booking.customer_name = name;
    }
    if let Some(email) = body.email {
        booking.email = email;
    }
    if let Some(phone) = body.phone {
        booking.phone = phone;
    }
    if let Some(nationality) = body.nationality {
        booking.nationality = nationality;
    }
    if let Some(passport) = body.passport_number {
        booking.passport_number = Some(passport);
    }
    if let Some(tour_id) = body.tour_id {
        booking.tour_id = Some(tour_id);
    }
    if let Some(tour_name) = body.tour_name {
        booking.tour_name = tour_name;
    }
    if let Some(date) = body.tour_date {
        booking.tour_date = booking_service::parse_tour_date(&date)
            .ok_or_else(|| AppError::Validation("tourDate is invalid".to_string()))?;
    }
    if let Some(duration) = body.duration {
        booking.duration = Some(duration);
    }
    if let Some(size) = body.group_size {
        if size < 1 {
            return Err(AppError::Validation(
                "groupSize must be at least 1".to_string(),
            ));
        }
        booking.group_size = size;
    }
    if let Some(value) = body.participants {
        booking.participants =
            booking_service::normalize_participants(Some(&value), &booking.customer_name);
    }
    if let Some(amount) = body.total_amount {
        if amount < 0.0 {
            return Err(AppError::Validation(
                "totalAmount must be a non-negative number".to_string(),
            ));
        }
        booking.total_amount = amount;
    }
    if let Some(currency) = body.currency {
        booking.currency = currency;
    }
    if let Some(deposit) = body.deposit_paid {
        booking.deposit_paid = deposit;
    }
    if let Some(method) = body.payment_method {
        booking.payment_method = PaymentMethod::parse(&method)
            .ok_or_else(|| AppError::Validation("paymentMethod is invalid".to_string()))?;
    }
    // No transition graph on status: any replacement value is accepted.
    if let Some(status) = body.status {
        booking.status = status;
    }
    if let Some(source) = body.source {
        booking.source = BookingSource::parse(&source)
            .ok_or_else(|| AppError::Validation("source is invalid".to_string()))?;
    }

    booking.updated_at = Utc::now().naive_utc();
    queries::update_booking(&db, &booking)?;

    Ok(Json(booking.into()))
}

// DELETE /api/bookings/:id
pub async fn delete_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    require_admin(&headers, &state.config.admin_token)?;

    let removed = {
        let db = state.db.lock().unwrap();
        queries::delete_booking(&db, &id)?
    };

    if removed {
        Ok(Json(serde_json::json!({ "ok": true })))
    } else {
        Err(AppError::NotFound("booking not found".to_string()))
    }
}
