use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rusqlite::Connection;
use serde_json::Value;
use uuid::Uuid;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::booking::STATUS_PENDING;
use crate::models::{Booking, BookingSource, NewBooking, Participant, PaymentMethod};
use crate::services::reference;

const MAX_NUMBER_ATTEMPTS: usize = 5;

// Checked in this order; the first missing field is the one reported.
const REQUIRED_FIELDS: [&str; 8] = [
    "customerName",
    "email",
    "phone",
    "tourName",
    "tourDate",
    "groupSize",
    "totalAmount",
    "nationality",
];

/// Normalizes a raw booking request into a `NewBooking`, or rejects it
/// before anything touches the store. Errors carry the wire-level field
/// name so callers know exactly what to fix.
pub fn validate_booking_request(payload: &Value) -> Result<NewBooking, AppError> {
    for field in REQUIRED_FIELDS {
        if is_missing(payload.get(field)) {
            return Err(required(field));
        }
    }

    let customer_name = str_field(payload, "customerName")?;
    let email = str_field(payload, "email")?;
    let phone = str_field(payload, "phone")?;
    let nationality = str_field(payload, "nationality")?;
    let tour_name = str_field(payload, "tourName")?;

    let tour_date = match payload.get("tourDate") {
        Some(Value::String(s)) => parse_tour_date(s).ok_or_else(|| invalid("tourDate"))?,
        _ => return Err(invalid("tourDate")),
    };

    let group_size = int_field(payload, "groupSize")?;
    if group_size < 1 {
        return Err(AppError::Validation(
            "groupSize must be at least 1".to_string(),
        ));
    }

    let total_amount = number_field(payload, "totalAmount")?;
    if total_amount < 0.0 {
        return Err(AppError::Validation(
            "totalAmount must be a non-negative number".to_string(),
        ));
    }

    let payment_method = match opt_str_field(payload, "paymentMethod") {
        Some(s) => PaymentMethod::parse(&s).ok_or_else(|| invalid("paymentMethod"))?,
        None => PaymentMethod::CreditCard,
    };

    let source = match opt_str_field(payload, "source") {
        Some(s) => BookingSource::parse(&s).ok_or_else(|| invalid("source"))?,
        None => BookingSource::Website,
    };

    let participants = normalize_participants(payload.get("participants"), &customer_name);

    Ok(NewBooking {
        customer_name,
        email,
        phone,
        nationality,
        passport_number: opt_str_field(payload, "passportNumber"),
        tour_id: opt_str_field(payload, "tourId"),
        tour_name,
        tour_date,
        duration: opt_str_field(payload, "duration"),
        group_size,
        participants,
        total_amount,
        currency: opt_str_field(payload, "currency").unwrap_or_else(|| "USD".to_string()),
        deposit_paid: payload
            .get("depositPaid")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        payment_method,
        source,
    })
}

/// Persists a validated booking, assigning the booking number. A unique
/// collision on the number is retried with a fresh one a bounded number of
/// times; running out of attempts is a conflict, not a validation failure.
pub fn create_booking(conn: &Connection, new: NewBooking) -> Result<Booking, AppError> {
    create_with_numbers(conn, new, reference::new_booking_number)
}

fn create_with_numbers(
    conn: &Connection,
    new: NewBooking,
    mut next_number: impl FnMut() -> String,
) -> Result<Booking, AppError> {
    let now = Utc::now().naive_utc();
    let mut booking = Booking {
        id: Uuid::new_v4().to_string(),
        booking_number: String::new(),
        customer_name: new.customer_name,
        email: new.email,
        phone: new.phone,
        nationality: new.nationality,
        passport_number: new.passport_number,
        tour_id: new.tour_id,
        tour_name: new.tour_name,
        tour_date: new.tour_date,
        duration: new.duration,
        group_size: new.group_size,
        participants: new.participants,
        total_amount: new.total_amount,
        currency: new.currency,
        deposit_paid: new.deposit_paid,
        payment_method: new.payment_method,
        status: STATUS_PENDING.to_string(),
        source: new.source,
        created_at: now,
        updated_at: now,
    };

    for attempt in 1..=MAX_NUMBER_ATTEMPTS {
        booking.booking_number = next_number();
        match queries::insert_booking(conn, &booking) {
            Ok(()) => return Ok(booking),
            Err(e) if queries::is_booking_number_collision(&e) => {
                tracing::warn!(
                    attempt,
                    booking_number = %booking.booking_number,
                    "booking number collision, regenerating"
                );
            }
            Err(e) => {
                return Err(match e.downcast::<rusqlite::Error>() {
                    Ok(db_err) => AppError::Database(db_err),
                    Err(other) => AppError::Internal(other),
                })
            }
        }
    }

    Err(AppError::Conflict("duplicate booking".to_string()))
}

pub fn parse_tour_date(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M") {
        return Some(dt);
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Coerces whatever the client sent for `participants` into a well-formed
/// list. Anything that is not an array collapses to a single participant
/// derived from the customer.
pub fn normalize_participants(value: Option<&Value>, customer_name: &str) -> Vec<Participant> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| Participant {
                name: item
                    .get("name")
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .unwrap_or(customer_name)
                    .to_string(),
                age: coerce_age(item.get("age")),
                gender: item
                    .get("gender")
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .unwrap_or("male")
                    .to_string(),
                special_requirements: item
                    .get("specialRequirements")
                    .and_then(Value::as_str)
                    .unwrap_or("")
                    .to_string(),
            })
            .collect(),
        _ => vec![Participant {
            name: customer_name.to_string(),
            age: 18,
            gender: "male".to_string(),
            special_requirements: String::new(),
        }],
    }
}

fn coerce_age(value: Option<&Value>) -> i64 {
    let age = match value {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    age.filter(|a| *a >= 0).unwrap_or(18)
}

fn required(field: &str) -> AppError {
    AppError::Validation(format!("{field} is required"))
}

fn invalid(field: &str) -> AppError {
    AppError::Validation(format!("{field} is invalid"))
}

fn is_missing(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

fn str_field(payload: &Value, field: &str) -> Result<String, AppError> {
    match payload.get(field) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        None | Some(Value::Null) | Some(Value::String(_)) => Err(required(field)),
        Some(_) => Err(invalid(field)),
    }
}

fn opt_str_field(payload: &Value, field: &str) -> Option<String> {
    payload
        .get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn int_field(payload: &Value, field: &str) -> Result<i64, AppError> {
    match payload.get(field) {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .ok_or_else(|| invalid(field)),
        Some(Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .or_else(|_| s.trim().parse::<f64>().map(|f| f as i64))
            .map_err(|_| invalid(field)),
        _ => Err(required(field)),
    }
}

fn number_field(payload: &Value, field: &str) -> Result<f64, AppError> {
    match payload.get(field) {
        Some(Value::Number(n)) => n.as_f64().ok_or_else(|| invalid(field)),
        Some(Value::String(s)) => s.trim().parse::<f64>().map_err(|_| invalid(field)),
        _ => Err(required(field)),
    }
}
