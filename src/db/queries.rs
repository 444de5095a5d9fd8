use std::collections::BTreeMap;

use chrono::{NaiveDateTime, Utc};
use rusqlite::{params, Connection};
use serde::Serialize;

use crate::models::booking::STATUS_COMPLETED;
use crate::models::{Booking, BookingSource, Participant, PaymentMethod, Tour};

// Microsecond precision keeps `updated_at` strictly increasing across
// back-to-back mutations and makes the text ordering chronological.
const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

const BOOKING_COLUMNS: &str = "id, booking_number, customer_name, email, phone, nationality, \
     passport_number, tour_id, tour_name, tour_date, duration, group_size, participants, \
     total_amount, currency, deposit_paid, payment_method, status, source, created_at, updated_at";

pub fn fmt_ts(dt: &NaiveDateTime) -> String {
    dt.format(TS_FORMAT).to_string()
}

pub fn parse_ts(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, TS_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
        .unwrap_or_else(|_| Utc::now().naive_utc())
}

// ── Bookings ──

pub fn insert_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<()> {
    let participants_json = serde_json::to_string(&booking.participants)?;

    conn.execute(
        "INSERT INTO bookings (id, booking_number, customer_name, email, phone, nationality, \
         passport_number, tour_id, tour_name, tour_date, duration, group_size, participants, \
         total_amount, currency, deposit_paid, payment_method, status, source, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21)",
        params![
            booking.id,
            booking.booking_number,
            booking.customer_name,
            booking.email,
            booking.phone,
            booking.nationality,
            booking.passport_number,
            booking.tour_id,
            booking.tour_name,
            fmt_ts(&booking.tour_date),
            booking.duration,
            booking.group_size,
            participants_json,
            booking.total_amount,
            booking.currency,
            booking.deposit_paid as i32,
            booking.payment_method.as_str(),
            booking.status,
            booking.source.as_str(),
            fmt_ts(&booking.created_at),
            fmt_ts(&booking.updated_at),
        ],
    )?;
    Ok(())
}

/// True when an insert failed on the unique booking-number constraint, the
/// one storage error the creation path treats as retryable.
pub fn is_booking_number_collision(err: &anyhow::Error) -> bool {
    match err.downcast_ref::<rusqlite::Error>() {
        Some(rusqlite::Error::SqliteFailure(e, Some(msg))) => {
            e.code == rusqlite::ErrorCode::ConstraintViolation
                && msg.contains("bookings.booking_number")
        }
        _ => false,
    }
}

pub fn get_booking_by_id(conn: &Connection, id: &str) -> anyhow::Result<Option<Booking>> {
    let result = conn.query_row(
        &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1"),
        params![id],
        |row| Ok(parse_booking_row(row)),
    );

    match result {
        Ok(booking) => Ok(Some(booking?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_booking_by_number(conn: &Connection, number: &str) -> anyhow::Result<Option<Booking>> {
    let result = conn.query_row(
        &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE booking_number = ?1"),
        params![number],
        |row| Ok(parse_booking_row(row)),
    );

    match result {
        Ok(booking) => Ok(Some(booking?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_bookings_by_email(conn: &Connection, email: &str) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings WHERE email = ?1 ORDER BY created_at DESC"
    ))?;

    let rows = stmt.query_map(params![email], |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

pub fn get_recent_bookings(conn: &Connection, limit: i64) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings ORDER BY created_at DESC LIMIT ?1"
    ))?;

    let rows = stmt.query_map(params![limit], |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

pub fn update_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<bool> {
    let participants_json = serde_json::to_string(&booking.participants)?;

    // booking_number and created_at are immutable once assigned.
    let count = conn.execute(
        "UPDATE bookings SET customer_name = ?1, email = ?2, phone = ?3, nationality = ?4, \
         passport_number = ?5, tour_id = ?6, tour_name = ?7, tour_date = ?8, duration = ?9, \
         group_size = ?10, participants = ?11, total_amount = ?12, currency = ?13, \
         deposit_paid = ?14, payment_method = ?15, status = ?16, source = ?17, updated_at = ?18
         WHERE id = ?19",
        params![
            booking.customer_name,
            booking.email,
            booking.phone,
            booking.nationality,
            booking.passport_number,
            booking.tour_id,
            booking.tour_name,
            fmt_ts(&booking.tour_date),
            booking.duration,
            booking.group_size,
            participants_json,
            booking.total_amount,
            booking.currency,
            booking.deposit_paid as i32,
            booking.payment_method.as_str(),
            booking.status,
            booking.source.as_str(),
            fmt_ts(&booking.updated_at),
            booking.id,
        ],
    )?;
    Ok(count > 0)
}

pub fn delete_booking(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM bookings WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<Booking> {
    let participants_json: String = row.get(12)?;
    let participants: Vec<Participant> =
        serde_json::from_str(&participants_json).unwrap_or_default();
    let payment_method_str: String = row.get(16)?;
    let source_str: String = row.get(18)?;

    Ok(Booking {
        id: row.get(0)?,
        booking_number: row.get(1)?,
        customer_name: row.get(2)?,
        email: row.get(3)?,
        phone: row.get(4)?,
        nationality: row.get(5)?,
        passport_number: row.get(6)?,
        tour_id: row.get(7)?,
        tour_name: row.get(8)?,
        tour_date: parse_ts(&row.get::<_, String>(9)?),
        duration: row.get(10)?,
        group_size: row.get(11)?,
        participants,
        total_amount: row.get(13)?,
        currency: row.get(14)?,
        deposit_paid: row.get::<_, i32>(15)? != 0,
        payment_method: PaymentMethod::parse(&payment_method_str)
            .unwrap_or(PaymentMethod::CreditCard),
        status: row.get(17)?,
        source: BookingSource::parse(&source_str).unwrap_or(BookingSource::Website),
        created_at: parse_ts(&row.get::<_, String>(19)?),
        updated_at: parse_ts(&row.get::<_, String>(20)?),
    })
}

// ── Aggregations ──

#[derive(Debug, Serialize)]
pub struct DailyRevenue {
    pub year: i64,
    pub month: i64,
    pub day: i64,
    pub revenue: f64,
    pub bookings: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TourPopularity {
    pub tour_name: String,
    pub bookings: i64,
    pub revenue: f64,
}

pub fn count_bookings(conn: &Connection) -> anyhow::Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM bookings", [], |row| row.get(0))?;
    Ok(count)
}

pub fn count_bookings_since(conn: &Connection, cutoff: &NaiveDateTime) -> anyhow::Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM bookings WHERE created_at >= ?1",
        params![fmt_ts(cutoff)],
        |row| row.get(0),
    )?;
    Ok(count)
}

pub fn completed_booking_totals(conn: &Connection) -> anyhow::Result<(i64, f64)> {
    let totals = conn.query_row(
        "SELECT COUNT(*), COALESCE(SUM(total_amount), 0) FROM bookings WHERE status = ?1",
        params![STATUS_COMPLETED],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;
    Ok(totals)
}

/// Completed revenue per calendar day of `created_at`, oldest first, at most
/// 30 buckets. Dates are sliced out of the text timestamps directly so the
/// grouping never depends on SQLite's date parsing.
pub fn revenue_by_day(conn: &Connection, cutoff: &NaiveDateTime) -> anyhow::Result<Vec<DailyRevenue>> {
    let mut stmt = conn.prepare(
        "SELECT CAST(substr(created_at, 1, 4) AS INTEGER),
                CAST(substr(created_at, 6, 2) AS INTEGER),
                CAST(substr(created_at, 9, 2) AS INTEGER),
                COALESCE(SUM(total_amount), 0),
                COUNT(*)
         FROM bookings
         WHERE status = ?1 AND created_at >= ?2
         GROUP BY substr(created_at, 1, 10)
         ORDER BY substr(created_at, 1, 10) ASC
         LIMIT 30",
    )?;

    let rows = stmt.query_map(params![STATUS_COMPLETED, fmt_ts(cutoff)], |row| {
        Ok(DailyRevenue {
            year: row.get(0)?,
            month: row.get(1)?,
            day: row.get(2)?,
            revenue: row.get(3)?,
            bookings: row.get(4)?,
        })
    })?;

    let mut buckets = vec![];
    for row in rows {
        buckets.push(row?);
    }
    Ok(buckets)
}

pub fn tour_popularity(conn: &Connection) -> anyhow::Result<Vec<TourPopularity>> {
    let mut stmt = conn.prepare(
        "SELECT tour_name, COUNT(*) AS bookings, COALESCE(SUM(total_amount), 0) AS revenue
         FROM bookings
         GROUP BY tour_name
         ORDER BY bookings DESC, revenue DESC
         LIMIT 10",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok(TourPopularity {
            tour_name: row.get(0)?,
            bookings: row.get(1)?,
            revenue: row.get(2)?,
        })
    })?;

    let mut ranking = vec![];
    for row in rows {
        ranking.push(row?);
    }
    Ok(ranking)
}

pub fn status_breakdown(conn: &Connection) -> anyhow::Result<BTreeMap<String, i64>> {
    let mut stmt = conn.prepare("SELECT status, COUNT(*) FROM bookings GROUP BY status")?;

    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
    })?;

    let mut counts = BTreeMap::new();
    for row in rows {
        let (status, count) = row?;
        counts.insert(status, count);
    }
    Ok(counts)
}

// ── Tours ──

pub fn count_active_tours(conn: &Connection) -> anyhow::Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM tours WHERE is_active = 1",
        [],
        |row| row.get(0),
    )?;
    Ok(count)
}

pub fn get_tour_by_id(conn: &Connection, id: &str) -> anyhow::Result<Option<Tour>> {
    let result = conn.query_row(
        "SELECT id, name, category, price, capacity, is_active, created_at FROM tours WHERE id = ?1",
        params![id],
        |row| Ok(parse_tour_row(row)),
    );

    match result {
        Ok(tour) => Ok(Some(tour?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_active_tours(conn: &Connection) -> anyhow::Result<Vec<Tour>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, category, price, capacity, is_active, created_at
         FROM tours WHERE is_active = 1 ORDER BY name ASC",
    )?;

    let rows = stmt.query_map([], |row| Ok(parse_tour_row(row)))?;

    let mut tours = vec![];
    for row in rows {
        tours.push(row??);
    }
    Ok(tours)
}

fn parse_tour_row(row: &rusqlite::Row) -> anyhow::Result<Tour> {
    Ok(Tour {
        id: row.get(0)?,
        name: row.get(1)?,
        category: row.get(2)?,
        price: row.get(3)?,
        capacity: row.get(4)?,
        is_active: row.get::<_, i32>(5)? != 0,
        created_at: parse_ts(&row.get::<_, String>(6)?),
    })
}
