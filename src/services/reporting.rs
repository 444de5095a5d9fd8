use std::collections::BTreeMap;

use chrono::{Duration, Utc};
use rusqlite::Connection;
use serde::Serialize;

use crate::db::queries::{self, DailyRevenue, TourPopularity};
use crate::models::Booking;

pub const DEFAULT_WINDOW_DAYS: i64 = 30;

const ACTIVITY_FEED_LIMIT: i64 = 10;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardReport {
    pub overview: Overview,
    pub revenue_by_day: Vec<DailyRevenue>,
    pub popular_tours: Vec<TourPopularity>,
    pub status_breakdown: BTreeMap<String, i64>,
    pub recent_activity: Vec<ActivityEntry>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub total_bookings: i64,
    pub recent_bookings: i64,
    pub completed_bookings: i64,
    pub total_revenue: f64,
    pub active_tours: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    pub booking_number: String,
    pub customer_name: String,
    pub tour_name: String,
    pub total_amount: f64,
    pub status: String,
    pub created_at: String,
}

impl From<Booking> for ActivityEntry {
    fn from(b: Booking) -> Self {
        ActivityEntry {
            booking_number: b.booking_number,
            customer_name: b.customer_name,
            tour_name: b.tour_name,
            total_amount: b.total_amount,
            status: b.status,
            created_at: queries::fmt_ts(&b.created_at),
        }
    }
}

/// Assembles the admin dashboard from the booking collection. Read-only;
/// an empty collection produces zeroed counts and empty lists.
pub fn build_dashboard(conn: &Connection, window_days: i64) -> anyhow::Result<DashboardReport> {
    let days = if window_days <= 0 {
        DEFAULT_WINDOW_DAYS
    } else {
        window_days
    };
    let cutoff = Utc::now().naive_utc() - Duration::days(days);

    let total_bookings = queries::count_bookings(conn)?;
    let recent_bookings = queries::count_bookings_since(conn, &cutoff)?;
    let (completed_bookings, total_revenue) = queries::completed_booking_totals(conn)?;
    let active_tours = queries::count_active_tours(conn)?;

    let recent_activity = queries::get_recent_bookings(conn, ACTIVITY_FEED_LIMIT)?
        .into_iter()
        .map(ActivityEntry::from)
        .collect();

    Ok(DashboardReport {
        overview: Overview {
            total_bookings,
            recent_bookings,
            completed_bookings,
            total_revenue,
            active_tours,
        },
        revenue_by_day: queries::revenue_by_day(conn, &cutoff)?,
        popular_tours: queries::tour_popularity(conn)?,
        status_breakdown: queries::status_breakdown(conn)?,
        recent_activity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::{BookingSource, Participant, PaymentMethod};
    use chrono::{Datelike, NaiveDateTime};
    use uuid::Uuid;

    fn seed_booking(
        conn: &Connection,
        number: &str,
        tour: &str,
        status: &str,
        amount: f64,
        created_at: NaiveDateTime,
    ) {
        let booking = Booking {
            id: Uuid::new_v4().to_string(),
            booking_number: number.to_string(),
            customer_name: "Test Customer".to_string(),
            email: "customer@example.com".to_string(),
            phone: "+251911000000".to_string(),
            nationality: "Ethiopian".to_string(),
            passport_number: None,
            tour_id: None,
            tour_name: tour.to_string(),
            tour_date: created_at,
            duration: None,
            group_size: 1,
            participants: vec![Participant {
                name: "Test Customer".to_string(),
                age: 18,
                gender: "male".to_string(),
                special_requirements: String::new(),
            }],
            total_amount: amount,
            currency: "USD".to_string(),
            deposit_paid: false,
            payment_method: PaymentMethod::CreditCard,
            status: status.to_string(),
            source: BookingSource::Website,
            created_at,
            updated_at: created_at,
        };
        queries::insert_booking(conn, &booking).unwrap();
    }

    fn days_ago(n: i64) -> NaiveDateTime {
        Utc::now().naive_utc() - Duration::days(n)
    }

    #[test]
    fn test_empty_collection_yields_zeroes() {
        let conn = db::init_db(":memory:").unwrap();
        let report = build_dashboard(&conn, DEFAULT_WINDOW_DAYS).unwrap();

        assert_eq!(report.overview.total_bookings, 0);
        assert_eq!(report.overview.recent_bookings, 0);
        assert_eq!(report.overview.completed_bookings, 0);
        assert_eq!(report.overview.total_revenue, 0.0);
        assert_eq!(report.overview.active_tours, 0);
        assert!(report.revenue_by_day.is_empty());
        assert!(report.popular_tours.is_empty());
        assert!(report.status_breakdown.is_empty());
        assert!(report.recent_activity.is_empty());
    }

    #[test]
    fn test_completed_revenue_grouped_by_day() {
        let conn = db::init_db(":memory:").unwrap();
        let day1 = days_ago(2);
        let day2 = days_ago(1);

        seed_booking(&conn, "ETH-2026-10001", "Simien Trek", "completed", 500.0, day1);
        seed_booking(&conn, "ETH-2026-10002", "Simien Trek", "completed", 300.0, day1);
        seed_booking(&conn, "ETH-2026-10003", "Omo Valley", "pending", 200.0, day2);

        let report = build_dashboard(&conn, DEFAULT_WINDOW_DAYS).unwrap();

        // only the completed bookings of day 1 form a bucket
        assert_eq!(report.revenue_by_day.len(), 1);
        let bucket = &report.revenue_by_day[0];
        assert_eq!(bucket.year, i64::from(day1.year()));
        assert_eq!(bucket.month, i64::from(day1.month()));
        assert_eq!(bucket.day, i64::from(day1.day()));
        assert_eq!(bucket.revenue, 800.0);
        assert_eq!(bucket.bookings, 2);

        assert_eq!(report.status_breakdown.get("completed"), Some(&2));
        assert_eq!(report.status_breakdown.get("pending"), Some(&1));

        assert_eq!(report.overview.total_bookings, 3);
        assert_eq!(report.overview.recent_bookings, 3);
        assert_eq!(report.overview.completed_bookings, 2);
        assert_eq!(report.overview.total_revenue, 800.0);
    }

    #[test]
    fn test_buckets_sorted_ascending_and_capped() {
        let conn = db::init_db(":memory:").unwrap();
        for i in 0..35 {
            seed_booking(
                &conn,
                &format!("ETH-2026-2{i:04}"),
                "Danakil Depression",
                "completed",
                100.0,
                days_ago(i + 1),
            );
        }

        let report = build_dashboard(&conn, 60).unwrap();
        assert_eq!(report.revenue_by_day.len(), 30);

        let keys: Vec<(i64, i64, i64)> = report
            .revenue_by_day
            .iter()
            .map(|b| (b.year, b.month, b.day))
            .collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn test_window_excludes_old_bookings_from_daily_revenue() {
        let conn = db::init_db(":memory:").unwrap();
        seed_booking(&conn, "ETH-2026-30001", "Lalibela", "completed", 900.0, days_ago(40));
        seed_booking(&conn, "ETH-2026-30002", "Lalibela", "completed", 100.0, days_ago(3));

        let report = build_dashboard(&conn, DEFAULT_WINDOW_DAYS).unwrap();

        assert_eq!(report.revenue_by_day.len(), 1);
        assert_eq!(report.revenue_by_day[0].revenue, 100.0);
        assert_eq!(report.overview.recent_bookings, 1);
        // completed totals are all-time
        assert_eq!(report.overview.completed_bookings, 2);
        assert_eq!(report.overview.total_revenue, 1000.0);
    }

    #[test]
    fn test_popularity_ranked_by_booking_count() {
        let conn = db::init_db(":memory:").unwrap();
        seed_booking(&conn, "ETH-2026-40001", "Simien Trek", "pending", 100.0, days_ago(1));
        seed_booking(&conn, "ETH-2026-40002", "Simien Trek", "confirmed", 200.0, days_ago(2));
        seed_booking(&conn, "ETH-2026-40003", "Simien Trek", "completed", 300.0, days_ago(3));
        seed_booking(&conn, "ETH-2026-40004", "Omo Valley", "completed", 5000.0, days_ago(1));

        let report = build_dashboard(&conn, DEFAULT_WINDOW_DAYS).unwrap();

        assert_eq!(report.popular_tours.len(), 2);
        assert_eq!(report.popular_tours[0].tour_name, "Simien Trek");
        assert_eq!(report.popular_tours[0].bookings, 3);
        assert_eq!(report.popular_tours[0].revenue, 600.0);
        assert_eq!(report.popular_tours[1].tour_name, "Omo Valley");
        assert_eq!(report.popular_tours[1].bookings, 1);
    }

    #[test]
    fn test_recent_activity_newest_first_capped_at_ten() {
        let conn = db::init_db(":memory:").unwrap();
        for i in 0..12 {
            seed_booking(
                &conn,
                &format!("ETH-2026-5{i:04}"),
                "Bale Mountains",
                "pending",
                50.0,
                days_ago(i + 1),
            );
        }

        let report = build_dashboard(&conn, DEFAULT_WINDOW_DAYS).unwrap();
        assert_eq!(report.recent_activity.len(), 10);
        // newest seed is the one created 1 day ago
        assert_eq!(report.recent_activity[0].booking_number, "ETH-2026-50000");
        assert_eq!(report.recent_activity[9].booking_number, "ETH-2026-50009");
    }
}
