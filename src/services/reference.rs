use chrono::{Datelike, Utc};
use rand::Rng;

/// Booking numbers look like `ETH-2026-48213`: stable prefix, current year,
/// five random digits. Uniqueness is only probabilistic here; the store
/// enforces it and the creation path regenerates on collision.
pub fn new_booking_number() -> String {
    let year = Utc::now().year();
    let suffix: u32 = rand::thread_rng().gen_range(10_000..=99_999);
    format!("ETH-{year}-{suffix}")
}
