use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Read-only lookup data. Bookings carry a denormalized copy of the tour
/// name, so a tour can be edited or removed without breaking past bookings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tour {
    pub id: String,
    pub name: String,
    pub category: Option<String>,
    pub price: f64,
    pub capacity: Option<i64>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}
