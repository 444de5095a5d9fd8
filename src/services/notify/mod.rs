pub mod email;

use async_trait::async_trait;

use crate::models::Booking;

/// Delivery outcome is recorded for observability only; a failed
/// confirmation must never fail the booking that triggered it.
#[async_trait]
pub trait BookingNotifier: Send + Sync {
    async fn send_confirmation(&self, booking: &Booking) -> anyhow::Result<()>;
}
