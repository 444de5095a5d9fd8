use anyhow::Context;
use async_trait::async_trait;

use super::BookingNotifier;
use crate::models::Booking;

pub struct EmailApiNotifier {
    api_url: String,
    api_key: String,
    from: String,
    client: reqwest::Client,
}

impl EmailApiNotifier {
    pub fn new(api_url: String, api_key: String, from: String) -> Self {
        Self {
            api_url,
            api_key,
            from,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl BookingNotifier for EmailApiNotifier {
    async fn send_confirmation(&self, booking: &Booking) -> anyhow::Result<()> {
        let subject = format!("Booking received: {}", booking.booking_number);
        let text = format!(
            "Dear {},\n\nWe have received your booking {} for {} on {}.\n\
             Total: {:.2} {}.\n\nOur team will be in touch shortly to confirm the details.",
            booking.customer_name,
            booking.booking_number,
            booking.tour_name,
            booking.tour_date.format("%Y-%m-%d"),
            booking.total_amount,
            booking.currency,
        );

        self.client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({
                "from": self.from,
                "to": [booking.email],
                "subject": subject,
                "text": text,
            }))
            .send()
            .await
            .context("failed to reach email API")?
            .error_for_status()
            .context("email API returned error")?;

        Ok(())
    }
}
