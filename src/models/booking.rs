use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// Well-known status values. The column itself is free text.
pub const STATUS_PENDING: &str = "pending";
pub const STATUS_CONFIRMED: &str = "confirmed";
pub const STATUS_CANCELLED: &str = "cancelled";
pub const STATUS_COMPLETED: &str = "completed";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub booking_number: String,
    pub customer_name: String,
    pub email: String,
    pub phone: String,
    pub nationality: String,
    pub passport_number: Option<String>,
    pub tour_id: Option<String>,
    pub tour_name: String,
    pub tour_date: NaiveDateTime,
    pub duration: Option<String>,
    pub group_size: i64,
    pub participants: Vec<Participant>,
    pub total_amount: f64,
    pub currency: String,
    pub deposit_paid: bool,
    pub payment_method: PaymentMethod,
    // Free-form on purpose: the admin UI edits this without a transition
    // graph, so the store accepts any replacement value.
    pub status: String,
    pub source: BookingSource,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Fully normalized creation payload, produced by the validator before any
/// persistence attempt.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub customer_name: String,
    pub email: String,
    pub phone: String,
    pub nationality: String,
    pub passport_number: Option<String>,
    pub tour_id: Option<String>,
    pub tour_name: String,
    pub tour_date: NaiveDateTime,
    pub duration: Option<String>,
    pub group_size: i64,
    pub participants: Vec<Participant>,
    pub total_amount: f64,
    pub currency: String,
    pub deposit_paid: bool,
    pub payment_method: PaymentMethod,
    pub source: BookingSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub name: String,
    #[serde(default = "default_age")]
    pub age: i64,
    #[serde(default = "default_gender")]
    pub gender: String,
    #[serde(default)]
    pub special_requirements: String,
}

fn default_age() -> i64 {
    18
}

fn default_gender() -> String {
    "male".to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CreditCard,
    BankTransfer,
    Paypal,
    OnArrival,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::CreditCard => "credit_card",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::Paypal => "paypal",
            PaymentMethod::OnArrival => "on_arrival",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "credit_card" => Some(PaymentMethod::CreditCard),
            "bank_transfer" => Some(PaymentMethod::BankTransfer),
            "paypal" => Some(PaymentMethod::Paypal),
            "on_arrival" => Some(PaymentMethod::OnArrival),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingSource {
    Website,
    Whatsapp,
    Email,
    Phone,
    Agent,
}

impl BookingSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingSource::Website => "website",
            BookingSource::Whatsapp => "whatsapp",
            BookingSource::Email => "email",
            BookingSource::Phone => "phone",
            BookingSource::Agent => "agent",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "website" => Some(BookingSource::Website),
            "whatsapp" => Some(BookingSource::Whatsapp),
            "email" => Some(BookingSource::Email),
            "phone" => Some(BookingSource::Phone),
            "agent" => Some(BookingSource::Agent),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_method_roundtrip() {
        for method in [
            PaymentMethod::CreditCard,
            PaymentMethod::BankTransfer,
            PaymentMethod::Paypal,
            PaymentMethod::OnArrival,
        ] {
            assert_eq!(PaymentMethod::parse(method.as_str()), Some(method));
        }
        assert_eq!(PaymentMethod::parse("cash"), None);
    }

    #[test]
    fn test_source_roundtrip() {
        for source in [
            BookingSource::Website,
            BookingSource::Whatsapp,
            BookingSource::Email,
            BookingSource::Phone,
            BookingSource::Agent,
        ] {
            assert_eq!(BookingSource::parse(source.as_str()), Some(source));
        }
        assert_eq!(BookingSource::parse("fax"), None);
    }

    #[test]
    fn test_participant_defaults_on_deserialize() {
        let p: Participant = serde_json::from_str(r#"{"name":"Alem"}"#).unwrap();
        assert_eq!(p.age, 18);
        assert_eq!(p.gender, "male");
        assert_eq!(p.special_requirements, "");
    }
}
