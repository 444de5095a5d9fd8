use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub admin_token: String,
    pub email_api_url: String,
    pub email_api_key: String,
    pub email_from: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "tourdesk.db".to_string()),
            admin_token: env::var("ADMIN_TOKEN").unwrap_or_else(|_| "changeme".to_string()),
            email_api_url: env::var("EMAIL_API_URL")
                .unwrap_or_else(|_| "https://api.resend.com/emails".to_string()),
            email_api_key: env::var("EMAIL_API_KEY").unwrap_or_default(),
            email_from: env::var("EMAIL_FROM")
                .unwrap_or_else(|_| "bookings@ethiopiantours.example".to_string()),
        }
    }
}
