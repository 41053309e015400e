use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub admin_token: String,
    pub auth_url: String,
    pub auth_service_key: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "eventhyra.db".to_string()),
            admin_token: env::var("ADMIN_TOKEN").unwrap_or_else(|_| "changeme".to_string()),
            auth_url: env::var("AUTH_URL")
                .unwrap_or_else(|_| "http://localhost:9999".to_string()),
            auth_service_key: env::var("AUTH_SERVICE_KEY").unwrap_or_default(),
        }
    }
}
