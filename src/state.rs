use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use tokio::sync::broadcast;

use crate::config::AppConfig;
use crate::models::BookingComment;
use crate::services::auth::AuthProvider;

pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub config: AppConfig,
    pub auth: Box<dyn AuthProvider>,
    pub comments_tx: broadcast::Sender<BookingComment>,
}
