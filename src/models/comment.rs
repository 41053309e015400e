use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BookingComment {
    pub id: i64,
    pub booking_id: String,
    pub author: String,
    pub body: String,
    pub created_at: String,
}
