use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Booking, RequestedProduct};
use crate::services::comments::record_comment;
use crate::state::AppState;

/// Valid and expired tokens 404 the same way; the portal never reveals
/// whether a booking exists behind a bad link.
fn load_booking_for_token(state: &Arc<AppState>, token: &str) -> Result<Booking, AppError> {
    let booking = {
        let db = state.db.lock().unwrap();
        queries::get_booking_by_token(&db, token)?
    };
    booking.ok_or_else(|| AppError::NotFound("Bokningen kunde inte hittas.".to_string()))
}

// GET /portal/:token
#[derive(Serialize)]
pub struct PortalBookingResponse {
    booking_number: String,
    status: String,
    status_label: &'static str,
    status_color: &'static str,
    customer_name: Option<String>,
    event_date: String,
    event_end_date: Option<String>,
    delivery_date: Option<String>,
    location: Option<String>,
    products: Vec<RequestedProduct>,
    total_amount: f64,
    tax_amount: f64,
}

pub async fn portal_booking(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<Json<PortalBookingResponse>, AppError> {
    let booking = load_booking_for_token(&state, &token)?;

    let customer_name = booking.customer_id.as_deref().and_then(|id| {
        let db = state.db.lock().unwrap();
        queries::get_customer(&db, id).ok().flatten().map(|c| c.name)
    });

    let display = booking.status.display();
    Ok(Json(PortalBookingResponse {
        booking_number: booking.booking_number,
        status: booking.status.as_str().to_string(),
        status_label: display.label,
        status_color: display.color_class,
        customer_name,
        event_date: booking.event_date.format("%Y-%m-%d").to_string(),
        event_end_date: booking
            .event_end_date
            .map(|d| d.format("%Y-%m-%d").to_string()),
        delivery_date: booking
            .delivery_date
            .map(|d| d.format("%Y-%m-%d").to_string()),
        location: booking.location,
        products: booking.products,
        total_amount: booking.total_amount,
        tax_amount: booking.tax_amount,
    }))
}

// POST /portal/:token/comments
#[derive(Deserialize)]
pub struct PortalCommentRequest {
    pub body: String,
}

pub async fn portal_post_comment(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
    Json(request): Json<PortalCommentRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let booking = load_booking_for_token(&state, &token)?;

    let body = request.body.trim();
    if body.is_empty() {
        return Err(AppError::Validation("Meddelandet får inte vara tomt.".to_string()));
    }

    let comment = record_comment(&state, &booking.id, "customer", body)?;

    Ok(Json(serde_json::json!({"ok": true, "id": comment.id})))
}
