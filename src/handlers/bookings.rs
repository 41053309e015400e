use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::check_auth;
use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Booking, BookingStatus, RequestedProduct};
use crate::services::lifecycle::{self, LifecycleError};
use crate::state::AppState;

#[derive(Serialize)]
pub struct BookingResponse {
    id: String,
    booking_number: String,
    customer_id: Option<String>,
    status: String,
    status_label: &'static str,
    status_color: &'static str,
    event_date: String,
    event_end_date: Option<String>,
    delivery_date: Option<String>,
    location: Option<String>,
    products: Vec<RequestedProduct>,
    total_amount: f64,
    tax_amount: f64,
    created_at: String,
    updated_at: String,
}

fn booking_response(b: Booking) -> BookingResponse {
    let display = b.status.display();
    BookingResponse {
        id: b.id,
        booking_number: b.booking_number,
        customer_id: b.customer_id,
        status: b.status.as_str().to_string(),
        status_label: display.label,
        status_color: display.color_class,
        event_date: b.event_date.format("%Y-%m-%d").to_string(),
        event_end_date: b.event_end_date.map(|d| d.format("%Y-%m-%d").to_string()),
        delivery_date: b.delivery_date.map(|d| d.format("%Y-%m-%d").to_string()),
        location: b.location,
        products: b.products,
        total_amount: b.total_amount,
        tax_amount: b.tax_amount,
        created_at: b.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        updated_at: b.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
    }
}

// GET /api/bookings
#[derive(Deserialize)]
pub struct BookingsQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
}

pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<BookingsQuery>,
) -> Result<Json<Vec<BookingResponse>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let status_filter = match query.status.as_deref() {
        Some(s) => Some(
            BookingStatus::parse(s)
                .ok_or_else(|| AppError::Validation(format!("Ogiltig status: {s}")))?,
        ),
        None => None,
    };
    let limit = query.limit.unwrap_or(50);

    let bookings = {
        let db = state.db.lock().unwrap();
        queries::get_all_bookings(&db, status_filter.map(|s| s.as_str()), limit)?
    };

    Ok(Json(bookings.into_iter().map(booking_response).collect()))
}

// GET /api/bookings/range
#[derive(Deserialize)]
pub struct RangeQuery {
    pub start: String,
    pub end: String,
}

pub async fn booking_range(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<RangeQuery>,
) -> Result<Json<Vec<BookingResponse>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let start = NaiveDate::parse_from_str(&query.start, "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("Ogiltigt startdatum: {}", query.start)))?;
    let end = NaiveDate::parse_from_str(&query.end, "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("Ogiltigt slutdatum: {}", query.end)))?;

    let bookings = {
        let db = state.db.lock().unwrap();
        queries::get_bookings_in_range(&db, &start, &end)?
    };

    Ok(Json(bookings.into_iter().map(booking_response).collect()))
}

// GET /api/bookings/:id
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<BookingResponse>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let booking = {
        let db = state.db.lock().unwrap();
        queries::get_booking_by_id(&db, &id)?
    };

    match booking {
        Some(b) => Ok(Json(booking_response(b))),
        None => Err(AppError::NotFound("Bokningen kunde inte hittas.".to_string())),
    }
}

// POST /api/bookings/:id/status
#[derive(Deserialize)]
pub struct TransitionRequest {
    pub status: String,
}

#[derive(Serialize)]
pub struct TransitionResponse {
    ok: bool,
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    access_token: Option<String>,
}

pub async fn update_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<TransitionRequest>,
) -> Result<Json<TransitionResponse>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let target = BookingStatus::parse(&body.status)
        .ok_or_else(|| AppError::Validation(format!("Ogiltig status: {}", body.status)))?;

    let outcome = {
        let mut db = state.db.lock().unwrap();
        lifecycle::transition(&mut db, &id, target)
    };

    match outcome {
        Ok(outcome) => Ok(Json(TransitionResponse {
            ok: true,
            status: outcome.status.as_str().to_string(),
            access_token: outcome.access_token,
        })),
        Err(e @ LifecycleError::NotFound) => Err(AppError::NotFound(e.to_string())),
        Err(e @ LifecycleError::InvalidTransition { .. }) => Err(AppError::Conflict(e.to_string())),
        Err(e @ LifecycleError::Store(_)) => {
            tracing::error!(booking_id = %id, error = ?e, "status transition failed");
            Err(AppError::Upstream(e.to_string()))
        }
    }
}
