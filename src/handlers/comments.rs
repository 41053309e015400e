use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use serde::Deserialize;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use super::check_auth;
use crate::db::queries;
use crate::errors::AppError;
use crate::models::BookingComment;
use crate::services::comments::record_comment;
use crate::state::AppState;

fn booking_exists(state: &Arc<AppState>, booking_id: &str) -> Result<(), AppError> {
    let found = {
        let db = state.db.lock().unwrap();
        queries::get_booking_by_id(&db, booking_id)?
    };
    if found.is_none() {
        return Err(AppError::NotFound("Bokningen kunde inte hittas.".to_string()));
    }
    Ok(())
}

// GET /api/bookings/:id/comments
#[derive(Deserialize)]
pub struct CommentsQuery {
    pub limit: Option<i64>,
}

pub async fn get_comments(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(query): Query<CommentsQuery>,
) -> Result<Json<Vec<BookingComment>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    booking_exists(&state, &id)?;

    let limit = query.limit.unwrap_or(200);
    let comments = {
        let db = state.db.lock().unwrap();
        queries::get_comments_for_booking(&db, &id, limit)?
    };

    Ok(Json(comments))
}

// POST /api/bookings/:id/comments
#[derive(Deserialize)]
pub struct CommentRequest {
    pub body: String,
    pub author: Option<String>,
}

pub async fn post_comment(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(request): Json<CommentRequest>,
) -> Result<Json<BookingComment>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;
    booking_exists(&state, &id)?;

    let body = request.body.trim();
    if body.is_empty() {
        return Err(AppError::Validation("Meddelandet får inte vara tomt.".to_string()));
    }

    let author = request.author.as_deref().unwrap_or("staff");
    let comment = record_comment(&state, &id, author, body)?;

    Ok(Json(comment))
}

// GET /api/comments/events (SSE stream)
#[derive(Deserialize)]
pub struct SseQuery {
    pub token: Option<String>,
    pub booking_id: Option<String>,
    pub last_id: Option<i64>,
}

pub async fn events_stream(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SseQuery>,
) -> Result<Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>>, AppError> {
    // Auth via query param (EventSource can't set headers)
    let token = query.token.as_deref().unwrap_or("");
    if token != state.config.admin_token {
        return Err(AppError::Unauthorized);
    }

    let last_id = query.last_id.unwrap_or(0);
    let booking_filter = query.booking_id;

    // Catch up on missed comments from the store
    let catchup = {
        let db = state.db.lock().unwrap();
        queries::get_comments_since(&db, last_id, booking_filter.as_deref()).unwrap_or_default()
    };

    let rx = state.comments_tx.subscribe();

    let catchup_stream = tokio_stream::iter(catchup.into_iter().map(|comment| {
        let data = serde_json::to_string(&comment).unwrap_or_default();
        Ok::<_, Infallible>(Event::default().data(data).event("booking_comment"))
    }));

    let live_stream = BroadcastStream::new(rx).filter_map(move |result| match result {
        Ok(comment) => {
            if let Some(ref wanted) = booking_filter {
                if comment.booking_id != *wanted {
                    return None;
                }
            }
            let data = serde_json::to_string(&comment).unwrap_or_default();
            Some(Ok(Event::default().data(data).event("booking_comment")))
        }
        Err(BroadcastStreamRecvError::Lagged(_)) => None,
    });

    Ok(Sse::new(catchup_stream.chain(live_stream)).keep_alive(KeepAlive::default()))
}
