use std::sync::Arc;

use crate::db::queries;
use crate::models::BookingComment;
use crate::state::AppState;

/// Persists a chat message and pushes it to live subscribers.
pub fn record_comment(
    state: &Arc<AppState>,
    booking_id: &str,
    author: &str,
    body: &str,
) -> anyhow::Result<BookingComment> {
    let comment_id = {
        let db = state.db.lock().unwrap();
        queries::insert_comment(&db, booking_id, author, body)?
    };

    let comment = BookingComment {
        id: comment_id,
        booking_id: booking_id.to_string(),
        author: author.to_string(),
        body: body.to_string(),
        created_at: chrono::Utc::now()
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
    };

    // Broadcast to SSE subscribers; ignore if no receivers
    let _ = state.comments_tx.send(comment.clone());

    Ok(comment)
}
