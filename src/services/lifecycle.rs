use rusqlite::Connection;

use crate::db::queries;
use crate::models::BookingStatus;
use crate::services::{confirmations, tokens};

#[derive(Debug)]
pub enum LifecycleError {
    NotFound,
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },
    Store(anyhow::Error),
}

impl std::fmt::Display for LifecycleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LifecycleError::NotFound => {
                write!(f, "Bokningen kunde inte hittas.")
            }
            LifecycleError::InvalidTransition { from, to } => {
                write!(
                    f,
                    "Bokningen kan inte ändras från {} till {}.",
                    from.display().label,
                    to.display().label
                )
            }
            LifecycleError::Store(_) => {
                write!(f, "Ett fel uppstod när bokningen skulle uppdateras. Försök igen.")
            }
        }
    }
}

#[derive(Debug)]
pub struct TransitionOutcome {
    pub status: BookingStatus,
    /// Present only when the transition issued a customer access token,
    /// i.e. on confirmation.
    pub access_token: Option<String>,
}

/// Validates and executes a status change. The transition table is checked
/// before any write; confirming a pending booking additionally issues an
/// access token and refreshes the confirmation-intent record.
pub fn transition(
    conn: &mut Connection,
    booking_id: &str,
    target: BookingStatus,
) -> Result<TransitionOutcome, LifecycleError> {
    let booking = queries::get_booking_by_id(conn, booking_id)
        .map_err(LifecycleError::Store)?
        .ok_or(LifecycleError::NotFound)?;

    if !booking.status.can_transition_to(target) {
        return Err(LifecycleError::InvalidTransition {
            from: booking.status,
            to: target,
        });
    }

    if target == BookingStatus::Confirmed {
        return confirm(conn, booking_id);
    }

    queries::update_booking_status(conn, booking_id, &target).map_err(LifecycleError::Store)?;

    Ok(TransitionOutcome {
        status: target,
        access_token: None,
    })
}

/// The confirm side-effect sequence. Token insert and status flip share one
/// transaction, so a failed flip cannot orphan a token. The confirmation
/// upsert runs after commit and is non-fatal: once the booking is
/// confirmed, a missing dispatch record must not undo that.
fn confirm(conn: &mut Connection, booking_id: &str) -> Result<TransitionOutcome, LifecycleError> {
    let tx = conn
        .transaction()
        .map_err(|e| LifecycleError::Store(e.into()))?;

    let token = tokens::issue_token(&tx, booking_id).map_err(LifecycleError::Store)?;
    queries::update_booking_status(&tx, booking_id, &BookingStatus::Confirmed)
        .map_err(LifecycleError::Store)?;

    tx.commit().map_err(|e| LifecycleError::Store(e.into()))?;

    if let Err(e) = confirmations::ensure_confirmation(conn, booking_id, Some(&token)) {
        tracing::error!(error = %e, booking_id = %booking_id, "failed to upsert booking confirmation");
    }

    Ok(TransitionOutcome {
        status: BookingStatus::Confirmed,
        access_token: Some(token),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::{Booking, RequestedProduct};
    use chrono::{NaiveDate, Utc};

    fn setup_db() -> Connection {
        db::init_db(":memory:").unwrap()
    }

    fn seed_booking(conn: &Connection, id: &str, status: BookingStatus) {
        let now = Utc::now().naive_utc();
        let booking = Booking {
            id: id.to_string(),
            booking_number: format!("BK-2025-{id}"),
            customer_id: None,
            status,
            event_date: NaiveDate::from_ymd_opt(2025, 8, 23).unwrap(),
            event_end_date: None,
            delivery_date: Some(NaiveDate::from_ymd_opt(2025, 8, 22).unwrap()),
            location: Some("Slagthuset, Malmö".to_string()),
            products: vec![RequestedProduct {
                name: "Partytält 6x12".to_string(),
                quantity: 1,
                wrapping_requested: false,
            }],
            total_amount: 12500.0,
            tax_amount: 2500.0,
            created_at: now,
            updated_at: now,
        };
        queries::create_booking(conn, &booking).unwrap();
    }

    #[test]
    fn test_confirm_from_pending() {
        let mut conn = setup_db();
        seed_booking(&conn, "b1", BookingStatus::Pending);

        let outcome = transition(&mut conn, "b1", BookingStatus::Confirmed).unwrap();
        assert_eq!(outcome.status, BookingStatus::Confirmed);
        let token = outcome.access_token.expect("confirmation issues a token");

        let booking = queries::get_booking_by_id(&conn, "b1").unwrap().unwrap();
        assert_eq!(booking.status, BookingStatus::Confirmed);

        assert_eq!(queries::count_tokens_for_booking(&conn, "b1").unwrap(), 1);
        let via_token = queries::get_booking_by_token(&conn, &token).unwrap();
        assert_eq!(via_token.unwrap().id, "b1");

        let confirmation = queries::get_confirmation(&conn, "b1").unwrap().unwrap();
        assert!(!confirmation.email_sent);
        assert_eq!(confirmation.token.as_deref(), Some(token.as_str()));
    }

    #[test]
    fn test_second_confirm_is_rejected() {
        let mut conn = setup_db();
        seed_booking(&conn, "b1", BookingStatus::Pending);

        transition(&mut conn, "b1", BookingStatus::Confirmed).unwrap();
        let second = transition(&mut conn, "b1", BookingStatus::Confirmed);

        assert!(matches!(
            second,
            Err(LifecycleError::InvalidTransition {
                from: BookingStatus::Confirmed,
                to: BookingStatus::Confirmed,
            })
        ));

        // The double-click leaves no extra rows behind
        assert_eq!(queries::count_tokens_for_booking(&conn, "b1").unwrap(), 1);
        assert_eq!(
            queries::count_confirmations_for_booking(&conn, "b1").unwrap(),
            1
        );
    }

    #[test]
    fn test_plain_transition_has_no_side_effects() {
        let mut conn = setup_db();
        seed_booking(&conn, "b1", BookingStatus::Draft);

        let outcome = transition(&mut conn, "b1", BookingStatus::Pending).unwrap();
        assert_eq!(outcome.status, BookingStatus::Pending);
        assert!(outcome.access_token.is_none());

        assert_eq!(queries::count_tokens_for_booking(&conn, "b1").unwrap(), 0);
        assert_eq!(
            queries::count_confirmations_for_booking(&conn, "b1").unwrap(),
            0
        );
    }

    #[test]
    fn test_cancellation_branches() {
        let mut conn = setup_db();
        seed_booking(&conn, "d", BookingStatus::Draft);
        seed_booking(&conn, "p", BookingStatus::Pending);
        seed_booking(&conn, "c", BookingStatus::Confirmed);

        for id in ["d", "p", "c"] {
            let outcome = transition(&mut conn, id, BookingStatus::Cancelled).unwrap();
            assert_eq!(outcome.status, BookingStatus::Cancelled);
        }
    }

    #[test]
    fn test_illegal_transitions_rejected_before_write() {
        let mut conn = setup_db();
        seed_booking(&conn, "b1", BookingStatus::Draft);

        let result = transition(&mut conn, "b1", BookingStatus::Confirmed);
        assert!(matches!(
            result,
            Err(LifecycleError::InvalidTransition { .. })
        ));

        // Nothing was written
        let booking = queries::get_booking_by_id(&conn, "b1").unwrap().unwrap();
        assert_eq!(booking.status, BookingStatus::Draft);
        assert_eq!(queries::count_tokens_for_booking(&conn, "b1").unwrap(), 0);
    }

    #[test]
    fn test_terminal_states_frozen() {
        let mut conn = setup_db();
        seed_booking(&conn, "done", BookingStatus::Completed);
        seed_booking(&conn, "gone", BookingStatus::Cancelled);

        assert!(matches!(
            transition(&mut conn, "done", BookingStatus::Cancelled),
            Err(LifecycleError::InvalidTransition { .. })
        ));
        assert!(matches!(
            transition(&mut conn, "gone", BookingStatus::Pending),
            Err(LifecycleError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_unknown_booking() {
        let mut conn = setup_db();

        let result = transition(&mut conn, "missing", BookingStatus::Confirmed);
        assert!(matches!(result, Err(LifecycleError::NotFound)));
    }

    #[test]
    fn test_confirmation_write_failure_is_non_fatal() {
        let mut conn = setup_db();
        seed_booking(&conn, "b1", BookingStatus::Pending);

        // Make the confirmation upsert fail while everything else works
        conn.execute_batch("DROP TABLE booking_confirmations;").unwrap();

        let outcome = transition(&mut conn, "b1", BookingStatus::Confirmed).unwrap();
        assert_eq!(outcome.status, BookingStatus::Confirmed);
        assert!(outcome.access_token.is_some());

        let booking = queries::get_booking_by_id(&conn, "b1").unwrap().unwrap();
        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert_eq!(queries::count_tokens_for_booking(&conn, "b1").unwrap(), 1);
    }

    #[test]
    fn test_error_messages_are_user_facing() {
        let err = LifecycleError::InvalidTransition {
            from: BookingStatus::Pending,
            to: BookingStatus::Completed,
        };
        assert_eq!(
            err.to_string(),
            "Bokningen kan inte ändras från Väntande till Avslutad."
        );
        assert_eq!(
            LifecycleError::NotFound.to_string(),
            "Bokningen kunde inte hittas."
        );
    }
}
