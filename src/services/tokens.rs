use chrono::{Duration, Utc};
use rand::{distributions::Alphanumeric, Rng};
use rusqlite::Connection;

use crate::db::queries;

/// Every issued token expires; 7 days matches the confirmation email's
/// "review your booking" window.
pub const TOKEN_TTL_DAYS: i64 = 7;

const TOKEN_LEN: usize = 32;

/// Issues a customer access token for a booking and persists it. The
/// `booking_tokens.token` column is UNIQUE, so a collision surfaces as an
/// insert error and propagates to the caller.
pub fn issue_token(conn: &Connection, booking_id: &str) -> anyhow::Result<String> {
    let token: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect();

    let expires_at = Utc::now().naive_utc() + Duration::days(TOKEN_TTL_DAYS);
    queries::insert_booking_token(conn, booking_id, &token, &expires_at)?;

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::{Booking, BookingStatus};
    use chrono::NaiveDate;

    fn setup_db() -> Connection {
        db::init_db(":memory:").unwrap()
    }

    fn seed_booking(conn: &Connection, id: &str) {
        let now = Utc::now().naive_utc();
        let booking = Booking {
            id: id.to_string(),
            booking_number: format!("BK-{id}"),
            customer_id: None,
            status: BookingStatus::Pending,
            event_date: NaiveDate::from_ymd_opt(2025, 8, 16).unwrap(),
            event_end_date: None,
            delivery_date: None,
            location: None,
            products: vec![],
            total_amount: 0.0,
            tax_amount: 0.0,
            created_at: now,
            updated_at: now,
        };
        queries::create_booking(conn, &booking).unwrap();
    }

    #[test]
    fn test_token_shape() {
        let conn = setup_db();
        seed_booking(&conn, "b1");

        let token = issue_token(&conn, "b1").unwrap();
        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_tokens_are_distinct() {
        let conn = setup_db();
        seed_booking(&conn, "b1");

        let a = issue_token(&conn, "b1").unwrap();
        let b = issue_token(&conn, "b1").unwrap();
        assert_ne!(a, b);
        assert_eq!(queries::count_tokens_for_booking(&conn, "b1").unwrap(), 2);
    }

    #[test]
    fn test_expiry_is_seven_days_out() {
        let conn = setup_db();
        seed_booking(&conn, "b1");
        issue_token(&conn, "b1").unwrap();

        let expires_at: String = conn
            .query_row(
                "SELECT expires_at FROM booking_tokens WHERE booking_id = 'b1'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        let expires =
            chrono::NaiveDateTime::parse_from_str(&expires_at, "%Y-%m-%d %H:%M:%S").unwrap();
        let now = Utc::now().naive_utc();
        assert!(expires > now + Duration::days(6));
        assert!(expires < now + Duration::days(8));
    }

    #[test]
    fn test_duplicate_token_rejected_by_store() {
        let conn = setup_db();
        seed_booking(&conn, "b1");
        seed_booking(&conn, "b2");

        let expires = Utc::now().naive_utc() + Duration::days(TOKEN_TTL_DAYS);
        queries::insert_booking_token(&conn, "b1", "fixedtoken", &expires).unwrap();
        let dup = queries::insert_booking_token(&conn, "b2", "fixedtoken", &expires);
        assert!(dup.is_err());
    }
}
