use rusqlite::Connection;

use crate::db::queries;

/// Ensures the booking has exactly one confirmation-intent record with
/// `email_sent` cleared, so the external dispatcher (re-)sends the
/// confirmation email. Keyed on `booking_id` with a UNIQUE constraint, the
/// upsert is a single atomic statement.
pub fn ensure_confirmation(
    conn: &Connection,
    booking_id: &str,
    token: Option<&str>,
) -> anyhow::Result<()> {
    queries::upsert_confirmation(conn, booking_id, token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::{Booking, BookingStatus};
    use chrono::{NaiveDate, Utc};

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
            event_date: NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(),
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
    fn test_creates_record_when_missing() {
        let conn = setup_db();
        seed_booking(&conn, "b1");

        ensure_confirmation(&conn, "b1", Some("tok123")).unwrap();

        let record = queries::get_confirmation(&conn, "b1").unwrap().unwrap();
        assert!(!record.email_sent);
        assert_eq!(record.token.as_deref(), Some("tok123"));
        assert_eq!(record.status, "pending");
    }

    #[test]
    fn test_repeat_updates_instead_of_inserting() {
        let conn = setup_db();
        seed_booking(&conn, "b1");

        ensure_confirmation(&conn, "b1", Some("first")).unwrap();
        // Simulate the dispatcher having sent the email
        conn.execute(
            "UPDATE booking_confirmations SET email_sent = 1 WHERE booking_id = 'b1'",
            [],
        )
        .unwrap();

        ensure_confirmation(&conn, "b1", Some("second")).unwrap();

        assert_eq!(
            queries::count_confirmations_for_booking(&conn, "b1").unwrap(),
            1
        );
        let record = queries::get_confirmation(&conn, "b1").unwrap().unwrap();
        assert!(!record.email_sent, "re-confirmation must reset email_sent");
        assert_eq!(record.token.as_deref(), Some("second"));
    }

    #[test]
    fn test_records_are_per_booking() {
        let conn = setup_db();
        seed_booking(&conn, "b1");
        seed_booking(&conn, "b2");

        ensure_confirmation(&conn, "b1", None).unwrap();
        ensure_confirmation(&conn, "b2", None).unwrap();

        assert_eq!(
            queries::count_confirmations_for_booking(&conn, "b1").unwrap(),
            1
        );
        assert_eq!(
            queries::count_confirmations_for_booking(&conn, "b2").unwrap(),
            1
        );
    }
}
