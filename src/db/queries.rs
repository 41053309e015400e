use chrono::{NaiveDate, NaiveDateTime, Utc};
use rusqlite::{params, Connection};

use crate::models::{
    parse_products, Booking, BookingComment, BookingStatus, Customer, StaffRole, UserProfile,
};

// ── Bookings ──

pub fn create_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<()> {
    // Write boundary: products are always stored as the canonical JSON array
    let products_json = serde_json::to_string(&booking.products)?;
    let event_date = booking.event_date.format("%Y-%m-%d").to_string();
    let event_end_date = booking.event_end_date.map(|d| d.format("%Y-%m-%d").to_string());
    let delivery_date = booking.delivery_date.map(|d| d.format("%Y-%m-%d").to_string());
    let created_at = booking.created_at.format("%Y-%m-%d %H:%M:%S").to_string();
    let updated_at = booking.updated_at.format("%Y-%m-%d %H:%M:%S").to_string();

    conn.execute(
        "INSERT INTO bookings (id, booking_number, customer_id, status, event_date, event_end_date, delivery_date, location, products_requested, total_amount, tax_amount, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            booking.id,
            booking.booking_number,
            booking.customer_id,
            booking.status.as_str(),
            event_date,
            event_end_date,
            delivery_date,
            booking.location,
            products_json,
            booking.total_amount,
            booking.tax_amount,
            created_at,
            updated_at,
        ],
    )?;
    Ok(())
}

const BOOKING_COLUMNS: &str = "id, booking_number, customer_id, status, event_date, event_end_date, delivery_date, location, products_requested, total_amount, tax_amount, created_at, updated_at";

pub fn get_booking_by_id(conn: &Connection, id: &str) -> anyhow::Result<Option<Booking>> {
    let result = conn.query_row(
        &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1"),
        params![id],
        |row| Ok(parse_booking_row(row)),
    );

    match result {
        Ok(booking) => Ok(Some(booking?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn get_all_bookings(
    conn: &Connection,
    status_filter: Option<&str>,
    limit: i64,
) -> anyhow::Result<Vec<Booking>> {
    let (sql, params_vec): (String, Vec<Box<dyn rusqlite::types::ToSql>>) = match status_filter {
        Some(status) => (
            format!(
                "SELECT {BOOKING_COLUMNS} FROM bookings WHERE status = ?1 ORDER BY event_date DESC LIMIT ?2"
            ),
            vec![
                Box::new(status.to_string()) as Box<dyn rusqlite::types::ToSql>,
                Box::new(limit),
            ],
        ),
        None => (
            format!("SELECT {BOOKING_COLUMNS} FROM bookings ORDER BY event_date DESC LIMIT ?1"),
            vec![Box::new(limit) as Box<dyn rusqlite::types::ToSql>],
        ),
    };

    let mut stmt = conn.prepare(&sql)?;
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(params_refs.as_slice(), |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

pub fn get_bookings_in_range(
    conn: &Connection,
    start: &NaiveDate,
    end: &NaiveDate,
) -> anyhow::Result<Vec<Booking>> {
    let start_str = start.format("%Y-%m-%d").to_string();
    let end_str = end.format("%Y-%m-%d").to_string();

    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings
         WHERE event_date >= ?1 AND event_date <= ?2 AND status != 'cancelled'
         ORDER BY event_date ASC"
    ))?;

    let rows = stmt.query_map(params![start_str, end_str], |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

pub fn update_booking_status(
    conn: &Connection,
    id: &str,
    status: &BookingStatus,
) -> anyhow::Result<bool> {
    let now = Utc::now()
        .naive_utc()
        .format("%Y-%m-%d %H:%M:%S")
        .to_string();
    let count = conn.execute(
        "UPDATE bookings SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![status.as_str(), now, id],
    )?;
    Ok(count > 0)
}

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<Booking> {
    let id: String = row.get(0)?;
    let booking_number: String = row.get(1)?;
    let customer_id: Option<String> = row.get(2)?;
    let status_str: String = row.get(3)?;
    let event_date_str: String = row.get(4)?;
    let event_end_date_str: Option<String> = row.get(5)?;
    let delivery_date_str: Option<String> = row.get(6)?;
    let location: Option<String> = row.get(7)?;
    let products_raw: String = row.get(8)?;
    let total_amount: f64 = row.get(9)?;
    let tax_amount: f64 = row.get(10)?;
    let created_at_str: String = row.get(11)?;
    let updated_at_str: String = row.get(12)?;

    let event_date = NaiveDate::parse_from_str(&event_date_str, "%Y-%m-%d")
        .unwrap_or_else(|_| Utc::now().date_naive());
    let event_end_date = event_end_date_str
        .as_deref()
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok());
    let delivery_date = delivery_date_str
        .as_deref()
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok());
    let created_at = NaiveDateTime::parse_from_str(&created_at_str, "%Y-%m-%d %H:%M:%S")
        .unwrap_or_else(|_| Utc::now().naive_utc());
    let updated_at = NaiveDateTime::parse_from_str(&updated_at_str, "%Y-%m-%d %H:%M:%S")
        .unwrap_or_else(|_| Utc::now().naive_utc());

    Ok(Booking {
        id,
        booking_number,
        customer_id,
        status: BookingStatus::parse(&status_str).unwrap_or(BookingStatus::Draft),
        event_date,
        event_end_date,
        delivery_date,
        location,
        products: parse_products(&products_raw),
        total_amount,
        tax_amount,
        created_at,
        updated_at,
    })
}

// ── Booking Tokens ──

pub fn insert_booking_token(
    conn: &Connection,
    booking_id: &str,
    token: &str,
    expires_at: &NaiveDateTime,
) -> anyhow::Result<()> {
    let expires_str = expires_at.format("%Y-%m-%d %H:%M:%S").to_string();
    conn.execute(
        "INSERT INTO booking_tokens (booking_id, token, expires_at) VALUES (?1, ?2, ?3)",
        params![booking_id, token, expires_str],
    )?;
    Ok(())
}

pub fn get_booking_by_token(conn: &Connection, token: &str) -> anyhow::Result<Option<Booking>> {
    let now = Utc::now()
        .naive_utc()
        .format("%Y-%m-%d %H:%M:%S")
        .to_string();
    let result = conn.query_row(
        "SELECT b.id, b.booking_number, b.customer_id, b.status, b.event_date, b.event_end_date, b.delivery_date, b.location, b.products_requested, b.total_amount, b.tax_amount, b.created_at, b.updated_at
         FROM bookings b
         INNER JOIN booking_tokens t ON t.booking_id = b.id
         WHERE t.token = ?1 AND t.expires_at > ?2",
        params![token, now],
        |row| Ok(parse_booking_row(row)),
    );

    match result {
        Ok(booking) => Ok(Some(booking?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn count_tokens_for_booking(conn: &Connection, booking_id: &str) -> anyhow::Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM booking_tokens WHERE booking_id = ?1",
        params![booking_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

// ── Booking Confirmations ──

pub struct BookingConfirmation {
    pub booking_id: String,
    pub token: Option<String>,
    pub email_sent: bool,
    pub status: String,
}

pub fn upsert_confirmation(
    conn: &Connection,
    booking_id: &str,
    token: Option<&str>,
) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO booking_confirmations (booking_id, token, email_sent, status)
         VALUES (?1, ?2, 0, 'pending')
         ON CONFLICT(booking_id) DO UPDATE SET
           token = excluded.token,
           email_sent = 0,
           status = 'pending',
           updated_at = datetime('now')",
        params![booking_id, token],
    )?;
    Ok(())
}

pub fn get_confirmation(
    conn: &Connection,
    booking_id: &str,
) -> anyhow::Result<Option<BookingConfirmation>> {
    let result = conn.query_row(
        "SELECT booking_id, token, email_sent, status FROM booking_confirmations WHERE booking_id = ?1",
        params![booking_id],
        |row| {
            Ok(BookingConfirmation {
                booking_id: row.get(0)?,
                token: row.get(1)?,
                email_sent: row.get::<_, i32>(2)? != 0,
                status: row.get(3)?,
            })
        },
    );

    match result {
        Ok(confirmation) => Ok(Some(confirmation)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn count_confirmations_for_booking(conn: &Connection, booking_id: &str) -> anyhow::Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM booking_confirmations WHERE booking_id = ?1",
        params![booking_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

// ── Customers ──

pub fn create_customer(conn: &Connection, customer: &Customer) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO customers (id, name, email, phone, company, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            customer.id,
            customer.name,
            customer.email,
            customer.phone,
            customer.company,
            customer.created_at,
        ],
    )?;
    Ok(())
}

pub fn get_customer(conn: &Connection, id: &str) -> anyhow::Result<Option<Customer>> {
    let result = conn.query_row(
        "SELECT id, name, email, phone, company, created_at FROM customers WHERE id = ?1",
        params![id],
        |row| {
            Ok(Customer {
                id: row.get(0)?,
                name: row.get(1)?,
                email: row.get(2)?,
                phone: row.get(3)?,
                company: row.get(4)?,
                created_at: row.get(5)?,
            })
        },
    );

    match result {
        Ok(customer) => Ok(Some(customer)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_customers(conn: &Connection, limit: i64) -> anyhow::Result<Vec<Customer>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, email, phone, company, created_at FROM customers ORDER BY created_at DESC LIMIT ?1",
    )?;

    let rows = stmt.query_map(params![limit], |row| {
        Ok(Customer {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            phone: row.get(3)?,
            company: row.get(4)?,
            created_at: row.get(5)?,
        })
    })?;

    let mut customers = vec![];
    for row in rows {
        customers.push(row?);
    }
    Ok(customers)
}

// ── User Profiles ──

pub fn insert_profile(
    conn: &Connection,
    id: &str,
    email: &str,
    full_name: &str,
    role: StaffRole,
) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO user_profiles (id, email, full_name, role) VALUES (?1, ?2, ?3, ?4)",
        params![id, email, full_name, role.as_str()],
    )?;
    Ok(())
}

pub fn list_profiles(conn: &Connection) -> anyhow::Result<Vec<UserProfile>> {
    let mut stmt = conn.prepare(
        "SELECT id, email, full_name, role, created_at FROM user_profiles ORDER BY created_at ASC",
    )?;

    let rows = stmt.query_map([], |row| {
        let role_str: String = row.get(3)?;
        Ok(UserProfile {
            id: row.get(0)?,
            email: row.get(1)?,
            full_name: row.get(2)?,
            role: StaffRole::parse(&role_str).unwrap_or(StaffRole::Sales),
            created_at: row.get(4)?,
        })
    })?;

    let mut profiles = vec![];
    for row in rows {
        profiles.push(row?);
    }
    Ok(profiles)
}

// ── Booking Comments ──

pub fn insert_comment(
    conn: &Connection,
    booking_id: &str,
    author: &str,
    body: &str,
) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO booking_comments (booking_id, author, body) VALUES (?1, ?2, ?3)",
        params![booking_id, author, body],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_comments_for_booking(
    conn: &Connection,
    booking_id: &str,
    limit: i64,
) -> anyhow::Result<Vec<BookingComment>> {
    let mut stmt = conn.prepare(
        "SELECT id, booking_id, author, body, created_at
         FROM booking_comments WHERE booking_id = ?1
         ORDER BY id ASC LIMIT ?2",
    )?;

    let rows = stmt.query_map(params![booking_id, limit], |row| {
        Ok(BookingComment {
            id: row.get(0)?,
            booking_id: row.get(1)?,
            author: row.get(2)?,
            body: row.get(3)?,
            created_at: row.get(4)?,
        })
    })?;

    let mut comments = vec![];
    for row in rows {
        comments.push(row?);
    }
    Ok(comments)
}

pub fn get_comments_since(
    conn: &Connection,
    since_id: i64,
    booking_id: Option<&str>,
) -> anyhow::Result<Vec<BookingComment>> {
    let (sql, params_vec): (&str, Vec<Box<dyn rusqlite::types::ToSql>>) = match booking_id {
        Some(id) => (
            "SELECT id, booking_id, author, body, created_at
             FROM booking_comments WHERE id > ?1 AND booking_id = ?2
             ORDER BY id ASC",
            vec![
                Box::new(since_id) as Box<dyn rusqlite::types::ToSql>,
                Box::new(id.to_string()),
            ],
        ),
        None => (
            "SELECT id, booking_id, author, body, created_at
             FROM booking_comments WHERE id > ?1
             ORDER BY id ASC",
            vec![Box::new(since_id) as Box<dyn rusqlite::types::ToSql>],
        ),
    };

    let mut stmt = conn.prepare(sql)?;
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(params_refs.as_slice(), |row| {
        Ok(BookingComment {
            id: row.get(0)?,
            booking_id: row.get(1)?,
            author: row.get(2)?,
            body: row.get(3)?,
            created_at: row.get(4)?,
        })
    })?;

    let mut comments = vec![];
    for row in rows {
        comments.push(row?);
    }
    Ok(comments)
}

// ── Dashboard ──

pub struct DashboardStats {
    pub draft_count: i64,
    pub pending_count: i64,
    pub confirmed_count: i64,
    pub completed_count: i64,
    pub cancelled_count: i64,
    pub upcoming_deliveries: i64,
    pub confirmed_revenue: f64,
}

pub fn get_dashboard_stats(conn: &Connection) -> anyhow::Result<DashboardStats> {
    let count_for = |status: &str| -> i64 {
        conn.query_row(
            "SELECT COUNT(*) FROM bookings WHERE status = ?1",
            params![status],
            |row| row.get(0),
        )
        .unwrap_or(0)
    };

    let today = Utc::now().date_naive().format("%Y-%m-%d").to_string();
    let upcoming_deliveries: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM bookings WHERE delivery_date >= ?1 AND status = 'confirmed'",
            params![today],
            |row| row.get(0),
        )
        .unwrap_or(0);

    let confirmed_revenue: f64 = conn
        .query_row(
            "SELECT COALESCE(SUM(total_amount), 0) FROM bookings WHERE status IN ('confirmed', 'completed')",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0.0);

    Ok(DashboardStats {
        draft_count: count_for("draft"),
        pending_count: count_for("pending"),
        confirmed_count: count_for("confirmed"),
        completed_count: count_for("completed"),
        cancelled_count: count_for("cancelled"),
        upcoming_deliveries,
        confirmed_revenue,
    })
}
