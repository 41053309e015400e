use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub booking_number: String,
    pub customer_id: Option<String>,
    pub status: BookingStatus,
    pub event_date: NaiveDate,
    pub event_end_date: Option<NaiveDate>,
    pub delivery_date: Option<NaiveDate>,
    pub location: Option<String>,
    pub products: Vec<RequestedProduct>,
    pub total_amount: f64,
    pub tax_amount: f64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Draft,
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Draft => "draft",
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(BookingStatus::Draft),
            "pending" => Some(BookingStatus::Pending),
            "confirmed" => Some(BookingStatus::Confirmed),
            "completed" => Some(BookingStatus::Completed),
            "cancelled" => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }

    /// Transitions the dashboard exposes. Everything else is rejected
    /// before any write happens.
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        match self {
            BookingStatus::Draft => {
                matches!(next, BookingStatus::Pending | BookingStatus::Cancelled)
            }
            BookingStatus::Pending => {
                matches!(next, BookingStatus::Confirmed | BookingStatus::Cancelled)
            }
            BookingStatus::Confirmed => {
                matches!(next, BookingStatus::Completed | BookingStatus::Cancelled)
            }
            BookingStatus::Completed | BookingStatus::Cancelled => false,
        }
    }

    pub fn display(&self) -> StatusDisplay {
        match self {
            BookingStatus::Draft => StatusDisplay {
                label: "Utkast",
                color_class: "bg-gray-100 text-gray-800",
            },
            BookingStatus::Pending => StatusDisplay {
                label: "Väntande",
                color_class: "bg-yellow-100 text-yellow-800",
            },
            BookingStatus::Confirmed => StatusDisplay {
                label: "Bekräftad",
                color_class: "bg-green-100 text-green-800",
            },
            BookingStatus::Completed => StatusDisplay {
                label: "Avslutad",
                color_class: "bg-blue-100 text-blue-800",
            },
            BookingStatus::Cancelled => StatusDisplay {
                label: "Avbokad",
                color_class: "bg-red-100 text-red-800",
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusDisplay {
    pub label: &'static str,
    pub color_class: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestedProduct {
    pub name: String,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
    #[serde(default)]
    pub wrapping_requested: bool,
}

fn default_quantity() -> i64 {
    1
}

/// Decodes a stored `products_requested` column. Older rows were written as
/// a JSON string (occasionally double-encoded) instead of a plain array;
/// new writes always store the array. Unparseable rows degrade to an empty
/// list rather than failing the read.
pub fn parse_products(raw: &str) -> Vec<RequestedProduct> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return vec![];
    }

    let mut value: serde_json::Value = match serde_json::from_str(trimmed) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(error = %e, "unparseable products_requested, defaulting to empty");
            return vec![];
        }
    };

    // Legacy rows: unwrap up to two layers of string encoding
    for _ in 0..2 {
        match value {
            serde_json::Value::String(inner) => {
                value = match serde_json::from_str(&inner) {
                    Ok(v) => v,
                    Err(e) => {
                        tracing::warn!(error = %e, "unparseable products_requested, defaulting to empty");
                        return vec![];
                    }
                };
            }
            other => {
                value = other;
                break;
            }
        }
    }

    match serde_json::from_value(value) {
        Ok(products) => products,
        Err(e) => {
            tracing::warn!(error = %e, "products_requested has unexpected shape, defaulting to empty");
            vec![]
        }
    }
}
