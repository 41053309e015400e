use serde::{Deserialize, Serialize};

/// Staff roles. This is the single definition consumed by both the
/// create-user validation and the users listing; the database carries a
/// matching CHECK constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StaffRole {
    Admin,
    Sales,
    Warehouse,
    Printer,
    Support,
}

impl StaffRole {
    pub const ALL: [StaffRole; 5] = [
        StaffRole::Admin,
        StaffRole::Sales,
        StaffRole::Warehouse,
        StaffRole::Printer,
        StaffRole::Support,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StaffRole::Admin => "admin",
            StaffRole::Sales => "sales",
            StaffRole::Warehouse => "warehouse",
            StaffRole::Printer => "printer",
            StaffRole::Support => "support",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(StaffRole::Admin),
            "sales" => Some(StaffRole::Sales),
            "warehouse" => Some(StaffRole::Warehouse),
            "printer" => Some(StaffRole::Printer),
            "support" => Some(StaffRole::Support),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub role: StaffRole,
    pub created_at: String,
}
