pub mod booking;
pub mod comment;
pub mod customer;
pub mod profile;

pub use booking::{parse_products, Booking, BookingStatus, RequestedProduct, StatusDisplay};
pub use comment::BookingComment;
pub use customer::Customer;
pub use profile::{StaffRole, UserProfile};
