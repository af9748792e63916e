pub mod availability;
pub mod booking;
pub mod cancellation;
pub mod catalog;
pub mod lifecycle;
pub mod notifications;
