pub mod actor;
pub mod booking;
pub mod ports;
pub mod transition;
