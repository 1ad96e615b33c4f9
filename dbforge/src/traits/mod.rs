//! Core traits for dbforge

mod connection;
mod from_value;

pub use connection::Connection;
pub use from_value::FromValue;
