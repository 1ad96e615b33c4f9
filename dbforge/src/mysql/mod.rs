//! MySQL implementation for dbforge

mod connection;
mod types;

pub use connection::MySqlConnection;
