//! `cadence-daemon`: the TCP front end of the scheduler.
//!
//! [`Server`] accepts connections and hands each one to
//! [`connection::handle_connection`], which reads a single request and either
//! forwards it to the dispatcher or answers it from the registry.

pub mod connection;
pub mod server;
pub mod state;

pub use server::Server;
pub use state::DaemonState;
