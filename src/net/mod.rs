//! Transport: per-connection session actors, the TCP accept loop, and
//! the connection census.

mod client;
mod server;
mod session;
mod switchboard;

pub use client::Client;
pub use server::Server;
pub use session::Session;
pub use switchboard::Switchboard;
