//! Network Module
//!
//! Socket transport between the consensus engine and the application.
//!
//! ## Architecture
//! - Single acceptor thread (non-blocking accept, polled for shutdown)
//! - One thread per connection; the engine typically opens separate
//!   consensus, mempool and query connections
//! - Requests routed through `protocol::dispatch`

mod client;
mod connection;
mod server;

pub use client::Client;
pub use connection::{Connection, FATAL_EXIT_CODE};
pub use server::{Server, ShutdownHandle};
