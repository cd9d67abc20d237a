#![forbid(unsafe_code)]

//! Line exchange with per-line acknowledgment over a Unix domain socket.
//!
//! A [`Listener`](ipc::listener::Listener) sends operator lines to a single
//! [`Connector`](ipc::connector::Connector), which answers each line with
//! one control byte. An empty line ends the session on both sides.

pub mod config;
pub mod console;
pub mod errors;
pub mod ipc;
pub mod mode;
pub mod protocol;
pub mod runner;

pub use config::SessionConfig;
pub use errors::{AppError, Result};
