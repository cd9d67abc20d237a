//! Unix domain socket endpoints.
//!
//! [`listener::Listener`] binds a path, accepts exactly one peer and sends
//! operator lines; [`connector::Connector`] connects to that path,
//! announces itself with a prologue byte and acknowledges every line.

pub mod connector;
pub mod listener;

use std::io::ErrorKind;
use std::net::Shutdown;

use tokio::net::UnixStream;
use tracing::debug;

use crate::Result;

/// Sun-path capacity, conservative across Linux (108) and macOS (104).
pub const MAX_SOCKET_PATH: usize = 104;

/// Per-session counters reported by either endpoint.
///
/// On the listener `lines` counts lines sent and `acks` counts
/// `ACKNOWLEDGE` bytes received; on the connector they count lines
/// reported and acknowledgments written.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct SessionStats {
    /// Lines exchanged, including the terminating empty line.
    pub lines: usize,
    /// Acknowledgments exchanged.
    pub acks: usize,
    /// Replies that were not `ACKNOWLEDGE` (listener only).
    pub ack_failures: usize,
}

/// Shut down both directions of `stream` and close it.
///
/// A peer that has already gone away leaves the socket unconnected on
/// some platforms; that is not an error here.
pub(crate) fn shutdown_stream(stream: UnixStream) -> Result<()> {
    let stream = stream.into_std()?;
    match stream.shutdown(Shutdown::Both) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotConnected => {
            debug!(%err, "peer already disconnected");
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}
