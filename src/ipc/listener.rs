//! Listener endpoint.
//!
//! ## Session
//!
//! 1. Refuse a path holding a non-empty file; remove an empty one.
//! 2. Bind and listen with the configured backlog.
//! 3. Accept exactly one peer and read its prologue byte.
//! 4. For each operator line: write `line\n`, flush, read one control
//!    byte. A byte other than `ACKNOWLEDGE` is logged and the loop goes on.
//! 5. The empty line ends the session; the stream is shut down in both
//!    directions.
//!
//! The listening socket stays open for the whole session, so later
//! connection attempts queue behind the first and are never served. The
//! socket file is removed when the [`Listener`] is dropped, unless the path
//! has since been taken over by another file (checked by device and inode).

use std::fs;
use std::io::ErrorKind;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};

use futures_util::{SinkExt, StreamExt};
use tokio::net::{UnixListener, UnixSocket, UnixStream};
use tokio_util::codec::Framed;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::config::SessionConfig;
use crate::console::LineSource;
use crate::ipc::{shutdown_stream, SessionStats, MAX_SOCKET_PATH};
use crate::protocol::{ControlByte, ListenerCodec};
use crate::{AppError, Result};

/// A bound, listening socket that has not yet accepted its peer.
#[derive(Debug)]
pub struct Listener {
    listener: UnixListener,
    path: PathBuf,
    /// `(dev, ino)` of the socket file created by `bind`.
    identity: Option<(u64, u64)>,
}

impl Listener {
    /// Bind a stream socket at `path` and start listening.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Precondition` if `path` is too long or already
    /// holds a non-empty file (the file is left untouched), and
    /// `AppError::Io` if the socket cannot be created or bound.
    pub fn bind(path: impl AsRef<Path>, config: &SessionConfig) -> Result<Self> {
        let path = path.as_ref();
        prepare_socket_path(path)?;

        let socket = UnixSocket::new_stream()?;
        socket
            .bind(path)
            .map_err(|err| AppError::Io(format!("failed to bind {}: {err}", path.display())))?;
        let listener = socket.listen(config.backlog)?;
        let identity = file_identity(path);

        info!(path = %path.display(), backlog = config.backlog, "listening");

        Ok(Self {
            listener,
            path: path.to_path_buf(),
            identity,
        })
    }

    /// Filesystem path the socket is bound to.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Accept one peer and run the line exchange until the empty line.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Disconnected` if the peer closes the stream where
    /// a control byte is expected, `AppError::InvalidLine` if the source
    /// yields a line containing `\n` (nothing of it is sent), and
    /// `AppError::Io` for socket or line source failures.
    pub async fn serve<S>(self, source: &mut S) -> Result<SessionStats>
    where
        S: LineSource + ?Sized,
    {
        let span = info_span!("listener", path = %self.path.display());
        async move {
            let (stream, peer) = self.listener.accept().await?;
            info!(
                local = ?stream.local_addr().ok(),
                peer = ?peer,
                "connection accepted"
            );

            let mut framed = Framed::new(stream, ListenerCodec::new());
            let prologue = next_control_byte(&mut framed, "prologue").await?;
            info!("received prologue: {prologue}");
            if ControlByte::from_wire(prologue) != Some(ControlByte::Prologue) {
                warn!(
                    value = prologue,
                    expected = ControlByte::PROLOGUE,
                    "unexpected prologue byte"
                );
            }

            let stats = exchange_lines(&mut framed, source).await?;

            info!(?stats, "shutting down");
            shutdown_stream(framed.into_inner())?;
            Ok(stats)
        }
        .instrument(span)
        .await
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        let current = file_identity(&self.path);
        if current.is_none() {
            return;
        }
        if current != self.identity {
            debug!(path = %self.path.display(), "socket path now belongs to another file, leaving it");
            return;
        }

        match fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "socket file removed"),
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => warn!(path = %self.path.display(), %err, "failed to remove socket file"),
        }
    }
}

/// Send operator lines, pairing each with exactly one control-byte read.
async fn exchange_lines<S>(
    framed: &mut Framed<UnixStream, ListenerCodec>,
    source: &mut S,
) -> Result<SessionStats>
where
    S: LineSource + ?Sized,
{
    let mut stats = SessionStats::default();

    loop {
        let line = if let Some(line) = source.next_line().await? {
            line
        } else {
            info!("line source exhausted, sending the empty line");
            String::new()
        };
        let is_last = line.is_empty();
        let chars = line.chars().count();

        framed.send(line).await?;
        stats.lines += 1;
        info!(chars, "sent line");

        let reply = next_control_byte(framed, "acknowledgment").await?;
        if ControlByte::from_wire(reply) == Some(ControlByte::Acknowledge) {
            stats.acks += 1;
        } else {
            stats.ack_failures += 1;
            let err = AppError::Acknowledgment(format!(
                "peer replied {reply} instead of {}",
                ControlByte::ACKNOWLEDGE
            ));
            warn!(%err, "client failed to acknowledge the line");
        }

        if is_last {
            return Ok(stats);
        }
    }
}

async fn next_control_byte(
    framed: &mut Framed<UnixStream, ListenerCodec>,
    expecting: &str,
) -> Result<u8> {
    match framed.next().await {
        Some(byte) => byte,
        None => Err(AppError::Disconnected(format!(
            "peer closed the stream before sending the {expecting}"
        ))),
    }
}

fn file_identity(path: &Path) -> Option<(u64, u64)> {
    fs::symlink_metadata(path)
        .ok()
        .map(|meta| (meta.dev(), meta.ino()))
}

/// Refuse to clobber content at `path`; clear an empty leftover.
fn prepare_socket_path(path: &Path) -> Result<()> {
    let len = path.as_os_str().len();
    if len >= MAX_SOCKET_PATH {
        return Err(AppError::Precondition(format!(
            "socket path too long ({len} bytes, max {}): {}",
            MAX_SOCKET_PATH - 1,
            path.display()
        )));
    }

    match fs::symlink_metadata(path) {
        Ok(meta) if meta.len() > 0 => Err(AppError::Precondition(format!(
            "cannot overwrite {}: the file exists and has content",
            path.display()
        ))),
        Ok(_) => {
            fs::remove_file(path)?;
            debug!(path = %path.display(), "removed empty file at socket path");
            Ok(())
        }
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err.into()),
    }
}
