//! Connector endpoint.
//!
//! Connects to the listener's path, writes the prologue byte, then reports
//! every received line to a [`LineSink`] and answers it with one
//! `ACKNOWLEDGE` byte. The empty line ends the session. End of stream ends
//! it as well; nothing is acknowledged then because the peer is gone.

use std::path::{Path, PathBuf};

use futures_util::{SinkExt, StreamExt};
use tokio::net::UnixStream;
use tokio_util::codec::Framed;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::config::SessionConfig;
use crate::console::LineSink;
use crate::ipc::{shutdown_stream, SessionStats};
use crate::protocol::{ConnectorCodec, ControlByte};
use crate::{AppError, Result};

/// An established connection that has not yet sent its prologue.
#[derive(Debug)]
pub struct Connector {
    framed: Framed<UnixStream, ConnectorCodec>,
    path: PathBuf,
}

impl Connector {
    /// Make a single connection attempt to the socket at `path`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Connection` if nothing is listening at `path`,
    /// access is denied, or the path is not a socket.
    pub async fn connect(path: impl AsRef<Path>, config: &SessionConfig) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "connecting");

        let stream = UnixStream::connect(path).await.map_err(|err| {
            AppError::Connection(format!("cannot connect to {}: {err}", path.display()))
        })?;
        info!(
            local = ?stream.local_addr().ok(),
            peer = ?stream.peer_addr().ok(),
            "connected"
        );

        Ok(Self {
            framed: Framed::new(stream, ConnectorCodec::new(config.max_line_bytes)),
            path: path.to_path_buf(),
        })
    }

    /// Connect with up to `config.connect_attempts` attempts, doubling the
    /// delay between them starting from `config.connect_backoff_ms`.
    ///
    /// # Errors
    ///
    /// Returns the last `AppError::Connection` once attempts run out.
    pub async fn connect_with_retry(
        path: impl AsRef<Path>,
        config: &SessionConfig,
    ) -> Result<Self> {
        let path = path.as_ref();
        let mut delay = config.connect_backoff();
        let mut attempt = 1;

        loop {
            match Self::connect(path, config).await {
                Ok(connector) => return Ok(connector),
                Err(err) if attempt < config.connect_attempts => {
                    warn!(attempt, %err, ?delay, "connect failed, retrying");
                    tokio::time::sleep(delay).await;
                    delay = delay.saturating_mul(2);
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Send the prologue and acknowledge lines until the session ends.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` on socket failures, oversized or non-UTF-8
    /// lines, or when the sink rejects a line.
    pub async fn run<K>(self, sink: &mut K) -> Result<SessionStats>
    where
        K: LineSink + ?Sized,
    {
        let span = info_span!("connector", path = %self.path.display());
        let mut framed = self.framed;
        async move {
            framed.send(ControlByte::Prologue).await?;
            info!("sent prologue");

            let mut stats = SessionStats::default();
            loop {
                let Some(line) = framed.next().await.transpose()? else {
                    info!("peer closed the stream");
                    break;
                };
                debug!(chars = line.chars().count(), "received line");
                sink.emit_line(&line).await?;
                stats.lines += 1;

                framed.send(ControlByte::Acknowledge).await?;
                stats.acks += 1;

                if line.is_empty() {
                    break;
                }
            }

            info!(?stats, "shutting down");
            shutdown_stream(framed.into_inner())?;
            Ok(stats)
        }
        .instrument(span)
        .await
    }
}
