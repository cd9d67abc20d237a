//! Runs the selected endpoints as concurrent tasks.
//!
//! When both endpoints run in one process the listener signals readiness
//! over a oneshot channel right after binding, and the connector waits for
//! that signal before its first connect. A listener that never binds drops
//! the sender, which ends the connector without a connection attempt.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::config::SessionConfig;
use crate::console::{LineSink, LineSource};
use crate::ipc::connector::Connector;
use crate::ipc::listener::Listener;
use crate::ipc::SessionStats;
use crate::mode::RunMode;
use crate::{AppError, Result};

/// Outcome of each endpoint that was started; `None` if it did not run.
#[derive(Debug)]
pub struct RunReport {
    /// Listener result.
    pub listener: Option<Result<SessionStats>>,
    /// Connector result.
    pub connector: Option<Result<SessionStats>>,
}

impl RunReport {
    /// Collapse the report into the process outcome.
    ///
    /// A listener that refused its socket path stopped cleanly and counts
    /// as success; any other endpoint failure is returned, listener first.
    ///
    /// # Errors
    ///
    /// Returns the first endpoint error other than `AppError::Precondition`.
    pub fn into_result(self) -> Result<()> {
        for outcome in [self.listener, self.connector].into_iter().flatten() {
            match outcome {
                Ok(_) | Err(AppError::Precondition(_)) => {}
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }
}

/// Run the endpoints selected by `mode` against `path` and wait for all
/// of them to finish.
///
/// Endpoint failures are logged here and returned in the report; they do
/// not cancel the other endpoint.
pub async fn run<S, K>(
    mode: RunMode,
    path: PathBuf,
    config: Arc<SessionConfig>,
    mut source: S,
    mut sink: K,
) -> RunReport
where
    S: LineSource + 'static,
    K: LineSink + 'static,
{
    let (ready_tx, ready_rx) = if mode.runs_listener() && mode.runs_connector() {
        let (tx, rx) = oneshot::channel();
        (Some(tx), Some(rx))
    } else {
        (None, None)
    };

    let listener_handle = mode.runs_listener().then(|| {
        let path = path.clone();
        let config = Arc::clone(&config);
        tokio::spawn(async move {
            let listener = Listener::bind(&path, &config)?;
            if let Some(tx) = ready_tx {
                if tx.send(()).is_err() {
                    debug!("connector gone before the readiness signal");
                }
            }
            listener.serve(&mut source).await
        })
    });

    let connector_handle = mode.runs_connector().then(|| {
        tokio::spawn(async move {
            let connector = if let Some(rx) = ready_rx {
                rx.await.map_err(|_| {
                    AppError::Connection("listener stopped before binding".into())
                })?;
                Connector::connect(&path, &config).await?
            } else {
                Connector::connect_with_retry(&path, &config).await?
            };
            connector.run(&mut sink).await
        })
    });

    let listener = match listener_handle {
        Some(handle) => Some(finish("listener", handle).await),
        None => None,
    };
    let connector = match connector_handle {
        Some(handle) => Some(finish("connector", handle).await),
        None => None,
    };

    RunReport {
        listener,
        connector,
    }
}

async fn finish(name: &str, handle: JoinHandle<Result<SessionStats>>) -> Result<SessionStats> {
    let result = handle
        .await
        .unwrap_or_else(|err| Err(AppError::Io(format!("{name} task failed: {err}"))));

    match &result {
        Ok(stats) => info!(endpoint = name, ?stats, "endpoint finished"),
        Err(err) => error!(endpoint = name, %err, "endpoint failed"),
    }
    result
}
