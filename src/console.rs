//! Operator-facing line sources and sinks.
//!
//! The listener pulls outgoing lines from a [`LineSource`] and the
//! connector pushes received lines into a [`LineSink`]. The terminal
//! implementations talk to stdin/stdout; the scripted and channel
//! implementations let the session loops run without a terminal.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin, Stdout};
use tokio::sync::mpsc;

use crate::{AppError, Result};

/// Prompt shown before each operator line.
pub const SERVER_PROMPT: &str = "SERVER >";

/// Prefix printed before each received line.
pub const CLIENT_PREFIX: &str = "CLIENT >";

/// Supplier of lines for the listener to send.
pub trait LineSource: Send {
    /// Next line to send, without its terminator.
    ///
    /// `Ok(None)` means the source is exhausted; the listener treats that
    /// like an empty line and ends the session.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` if the underlying input fails.
    fn next_line(&mut self) -> Pin<Box<dyn Future<Output = Result<Option<String>>> + Send + '_>>;
}

/// Consumer of lines received by the connector.
pub trait LineSink: Send {
    /// Report one received line.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` if the line cannot be delivered.
    fn emit_line<'a>(
        &'a mut self,
        line: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;
}

/// Interactive source: prompts on stdout and reads stdin.
#[derive(Debug)]
pub struct StdinSource {
    lines: Lines<BufReader<Stdin>>,
    stdout: Stdout,
}

impl StdinSource {
    /// Attach to the process stdin/stdout.
    #[must_use]
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
            stdout: tokio::io::stdout(),
        }
    }
}

impl Default for StdinSource {
    fn default() -> Self {
        Self::new()
    }
}

impl LineSource for StdinSource {
    fn next_line(&mut self) -> Pin<Box<dyn Future<Output = Result<Option<String>>> + Send + '_>> {
        Box::pin(async move {
            self.stdout.write_all(SERVER_PROMPT.as_bytes()).await?;
            self.stdout.flush().await?;
            Ok(self.lines.next_line().await?)
        })
    }
}

/// Interactive sink: prints each line to stdout.
#[derive(Debug)]
pub struct StdoutSink {
    stdout: Stdout,
}

impl StdoutSink {
    /// Attach to the process stdout.
    #[must_use]
    pub fn new() -> Self {
        Self {
            stdout: tokio::io::stdout(),
        }
    }
}

impl Default for StdoutSink {
    fn default() -> Self {
        Self::new()
    }
}

impl LineSink for StdoutSink {
    fn emit_line<'a>(
        &'a mut self,
        line: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            let rendered = format!("{CLIENT_PREFIX}{line}\n");
            self.stdout.write_all(rendered.as_bytes()).await?;
            self.stdout.flush().await?;
            Ok(())
        })
    }
}

/// Fixed queue of lines, drained front to back.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    lines: VecDeque<String>,
}

impl ScriptedSource {
    /// Build a source that yields `lines` in order, then `None`.
    #[must_use]
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    /// Lines not yet handed out.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.lines.len()
    }
}

impl LineSource for ScriptedSource {
    fn next_line(&mut self) -> Pin<Box<dyn Future<Output = Result<Option<String>>> + Send + '_>> {
        let next = self.lines.pop_front();
        Box::pin(async move { Ok(next) })
    }
}

/// Forwards every received line into an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<String>,
}

impl ChannelSink {
    /// Create a sink together with the receiver that observes it.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl LineSink for ChannelSink {
    fn emit_line<'a>(
        &'a mut self,
        line: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        let sent = self
            .tx
            .send(line.to_owned())
            .map_err(|_| AppError::Io("line sink receiver dropped".into()));
        Box::pin(async move { sent })
    }
}
