//! Socket framing for the two directions of a session.
//!
//! The listener writes lines and reads raw control bytes, the connector
//! does the opposite, so each side gets its own codec for use with
//! [`tokio_util::codec::Framed`]:
//!
//! - [`ListenerCodec`] encodes `String` as `line\n` and decodes one raw
//!   byte at a time. A line holding `\n` is refused, since it would reach
//!   the peer as several lines and each would be acknowledged. The byte is returned untouched so the caller can
//!   report values outside the control vocabulary.
//! - [`ConnectorCodec`] decodes `\n`-terminated UTF-8 lines through
//!   [`LinesCodec`] (a trailing `\r` is stripped) and encodes a
//!   [`ControlByte`] as its single wire byte.

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder, LinesCodec, LinesCodecError};

use crate::protocol::ControlByte;
use crate::{AppError, Result};

/// Listener-side codec: lines out, control bytes in.
#[derive(Debug)]
pub struct ListenerCodec(LinesCodec);

impl ListenerCodec {
    /// Create a new `ListenerCodec`.
    #[must_use]
    pub fn new() -> Self {
        Self(LinesCodec::new())
    }
}

impl Default for ListenerCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for ListenerCodec {
    type Item = u8;
    type Error = AppError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        if src.is_empty() {
            return Ok(None);
        }
        Ok(Some(src.get_u8()))
    }
}

impl Encoder<String> for ListenerCodec {
    type Error = AppError;

    fn encode(&mut self, line: String, dst: &mut BytesMut) -> Result<()> {
        if line.contains('\n') {
            return Err(AppError::InvalidLine(format!(
                "line of {} chars contains a line break",
                line.chars().count()
            )));
        }
        self.0.encode(line, dst).map_err(map_codec_error)
    }
}

/// Connector-side codec: lines in, control bytes out.
#[derive(Debug)]
pub struct ConnectorCodec {
    lines: LinesCodec,
    max_line_bytes: usize,
}

impl ConnectorCodec {
    /// Create a codec that rejects lines longer than `max_line_bytes`.
    #[must_use]
    pub fn new(max_line_bytes: usize) -> Self {
        Self {
            lines: LinesCodec::new_with_max_length(max_line_bytes),
            max_line_bytes,
        }
    }

    fn map_error(&self, err: LinesCodecError) -> AppError {
        match err {
            LinesCodecError::MaxLineLengthExceeded => AppError::Io(format!(
                "line too long: exceeded {} bytes",
                self.max_line_bytes
            )),
            LinesCodecError::Io(io_err) => AppError::from(io_err),
        }
    }
}

impl Decoder for ConnectorCodec {
    type Item = String;
    type Error = AppError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        self.lines.decode(src).map_err(|err| self.map_error(err))
    }

    /// An unterminated tail at end of stream is still returned as a line.
    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        self.lines.decode_eof(src).map_err(|err| self.map_error(err))
    }
}

impl Encoder<ControlByte> for ConnectorCodec {
    type Error = AppError;

    fn encode(&mut self, byte: ControlByte, dst: &mut BytesMut) -> Result<()> {
        dst.reserve(1);
        dst.put_u8(byte.to_wire());
        Ok(())
    }
}

fn map_codec_error(err: LinesCodecError) -> AppError {
    match err {
        LinesCodecError::MaxLineLengthExceeded => AppError::Io("line too long".into()),
        LinesCodecError::Io(io_err) => AppError::from(io_err),
    }
}
