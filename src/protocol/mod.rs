//! Wire vocabulary shared by both endpoints.
//!
//! The session layers two things over one Unix stream: newline-terminated
//! text lines flowing listener → connector, and single control bytes
//! flowing connector → listener.

pub mod codec;
pub mod control;

pub use codec::{ConnectorCodec, ListenerCodec};
pub use control::ControlByte;
