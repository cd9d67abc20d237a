//! Control bytes exchanged outside the line text.

use std::fmt::{Display, Formatter};

/// One-byte handshake and flow-control signal sent by the connector.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ControlByte {
    /// Sent once, immediately after connecting.
    Prologue,
    /// Sent once per received line.
    Acknowledge,
}

impl ControlByte {
    /// Wire value of [`ControlByte::Prologue`].
    pub const PROLOGUE: u8 = 127;
    /// Wire value of [`ControlByte::Acknowledge`].
    pub const ACKNOWLEDGE: u8 = 128;

    /// Raw byte written to the socket.
    #[must_use]
    pub const fn to_wire(self) -> u8 {
        match self {
            Self::Prologue => Self::PROLOGUE,
            Self::Acknowledge => Self::ACKNOWLEDGE,
        }
    }

    /// Interpret a raw byte; `None` for anything outside the vocabulary.
    #[must_use]
    pub const fn from_wire(value: u8) -> Option<Self> {
        match value {
            Self::PROLOGUE => Some(Self::Prologue),
            Self::ACKNOWLEDGE => Some(Self::Acknowledge),
            _ => None,
        }
    }
}

impl From<ControlByte> for u8 {
    fn from(byte: ControlByte) -> Self {
        byte.to_wire()
    }
}

impl Display for ControlByte {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Prologue => write!(f, "prologue({})", Self::PROLOGUE),
            Self::Acknowledge => write!(f, "acknowledge({})", Self::ACKNOWLEDGE),
        }
    }
}
