//! Run mode — which endpoints a single invocation starts.
//!
//! The selector is matched loosely: any value containing `s` starts the
//! listener and any value containing `c` starts the connector, so `s`,
//! `c`, `sc` and `cs` all work. The literal `both` is accepted as well.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::AppError;

/// Endpoints to run in this process.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum RunMode {
    /// Listener only.
    ServerOnly,
    /// Connector only.
    ClientOnly,
    /// Listener and connector as two concurrent tasks. Default mode.
    #[default]
    Both,
}

impl RunMode {
    /// Whether the listener endpoint runs.
    #[must_use]
    pub fn runs_listener(self) -> bool {
        matches!(self, Self::ServerOnly | Self::Both)
    }

    /// Whether the connector endpoint runs.
    #[must_use]
    pub fn runs_connector(self) -> bool {
        matches!(self, Self::ClientOnly | Self::Both)
    }
}

impl FromStr for RunMode {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let selector = raw.to_lowercase();
        if selector == "both" {
            return Ok(Self::Both);
        }

        match (selector.contains('s'), selector.contains('c')) {
            (true, true) => Ok(Self::Both),
            (true, false) => Ok(Self::ServerOnly),
            (false, true) => Ok(Self::ClientOnly),
            (false, false) => Err(AppError::Config(format!(
                "mode '{raw}' selects neither server (s) nor client (c)"
            ))),
        }
    }
}

impl Display for RunMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ServerOnly => write!(f, "s"),
            Self::ClientOnly => write!(f, "c"),
            Self::Both => write!(f, "sc"),
        }
    }
}
