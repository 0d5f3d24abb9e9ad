//! Chat command parsing and dispatch.
//!
//! Inbound message text is parsed into a closed [`Command`] set and executed
//! by the [`CommandRouter`]. Reply text is produced by the pure functions in
//! [`render`].

pub mod render;
mod router;

pub use router::CommandRouter;

use thiserror::Error;

use crate::domain::Handle;

/// A parsed chat command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `!n <handle>`: show live stats.
    Lookup(Handle),
    /// `!r <handle>`: store a first snapshot.
    Register(Handle),
    /// `!update`: refresh every stored snapshot.
    UpdateAll,
    /// `!c <handle>`: compare live stats with the stored snapshot.
    Compare(Handle),
}

/// Why a message that looked like a command could not be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("`{command}` needs a handle")]
    MissingArgument { command: &'static str },

    #[error("`{command}`: {reason}")]
    InvalidHandle {
        command: &'static str,
        reason: String,
    },
}

impl Command {
    pub const LOOKUP: &'static str = "!n";
    pub const REGISTER: &'static str = "!r";
    pub const UPDATE_ALL: &'static str = "!update";
    pub const COMPARE: &'static str = "!c";

    /// Parse message text.
    ///
    /// Returns `None` for anything that is not a command, so ordinary chat is
    /// ignored. The command token must be the first word of the message.
    pub fn parse(content: &str) -> Option<Result<Self, ParseError>> {
        let (token, rest) = match content.split_once(char::is_whitespace) {
            Some((token, rest)) => (token, rest),
            None => (content, ""),
        };

        let command = match token {
            Self::LOOKUP => Self::LOOKUP,
            Self::REGISTER => Self::REGISTER,
            Self::COMPARE => Self::COMPARE,
            Self::UPDATE_ALL => return Some(Ok(Self::UpdateAll)),
            _ => return None,
        };

        let argument = rest.trim();
        if argument.is_empty() {
            return Some(Err(ParseError::MissingArgument { command }));
        }

        let handle = match Handle::new(argument) {
            Ok(handle) => handle,
            Err(e) => {
                return Some(Err(ParseError::InvalidHandle {
                    command,
                    reason: e.to_string(),
                }));
            }
        };

        Some(Ok(match command {
            Self::LOOKUP => Self::Lookup(handle),
            Self::REGISTER => Self::Register(handle),
            _ => Self::Compare(handle),
        }))
    }

    /// The command token, e.g. `!n`.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Lookup(_) => Self::LOOKUP,
            Self::Register(_) => Self::REGISTER,
            Self::UpdateAll => Self::UPDATE_ALL,
            Self::Compare(_) => Self::COMPARE,
        }
    }

    pub fn handle(&self) -> Option<&Handle> {
        match self {
            Self::Lookup(handle) | Self::Register(handle) | Self::Compare(handle) => Some(handle),
            Self::UpdateAll => None,
        }
    }
}
