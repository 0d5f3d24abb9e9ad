//! Handle value object.

use serde::{Deserialize, Serialize};

use crate::Error;

/// Longest handle accepted from chat input.
pub const MAX_HANDLE_LEN: usize = 32;

/// A validated solved.ac / BOJ handle.
///
/// Handles are case-sensitive and limited to ASCII letters, digits and `_`,
/// which also makes them safe to embed in a snapshot file name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Handle(String);

impl Handle {
    /// Create a new Handle from a string, validating it.
    pub fn new(handle: impl Into<String>) -> Result<Self, Error> {
        let handle = handle.into();
        Self::validate(&handle)?;
        Ok(Self(handle))
    }

    /// Get the handle as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(handle: &str) -> Result<(), Error> {
        if handle.is_empty() {
            return Err(Error::validation("handle cannot be empty"));
        }

        if handle.chars().count() > MAX_HANDLE_LEN {
            return Err(Error::validation(format!(
                "handle cannot be longer than {MAX_HANDLE_LEN} characters"
            )));
        }

        if !handle.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(Error::validation(format!(
                "handle `{handle}` may only contain letters, digits and `_`"
            )));
        }

        Ok(())
    }
}

impl std::fmt::Display for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Handle {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Handle {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Handle> for String {
    fn from(handle: Handle) -> Self {
        handle.0
    }
}
