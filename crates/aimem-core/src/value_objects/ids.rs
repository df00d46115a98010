//! String identifiers used across the sync protocol
//!
//! Workspaces, users, and thoughts are all addressed by opaque server-issued
//! strings. Each gets its own newtype so they cannot be mixed up.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum accepted identifier length
const MAX_ID_LEN: usize = 128;

/// Error when parsing an identifier from a string
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum IdParseError {
    #[error("identifier is empty")]
    Empty,

    #[error("identifier exceeds {MAX_ID_LEN} characters")]
    TooLong,
}

fn validate(raw: &str) -> Result<&str, IdParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(IdParseError::Empty);
    }
    if trimmed.chars().count() > MAX_ID_LEN {
        return Err(IdParseError::TooLong);
    }
    Ok(trimmed)
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Parse and normalize (trim) an identifier
            pub fn parse(raw: &str) -> Result<Self, IdParseError> {
                validate(raw).map(|s| Self(s.to_string()))
            }

            /// Borrow the identifier as a string slice
            #[inline]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume into the inner string
            #[inline]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = IdParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdParseError;

            fn try_from(raw: String) -> Result<Self, Self::Error> {
                Self::parse(&raw)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id! {
    /// Shared scope (a team) that a push connection subscribes to
    WorkspaceId
}

string_id! {
    /// A user as seen by presence tracking
    UserId
}

string_id! {
    /// A thought document
    ThoughtId
}

impl ThoughtId {
    /// Build a thought id from a JSON value, accepting both strings and integers
    ///
    /// The server is not consistent about the type of `id` in payloads.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::String(s) => Self::parse(s).ok(),
            serde_json::Value::Number(n) => Self::parse(&n.to_string()).ok(),
            _ => None,
        }
    }
}
