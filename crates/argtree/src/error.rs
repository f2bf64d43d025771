//! Error type shared by registration, parsing and dispatch.

use thiserror::Error;

/// Everything a dispatch level can hand back to its caller.
///
/// None of these are logged or retried inside the crate; deciding whether to
/// print usage or exit belongs to the caller.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or unknown flag syntax on the command line.
    #[error("{0}")]
    Parse(String),

    /// An environment- or file-sourced value does not fit the flag's type.
    #[error("could not parse {value:?} as {kind} value for flag {flag}: {reason}")]
    TypeConversion {
        flag: String,
        kind: &'static str,
        value: String,
        reason: String,
    },

    /// Two aliases of one logical flag were both given explicitly.
    #[error("Cannot use two forms of the same flag: {first} {second}")]
    AliasConflict { first: String, second: String },

    /// Required flags that were neither given nor sourced from env/file.
    #[error("{}", missing_message(.0))]
    MissingRequired(Vec<String>),

    /// A declaration that can never dispatch (bad tree, redefined flag).
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Returned by a before hook or an action, passed through untouched.
    #[error(transparent)]
    Hook(anyhow::Error),
}

fn missing_message(names: &[String]) -> String {
    let plural = if names.len() > 1 { "s" } else { "" };
    format!("Required flag{plural} {:?} not set", names.join(", "))
}

impl Error {
    pub(crate) fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }
}

/// Convenience alias for results with [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
