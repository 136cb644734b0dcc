use thiserror::Error;

// ---------------------------------------------------------------------------
// Crate error type
// ---------------------------------------------------------------------------

/// Errors raised by the controller core and its plumbing.
///
/// Only the construction errors (`InvalidShape`, `InvalidVariable`,
/// `RuleTable`, `Config`) are fatal, and they happen before the control loop
/// starts. Everything else is logged and the loop keeps ticking.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid membership shape for term `{term}`: {reason}")]
    InvalidShape { term: String, reason: String },

    #[error("invalid fuzzy variable `{name}`: {reason}")]
    InvalidVariable { name: String, reason: String },

    #[error("rule table: {0}")]
    RuleTable(String),

    #[error("malformed payload on `{topic}` ({payload:?}): {reason}")]
    MalformedCommand {
        topic: String,
        payload: String,
        reason: String,
    },

    #[error("transport: {0}")]
    Transport(String),

    #[error("configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn malformed(topic: &str, payload: &str, reason: impl Into<String>) -> Self {
        Error::MalformedCommand {
            topic: topic.to_string(),
            payload: payload.to_string(),
            reason: reason.into(),
        }
    }
}
