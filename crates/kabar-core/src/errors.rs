/// Core error type for the bot.
///
/// Adapter crates map their specific errors into this type so the handlers
/// can decide consistently between a configuration message, a "not found"
/// message and a generic apology.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("missing credential: {0}")]
    MissingCredential(&'static str),

    #[error("source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("external error: {0}")]
    External(String),
}

impl Error {
    /// Short, stable label for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Config(_) => "config",
            Error::MissingCredential(_) => "missing_credential",
            Error::SourceUnavailable(_) => "source_unavailable",
            Error::MalformedResponse(_) => "malformed_response",
            Error::NotFound(_) => "not_found",
            Error::External(_) => "external",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
