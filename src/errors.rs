use thiserror::Error as ThisError;

/// Failures reported by the derivation, recording and seeding paths.
///
/// Infrastructure failures (database, I/O) arrive as `anyhow::Error` and are
/// carried through `Other` with their context chain intact.
#[derive(ThisError, Debug)]
pub enum Error {
    /// A physical or economic input is outside its plausible range.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The weather source could not supply a snapshot. Never retried here.
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Building parameters (or another required setting) are absent.
    #[error("configuration missing: {0}")]
    ConfigurationMissing(String),

    #[error("{resource} with ID {id} not found")]
    NotFound { resource: &'static str, id: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn missing(message: impl Into<String>) -> Self {
        Self::ConfigurationMissing(message.into())
    }

    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
