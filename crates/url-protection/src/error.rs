use thiserror::Error;

/// Error type for URL protection operations.
///
/// Verification failures are NOT errors: a tampered, foreign or malformed
/// URL is reported as `Ok(false)` (or as expired) so hostile input never
/// turns into a failure of the caller. `Err` is reserved for inputs the
/// caller should never pass and for broken configuration.
#[derive(Debug, Error)]
pub enum Error {
    /// The caller passed a value the contract forbids
    #[error(transparent)]
    Input(#[from] InputError),

    /// Configuration error with specific details
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Operation failed (intentionally vague for security)
    ///
    /// This could be:
    /// - A timestamp that passed signature verification but cannot be parsed
    /// - A URL that could not be rebuilt from its components
    ///
    /// Use `{:?}` formatting to see details in logs.
    #[error("Operation failed")]
    OperationFailed(
        #[source]
        #[from]
        OperationError,
    ),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("URL must be an absolute URL with a scheme and authority")]
    NotAbsolute,

    #[error("Salt cannot be empty or whitespace")]
    BlankSalt,

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Configuration errors with specific variants
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Parameter name must not be empty")]
    EmptyParameterName,

    #[error("Path template is required when the parameter location is path")]
    MissingPathTemplate,

    #[error("Path template must be an absolute path: {0}")]
    InvalidPathTemplate(String),

    #[error("Path template must contain exactly one {{0}} placeholder")]
    PathTemplatePlaceholder,

    #[error("Parameter {0} is used for both the hash and the time")]
    ParameterClash(String),
}

/// Detailed operation errors for debugging (use {:?} to see these)
#[derive(Debug, Error)]
pub enum OperationError {
    #[error("Malformed timestamp: {0}")]
    MalformedTimestamp(String),

    #[error("URL reconstruction failed: {0}")]
    Reconstruction(String),
}

pub type Result<T> = std::result::Result<T, Error>;
