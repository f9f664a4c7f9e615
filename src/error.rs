/// Errors raised while talking to the identity provider.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("{operation} failed (status {status:?}): {detail}")]
    OAuth {
        operation: &'static str,
        status: Option<u16>,
        detail: String,
    },
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Invalid ID token: {0}")]
    InvalidIdToken(String),
    #[error("Identity provider returned no subject")]
    MissingSubject,
}
