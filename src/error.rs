//! Error taxonomy shared across the relay. Every non-fatal error is caught
//! at the component boundary that owns the I/O, logged once, and translated
//! into a wire-level outcome or a buffered retry (see spec.md §7).

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("transient store error: {0}")]
    TransientStore(#[from] sqlx::Error),

    #[error("duplicate fingerprint")]
    DuplicateFingerprint,

    #[error("malformed upstream frame: {0}")]
    MalformedUpstream(String),

    #[error("auth failure: {0}")]
    AuthFailure(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("config error: {0}")]
    Config(String),
}

pub type RelayResult<T> = Result<T, RelayError>;
