//! Error types for the subscription tracker core.

/// Top-level error type for the renewal reminder engine.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    /// Backing-store query or mutation failed (transport/service error).
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// A mutation referenced a record id that does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A record failed validation (empty name, negative cost).
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    /// One notification job's email attempt failed.
    #[error("delivery failed: {0}")]
    DeliveryFailed(String),

    /// Configuration error (unparseable file, bad trigger time or timezone).
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Channel send/receive error.
    #[error("channel error: {0}")]
    Channel(String),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, TrackerError>;
