pub type Result<T, E = AlerterError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum AlerterError {
    #[error("unknown transport type {0}")]
    UnknownTransport(String),

    #[error("invalid destination '{0}', expected transport:endpoint")]
    InvalidDestination(String),

    #[error("store: {0}")]
    Store(String),

    #[error(transparent)]
    Serde(#[from] serde_json::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("received status code {0}")]
    HttpStatus(u16),

    #[error("invalid email address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("building email failed: {0}")]
    Email(#[from] lettre::error::Error),

    #[error("smtp: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("{0}")]
    Send(String),

    #[error("some destination failed: {0}")]
    DestinationsFailed(String),
}
