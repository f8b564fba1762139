use thiserror::Error;

/// Failures on the delivery paths out of the agent.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Networking or TLS errors talking to the collector or token endpoint.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The collector answered with a non-success status.
    #[error("collector returned status {0}")]
    Status(u16),

    /// The token endpoint refused us or answered with garbage.
    #[error("token endpoint failure: {0}")]
    Auth(String),

    /// An outgoing record could not be encoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The stream transport would not accept the record.
    #[error("publish error: {0}")]
    Publish(String),
}
