use thiserror::Error;
use tokio::task::JoinError;

use netwatch_capture::CaptureError;
use netwatch_config::ConfigError;
use netwatch_export::ExportError;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("Event processing error: {0}")]
    Processing(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<JoinError> for AgentError {
    fn from(err: JoinError) -> Self {
        AgentError::Processing(err.to_string())
    }
}
