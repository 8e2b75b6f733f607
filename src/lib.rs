use alloy::signers::local::LocalSignerError;
use tokio::task::JoinError;

pub mod app;
pub mod cli;
pub mod config;
pub mod panel;
pub mod session;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("Can't split the line")]
    SplitLineError,

    #[error("Problem from std::io library: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to send message to channel: {0}")]
    SenderError(String),

    #[error("Failed from tokio join: {0}")]
    TokioJoinError(#[from] JoinError),
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("No wallet session is active")]
    NotSignedIn,
    #[error("A wallet session is already active")]
    AlreadySignedIn,
    #[error("Failed to parse signer: {0}")]
    SignerParsingError(#[from] LocalSignerError),
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Voting panel is not running")]
    PanelClosed,
    #[error("Contract address is not configured for this network")]
    MissingContractAddress,
    #[error("Invalid metadata: {0}")]
    InvalidMetadata(#[from] serde_json::Error),

    #[error(transparent)]
    SessionError(#[from] SessionError),

    #[error("Failed to send message to channel: {0}")]
    SenderError(String),
}
