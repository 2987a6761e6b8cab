use thiserror::Error;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("settings io: {0}")]
    Io(#[from] std::io::Error),
    #[error("settings: {0}")]
    Settings(#[from] eyre::Report),
}

pub type Result<T> = std::result::Result<T, HostError>;
