use thiserror::Error;

#[derive(Error, Debug)]
pub enum NormalizerError {
    #[error("Fact store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("Fact store lock poisoned")]
    PoisonedLock,

    #[error("CSV export error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, NormalizerError>;
