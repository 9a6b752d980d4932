use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("project not found: {0}")]
    ProjectNotFound(String),

    #[error("commit not found: {0}")]
    CommitNotFound(String),

    #[error("analysis job not found for project {0}")]
    JobNotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("analysis already running for project {0}")]
    Conflict(String),

    #[error("git repository error: {0}")]
    Repository(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("analysis cancelled")]
    Cancelled,

    #[error("{0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;
