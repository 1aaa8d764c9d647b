use thiserror::Error;

/// Failures surfaced by the catalog and mapped onto HTTP responses by the api.
#[derive(Debug, Error)]
pub enum MarketError {
    /// Client supplied fields are missing or invalid
    #[error("{0}")]
    Validation(String),

    /// Referenced entity does not exist
    #[error("{0}")]
    NotFound(String),

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("connection pool error: {0}")]
    Pool(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl MarketError {
    pub fn validation(message: impl Into<String>) -> Self {
        MarketError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        MarketError::NotFound(message.into())
    }

    /// True for failures whose detail must not reach the caller.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            MarketError::Database(_) | MarketError::Pool(_) | MarketError::Internal(_)
        )
    }
}

pub type MarketResult<T> = Result<T, MarketError>;
