use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum BenchError {
    /// Invalid or out-of-range settings. Raised before any database work.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The session could not be opened or closed.
    #[error("{backend} connection failed: {source}")]
    Connection {
        backend: &'static str,
        #[source]
        source: BoxError,
    },

    /// Any failure while preparing, executing, committing or querying.
    #[error("{operation} failed: {source}")]
    Statement {
        operation: &'static str,
        #[source]
        source: BoxError,
    },

    /// The reporting sink rejected a write.
    #[error("cannot write benchmark report: {0}")]
    Report(#[from] std::io::Error),
}

impl BenchError {
    pub fn config(message: impl Into<String>) -> Self {
        BenchError::Configuration(message.into())
    }

    pub fn connection(backend: &'static str, source: impl Into<BoxError>) -> Self {
        BenchError::Connection {
            backend,
            source: source.into(),
        }
    }

    pub fn statement(operation: &'static str, source: impl Into<BoxError>) -> Self {
        BenchError::Statement {
            operation,
            source: source.into(),
        }
    }
}

pub type Result<T, E = BenchError> = std::result::Result<T, E>;
