use thiserror::Error;

#[derive(Error, Debug)]
pub enum LdbError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("could not connect to executor to check binary version: {0}")]
    CatalogConnect(String),

    #[error("query failed: {query}: {reason}")]
    QueryFailed { query: String, reason: String },

    #[error("Version query error: {0}")]
    VersionQuery(String),

    #[error("unsupported element type: {name} (oid {oid})")]
    UnsupportedElementType { name: &'static str, oid: u32 },

    #[error("Wrong number of dimensions: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Invalid index option: {0}")]
    InvalidOption(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Engine error: {0}")]
    Engine(String),
}

pub type Result<T> = std::result::Result<T, LdbError>;

impl From<serde_json::Error> for LdbError {
    fn from(err: serde_json::Error) -> Self {
        LdbError::Serialization(err.to_string())
    }
}
