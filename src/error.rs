use thiserror::Error;

#[derive(Debug, Error)]
pub enum SplitError {
    #[error("malformed model: {0}")]
    Parse(String),

    #[error("invalid cut configuration: {0}")]
    InvalidCut(String),

    #[error("cut is not a single-edge boundary: {0}")]
    Partition(String),

    #[error("invalid precision fixup table: {0}")]
    InvalidFixup(String),

    #[error("JSON codec error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SplitError {
    pub(crate) fn parse(msg: impl Into<String>) -> Self {
        SplitError::Parse(msg.into())
    }

    pub(crate) fn invalid_cut(msg: impl Into<String>) -> Self {
        SplitError::InvalidCut(msg.into())
    }

    pub(crate) fn partition(msg: impl Into<String>) -> Self {
        SplitError::Partition(msg.into())
    }

    pub(crate) fn invalid_fixup(msg: impl Into<String>) -> Self {
        SplitError::InvalidFixup(msg.into())
    }
}
