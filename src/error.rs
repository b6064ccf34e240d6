pub type SmudgeResult<T> = Result<T, SmudgeError>;

#[derive(thiserror::Error, Debug)]
pub enum SmudgeError {
    #[error("decode error: {0}")]
    Decode(String),

    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),

    #[error("reconstruction error: {0}")]
    Reconstruction(String),

    #[error("unsupported layout: {0}")]
    UnsupportedLayout(String),

    #[error("missing dimensions: {0}")]
    MissingDimensions(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SmudgeError {
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn dimension_mismatch(msg: impl Into<String>) -> Self {
        Self::DimensionMismatch(msg.into())
    }

    pub fn reconstruction(msg: impl Into<String>) -> Self {
        Self::Reconstruction(msg.into())
    }

    pub fn unsupported_layout(msg: impl Into<String>) -> Self {
        Self::UnsupportedLayout(msg.into())
    }

    pub fn missing_dimensions(msg: impl Into<String>) -> Self {
        Self::MissingDimensions(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
