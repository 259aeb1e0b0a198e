use thiserror::Error;

#[derive(Error, Debug)]
pub enum MsfError {
    #[error("Invalid MSF container: {0}")]
    InvalidFormat(String),

    #[error("Truncated data at offset {offset}: expected {expected} bytes, got {actual}")]
    TruncatedData {
        offset: u64,
        expected: usize,
        actual: usize,
    },

    #[error("Stream index {index} out of range (stream count: {count})")]
    IndexOutOfRange { index: usize, count: usize },

    #[error("No container path given")]
    MissingPath,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),
}

impl MsfError {
    pub(crate) fn invalid<S: Into<String>>(msg: S) -> Self {
        MsfError::InvalidFormat(msg.into())
    }

    /// True for errors caused by the container bytes themselves rather than
    /// by the caller or the environment.
    pub fn is_corrupt_input(&self) -> bool {
        matches!(
            self,
            MsfError::InvalidFormat(_) | MsfError::TruncatedData { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, MsfError>;
