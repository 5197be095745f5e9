use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Config(String),

    #[error("{0}")]
    Transport(String),

    #[error("Message not found: {0}")]
    NotFound(String),

    #[error("Duplicate message id: {0}")]
    DuplicateId(String),

    #[error("A response is already streaming")]
    Busy,

    #[error("Nothing to send: the turn has no text and no image")]
    EmptyTurn,

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Helper for creating configuration errors
    ///
    /// # Example
    /// ```
    /// use gemchat_core::Error;
    /// let err = Error::config_error("API_KEY is not configured.");
    /// ```
    pub fn config_error(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Helper for creating transport errors
    ///
    /// # Example
    /// ```
    /// use gemchat_core::Error;
    /// let err = Error::transport("connection reset");
    /// assert_eq!(err.to_string(), "connection reset");
    /// ```
    pub fn transport(msg: impl Into<String>) -> Self {
        Error::Transport(msg.into())
    }

    /// Errors the user can do something about, as opposed to store invariant
    /// violations.
    pub fn is_user_facing(&self) -> bool {
        !matches!(self, Error::NotFound(_) | Error::DuplicateId(_))
    }
}
