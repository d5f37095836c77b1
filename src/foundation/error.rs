/// Crate-wide result alias.
pub type CroquisResult<T> = Result<T, CroquisError>;

/// Error type for every fallible operation in the crate.
#[derive(thiserror::Error, Debug)]
pub enum CroquisError {
    /// Fatal configuration error detected before any render occurs.
    #[error("configuration error: {0}")]
    Config(String),

    /// A sketch factory or sketch callback failed.
    #[error("sketch error: {0}")]
    Sketch(String),

    /// An export or save operation failed.
    #[error("export error: {0}")]
    Export(String),

    /// Passthrough for errors raised by collaborators.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CroquisError {
    /// Build a [`CroquisError::Config`].
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Build a [`CroquisError::Sketch`].
    pub fn sketch(msg: impl Into<String>) -> Self {
        Self::Sketch(msg.into())
    }

    /// Build a [`CroquisError::Export`].
    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export(msg.into())
    }
}
