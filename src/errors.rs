use thiserror::Error;

#[derive(Debug, Error)]
pub enum IonStreamError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A processing step needs data an earlier step should have produced,
    /// eg. merging mobility scans before mass detection ran on them.
    #[error("Missing prerequisite: {0}")]
    MissingPrerequisite(String),

    /// Caller handed in data that breaks a precondition
    /// (unsorted m/z values, unsorted target ranges ...)
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),

    #[error(transparent)]
    TomlSer(#[from] toml::ser::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, IonStreamError>;
