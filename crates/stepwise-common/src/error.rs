use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("registration error: {0}")]
    Registration(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("execution error: {0}")]
    Execution(String),

    #[error("state error: {0}")]
    State(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Short category name, used when reporting failures from the command surface.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Config(_) => "config",
            Error::Registration(_) => "registration",
            Error::Storage(_) => "storage",
            Error::Execution(_) => "execution",
            Error::State(_) => "state",
            Error::Io(_) => "io",
            Error::Serialization(_) => "serialization",
            Error::Other(_) => "other",
        }
    }
}
