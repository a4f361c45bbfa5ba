use thiserror::Error;

/// An input command string that could not be understood.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("unknown command: {0:?}")]
    Unknown(String),

    #[error("command {0:?} requires an argument")]
    MissingArgument(String),

    #[error("bad argument {value:?} for command {command:?}")]
    BadArgument { command: String, value: String },
}
