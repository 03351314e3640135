use std::fmt;

#[derive(Debug, PartialEq)]
pub enum Error {
    InvalidArgument(String),
    InvalidPattern(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            Error::InvalidPattern(msg) => write!(f, "invalid audit exclusion pattern: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<regex::Error> for Error {
    fn from(error: regex::Error) -> Self {
        Error::InvalidPattern(error.to_string())
    }
}
