use std::error::Error;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum CorpusError {
    ParseError(String),
    NotADirectory(PathBuf),
}

impl Error for CorpusError {}

impl fmt::Display for CorpusError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CorpusError::ParseError(msg) => write!(fmt, "{}", msg),
            CorpusError::NotADirectory(path) => {
                write!(fmt, "Not a directory: '{}'", path.display())
            }
        }
    }
}
