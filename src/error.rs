//! Error handling for numincrement

use std::path::PathBuf;

pub type Result<T> = core::result::Result<T, Error>;

/// Everything that can go wrong, from a single capture group up to the whole run.
///
/// Only `Regex` is fatal; the rest are recovered per file or per capture group and surface through logs.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no match found in file name {file_name:?} with regex string `{pattern}`")]
    NoMatch { file_name: String, pattern: String },

    #[error("`{text}` is not a string which can be incremented/decremented")]
    NonNumeric { text: String },

    #[error("`{text}` is out of range once changed")]
    Overflow { text: String },

    #[error("{} already exists", path.display())]
    Collision { path: PathBuf },

    #[error("file name of {path:?} is missing or not valid UTF-8")]
    NonUtf8Name { path: PathBuf },

    #[error(transparent)]
    Regex(#[from] regex::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
