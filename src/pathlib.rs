use std::fmt;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, Hash, Ord, PartialOrd, Eq, PartialEq, Serialize, Deserialize)]
pub struct FilePath {
    buf: PathBuf,
}

impl FilePath {
    pub fn new() -> FilePath {
        FilePath {
            buf: PathBuf::new(),
        }
    }

    pub fn sep() -> String {
        String::from(MAIN_SEPARATOR)
    }

    pub fn is_empty(&self) -> bool {
        self.buf.components().count() == 0
    }

    pub fn push<P: AsRef<Path>>(&mut self, path: P) {
        self.buf.push(path);
    }

    /// Returns the final component of the `FilePath`, if there is one.
    pub fn file_name(&self) -> Option<String> {
        self.buf
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| name.to_string())
    }
}

impl fmt::Display for FilePath {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.buf.display())
    }
}

impl<T: Into<PathBuf>> From<T> for FilePath {
    fn from(s: T) -> FilePath {
        FilePath { buf: s.into() }
    }
}

impl FromStr for FilePath {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<FilePath, &'static str> {
        Ok(FilePath { buf: s.into() })
    }
}
