use std::fmt;
use std::path::PathBuf;

use crate::error::SourceError;

/// Where to load a resource from: a local file or an http(s) URL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceRef {
    Path(PathBuf),
    Url(String),
}

impl SourceRef {
    pub fn parse(s: &str) -> Self {
        if s.starts_with("http://") || s.starts_with("https://") {
            SourceRef::Url(s.to_string())
        } else {
            SourceRef::Path(PathBuf::from(s))
        }
    }

    /// Blocking load. Callers run this off the frame loop.
    pub fn load_bytes(&self) -> Result<Vec<u8>, SourceError> {
        match self {
            SourceRef::Path(path) => std::fs::read(path).map_err(|source| SourceError::Io {
                path: path.display().to_string(),
                source,
            }),
            SourceRef::Url(url) => {
                let http = |source| SourceError::Http {
                    url: url.clone(),
                    source,
                };
                let response = reqwest::blocking::get(url)
                    .and_then(|r| r.error_for_status())
                    .map_err(http)?;
                let bytes = response.bytes().map_err(http)?;
                Ok(bytes.to_vec())
            }
        }
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceRef::Path(path) => write!(f, "{}", path.display()),
            SourceRef::Url(url) => f.write_str(url),
        }
    }
}
