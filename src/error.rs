use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unsupported grid: {0} (expected 0.5 or 0.25)")]
    UnsupportedGrid(String),

    #[error("failed to download {url} -> {}: {cause}", destination.display())]
    Download {
        url: String,
        destination: PathBuf,
        #[source]
        cause: DownloadCause,
    },

    #[error("cannot decode {}: {message}", path.display())]
    Decode { path: PathBuf, message: String },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),
}

/// Underlying reason of a failed transfer.
#[derive(Debug, Error)]
pub enum DownloadCause {
    #[error("HTTP {0}")]
    Status(u16),

    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("io error: {0}")]
    Io(#[source] std::io::Error),
}

impl Error {
    pub(crate) fn download(
        url: &str,
        destination: impl Into<PathBuf>,
        cause: DownloadCause,
    ) -> Self {
        Error::Download {
            url: url.to_string(),
            destination: destination.into(),
            cause,
        }
    }
}
