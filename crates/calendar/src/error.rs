use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Network failure, timeout or non-2xx status.
    #[error("fetch failed: {0}")]
    Fetch(String),

    #[error("parse failed: {0}")]
    Parse(String),

    /// The page was read but held no usable activity. Not a failure.
    #[error("no activities found on page")]
    NoDataFound,
}

impl From<reqwest::Error> for ScrapeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ScrapeError::Fetch(format!("timed out: {err}"))
        } else {
            ScrapeError::Fetch(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, ScrapeError>;
