use thiserror::Error;

pub(crate) type DohClientResult<T> = std::result::Result<T, DohClientError>;

/// Describes things that can go wrong in building and sending DoH queries
#[derive(Debug, Error)]
pub enum DohClientError {
  #[error("HttpClient error for DoH client: {0}")]
  HttpClientError(#[from] reqwest::Error),

  #[error("Failed to build DoH url")]
  FailedToBuildDohUrl,
  #[error("Url error: {0}")]
  UrlError(#[from] url::ParseError),
  #[error("Invalid header value: {0}")]
  InvalidHeaderValue(#[from] reqwest::header::InvalidHeaderValue),

  #[error("DoH query error: upstream returned {0}")]
  DoHQueryError(reqwest::StatusCode),
}
