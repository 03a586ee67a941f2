use thiserror::Error;

/// Describes things that can go wrong in building the HTTP client
#[derive(Debug, Error)]
pub enum HttpClientError {
  #[error(transparent)]
  ReqwestError(#[from] reqwest::Error),
}
