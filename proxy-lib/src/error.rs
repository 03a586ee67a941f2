use std::net::SocketAddr;
use thiserror::Error;
use tokio::sync::mpsc::error::SendError;

pub type Result<T> = std::result::Result<T, DapError>;

/// Describes things that can go wrong in the proxy
#[derive(Debug, Error)]
pub enum DapError {
  #[error("HttpClient error: {0}")]
  HttpClientError(#[from] crate::http_client::HttpClientError),
  #[error("DoH client error: {0}")]
  DohClientError(#[from] crate::doh_client::DohClientError),

  #[error("Io Error: {0}")]
  Io(#[from] std::io::Error),
  #[error("Udp channel send error")]
  UdpChannelSendError(#[from] SendError<(Vec<u8>, SocketAddr)>),
  #[error("Too many in-flight queries")]
  TooManyConnections,
  #[error("Failed to make DoH query")]
  FailedToMakeDohQuery,
  #[error("Proxy service error: {0}")]
  ProxyServiceError(String),

  #[error(transparent)]
  Other(#[from] anyhow::Error),
}
