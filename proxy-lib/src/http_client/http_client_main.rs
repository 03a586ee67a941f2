use super::error::HttpClientError;
use reqwest::{Client, Request, Response};
use tokio::time::Duration;

#[derive(Debug, Clone)]
/// HttpClient that is a wrapper of reqwest::Client.
/// Cloning shares the underlying connection pool, so it is used concurrently by every query task.
pub struct HttpClient {
  /// client inner
  inner: Client,

  /// timeout for http request
  timeout_sec: Duration,

  /// http user agent
  user_agent: String,
}

impl HttpClient {
  /// Build HttpClient
  pub fn new(timeout_sec: Duration, user_agent: &str) -> Result<Self, HttpClientError> {
    let inner = Client::builder().user_agent(user_agent).timeout(timeout_sec).build()?;
    Ok(Self {
      inner,
      timeout_sec,
      user_agent: user_agent.to_string(),
    })
  }

  /// Get timeout
  pub fn timeout_sec(&self) -> Duration {
    self.timeout_sec
  }

  /// Get user agent
  pub fn user_agent(&self) -> &str {
    &self.user_agent
  }

  /// Execute a prebuilt request
  pub async fn execute(&self, request: Request) -> reqwest::Result<Response> {
    self.inner.execute(request).await
  }
}
