mod doh_client_main;
mod error;
mod request;

pub use doh_client_main::DoHClient;
pub use error::DohClientError;
pub use request::DoHRequest;

use bytes::Bytes;

#[derive(Debug, PartialEq, Eq)]
/// Classified response of the DoH target.
/// Any other status code or a transport failure is returned as `DohClientError`.
pub enum DoHOutcome {
  /// 200 OK with the response DNS message
  Success(Bytes),
  /// 403 Forbidden, the target declined to answer
  SoftReject,
}

#[derive(PartialEq, Eq, Debug, Clone, Copy)]
/// DoH method, GET or POST
pub enum DoHMethod {
  Get,
  Post,
}

impl DoHMethod {
  fn as_str(&self) -> &'static str {
    match self {
      DoHMethod::Get => "GET",
      DoHMethod::Post => "POST",
    }
  }
}

impl std::fmt::Display for DoHMethod {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.as_str())
  }
}
