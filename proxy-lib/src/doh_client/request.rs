use super::{
  error::{DohClientError, DohClientResult},
  DoHMethod,
};
use crate::{
  constants::{DOH_CONTENT_TYPE, DOH_QUERY_PARAM_DNS, DOH_QUERY_PARAM_QUERY_TYPE},
  dns_message::query_type_name,
};
use data_encoding::BASE64URL_NOPAD;
use reqwest::{
  header::{self, HeaderMap, HeaderName, HeaderValue},
  Method,
};
use std::net::SocketAddr;
use url::Url;

const X_FORWARDED_FOR: &str = "x-forwarded-for";
const X_REAL_IP: &str = "x-real-ip";
// not a standard header, but some targets expect the media type here
const SCHEME: &str = "scheme";

#[derive(Debug, Clone)]
/// DoH request built from a single UDP query, immutable once built
pub struct DoHRequest {
  method: DoHMethod,
  url: Url,
  headers: HeaderMap,
  /// raw DNS message in POST, none in GET
  body: Option<Vec<u8>>,
}

impl DoHRequest {
  /// Build a DoH request for the raw DNS query received from `src_addr` on the socket bound to `local_addr`.
  /// The query type, if known, is attached as `queryType` parameter regardless of the method.
  pub fn build(
    packet_buf: &[u8],
    query_type: Option<u16>,
    src_addr: &SocketAddr,
    local_addr: &SocketAddr,
    target_url: &Url,
    method: DoHMethod,
  ) -> DohClientResult<Self> {
    if target_url.cannot_be_a_base() {
      return Err(DohClientError::FailedToBuildDohUrl);
    }

    let mut params: Vec<(&str, String)> = Vec::with_capacity(2);
    let body = match method {
      DoHMethod::Get => {
        params.push((DOH_QUERY_PARAM_DNS, BASE64URL_NOPAD.encode(packet_buf)));
        None
      }
      DoHMethod::Post => Some(packet_buf.to_vec()),
    };
    if let Some(name) = query_type.and_then(query_type_name) {
      params.push((DOH_QUERY_PARAM_QUERY_TYPE, name.to_string()));
    }

    let mut url = target_url.clone();
    if !params.is_empty() {
      url.query_pairs_mut().extend_pairs(params);
    }

    // IPv4 clients of a dual-stack socket appear as IPv4-mapped IPv6 addresses
    let src_ip = HeaderValue::from_str(&src_addr.ip().to_canonical().to_string())?;
    let media_type = HeaderValue::from_static(DOH_CONTENT_TYPE);
    let mut headers = HeaderMap::new();
    headers.insert(HeaderName::from_static(X_FORWARDED_FOR), src_ip.clone());
    headers.insert(HeaderName::from_static(X_REAL_IP), src_ip);
    headers.insert(header::HOST, HeaderValue::from_str(&local_addr.to_string())?);
    headers.insert(header::ACCEPT, media_type.clone());
    headers.insert(header::CONTENT_TYPE, media_type.clone());
    headers.insert(HeaderName::from_static(SCHEME), media_type);

    Ok(Self {
      method,
      url,
      headers,
      body,
    })
  }

  /// Get method
  pub fn method(&self) -> DoHMethod {
    self.method
  }

  /// Get url including query parameters
  pub fn url(&self) -> &Url {
    &self.url
  }

  /// Get headers
  pub fn headers(&self) -> &HeaderMap {
    &self.headers
  }

  /// Get body
  pub fn body(&self) -> Option<&[u8]> {
    self.body.as_deref()
  }
}

impl From<DoHRequest> for reqwest::Request {
  fn from(value: DoHRequest) -> Self {
    let method = match value.method {
      DoHMethod::Get => Method::GET,
      DoHMethod::Post => Method::POST,
    };
    let mut request = reqwest::Request::new(method, value.url);
    *request.headers_mut() = value.headers;
    if let Some(body) = value.body {
      *request.body_mut() = Some(body.into());
    }
    request
  }
}
