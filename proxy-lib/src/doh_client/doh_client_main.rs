use super::{
  error::{DohClientError, DohClientResult},
  request::DoHRequest,
  DoHMethod, DoHOutcome,
};
use crate::{
  dns_message,
  globals::Globals,
  http_client::HttpClient,
  log::*,
};
use reqwest::StatusCode;
use std::{net::SocketAddr, sync::Arc};
use url::Url;

/// DoH client translating raw UDP DNS queries into DoH requests to a single target
pub struct DoHClient {
  /// http client to make doh query
  http_client: HttpClient,
  /// DoH target url
  target_url: Url,
  /// DoH method
  doh_method: DoHMethod,
  /// Query logging sender
  query_log_tx: crossbeam_channel::Sender<QueryLoggingBase>,
}

impl DoHClient {
  /// Create a new DoH client
  pub(crate) fn new(globals: &Arc<Globals>, http_client: HttpClient) -> Self {
    let target_config = &globals.proxy_config.target_config;
    let doh_method = if target_config.use_get {
      DoHMethod::Get
    } else {
      DoHMethod::Post
    };
    Self {
      http_client,
      target_url: target_config.doh_target_url.clone(),
      doh_method,
      query_log_tx: globals.query_log_tx.clone(),
    }
  }

  /// Get DoH method
  pub fn doh_method(&self) -> DoHMethod {
    self.doh_method
  }

  /// Log DNS message
  fn log_dns_message(&self, raw_packet: &[u8], src_addr: &SocketAddr, outcome: QueryOutcome, start: std::time::Instant) {
    let elapsed = start.elapsed();
    // never block the runtime on a congested logger
    if let Err(e) = self.query_log_tx.try_send(QueryLoggingBase::from((
      raw_packet.to_vec(),
      src_addr.ip().to_canonical(),
      outcome,
      self.target_url.clone(),
      elapsed,
    ))) {
      debug!("Failed to send query log message: {e}")
    }
  }

  /// Make DoH query for a raw DNS query received from `src` on the socket bound to `listening_on`.
  /// The query type is extracted only as a hint, so an unparsable query is still forwarded as-is.
  pub async fn make_doh_query(
    &self,
    packet_buf: &[u8],
    src: &SocketAddr,
    listening_on: &SocketAddr,
  ) -> DohClientResult<DoHOutcome> {
    let start = std::time::Instant::now();

    let query_type = dns_message::query_type_of(packet_buf);
    if query_type.is_none() {
      debug!("No query type found in the query from {src}, forwarding without hint");
    }

    let res = match DoHRequest::build(
      packet_buf,
      query_type,
      src,
      listening_on,
      &self.target_url,
      self.doh_method,
    ) {
      Ok(request) => self.send(request).await,
      Err(e) => Err(e),
    };

    let outcome = match &res {
      Ok(DoHOutcome::Success(_)) => QueryOutcome::Success,
      Ok(DoHOutcome::SoftReject) => QueryOutcome::Rejected,
      Err(_) => QueryOutcome::Failed,
    };
    self.log_dns_message(packet_buf, src, outcome, start);

    res
  }

  /// Send a DoH request and classify the response.
  /// Only 200 carries an answer and 403 is an expected rejection. Anything else is an error.
  pub async fn send(&self, request: DoHRequest) -> DohClientResult<DoHOutcome> {
    debug!("[DoH] {} {}", request.method(), request.url().as_str());
    let response = self.http_client.execute(request.into()).await?;

    match response.status() {
      StatusCode::OK => {
        let body = response.bytes().await?;
        Ok(DoHOutcome::Success(body))
      }
      StatusCode::FORBIDDEN => Ok(DoHOutcome::SoftReject),
      status => Err(DohClientError::DoHQueryError(status)),
    }
  }
}
