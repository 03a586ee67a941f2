pub use tracing::{debug, error, info, warn};

use crate::{
  constants::{QUERY_LOG_CHANNEL_SIZE, QUERY_LOG_EVENT_NAME},
  dns_message,
};
use crossbeam_channel::{Receiver, Sender};
use std::{net::IpAddr, time::Duration};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Outcome of a single query-response cycle
pub(crate) enum QueryOutcome {
  /// Response relayed to the client
  Success,
  /// Target declined with 403, nothing relayed
  Rejected,
  /// Request could not be built, sent, or answered, nothing relayed
  Failed,
}

impl std::fmt::Display for QueryOutcome {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      QueryOutcome::Success => write!(f, "success"),
      QueryOutcome::Rejected => write!(f, "rejected"),
      QueryOutcome::Failed => write!(f, "failed"),
    }
  }
}

#[derive(Debug)]
/// Logging base for query-response
pub(crate) struct QueryLoggingBase {
  /// Raw DNS query packet
  raw_packet: Vec<u8>,
  /// Source address
  src_addr: IpAddr,
  /// Outcome
  outcome: QueryOutcome,
  /// Destination url
  dst_url: url::Url,
  /// Resolving time
  elapsed: Duration,
}

impl From<(Vec<u8>, IpAddr, QueryOutcome, url::Url, Duration)> for QueryLoggingBase {
  fn from((raw_packet, src_addr, outcome, dst_url, elapsed): (Vec<u8>, IpAddr, QueryOutcome, url::Url, Duration)) -> Self {
    Self {
      raw_packet,
      src_addr,
      outcome,
      dst_url,
      elapsed,
    }
  }
}

impl QueryLoggingBase {
  /// Log the query-response through tracing
  pub(crate) fn log(&self) {
    let span = tracing::info_span!(QUERY_LOG_EVENT_NAME);
    let _guard = span.enter();

    let src = self.src_addr.to_string();
    let summary = dns_message::summarize(&self.raw_packet).unwrap_or_default();
    let id = summary.id;
    let qname = summary.qname;
    let qtype = summary.qtype;
    let outcome = self.outcome.to_string();
    let dst = self.dst_url.to_string();
    let elapsed_micros = self.elapsed.as_micros();

    tracing::event!(
      name: QUERY_LOG_EVENT_NAME,
      tracing::Level::INFO,
      src,
      qname,
      qtype,
      outcome,
      id,
      dst,
      elapsed_micros
    );
  }
}

/// Logger for query-response
pub(crate) struct QueryLogger {
  /// Receiver for message
  query_log_rx: Receiver<QueryLoggingBase>,
}

impl QueryLogger {
  /// Create a new instance of QueryLogger
  pub(crate) fn new() -> (Sender<QueryLoggingBase>, Self) {
    let (query_log_tx, query_log_rx) = crossbeam_channel::bounded(QUERY_LOG_CHANNEL_SIZE);
    (query_log_tx, Self { query_log_rx })
  }

  /// Start the logger service. It blocks on the channel, so run it on a blocking thread.
  /// It returns once every sender is dropped, i.e., the proxy services are down.
  pub(crate) fn start(self) {
    while let Ok(qr_log) = self.query_log_rx.recv() {
      qr_log.log();
    }
    debug!("Query logger is terminated as the channel is closed");
  }
}
