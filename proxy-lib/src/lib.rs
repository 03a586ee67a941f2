mod constants;
mod dns_message;
mod doh_client;
mod error;
mod globals;
mod http_client;
mod log;
mod proxy;

use crate::{doh_client::DoHClient, error::*, globals::Globals, http_client::HttpClient, log::*, proxy::Proxy};
use futures::{select, FutureExt};
use std::sync::Arc;

pub use constants::{DOH_TARGET_URL, LISTEN_ADDRESS, LISTEN_PORT};
pub use dns_message::{query_type_name, query_type_of};
pub use doh_client::{DoHMethod, DoHOutcome, DoHRequest, DohClientError};
pub use error::DapError;
pub use globals::{ProxyConfig, TargetConfig};

/// entrypoint of the UDP to DoH proxy
/// This binds the UDP listener and spawns the following services
/// - UDP listener serving every query in its own task, with a responder task writing back to the socket
/// - Query logger emitting a tracing event per query-response cycle
///
/// Failure to bind the listening socket is returned immediately.
/// Otherwise this runs until the listener gets down or `term_notify` is notified.
pub async fn entrypoint(
  proxy_config: &ProxyConfig,
  runtime_handle: &tokio::runtime::Handle,
  term_notify: Option<Arc<tokio::sync::Notify>>,
) -> Result<()> {
  info!("Start UDP to DoH proxy");

  // query logger service
  let (query_log_tx, query_logger) = QueryLogger::new();
  let query_logger_service = runtime_handle.spawn_blocking(move || query_logger.start());

  // build global
  let globals = Arc::new(Globals {
    proxy_config: proxy_config.clone(),
    runtime_handle: runtime_handle.clone(),
    term_notify,
    query_log_tx,
  });

  // build http client whose connection pool is shared among all query tasks
  let http_client = HttpClient::new(proxy_config.http_timeout_sec, &proxy_config.http_user_agent)?;
  debug!(
    "HTTP client: timeout = {:?}, user agent = {}",
    http_client.timeout_sec(),
    http_client.user_agent()
  );

  // build doh_client
  let doh_client = Arc::new(DoHClient::new(&globals, http_client));
  info!(
    "DoH target: {} ({})",
    proxy_config.target_config.doh_target_url,
    doh_client.doh_method()
  );

  // bind the socket first so that failure to bind is reported as is
  let proxy = Proxy::new(globals, &proxy_config.listen_address, &doh_client);
  let udp_socket = proxy.bind()?;
  let proxy_service = runtime_handle.spawn(proxy.serve(udp_socket));

  // wait for all future
  let res = select! {
    res = proxy_service.fuse() => {
      warn!("Proxy service is down, or term notified");
      res
    },
    _ = query_logger_service.fuse() => {
      warn!("Query logger service is down");
      return Err(DapError::ProxyServiceError("query logger got down".to_string()));
    }
  };

  match res {
    Ok(res) => res,
    Err(e) => Err(DapError::ProxyServiceError(e.to_string())),
  }
}
