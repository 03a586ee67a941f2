use crate::{constants::*, log::QueryLoggingBase};
use std::{
  net::{IpAddr, SocketAddr},
  sync::Arc,
};
use tokio::{sync::Notify, time::Duration};
use url::Url;

#[derive(Debug)]
/// Global objects containing shared resources
pub(crate) struct Globals {
  /// proxy configuration
  pub proxy_config: ProxyConfig,

  /// tokio runtime handler
  pub runtime_handle: tokio::runtime::Handle,

  /// notifier for termination at spawned tokio tasks
  pub term_notify: Option<Arc<Notify>>,

  /// query logger sender
  pub query_log_tx: crossbeam_channel::Sender<QueryLoggingBase>,
}

#[derive(PartialEq, Eq, Debug, Clone)]
pub struct ProxyConfig {
  /// listen address, where an IPv6 address is bound as a dual-stack socket
  pub listen_address: SocketAddr,
  /// maximum number of in-flight queries
  pub max_connections: usize,

  // udp proxy setting
  /// UDP buffer size
  pub udp_buffer_size: usize,
  /// UDP channel capacity
  pub udp_channel_capacity: usize,

  /// timeout for HTTP requests to the DoH target
  pub http_timeout_sec: Duration,

  /// http user agent
  pub http_user_agent: String,

  /// doh target settings
  pub target_config: TargetConfig,
}

#[derive(PartialEq, Eq, Debug, Clone)]
/// doh target settings
pub struct TargetConfig {
  pub use_get: bool,
  pub doh_target_url: Url,
}

impl Default for TargetConfig {
  fn default() -> Self {
    Self {
      use_get: false,
      doh_target_url: DOH_TARGET_URL.parse().unwrap(),
    }
  }
}

impl Default for ProxyConfig {
  fn default() -> Self {
    Self {
      listen_address: SocketAddr::new(LISTEN_ADDRESS.parse::<IpAddr>().unwrap(), LISTEN_PORT),
      max_connections: MAX_CONNECTIONS,

      udp_buffer_size: UDP_BUFFER_SIZE,
      udp_channel_capacity: UDP_CHANNEL_CAPACITY,

      http_timeout_sec: Duration::from_secs(HTTP_TIMEOUT_SEC),
      http_user_agent: format!("{}/{}", HTTP_USER_AGENT, env!("CARGO_PKG_VERSION")),

      target_config: TargetConfig::default(),
    }
  }
}
