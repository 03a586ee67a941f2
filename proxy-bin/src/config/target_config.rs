use super::{parse::Opts, toml::ConfigToml, utils_verifier::*};
use crate::{error::*, log::*};
use doh_udp_proxy_lib::{ProxyConfig, DOH_TARGET_URL, LISTEN_ADDRESS, LISTEN_PORT};
use tokio::time::Duration;

#[derive(PartialEq, Eq, Clone, Debug)]
/// Command line options layered on top of the optional config toml
pub struct LoadedConfig {
  /// command line options
  pub opts: Opts,
  /// config toml, empty if not given
  pub config_toml: ConfigToml,
}

impl LoadedConfig {
  /// load config toml if specified in command line options
  pub fn new(opts: &Opts) -> anyhow::Result<Self> {
    let config_toml = match &opts.config_file_path {
      Some(path) => ConfigToml::new(path)?,
      None => ConfigToml::default(),
    };
    Ok(Self {
      opts: opts.clone(),
      config_toml,
    })
  }
}

impl TryInto<ProxyConfig> for &LoadedConfig {
  type Error = anyhow::Error;

  fn try_into(self) -> Result<ProxyConfig, Self::Error> {
    let mut proxy_config = ProxyConfig::default();
    let opts = &self.opts;
    let toml = &self.config_toml;

    /////////////////////////////
    // listen address
    let address = opts
      .address
      .as_deref()
      .or(toml.address.as_deref())
      .unwrap_or(LISTEN_ADDRESS);
    let port = opts.port.or(toml.port).unwrap_or(LISTEN_PORT);
    let ip6 = opts.ip6 || toml.ip6.unwrap_or(false);
    proxy_config.listen_address = match listen_sock_addr(address, port, ip6) {
      Ok(addr) => addr,
      Err(e) => bail!("Invalid listen address: {e}"),
    };
    info!("Listen address: {}", proxy_config.listen_address);

    /////////////////////////////
    // DoH target and method
    let target_url = opts.doh.as_deref().or(toml.target_url.as_deref()).unwrap_or(DOH_TARGET_URL);
    if let Err(e) = verify_target_url(target_url) {
      bail!("Invalid target url: {e}");
    }
    proxy_config.target_config.doh_target_url = url::Url::parse(target_url)?;
    info!("Target DoH resolver: {}", proxy_config.target_config.doh_target_url);

    if opts.get || toml.use_get_method.unwrap_or(false) {
      proxy_config.target_config.use_get = true;
      info!("Use GET method for query");
    }

    /////////////////////////////
    // tuning knobs
    if let Some(val) = toml.max_connections {
      ensure!(val > 0, "max_connections must be positive");
      proxy_config.max_connections = val;
    }
    info!("Max in-flight queries: {}", proxy_config.max_connections);

    if let Some(val) = toml.http_timeout_sec {
      ensure!(val > 0, "http_timeout_sec must be positive");
      proxy_config.http_timeout_sec = Duration::from_secs(val);
    }
    info!("HTTP timeout: {:?}", proxy_config.http_timeout_sec);

    /////////////////////////////
    // User agent
    if let Some(val) = &toml.user_agent {
      proxy_config.http_user_agent.clone_from(val);
    }

    Ok(proxy_config)
  }
}
