use crate::error::*;
use serde::Deserialize;
use std::fs;

#[derive(Deserialize, Debug, Default, PartialEq, Eq, Clone)]
/// Optional config file, every key of which can also be given as a command line option except for tuning knobs
pub struct ConfigToml {
  pub address: Option<String>,
  pub port: Option<u16>,
  pub ip6: Option<bool>,
  pub use_get_method: Option<bool>,
  pub target_url: Option<String>,
  pub max_connections: Option<usize>,
  pub http_timeout_sec: Option<u64>,
  pub user_agent: Option<String>,
}

impl ConfigToml {
  pub fn new(config_file: &str) -> Result<Self> {
    let Ok(config_str) = fs::read_to_string(config_file) else {
      bail!("Failed to read config file");
    };
    Self::parse(&config_str)
  }

  pub fn parse(config_str: &str) -> Result<Self> {
    toml::from_str(config_str).map_err(|e: toml::de::Error| anyhow!("Failed to parse toml config: {:?}", e))
  }
}
