#[global_allocator]
static ALLOC: mimalloc::MiMalloc = mimalloc::MiMalloc;

mod config;
mod constants;
mod error;
mod log;

use crate::{
  config::{parse_opts, LoadedConfig, Opts},
  log::*,
};
use doh_udp_proxy_lib::{entrypoint, ProxyConfig};

fn main() {
  // Initially load options
  let parsed_opts = match parse_opts() {
    Ok(v) => v,
    Err(e) => {
      eprintln!("Invalid options: {e}");
      std::process::exit(1);
    }
  };
  init_logger(&parsed_opts);

  let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
  runtime_builder.enable_all();
  runtime_builder.thread_name("doh-udp-proxy");
  let runtime = match runtime_builder.build() {
    Ok(v) => v,
    Err(e) => {
      error!("Failed to build runtime: {e}");
      std::process::exit(1);
    }
  };

  runtime.block_on(async {
    if let Err(e) = proxy_service(&parsed_opts, runtime.handle().clone()).await {
      error!("proxy service exited: {e}");
      std::process::exit(1);
    }
  });
}

async fn proxy_service(parsed_opts: &Opts, runtime_handle: tokio::runtime::Handle) -> Result<(), anyhow::Error> {
  info!("Start DNS proxy service");
  let config = match LoadedConfig::new(parsed_opts) {
    Ok(v) => v,
    Err(e) => {
      error!("Invalid toml file: {e}");
      return Err(e);
    }
  };

  let proxy_conf = match (&config).try_into() as Result<ProxyConfig, anyhow::Error> {
    Ok(v) => v,
    Err(e) => {
      error!("Invalid configuration: {e}");
      return Err(e);
    }
  };

  entrypoint(&proxy_conf, &runtime_handle, None)
    .await
    .map_err(|e| anyhow::anyhow!(e))
}
