mod parse;
mod target_config;
mod toml;
mod utils_verifier;

pub use {
  parse::{parse_opts, Opts},
  target_config::LoadedConfig,
};
