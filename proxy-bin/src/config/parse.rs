use clap::{Arg, ArgAction, ArgMatches};

/// Parsed options
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Opts {
  /// Configuration file path
  pub config_file_path: Option<String>,
  /// Use GET method instead of POST
  pub get: bool,
  /// Listen on IPv6 (dual-stack) socket
  pub ip6: bool,
  /// DoH target url
  pub doh: Option<String>,
  /// Listen port
  pub port: Option<u16>,
  /// Listen ip address
  pub address: Option<String>,
  /// Query log path
  pub query_log_path: Option<String>,
  /// Query log in json format
  pub json_query_log: bool,
}

fn command() -> clap::Command {
  let _ = include_str!("../../Cargo.toml");
  clap::command!()
    .arg(
      Arg::new("config_file")
        .long("config")
        .short('c')
        .value_name("FILE")
        .help("Configuration file path like ./config.toml. Command line options take precedence over it."),
    )
    .arg(
      Arg::new("get")
        .long("get")
        .action(ArgAction::SetTrue)
        .help("Use GET method for DoH queries instead of POST"),
    )
    .arg(
      Arg::new("ip6")
        .long("ip6")
        .action(ArgAction::SetTrue)
        .help("Listen on an IPv6 socket accepting both IPv6 and IPv4 queries"),
    )
    .arg(
      Arg::new("doh")
        .long("doh")
        .value_name("URL")
        .help("DoH server url [default: https://dns.google/dns-query]"),
    )
    .arg(
      Arg::new("port")
        .long("port")
        .short('p')
        .value_name("PORT")
        .value_parser(clap::value_parser!(u16))
        .help("Listen port [default: 53]"),
    )
    .arg(
      Arg::new("address")
        .long("address")
        .short('a')
        .value_name("IP")
        .help("Listen ip address [default: 0.0.0.0]"),
    )
    .arg(
      Arg::new("query_log")
        .long("query-log")
        .short('q')
        .value_name("PATH")
        .help("Enable query logging. Unless specified, it is disabled."),
    )
    .arg(
      Arg::new("json_query_log")
        .long("json-query-log")
        .short('j')
        .action(ArgAction::SetTrue)
        .requires("query_log")
        .help("Enable query logging in json format. Unless specified, it is recorded in human-readable compact format. Must be used with --query-log option."),
    )
}

/// Parse arg values passed from cli
pub fn parse_opts() -> Result<Opts, anyhow::Error> {
  let matches = command().get_matches();
  Ok(opts_from_matches(&matches))
}

fn opts_from_matches(matches: &ArgMatches) -> Opts {
  Opts {
    config_file_path: matches.get_one::<String>("config_file").cloned(),
    get: matches.get_flag("get"),
    ip6: matches.get_flag("ip6"),
    doh: matches.get_one::<String>("doh").cloned(),
    port: matches.get_one::<u16>("port").copied(),
    address: matches.get_one::<String>("address").cloned(),
    query_log_path: matches.get_one::<String>("query_log").cloned(),
    json_query_log: matches.get_flag("json_query_log"),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn parse(args: &[&str]) -> Result<Opts, clap::Error> {
    let matches = command().try_get_matches_from(std::iter::once("doh-udp-proxy").chain(args.iter().copied()))?;
    Ok(opts_from_matches(&matches))
  }

  #[test]
  fn defaults_are_left_to_config() {
    assert_eq!(parse(&[]).unwrap(), Opts::default());
  }

  #[test]
  fn all_options() {
    let opts = parse(&[
      "--get",
      "--ip6",
      "--doh",
      "https://cloudflare-dns.com/dns-query",
      "--port",
      "5353",
      "--address",
      "::1",
      "-c",
      "config.toml",
    ])
    .unwrap();
    assert!(opts.get);
    assert!(opts.ip6);
    assert_eq!(opts.doh.as_deref(), Some("https://cloudflare-dns.com/dns-query"));
    assert_eq!(opts.port, Some(5353));
    assert_eq!(opts.address.as_deref(), Some("::1"));
    assert_eq!(opts.config_file_path.as_deref(), Some("config.toml"));
  }

  #[test]
  fn invalid_port() {
    assert!(parse(&["--port", "70000"]).is_err());
  }

  #[test]
  fn json_query_log_requires_query_log() {
    assert!(parse(&["--json-query-log"]).is_err());
    let opts = parse(&["--query-log", "query.log", "--json-query-log"]).unwrap();
    assert_eq!(opts.query_log_path.as_deref(), Some("query.log"));
    assert!(opts.json_query_log);
  }
}
