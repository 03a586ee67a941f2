// functions to verify the startup arguments as correct
use std::net::{IpAddr, Ipv6Addr, SocketAddr};
use url::Url;

pub(crate) fn verify_ip_addr(arg_val: &str) -> Result<(), String> {
  match arg_val.parse::<IpAddr>() {
    Ok(_addr) => Ok(()),
    Err(_) => Err(format!("Could not parse \"{}\" as a valid ip address.", arg_val)),
  }
}

pub(crate) fn verify_target_url(arg_val: &str) -> Result<(), String> {
  let url = match Url::parse(arg_val) {
    Ok(addr) => addr,
    Err(_) => return Err(format!("Could not parse \"{}\" as a valid url.", arg_val)),
  };

  match url.scheme() {
    "http" => (),
    "https" => (),
    _ => return Err("Invalid scheme".to_string()),
  };

  if url.cannot_be_a_base() {
    return Err("Invalid scheme".to_string());
  }
  Ok(())
}

/// Build the listen socket address.
/// Without `ip6`, only an IPv4 address is accepted. With `ip6`, the IPv4 wildcard is widened to the IPv6 wildcard,
/// which is bound in dual-stack mode.
pub(crate) fn listen_sock_addr(address: &str, port: u16, ip6: bool) -> Result<SocketAddr, String> {
  verify_ip_addr(address)?;
  let ip = address.parse::<IpAddr>().map_err(|e| e.to_string())?;
  let ip = match (ip, ip6) {
    (IpAddr::V6(_), false) => {
      return Err(format!("\"{}\" is an IPv6 address, which requires ip6 option.", address));
    }
    (IpAddr::V4(v4), true) if v4.is_unspecified() => IpAddr::V6(Ipv6Addr::UNSPECIFIED),
    (ip, _) => ip,
  };
  Ok(SocketAddr::new(ip, port))
}
