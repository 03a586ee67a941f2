use crate::{error::*, log::*};
use socket2::{Domain, Protocol, Socket, Type};
use std::net::SocketAddr;
use tokio::net::UdpSocket;

/// Bind UDP socket to the given `SocketAddr`, and returns the UDP socket.
/// An IPv6 socket is bound in dual-stack mode, accepting IPv4-mapped peers as well.
pub(super) fn bind_udp_socket(listening_on: &SocketAddr) -> Result<UdpSocket> {
  let socket = match listening_on {
    SocketAddr::V4(_) => Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?,
    SocketAddr::V6(_) => {
      let socket = Socket::new(Domain::IPV6, Type::DGRAM, Some(Protocol::UDP))?;
      socket.set_only_v6(false)?;
      socket
    }
  };
  socket.set_nonblocking(true)?;
  if let Err(e) = socket.bind(&(*listening_on).into()) {
    error!("bind_udp_socket: {}", e);
    return Err(DapError::Io(e));
  };
  let udp_socket = UdpSocket::from_std(socket.into())?;

  Ok(udp_socket)
}
