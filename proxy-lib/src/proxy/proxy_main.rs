use super::{counter::ConnCounter, socket::bind_udp_socket};
use crate::{doh_client::DoHClient, error::*, globals::Globals, log::*};
use std::{net::SocketAddr, sync::Arc};
use tokio::net::UdpSocket;

/// Proxy object serving UDP queries
#[derive(Clone)]
pub struct Proxy {
  pub(super) globals: Arc<Globals>,
  pub(super) counter: Arc<ConnCounter>,
  pub(super) doh_client: Arc<DoHClient>,
  pub(super) listening_on: SocketAddr,
}

impl Proxy {
  /// Create a new proxy object
  pub(crate) fn new(globals: Arc<Globals>, listening_on: &SocketAddr, doh_client: &Arc<DoHClient>) -> Self {
    Self {
      globals,
      counter: Arc::new(ConnCounter::default()),
      doh_client: doh_client.clone(),
      listening_on: *listening_on,
    }
  }

  /// Bind the listening socket. Failure here is fatal for the proxy.
  pub(crate) fn bind(&self) -> Result<UdpSocket> {
    bind_udp_socket(&self.listening_on)
  }

  /// Serve queries arriving at an already bound socket until the listener gets down or term is notified
  pub(crate) async fn serve(self, udp_socket: UdpSocket) -> Result<()> {
    match self.globals.term_notify.clone() {
      Some(term) => {
        tokio::select! {
          res = self.start_udp_listener(udp_socket) => {
            warn!("UDP listener service got down");
            res
          }
          _ = term.notified() => {
            info!("UDP listener received term signal");
            Ok(())
          }
        }
      }
      None => {
        let res = self.start_udp_listener(udp_socket).await;
        warn!("UDP listener service got down");
        res
      }
    }
  }
}
