use super::proxy_main::Proxy;
use crate::{doh_client::DoHOutcome, error::*, log::*};
use std::{net::SocketAddr, sync::Arc};
use tokio::{net::UdpSocket, sync::mpsc, time::Duration};

impl Proxy {
  /// Start UDP listener on the bound socket.
  /// Every datagram is served in its own task, and responses are sent out by a single responder task.
  pub async fn start_udp_listener(&self, udp_socket: UdpSocket) -> Result<()> {
    let local_addr = udp_socket.local_addr()?;
    info!("Listening on UDP: {:?}", local_addr);

    // setup a channel for sending out responses
    let (channel_sender, channel_receiver) =
      mpsc::channel::<(Vec<u8>, SocketAddr)>(self.globals.proxy_config.udp_channel_capacity);

    let socket_sender = Arc::new(udp_socket);
    let socket_receiver = socket_sender.clone();

    // create sender task that sends out response given through channel
    self
      .globals
      .runtime_handle
      .spawn(Self::udp_responder_service(socket_sender, channel_receiver));

    // Setup buffer. Datagrams exceeding the buffer are truncated.
    let mut udp_buf = vec![0u8; self.globals.proxy_config.udp_buffer_size];

    // receive from src
    loop {
      let (buf_size, src_addr) = match socket_receiver.recv_from(&mut udp_buf).await {
        Err(e) => {
          error!("Error in UDP listener: {}", e);
          continue;
        }
        Ok(res) => res,
      };

      let packet_buf = udp_buf[..buf_size].to_vec();
      let self_clone = self.clone();
      let channel_sender_clone = channel_sender.clone();
      self.globals.runtime_handle.spawn(async move {
        if let Err(e) = self_clone
          .serve_udp_query(packet_buf, src_addr, local_addr, channel_sender_clone)
          .await
        {
          error!("Failed to handle UDP query from {}: {}", src_addr, e);
        }
      });
    }
  }

  /// Send response to source client.
  /// This is the only writer to the socket, so writes are serialized.
  async fn udp_responder_service(socket_sender: Arc<UdpSocket>, mut channel_receiver: mpsc::Receiver<(Vec<u8>, SocketAddr)>) {
    while let Some((bytes, addr)) = channel_receiver.recv().await {
      match socket_sender.send_to(&bytes, addr).await {
        Ok(len) => {
          debug!("send_to {} with response of {:?} bytes", addr, len);
        }
        Err(e) => {
          error!("send_to error: {:?}", e);
        }
      };
    }
    debug!("Udp responder service got down as all senders are dropped");
  }

  /// Serve UDP query from source client
  async fn serve_udp_query(
    self,
    packet_buf: Vec<u8>,
    src_addr: SocketAddr,
    local_addr: SocketAddr,
    res_sender: mpsc::Sender<(Vec<u8>, SocketAddr)>,
  ) -> Result<()> {
    debug!("handle udp query from {:?}", src_addr);
    let counter = self.counter.clone();
    // over the limit, dropped and logged once by the caller
    if counter.increment() > self.globals.proxy_config.max_connections as isize {
      counter.decrement();
      return Err(DapError::TooManyConnections);
    }

    let res = tokio::time::timeout(
      self.globals.proxy_config.http_timeout_sec + Duration::from_secs(1),
      self.doh_client.make_doh_query(&packet_buf, &src_addr, &local_addr),
    )
    .await;
    counter.decrement(); // decrement counter anyways

    match res {
      Ok(Ok(DoHOutcome::Success(body))) => {
        // send response via channel to the dispatch socket
        res_sender.send((body.to_vec(), src_addr)).await?;
        Ok(())
      }
      Ok(Ok(DoHOutcome::SoftReject)) => {
        debug!("DoH target rejected the query from {:?}", src_addr);
        Ok(())
      }
      Ok(Err(e)) => Err(DapError::DohClientError(e)),
      Err(_) => {
        warn!("DoH query timed out");
        Err(DapError::FailedToMakeDohQuery)
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    doh_client::DoHClient,
    globals::{Globals, ProxyConfig, TargetConfig},
    http_client::HttpClient,
    log::QueryLogger,
  };
  use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode, Uri},
    routing::post,
    Router,
  };
  use tokio::sync::Mutex;
  use url::Url;

  // 29-byte A query for example.com
  const QUERY_EXAMPLE_COM_A: [u8; 29] = [
    0xab, 0xcd, 0x01, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x07, b'e', b'x', b'a', b'm', b'p', b'l', b'e',
    0x03, b'c', b'o', b'm', 0x00, 0x00, 0x01, 0x00, 0x01,
  ];

  // answer for the query above with 93.184.215.14
  const RESPONSE_EXAMPLE_COM_A: [u8; 45] = [
    0xab, 0xcd, 0x81, 0x80, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x07, b'e', b'x', b'a', b'm', b'p', b'l', b'e',
    0x03, b'c', b'o', b'm', 0x00, 0x00, 0x01, 0x00, 0x01, 0xc0, 0x0c, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x0e, 0x10, 0x00,
    0x04, 0x5d, 0xb8, 0xd7, 0x0e,
  ];

  #[derive(Debug)]
  struct Captured {
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
  }

  #[derive(Clone)]
  struct MockUpstream {
    status: StatusCode,
    body: Bytes,
    received: Arc<Mutex<Vec<Captured>>>,
  }

  async fn mock_handler(State(mock): State<MockUpstream>, uri: Uri, headers: HeaderMap, body: Bytes) -> (StatusCode, Bytes) {
    // a query with id 0x0001 is answered slowly
    if body.starts_with(&[0x00, 0x01]) {
      tokio::time::sleep(Duration::from_millis(1500)).await;
    }
    let mut response = mock.body.to_vec();
    if body.len() >= 2 && response.len() >= 2 {
      response[..2].copy_from_slice(&body[..2]);
    }
    mock.received.lock().await.push(Captured { uri, headers, body });
    (mock.status, Bytes::from(response))
  }

  async fn spawn_mock_upstream(status: StatusCode, body: &[u8]) -> (Url, Arc<Mutex<Vec<Captured>>>) {
    let received = Arc::new(Mutex::new(vec![]));
    let mock = MockUpstream {
      status,
      body: Bytes::copy_from_slice(body),
      received: received.clone(),
    };
    let app = Router::new()
      .route("/dns-query", post(mock_handler).get(mock_handler))
      .with_state(mock);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    (Url::parse(&format!("http://{addr}/dns-query")).unwrap(), received)
  }

  fn build_proxy(target_url: Url, use_get: bool) -> Proxy {
    build_proxy_with_limit(target_url, use_get, crate::constants::MAX_CONNECTIONS)
  }

  fn build_proxy_with_limit(target_url: Url, use_get: bool, max_connections: usize) -> Proxy {
    let proxy_config = ProxyConfig {
      listen_address: "127.0.0.1:0".parse().unwrap(),
      max_connections,
      http_timeout_sec: Duration::from_secs(5),
      target_config: TargetConfig {
        use_get,
        doh_target_url: target_url,
      },
      ..Default::default()
    };
    let (query_log_tx, query_logger) = QueryLogger::new();
    tokio::task::spawn_blocking(move || query_logger.start());
    let globals = Arc::new(Globals {
      proxy_config,
      runtime_handle: tokio::runtime::Handle::current(),
      term_notify: None,
      query_log_tx,
    });
    let http_client = HttpClient::new(globals.proxy_config.http_timeout_sec, "doh-udp-proxy-test").unwrap();
    let doh_client = Arc::new(DoHClient::new(&globals, http_client));
    let listening_on = globals.proxy_config.listen_address;
    Proxy::new(globals, &listening_on, &doh_client)
  }

  /// Bind the proxy and serve it in background, returning its address
  fn spawn_proxy(proxy: Proxy) -> SocketAddr {
    let udp_socket = proxy.bind().unwrap();
    let local_addr = udp_socket.local_addr().unwrap();
    tokio::spawn(proxy.serve(udp_socket));
    local_addr
  }

  async fn udp_client() -> UdpSocket {
    UdpSocket::bind("127.0.0.1:0").await.unwrap()
  }

  async fn recv_reply(client: &UdpSocket, wait: Duration) -> Option<Vec<u8>> {
    let mut buf = vec![0u8; 4096];
    match tokio::time::timeout(wait, client.recv_from(&mut buf)).await {
      Ok(Ok((len, _))) => Some(buf[..len].to_vec()),
      _ => None,
    }
  }

  #[tokio::test]
  async fn post_query_is_relayed_end_to_end() {
    let (target_url, received) = spawn_mock_upstream(StatusCode::OK, &RESPONSE_EXAMPLE_COM_A).await;
    let proxy_addr = spawn_proxy(build_proxy(target_url, false));

    let client = udp_client().await;
    client.send_to(&QUERY_EXAMPLE_COM_A, proxy_addr).await.unwrap();
    let reply = recv_reply(&client, Duration::from_secs(5)).await.unwrap();
    assert_eq!(reply, RESPONSE_EXAMPLE_COM_A.to_vec());

    let received = received.lock().await;
    assert_eq!(received.len(), 1);
    let captured = &received[0];
    assert_eq!(captured.body.len(), 29);
    assert_eq!(captured.body.as_ref(), QUERY_EXAMPLE_COM_A.as_slice());
    assert_eq!(captured.uri.query(), Some("queryType=A"));
    assert_eq!(captured.headers.get("x-forwarded-for").unwrap(), "127.0.0.1");
    assert_eq!(captured.headers.get("x-real-ip").unwrap(), "127.0.0.1");
    assert_eq!(captured.headers.get("content-type").unwrap(), "application/dns-message");
    assert_eq!(captured.headers.get("accept").unwrap(), "application/dns-message");
    assert_eq!(captured.headers.get("scheme").unwrap(), "application/dns-message");
    assert_eq!(captured.headers.get("host").unwrap(), proxy_addr.to_string().as_str());
  }

  #[tokio::test]
  async fn get_query_is_relayed_end_to_end() {
    let (target_url, received) = spawn_mock_upstream(StatusCode::OK, &RESPONSE_EXAMPLE_COM_A).await;
    let proxy_addr = spawn_proxy(build_proxy(target_url, true));

    let client = udp_client().await;
    client.send_to(&QUERY_EXAMPLE_COM_A, proxy_addr).await.unwrap();
    let reply = recv_reply(&client, Duration::from_secs(5)).await.unwrap();
    assert_eq!(reply, RESPONSE_EXAMPLE_COM_A.to_vec());

    let received = received.lock().await;
    assert_eq!(received.len(), 1);
    assert!(received[0].body.is_empty());
    let expected_query = format!(
      "dns={}&queryType=A",
      data_encoding::BASE64URL_NOPAD.encode(&QUERY_EXAMPLE_COM_A)
    );
    assert_eq!(received[0].uri.query(), Some(expected_query.as_str()));
  }

  #[tokio::test]
  async fn forbidden_is_dropped_silently() {
    let (target_url, received) = spawn_mock_upstream(StatusCode::FORBIDDEN, &RESPONSE_EXAMPLE_COM_A).await;
    let proxy = build_proxy(target_url, false);
    let (res_sender, mut res_receiver) = mpsc::channel(8);

    let src: SocketAddr = "127.0.0.1:40000".parse().unwrap();
    let local: SocketAddr = "127.0.0.1:53".parse().unwrap();
    let res = proxy
      .clone()
      .serve_udp_query(QUERY_EXAMPLE_COM_A.to_vec(), src, local, res_sender)
      .await;

    assert!(res.is_ok());
    assert!(res_receiver.recv().await.is_none());
    assert_eq!(received.lock().await.len(), 1);
    assert_eq!(proxy.counter.get_current(), 0);
  }

  #[tokio::test]
  async fn other_status_is_a_failure() {
    let (target_url, _received) = spawn_mock_upstream(StatusCode::INTERNAL_SERVER_ERROR, &[]).await;
    let proxy = build_proxy(target_url, false);
    let (res_sender, mut res_receiver) = mpsc::channel(8);

    let src: SocketAddr = "127.0.0.1:40000".parse().unwrap();
    let local: SocketAddr = "127.0.0.1:53".parse().unwrap();
    let res = proxy
      .clone()
      .serve_udp_query(QUERY_EXAMPLE_COM_A.to_vec(), src, local, res_sender)
      .await;

    assert!(matches!(res, Err(DapError::DohClientError(_))));
    assert!(res_receiver.recv().await.is_none());
    assert_eq!(proxy.counter.get_current(), 0);
  }

  #[tokio::test]
  async fn forbidden_sends_no_datagram() {
    let (target_url, received) = spawn_mock_upstream(StatusCode::FORBIDDEN, &RESPONSE_EXAMPLE_COM_A).await;
    let proxy_addr = spawn_proxy(build_proxy(target_url, false));

    let client = udp_client().await;
    client.send_to(&QUERY_EXAMPLE_COM_A, proxy_addr).await.unwrap();
    assert!(recv_reply(&client, Duration::from_millis(700)).await.is_none());
    assert_eq!(received.lock().await.len(), 1);
  }

  #[tokio::test]
  async fn slow_upstream_does_not_block_other_clients() {
    let (target_url, _received) = spawn_mock_upstream(StatusCode::OK, &RESPONSE_EXAMPLE_COM_A).await;
    let proxy_addr = spawn_proxy(build_proxy(target_url, false));

    let mut slow_query = QUERY_EXAMPLE_COM_A;
    slow_query[..2].copy_from_slice(&[0x00, 0x01]);
    let slow_client = udp_client().await;
    let fast_client = udp_client().await;

    slow_client.send_to(&slow_query, proxy_addr).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    fast_client.send_to(&QUERY_EXAMPLE_COM_A, proxy_addr).await.unwrap();

    // the fast one is answered while the slow one is still waiting for the upstream
    let fast_reply = recv_reply(&fast_client, Duration::from_millis(1000)).await.unwrap();
    assert_eq!(&fast_reply[..2], &[0xab, 0xcd]);
    let slow_reply = recv_reply(&slow_client, Duration::from_secs(5)).await.unwrap();
    assert_eq!(&slow_reply[..2], &[0x00, 0x01]);
  }

  #[tokio::test]
  async fn queries_over_limit_are_dropped() {
    let (target_url, received) = spawn_mock_upstream(StatusCode::OK, &RESPONSE_EXAMPLE_COM_A).await;
    let proxy = build_proxy_with_limit(target_url, false, 1);
    let counter = proxy.counter.clone();
    let proxy_addr = spawn_proxy(proxy);

    // occupies the only slot for 1.5 sec
    let mut slow_query = QUERY_EXAMPLE_COM_A;
    slow_query[..2].copy_from_slice(&[0x00, 0x01]);
    let slow_client = udp_client().await;
    let dropped_client = udp_client().await;

    slow_client.send_to(&slow_query, proxy_addr).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    dropped_client.send_to(&QUERY_EXAMPLE_COM_A, proxy_addr).await.unwrap();

    assert!(recv_reply(&dropped_client, Duration::from_millis(700)).await.is_none());
    let slow_reply = recv_reply(&slow_client, Duration::from_secs(5)).await.unwrap();
    assert_eq!(&slow_reply[..2], &[0x00, 0x01]);

    assert_eq!(received.lock().await.len(), 1);
    assert_eq!(counter.get_current(), 0);
  }

  #[tokio::test]
  async fn datagram_over_buffer_size_is_truncated() {
    let (target_url, received) = spawn_mock_upstream(StatusCode::OK, &RESPONSE_EXAMPLE_COM_A).await;
    let proxy_addr = spawn_proxy(build_proxy(target_url, false));

    let mut oversized = QUERY_EXAMPLE_COM_A.to_vec();
    oversized.extend((0..700 - QUERY_EXAMPLE_COM_A.len()).map(|i| i as u8));
    let client = udp_client().await;
    client.send_to(&oversized, proxy_addr).await.unwrap();
    let reply = recv_reply(&client, Duration::from_secs(5)).await.unwrap();
    assert_eq!(reply, RESPONSE_EXAMPLE_COM_A.to_vec());

    let received = received.lock().await;
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].body.len(), crate::constants::UDP_BUFFER_SIZE);
    assert_eq!(received[0].body.as_ref(), &oversized[..crate::constants::UDP_BUFFER_SIZE]);
  }

  #[tokio::test]
  async fn unreachable_upstream_is_a_failure() {
    // bind and drop to get a closed port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let target_url = Url::parse(&format!("http://{addr}/dns-query")).unwrap();
    let proxy = build_proxy(target_url, false);
    let (res_sender, _res_receiver) = mpsc::channel(8);

    let src: SocketAddr = "127.0.0.1:40000".parse().unwrap();
    let local: SocketAddr = "127.0.0.1:53".parse().unwrap();
    let res = proxy
      .serve_udp_query(QUERY_EXAMPLE_COM_A.to_vec(), src, local, res_sender)
      .await;
    assert!(matches!(res, Err(DapError::DohClientError(_))));
  }
}
