// Copyright 2022 Matthew Ingwersen.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you
// may not use this file except in compliance with the License. You may
// obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or
// implied. See the License for the specific language governing
// permissions and limitations under the License.

//! Implementation of the Tokio I/O provider.

// NOTE: In this provider, I/O error handling is generally to exit the
// task. The run_with_respawning function acts as a supervisor that will
// respawn the TCP acceptor and UDP receivers, after a delay, if they
// exit with an error or a panic.

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, error};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream, UdpSocket};
use tokio::sync::{broadcast, mpsc};
use tokio::time::timeout;

use crate::message::MAX_TCP_MESSAGE_SIZE;
use crate::server::{ReceivedInfo, Response, Server, Transport};

/// A Tokio I/O provider.
///
/// This provider uses asynchronous I/O and runs the server by spawning
/// tasks on a Tokio runtime: one task per received UDP datagram and
/// one task per accepted TCP connection.
///
/// The `TokioIoProvider` supports graceful shutdown. To initiate a
/// graceful shutdown, use the [`TokioShutdownController`] returned by
/// [`TokioIoProvider::start`].
pub struct TokioIoProvider {
    tcp_listeners: Vec<TcpListener>,
    udp_sockets: Vec<UdpSocket>,
    tcp_idle_timeout: Duration,
}

impl TokioIoProvider {
    /// Creates a new `TokioIoProvider`. This call binds TCP and UDP
    /// sockets in preparation, but does not start the server. This
    /// function requires that the Tokio runtime be active.
    pub async fn bind<T, U>(tcp_addrs: T, udp_addrs: U) -> io::Result<Self>
    where
        T: IntoIterator<Item = SocketAddr>,
        U: IntoIterator<Item = SocketAddr>,
    {
        let mut tcp_listeners = Vec::new();
        for addr in tcp_addrs {
            let listener = TcpListener::bind(addr).await?;
            tcp_listeners.push(listener);
        }

        let mut udp_sockets = Vec::new();
        for addr in udp_addrs {
            let socket = UdpSocket::bind(addr).await?;
            udp_sockets.push(socket);
        }

        Ok(Self {
            tcp_listeners,
            udp_sockets,
            tcp_idle_timeout: super::DEFAULT_TCP_IDLE_TIMEOUT,
        })
    }

    /// Sets how long a TCP connection may be idle before it is closed.
    pub fn set_tcp_idle_timeout(&mut self, tcp_idle_timeout: Duration) {
        self.tcp_idle_timeout = tcp_idle_timeout;
    }

    /// Returns the local addresses of the bound sockets, TCP listeners
    /// first. This is how callers learn the ports chosen when binding
    /// to port 0.
    pub fn local_addrs(&self) -> io::Result<Vec<(Transport, SocketAddr)>> {
        let mut addrs = Vec::new();
        for listener in &self.tcp_listeners {
            addrs.push((Transport::Tcp, listener.local_addr()?));
        }
        for socket in &self.udp_sockets {
            addrs.push((Transport::Udp, socket.local_addr()?));
        }
        Ok(addrs)
    }

    /// Starts the server on the active Tokio runtime.
    ///
    /// This spawns tasks on the active Tokio runtime and then returns
    /// a [`TokioShutdownController`] that can be used to shut down the
    /// tasks at a later time. (The [`TokioShutdownController`] must be
    /// held as long as the server should be running, since dropping it
    /// will trigger shutdown.)
    pub fn start(self, server: &Arc<Server>) -> TokioShutdownController {
        let (shutdown_controller, shutdown_handle) = make_shutdown_channels();

        // Start the TCP tasks.
        for tcp_listener in self.tcp_listeners {
            let tcp = TcpTask {
                listener: Arc::new(tcp_listener),
                idle_timeout: self.tcp_idle_timeout,
            };
            tokio::spawn(run_with_respawning(
                run_tcp_listener,
                shutdown_handle.clone(),
                server.clone(),
                tcp,
            ));
        }

        // Start the UDP tasks.
        for udp_socket in self.udp_sockets {
            tokio::spawn(run_with_respawning(
                run_udp_receiver,
                shutdown_handle.clone(),
                server.clone(),
                Arc::new(udp_socket),
            ));
        }

        shutdown_controller
    }
}

/// How long to wait between respawns of a task. This is to prevent
/// tasks that crash immediately from using up significant CPU time.
const TASK_RESPAWN_DELAY: Duration = Duration::from_secs(1);

/// Runs a Tokio task, respawning it if it returns an I/O error, is
/// cancelled, or panics.
async fn run_with_respawning<F, G, S>(
    f: F,
    mut shutdown: ShutdownHandle,
    server: Arc<Server>,
    socket: S,
) where
    F: Fn(ShutdownHandle, Arc<Server>, S) -> G,
    G: Future<Output = io::Result<()>> + Send + 'static,
    S: Clone,
{
    loop {
        let last_spawn_time = Instant::now();
        match tokio::spawn(f(shutdown.clone(), server.clone(), socket.clone())).await {
            Ok(Ok(())) => return,
            Ok(Err(e)) => log_io_error(e),
            Err(_) => error!("A listener task panicked; respawning it"),
        }

        // If necessary, wait before respawning, but receive shutdown
        // requests immediately.
        let since_last_spawn = Instant::now().duration_since(last_spawn_time);
        if let Some(duration_to_wait) = TASK_RESPAWN_DELAY.checked_sub(since_last_spawn) {
            tokio::select! {
                _ = shutdown.request_receiver.recv() => return,
                _ = tokio::time::sleep(duration_to_wait) => (),
            }
        }
    }
}

////////////////////////////////////////////////////////////////////////
// TCP                                                                //
////////////////////////////////////////////////////////////////////////

/// What the TCP accept loop needs to (re)start.
#[derive(Clone)]
struct TcpTask {
    listener: Arc<TcpListener>,
    idle_timeout: Duration,
}

/// The TCP listener/accept loop.
async fn run_tcp_listener(
    mut shutdown: ShutdownHandle,
    server: Arc<Server>,
    tcp: TcpTask,
) -> io::Result<()> {
    loop {
        let (client, client_socket_addr) = tokio::select! {
            _ = shutdown.request_receiver.recv() => return Ok(()),
            res = tcp.listener.accept() => res?,
        };
        let shutdown = shutdown.clone();
        let server = server.clone();
        let idle_timeout = tcp.idle_timeout;
        tokio::spawn(async move {
            if let Err(e) =
                handle_tcp_connection(shutdown, &server, client, client_socket_addr, idle_timeout)
                    .await
            {
                log_io_error(e);
            }
        });
    }
}

/// Handles a TCP connection. Messages are answered one at a time, in
/// the order received.
async fn handle_tcp_connection(
    mut shutdown: ShutdownHandle,
    server: &Server,
    mut socket: TcpStream,
    source: SocketAddr,
    idle_timeout: Duration,
) -> io::Result<()> {
    let mut received_buf = vec![0; 2 + MAX_TCP_MESSAGE_SIZE];
    let mut response_buf = vec![0; 2 + MAX_TCP_MESSAGE_SIZE];
    let mut n_read = 0;

    loop {
        let received_len = tokio::select! {
            _ = shutdown.request_receiver.recv() => return Ok(()),
            res = timeout(
                idle_timeout,
                read_message_over_tcp(&mut socket, &mut received_buf, &mut n_read),
            ) => match res {
                Ok(Ok(Some(len))) => len,
                Ok(Ok(None)) => return Ok(()), // The connection was closed.
                Ok(Err(e)) => return Err(e),   // There was an I/O error.
                Err(_) => {
                    debug!("Closing idle TCP connection from {}", source);
                    return Ok(());
                }
            },
        };

        // Process the DNS message and write the response, if any.
        match server.handle_message(
            &received_buf[2..received_len + 2],
            ReceivedInfo::new(source, Transport::Tcp),
            &mut response_buf[2..],
        ) {
            Response::Single(response_len) => {
                response_buf[0..2].copy_from_slice(&u16::to_be_bytes(response_len as u16));
                socket.write_all(&response_buf[0..2 + response_len]).await?;
            }

            // Response::None occurs when something was really
            // malformed, so close the connection.
            Response::None => return Ok(()),
        };

        // Any leftover data is the start of the next message.
        if n_read > received_len + 2 {
            received_buf.copy_within(received_len + 2..n_read, 0);
            n_read -= received_len + 2;
        } else {
            n_read = 0;
        }
    }
}

/// Reads a single DNS message (including the initial two-octet length
/// field) from a [`TcpStream`].
///
/// This function assumes that `*n_read` octets have already been read
/// into the buffer. It updates `*n_read` as it reads more data. It may
/// read data past the end of the message. When this function returns,
/// `*n_read` reflects the number of octets read into the buffer
/// (including the initial two-octet length field and any data read
/// after the end of the message), while the returned `usize` (if any)
/// is the size of the message itself (not including the initial length
/// field).
///
/// If this function returns `Ok(None)`, then the connection was closed
/// before a whole message could be read.
async fn read_message_over_tcp(
    socket: &mut TcpStream,
    buf: &mut [u8],
    n_read: &mut usize,
) -> io::Result<Option<usize>> {
    loop {
        if *n_read >= 2 {
            let received_len = u16::from_be_bytes([buf[0], buf[1]]) as usize;
            if *n_read >= received_len + 2 {
                return Ok(Some(received_len));
            }
        }

        let n_read_this_time = socket.read(&mut buf[*n_read..]).await?;

        // If we read nothing, then the client closed their side of
        // the connection.
        if n_read_this_time == 0 {
            return Ok(None);
        }
        *n_read += n_read_this_time;
    }
}

////////////////////////////////////////////////////////////////////////
// UDP                                                                //
////////////////////////////////////////////////////////////////////////

/// The UDP receiver loop.
async fn run_udp_receiver(
    mut shutdown: ShutdownHandle,
    server: Arc<Server>,
    socket: Arc<UdpSocket>,
) -> io::Result<()> {
    let udp_payload_size = server.edns_udp_payload_size() as usize;

    loop {
        // Queries are not bound by our payload size, only responses
        // are, so any datagram is received whole.
        let mut received_buf = vec![0; MAX_TCP_MESSAGE_SIZE];
        let mut response_buf = vec![0; udp_payload_size];

        // Receive a DNS message (or a shutdown request).
        let (received_len, src) = tokio::select! {
            _ = shutdown.request_receiver.recv() => return Ok(()),
            res = socket.recv_from(&mut received_buf) => res?,
        };

        // In a new Tokio task, process the DNS message and send the
        // response (if any).
        let shutdown = shutdown.wait_sender.clone();
        let server = server.clone();
        let socket = socket.clone();
        tokio::spawn(async move {
            match server.handle_message(
                &received_buf[0..received_len],
                ReceivedInfo::new(src, Transport::Udp),
                &mut response_buf,
            ) {
                Response::Single(response_len) => {
                    if let Err(e) = socket.send_to(&response_buf[0..response_len], src).await {
                        log_io_error(e);
                    }
                }
                Response::None => (),
            }

            // This ensures that the shutdown handle is moved into the
            // new task.
            drop(shutdown);
        });
    }
}

////////////////////////////////////////////////////////////////////////
// SHUTDOWN                                                           //
////////////////////////////////////////////////////////////////////////

/// Controls the shutdown of a server's Tokio tasks.
///
/// This type is used to shut down the Tokio tasks spawned by
/// [`TokioIoProvider::start`]. Use [`TokioShutdownController::shut_down`]
/// to initiate shutdown and wait, for at most a grace period, for its
/// completion. Dropping the controller will also trigger shutdown (but
/// will not wait for it to complete).
#[must_use]
pub struct TokioShutdownController {
    request_sender: broadcast::Sender<()>,
    wait_receiver: mpsc::Receiver<()>,
}

impl TokioShutdownController {
    /// Requests that running server tasks shut down, and then waits up
    /// to `grace` for them to terminate. Returns `true` if every task
    /// finished in time.
    pub async fn shut_down(mut self, grace: Duration) -> bool {
        drop(self.request_sender);
        timeout(grace, self.wait_receiver.recv()).await.is_ok()
    }
}

/// A handle held by tasks to interact with the graceful shutdown
/// mechanism.
///
/// This type has two roles:
///
/// 1. It enables tasks to listen for graceful shutdown signals. This
///    is done by waiting for all senders attached to `request_receiver`
///    to close.
/// 2. It prevents graceful shutdown from completing until it is
///    dropped. This is done by holding `wait_sender`. All server tasks
///    therefore own a `ShutdownHandle` (or at least the `wait_sender`
///    component).
struct ShutdownHandle {
    request_receiver: broadcast::Receiver<()>,
    wait_sender: mpsc::Sender<()>,
}

impl Clone for ShutdownHandle {
    fn clone(&self) -> Self {
        // A resubscribed receiver misses values already queued, but the
        // shutdown signal is all senders being dropped, not a value.
        ShutdownHandle {
            request_receiver: self.request_receiver.resubscribe(),
            wait_sender: self.wait_sender.clone(),
        }
    }
}

/// Produces a [`TokioShutdownController`] and an initial
/// [`ShutdownHandle`] connected to it.
fn make_shutdown_channels() -> (TokioShutdownController, ShutdownHandle) {
    let (request_sender, request_receiver) = broadcast::channel(1);
    let (wait_sender, wait_receiver) = mpsc::channel(1);
    let controller = TokioShutdownController {
        request_sender,
        wait_receiver,
    };
    let handle = ShutdownHandle {
        request_receiver,
        wait_sender,
    };
    (controller, handle)
}

/// Logs an I/O error.
fn log_io_error(e: io::Error) {
    error!("I/O error: {e}");
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};

    use super::*;
    use crate::message::{Question, Reader, Writer};
    use crate::name::Name;
    use crate::rr::{Class, Type};
    use crate::zone::{Zone, ZoneStore};
    use crate::zone_file::Parser;

    const ZONE: &str = "\
$TTL 300
@    SOA ns1 hostmaster 1 3600 900 604800 300
$SCOPE 127.0.0.2/32
www  A   10.0.0.1
$SCOPE default
www  A   93.184.216.34
";

    fn server(text: &str) -> Arc<Server> {
        let origin: Name = "example.com.".parse().unwrap();
        let mut zone = Zone::new(origin.clone(), Class::IN);
        for parsed in Parser::new(text.as_bytes()).with_origin(origin) {
            let parsed = parsed.unwrap();
            zone.add(&parsed.record, parsed.scope, parsed.block).unwrap();
        }
        let mut store = ZoneStore::new();
        store.insert(zone).unwrap();
        Arc::new(Server::new(Arc::new(store)))
    }

    async fn start(server: &Arc<Server>) -> (TokioShutdownController, SocketAddr, SocketAddr) {
        let local: SocketAddr = (Ipv4Addr::LOCALHOST, 0).into();
        let provider = TokioIoProvider::bind([local], [local]).await.unwrap();
        let addrs = provider.local_addrs().unwrap();
        assert_eq!(addrs[0].0, Transport::Tcp);
        assert_eq!(addrs[1].0, Transport::Udp);
        let (tcp_addr, udp_addr) = (addrs[0].1, addrs[1].1);
        (provider.start(server), tcp_addr, udp_addr)
    }

    fn query(id: u16, qname: &str, rr_type: Type) -> Vec<u8> {
        let mut buf = vec![0; 512];
        let mut writer = Writer::new(&mut buf, 512).unwrap();
        writer.set_id(id);
        writer
            .add_question(&Question {
                qname: qname.parse().unwrap(),
                qtype: rr_type.into(),
                qclass: Class::IN.into(),
            })
            .unwrap();
        let len = writer.finish();
        buf.truncate(len);
        buf
    }

    /// Returns the ID, the TC bit, and the A records of a response.
    fn read_response(message: &[u8]) -> (u16, bool, Vec<Ipv4Addr>) {
        let mut reader = Reader::try_from(message).unwrap();
        reader.read_question().unwrap();
        let mut addresses = Vec::new();
        for _ in 0..reader.ancount() {
            let rr = reader.read_rr().unwrap();
            if rr.rr_type == Type::A {
                let octets: [u8; 4] = rr.rdata.try_into().unwrap();
                addresses.push(Ipv4Addr::from(octets));
            }
        }
        (reader.id(), reader.tc(), addresses)
    }

    async fn udp_exchange(client_ip: IpAddr, server_addr: SocketAddr, message: &[u8]) -> Vec<u8> {
        let socket = UdpSocket::bind((client_ip, 0)).await.unwrap();
        socket.send_to(message, server_addr).await.unwrap();
        let mut buf = vec![0; 4096];
        let (len, from) = timeout(Duration::from_secs(5), socket.recv_from(&mut buf))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(from, server_addr);
        buf.truncate(len);
        buf
    }

    async fn tcp_send(stream: &mut TcpStream, message: &[u8]) {
        stream
            .write_all(&(message.len() as u16).to_be_bytes())
            .await
            .unwrap();
        stream.write_all(message).await.unwrap();
    }

    async fn tcp_receive(stream: &mut TcpStream) -> Vec<u8> {
        let mut len = [0; 2];
        stream.read_exact(&mut len).await.unwrap();
        let mut buf = vec![0; u16::from_be_bytes(len) as usize];
        stream.read_exact(&mut buf).await.unwrap();
        buf
    }

    // The whole of 127.0.0.0/8 is routed to the loopback interface on
    // Linux, so clients can bind to distinct source addresses there.
    #[cfg(target_os = "linux")]
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_udp_clients_get_their_own_answers() {
        let server = server(ZONE);
        let (controller, _, udp_addr) = start(&server).await;

        let mut tasks = Vec::new();
        for i in 0..32u16 {
            let client_ip = if i % 2 == 0 {
                IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
            } else {
                IpAddr::V4(Ipv4Addr::new(127, 0, 0, 2))
            };
            tasks.push(tokio::spawn(async move {
                let response =
                    udp_exchange(client_ip, udp_addr, &query(i, "www.example.com.", Type::A))
                        .await;
                (i, client_ip, read_response(&response))
            }));
        }
        for task in tasks {
            let (i, client_ip, (id, tc, addresses)) = task.await.unwrap();
            assert_eq!(id, i);
            assert!(!tc);
            let expected = if client_ip == IpAddr::V4(Ipv4Addr::new(127, 0, 0, 2)) {
                Ipv4Addr::new(10, 0, 0, 1)
            } else {
                Ipv4Addr::new(93, 184, 216, 34)
            };
            assert_eq!(addresses, [expected]);
        }

        assert!(controller.shut_down(Duration::from_secs(5)).await);
    }

    #[tokio::test]
    async fn tcp_carries_answers_that_udp_truncates() {
        let mut text = String::from("@ SOA ns1 hostmaster 1 3600 900 604800 300\n");
        for i in 1..=40 {
            text.push_str(&format!("big A 192.0.2.{}\n", i));
        }
        let server = server(&text);
        let (controller, tcp_addr, udp_addr) = start(&server).await;
        let message = query(7, "big.example.com.", Type::A);

        let response = udp_exchange(Ipv4Addr::LOCALHOST.into(), udp_addr, &message).await;
        let (id, tc, addresses) = read_response(&response);
        assert_eq!(id, 7);
        assert!(tc);
        assert!(response.len() <= 512);
        assert!(addresses.len() < 40);

        let mut stream = TcpStream::connect(tcp_addr).await.unwrap();
        tcp_send(&mut stream, &message).await;
        let (id, tc, addresses) = read_response(&tcp_receive(&mut stream).await);
        assert_eq!(id, 7);
        assert!(!tc);
        assert_eq!(addresses.len(), 40);

        drop(stream);
        assert!(controller.shut_down(Duration::from_secs(5)).await);
    }

    #[tokio::test]
    async fn udp_queries_larger_than_the_payload_size_are_answered() {
        let server = server(ZONE);
        let (controller, _, udp_addr) = start(&server).await;

        // Pad the query with a 1,300-octet TXT record in the additional
        // section, past the default payload size of 1,232 octets.
        let mut message = query(9, "www.example.com.", Type::A);
        message[10..12].copy_from_slice(&1u16.to_be_bytes());
        message.extend_from_slice(&[0, 0, 16, 0, 1, 0, 0, 0, 0]);
        message.extend_from_slice(&1300u16.to_be_bytes());
        message.extend_from_slice(&[0; 1300]);
        assert!(message.len() > server.edns_udp_payload_size() as usize);

        let response = udp_exchange(Ipv4Addr::LOCALHOST.into(), udp_addr, &message).await;
        let (id, tc, addresses) = read_response(&response);
        assert_eq!(id, 9);
        assert!(!tc);
        assert_eq!(addresses, [Ipv4Addr::new(93, 184, 216, 34)]);

        assert!(controller.shut_down(Duration::from_secs(5)).await);
    }

    #[tokio::test]
    async fn pipelined_tcp_queries_are_answered_in_order() {
        let server = server(ZONE);
        let (controller, tcp_addr, _) = start(&server).await;
        let mut stream = TcpStream::connect(tcp_addr).await.unwrap();

        // Send both messages in a single write.
        let mut both = Vec::new();
        for id in [1, 2] {
            let message = query(id, "www.example.com.", Type::A);
            both.extend_from_slice(&(message.len() as u16).to_be_bytes());
            both.extend_from_slice(&message);
        }
        stream.write_all(&both).await.unwrap();

        for id in [1, 2] {
            let (received_id, _, addresses) = read_response(&tcp_receive(&mut stream).await);
            assert_eq!(received_id, id);
            assert_eq!(addresses, [Ipv4Addr::new(93, 184, 216, 34)]);
        }

        drop(stream);
        assert!(controller.shut_down(Duration::from_secs(5)).await);
    }

    #[tokio::test]
    async fn idle_tcp_connections_are_closed() {
        let server = server(ZONE);
        let local: SocketAddr = (Ipv4Addr::LOCALHOST, 0).into();
        let mut provider = TokioIoProvider::bind([local], std::iter::empty()).await.unwrap();
        provider.set_tcp_idle_timeout(Duration::from_millis(100));
        let tcp_addr = provider.local_addrs().unwrap()[0].1;
        let controller = provider.start(&server);

        let mut stream = TcpStream::connect(tcp_addr).await.unwrap();
        // Only half of a length field.
        stream.write_all(&[0]).await.unwrap();
        let mut buf = [0; 1];
        let n_read = timeout(Duration::from_secs(5), stream.read(&mut buf))
            .await
            .unwrap()
            .unwrap_or(0);
        assert_eq!(n_read, 0);

        assert!(controller.shut_down(Duration::from_secs(5)).await);
    }

    #[tokio::test]
    async fn half_closed_connections_are_closed_after_answering() {
        let server = server(ZONE);
        let (controller, tcp_addr, _) = start(&server).await;
        let mut stream = TcpStream::connect(tcp_addr).await.unwrap();
        tcp_send(&mut stream, &query(4, "www.example.com.", Type::A)).await;
        let (id, _, addresses) = read_response(&tcp_receive(&mut stream).await);
        assert_eq!(id, 4);
        assert_eq!(addresses, [Ipv4Addr::new(93, 184, 216, 34)]);

        // Close our sending side only. The server sees end of stream
        // and closes the connection well before the idle timeout.
        stream.shutdown().await.unwrap();
        let mut buf = [0; 1];
        let n_read = timeout(Duration::from_secs(2), stream.read(&mut buf))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(n_read, 0);

        assert!(controller.shut_down(Duration::from_secs(5)).await);
    }

    #[tokio::test]
    async fn shutdown_closes_open_connections() {
        let server = server(ZONE);
        let (controller, tcp_addr, _) = start(&server).await;
        let mut stream = TcpStream::connect(tcp_addr).await.unwrap();
        tcp_send(&mut stream, &query(3, "www.example.com.", Type::A)).await;
        tcp_receive(&mut stream).await;

        // The connection is idle but open; shutdown must not wait for
        // the idle timeout.
        assert!(controller.shut_down(Duration::from_secs(5)).await);
        let mut buf = [0; 1];
        let n_read = timeout(Duration::from_secs(5), stream.read(&mut buf))
            .await
            .unwrap()
            .unwrap_or(0);
        assert_eq!(n_read, 0);
    }
}
