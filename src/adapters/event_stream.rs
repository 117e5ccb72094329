//! Server-sent-events adapter.
//!
//! Implements [`EventStreamPort`].  A browser subscribes with
//! `GET /connect-client` and gets a `text/event-stream` response carrying
//! one `data: <line>\n\n` frame per record.  `GET /id` answers with the
//! device's hostname so a dashboard can tell loggers apart.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: routes are registered on
//!   `EspHttpServer`.  The stream handler parks on a frame queue and writes
//!   each frame to its response until the queue is dropped or the peer
//!   goes away.  The httpd task is single-threaded, so other requests wait
//!   while a subscriber is live.
//! - **all other targets**: a non-blocking `std::net::TcpListener` with a
//!   minimal request-line parser, for host-side testing.

use log::{debug, info};
#[cfg(not(target_os = "espidf"))]
use log::warn;

use crate::app::ports::{EventStreamPort, StreamError, SubscriptionHandle};

/// Default listen port.
pub const DEFAULT_PORT: u16 = 80;

/// Request path that opens the event stream.
pub const STREAM_PATH: &str = "/connect-client";

/// Request path that reports the device identity.
pub const ID_PATH: &str = "/id";

const STREAM_HEADERS: &[(&str, &str)] = &[
    ("Content-Type", "text/event-stream"),
    ("Cache-Control", "no-cache"),
    ("Connection", "keep-alive"),
    ("Access-Control-Allow-Origin", "*"),
];

/// Frame one event.
pub fn sse_frame(data: &str) -> String {
    format!("data: {}\n\n", data)
}

#[cfg(target_os = "espidf")]
mod esp_impl {
    use std::collections::VecDeque;
    use std::sync::mpsc::{self, RecvTimeoutError, SyncSender, TrySendError};
    use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
    use std::time::Duration;

    use esp_idf_svc::http::Method;
    use esp_idf_svc::http::server::{Configuration, EspHttpServer};
    use esp_idf_svc::io::{EspIOError, Write};
    use log::{debug, info, warn};

    use super::{ID_PATH, STREAM_HEADERS, STREAM_PATH};
    use crate::app::ports::{StreamError, SubscriptionHandle};

    /// Frames buffered per subscriber before sends report `Io`.
    const FRAME_QUEUE: usize = 8;

    /// A comment line goes out after this much silence so a vanished peer
    /// is noticed.
    const KEEP_ALIVE: Duration = Duration::from_secs(2);

    #[derive(Default)]
    struct Hub {
        next_id: u32,
        waiting: VecDeque<SubscriptionHandle>,
        clients: Vec<(SubscriptionHandle, SyncSender<String>)>,
    }

    impl Hub {
        fn register(&mut self, tx: SyncSender<String>) -> SubscriptionHandle {
            self.next_id = self.next_id.wrapping_add(1);
            let handle = SubscriptionHandle(self.next_id);
            self.clients.push((handle, tx));
            self.waiting.push_back(handle);
            handle
        }

        fn drop_client(&mut self, handle: SubscriptionHandle) -> bool {
            let before = self.clients.len();
            self.clients.retain(|(h, _)| *h != handle);
            self.waiting.retain(|h| *h != handle);
            self.clients.len() != before
        }
    }

    #[derive(Clone, Default)]
    pub struct SharedHub(Arc<Mutex<Hub>>);

    impl SharedHub {
        fn lock(&self) -> MutexGuard<'_, Hub> {
            self.0.lock().unwrap_or_else(PoisonError::into_inner)
        }

        pub fn accept(&self) -> Option<SubscriptionHandle> {
            self.lock().waiting.pop_front()
        }

        pub fn close(&self, handle: SubscriptionHandle) -> bool {
            self.lock().drop_client(handle)
        }

        pub fn send(&self, handle: SubscriptionHandle, frame: String) -> Result<(), StreamError> {
            let mut hub = self.lock();
            let tx = hub
                .clients
                .iter()
                .find(|(h, _)| *h == handle)
                .map(|(_, tx)| tx)
                .ok_or(StreamError::Disconnected)?;
            match tx.try_send(frame) {
                Ok(()) => Ok(()),
                Err(TrySendError::Full(_)) => Err(StreamError::Io),
                Err(TrySendError::Disconnected(_)) => {
                    hub.drop_client(handle);
                    Err(StreamError::Disconnected)
                }
            }
        }
    }

    pub fn start_server(
        port: u16,
        hub: SharedHub,
        identity: String,
    ) -> Result<EspHttpServer<'static>, StreamError> {
        let conf = Configuration {
            http_port: port,
            max_uri_handlers: 2,
            max_open_sockets: 4,
            stack_size: 6144,
            ..Default::default()
        };
        let mut server = EspHttpServer::new(&conf).map_err(|e| {
            warn!("SSE: httpd start failed: {}", e);
            StreamError::Io
        })?;

        server
            .fn_handler(STREAM_PATH, Method::Get, move |req| -> Result<(), EspIOError> {
                let (tx, rx) = mpsc::sync_channel::<String>(FRAME_QUEUE);
                let handle = hub.lock().register(tx);
                info!("SSE: subscribed as {:?}", handle);

                let mut resp = req.into_response(200, Some("OK"), STREAM_HEADERS)?;
                resp.flush()?;
                loop {
                    match rx.recv_timeout(KEEP_ALIVE) {
                        Ok(frame) => resp.write_all(frame.as_bytes())?,
                        Err(RecvTimeoutError::Timeout) => resp.write_all(b": keep-alive\n\n")?,
                        Err(RecvTimeoutError::Disconnected) => break,
                    }
                    resp.flush()?;
                }
                debug!("SSE: {:?} handler done", handle);
                Ok(())
            })
            .map_err(|e| {
                warn!("SSE: registering {} failed: {}", STREAM_PATH, e);
                StreamError::Io
            })?;

        server
            .fn_handler(ID_PATH, Method::Get, move |req| -> Result<(), EspIOError> {
                let len = identity.len().to_string();
                let mut resp = req.into_response(
                    200,
                    None,
                    &[
                        ("Content-Type", "text/plain"),
                        ("Content-Length", &len),
                        ("Connection", "close"),
                    ],
                )?;
                resp.write_all(identity.as_bytes())?;
                Ok(())
            })
            .map_err(|e| {
                warn!("SSE: registering {} failed: {}", ID_PATH, e);
                StreamError::Io
            })?;

        Ok(server)
    }
}

#[cfg(not(target_os = "espidf"))]
mod sim {
    use std::io::{Read, Write};
    use std::net::TcpStream;
    use std::time::Duration;

    use log::debug;

    const REQUEST_TIMEOUT: Duration = Duration::from_millis(200);
    const MAX_REQUEST_BYTES: usize = 1024;

    /// Request target of an HTTP request head, if it is a GET.
    pub fn request_path(head: &str) -> Option<&str> {
        let line = head.lines().next()?;
        let mut parts = line.split_whitespace();
        match (parts.next(), parts.next()) {
            (Some("GET"), Some(path)) => Some(path.split('?').next().unwrap_or(path)),
            _ => None,
        }
    }

    pub fn read_head(stream: &mut TcpStream) -> Option<String> {
        stream.set_read_timeout(Some(REQUEST_TIMEOUT)).ok()?;
        let mut buf = [0u8; MAX_REQUEST_BYTES];
        let mut len = 0;
        while len < buf.len() {
            match stream.read(&mut buf[len..]) {
                Ok(0) => break,
                Ok(n) => {
                    len += n;
                    if buf[..len].windows(4).any(|w| w == b"\r\n\r\n") {
                        break;
                    }
                }
                Err(e) => {
                    debug!("SSE: request read ended: {}", e);
                    break;
                }
            }
        }
        (len > 0).then(|| String::from_utf8_lossy(&buf[..len]).into_owned())
    }

    pub fn write_response(
        stream: &mut TcpStream,
        status: &str,
        headers: &[(&str, &str)],
        body: &str,
    ) -> std::io::Result<()> {
        let mut head = format!("HTTP/1.1 {}\r\n", status);
        for (k, v) in headers {
            head.push_str(&format!("{}: {}\r\n", k, v));
        }
        head.push_str("\r\n");
        head.push_str(body);
        stream.write_all(head.as_bytes())
    }
}

pub struct SseServer {
    port: u16,

    #[cfg(target_os = "espidf")]
    hub: esp_impl::SharedHub,
    #[cfg(target_os = "espidf")]
    server: Option<esp_idf_svc::http::server::EspHttpServer<'static>>,

    #[cfg(not(target_os = "espidf"))]
    listener: Option<std::net::TcpListener>,
    #[cfg(not(target_os = "espidf"))]
    clients: Vec<(SubscriptionHandle, std::net::TcpStream)>,
    #[cfg(not(target_os = "espidf"))]
    next_id: u32,
    #[cfg(not(target_os = "espidf"))]
    identity: String,
}

#[cfg(target_os = "espidf")]
impl SseServer {
    pub fn new(port: u16) -> Self {
        Self {
            port,
            hub: esp_impl::SharedHub::default(),
            server: None,
        }
    }
}

#[cfg(target_os = "espidf")]
impl EventStreamPort for SseServer {
    fn start(&mut self, identity: &str) -> Result<(), StreamError> {
        if self.server.is_some() {
            return Ok(());
        }
        let server = esp_impl::start_server(self.port, self.hub.clone(), identity.to_string())?;
        info!("SSE: httpd listening on port {}", self.port);
        self.server = Some(server);
        Ok(())
    }

    fn accept(&mut self) -> Option<SubscriptionHandle> {
        self.hub.accept()
    }

    fn close(&mut self, handle: SubscriptionHandle) {
        if self.hub.close(handle) {
            info!("SSE: {:?} closed", handle);
        }
    }

    fn send(&mut self, handle: SubscriptionHandle, data: &str) -> Result<(), StreamError> {
        self.hub.send(handle, sse_frame(data)).inspect_err(|e| {
            debug!("SSE: {:?} send failed: {}", handle, e);
        })
    }
}

#[cfg(not(target_os = "espidf"))]
impl SseServer {
    pub fn new(port: u16) -> Self {
        Self {
            port,
            listener: None,
            clients: Vec::new(),
            next_id: 1,
            identity: String::new(),
        }
    }

    /// Bound address once started.  Useful when port `0` was requested.
    pub fn local_addr(&self) -> Option<std::net::SocketAddr> {
        self.listener.as_ref().and_then(|l| l.local_addr().ok())
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    fn handle_request(
        &mut self,
        mut stream: std::net::TcpStream,
        peer: std::net::SocketAddr,
    ) -> Option<SubscriptionHandle> {
        use std::time::Duration;

        let head = sim::read_head(&mut stream)?;
        match sim::request_path(&head) {
            Some(STREAM_PATH) => {}
            Some(ID_PATH) => {
                let len = self.identity.len().to_string();
                let headers = [
                    ("Content-Type", "text/plain"),
                    ("Content-Length", len.as_str()),
                    ("Connection", "close"),
                ];
                let _ = sim::write_response(&mut stream, "200 OK", &headers, &self.identity);
                return None;
            }
            other => {
                debug!("SSE: {} asked for {:?}, 404", peer, other);
                let headers = [("Content-Length", "0"), ("Connection", "close")];
                let _ = sim::write_response(&mut stream, "404 Not Found", &headers, "");
                return None;
            }
        }

        if stream.set_write_timeout(Some(Duration::from_millis(100))).is_err()
            || sim::write_response(&mut stream, "200 OK", STREAM_HEADERS, "").is_err()
        {
            warn!("SSE: could not open stream to {}", peer);
            return None;
        }

        let handle = SubscriptionHandle(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        info!("SSE: {} subscribed as {:?}", peer, handle);
        self.clients.push((handle, stream));
        Some(handle)
    }
}

#[cfg(not(target_os = "espidf"))]
impl EventStreamPort for SseServer {
    fn start(&mut self, identity: &str) -> Result<(), StreamError> {
        use std::net::{SocketAddr, TcpListener};

        self.identity = identity.to_string();
        if self.listener.is_some() {
            return Ok(());
        }
        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        let listener = TcpListener::bind(addr).map_err(|e| {
            warn!("SSE: bind {} failed: {}", addr, e);
            StreamError::Io
        })?;
        listener.set_nonblocking(true).map_err(|_| StreamError::Io)?;
        info!("SSE: listening on {}", listener.local_addr().map_err(|_| StreamError::Io)?);
        self.listener = Some(listener);
        Ok(())
    }

    fn accept(&mut self) -> Option<SubscriptionHandle> {
        let accepted = self.listener.as_ref()?.accept();
        match accepted {
            Ok((stream, peer)) => {
                if stream.set_nonblocking(false).is_err() {
                    warn!("SSE: failed to configure client socket");
                    return None;
                }
                self.handle_request(stream, peer)
            }
            Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => None,
            Err(e) => {
                warn!("SSE: accept error: {}", e);
                None
            }
        }
    }

    fn close(&mut self, handle: SubscriptionHandle) {
        if let Some(pos) = self.clients.iter().position(|(h, _)| *h == handle) {
            let (_, stream) = self.clients.remove(pos);
            let _ = stream.shutdown(std::net::Shutdown::Both);
            info!("SSE: {:?} closed", handle);
        }
    }

    fn send(&mut self, handle: SubscriptionHandle, data: &str) -> Result<(), StreamError> {
        use std::io::{ErrorKind, Write};

        let stream = self
            .clients
            .iter_mut()
            .find(|(h, _)| *h == handle)
            .map(|(_, s)| s)
            .ok_or(StreamError::Disconnected)?;

        match stream.write_all(sse_frame(data).as_bytes()) {
            Ok(()) => Ok(()),
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                Err(StreamError::Io)
            }
            Err(e) => {
                debug!("SSE: {:?} write failed: {}", handle, e);
                Err(StreamError::Disconnected)
            }
        }
    }
}
