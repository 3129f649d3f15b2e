//! TCP servers.
//!
//! [`StreamServer`] speaks the `\r`-terminated command protocol,
//! [`BackdoorServer`] speaks newline-delimited JSON property requests. Both
//! spawn one thread per connection and stop once the shared running flag is
//! cleared.

use crate::core::{EmulatorContext, SharedContext, lock_context};
use crate::device::PropertyValue;
use crate::error::BackdoorError;
use crate::protocol::{LineFramer, handle_line};
use huber_common::consts::{BACKDOOR_TERMINATOR, OUT_TERMINATOR};
use serde::{Deserialize, Serialize};
use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// How often idle accept loops and connection reads check the running flag.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Per-connection loop, run on its own thread.
type ConnectionHandler = fn(TcpStream, SharedContext, Arc<AtomicBool>) -> io::Result<()>;

/// Listener shared by both servers.
struct Acceptor {
    name: &'static str,
    listener: TcpListener,
    /// Read timeout of accepted connections
    read_timeout: Duration,
    context: SharedContext,
    running: Arc<AtomicBool>,
}

impl Acceptor {
    fn bind(
        name: &'static str,
        addr: impl ToSocketAddrs,
        context: SharedContext,
        running: Arc<AtomicBool>,
    ) -> io::Result<Self> {
        let listener = TcpListener::bind(addr)?;
        listener.set_nonblocking(true)?;
        info!("{} listening on {}", name, listener.local_addr()?);
        Ok(Self {
            name,
            listener,
            read_timeout: POLL_INTERVAL,
            context,
            running,
        })
    }

    /// Accept connections until shutdown, running `handler` on a thread per
    /// connection. A client that cannot be set up is dropped; the listener
    /// keeps serving.
    fn serve(self, handler: ConnectionHandler) -> io::Result<()> {
        let mut connections: Vec<JoinHandle<()>> = Vec::new();

        while self.running.load(Ordering::SeqCst) {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    info!("{}: client connected from {}", self.name, peer);
                    match self.start_connection(stream, peer, handler) {
                        Ok(handle) => connections.push(handle),
                        Err(e) => warn!("{}: dropping client {}: {}", self.name, peer, e),
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => thread::sleep(POLL_INTERVAL),
                Err(e)
                    if matches!(
                        e.kind(),
                        io::ErrorKind::ConnectionAborted
                            | io::ErrorKind::ConnectionReset
                            | io::ErrorKind::Interrupted
                    ) =>
                {
                    warn!("{}: accept interrupted: {}", self.name, e);
                }
                Err(e) => {
                    error!("{}: accept failed: {}", self.name, e);
                    return Err(e);
                }
            }
            connections.retain(|handle| !handle.is_finished());
        }

        for handle in connections {
            if handle.join().is_err() {
                error!("{}: connection thread panicked", self.name);
            }
        }
        info!("{} stopped", self.name);
        Ok(())
    }

    fn start_connection(
        &self,
        stream: TcpStream,
        peer: SocketAddr,
        handler: ConnectionHandler,
    ) -> io::Result<JoinHandle<()>> {
        stream.set_nonblocking(false)?;
        stream.set_read_timeout(Some(self.read_timeout))?;

        let context = Arc::clone(&self.context);
        let running = Arc::clone(&self.running);
        let name = self.name;
        thread::Builder::new()
            .name(format!("{}-{}", name, peer))
            .spawn(move || match handler(stream, context, running) {
                Ok(()) => info!("{}: client {} disconnected", name, peer),
                Err(e) => warn!("{}: connection {} closed: {}", name, peer, e),
            })
    }
}

fn is_timeout(e: &io::Error) -> bool {
    matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut)
}

/// Server for the device command protocol.
pub struct StreamServer {
    acceptor: Acceptor,
}

impl StreamServer {
    pub fn bind(
        addr: impl ToSocketAddrs,
        context: SharedContext,
        running: Arc<AtomicBool>,
    ) -> io::Result<Self> {
        Ok(Self {
            acceptor: Acceptor::bind("stream server", addr, context, running)?,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.acceptor.listener.local_addr()
    }

    /// Serve until the running flag is cleared.
    pub fn serve(self) -> io::Result<()> {
        self.acceptor.serve(serve_stream_connection)
    }
}

fn serve_stream_connection(
    mut stream: TcpStream,
    context: SharedContext,
    running: Arc<AtomicBool>,
) -> io::Result<()> {
    let mut framer = LineFramer::new();
    let mut buf = [0u8; 256];

    while running.load(Ordering::SeqCst) {
        let n = match stream.read(&mut buf) {
            Ok(0) => return Ok(()),
            Ok(n) => n,
            Err(e) if is_timeout(&e) => continue,
            Err(e) => return Err(e),
        };

        for line in framer.extend(&buf[..n]) {
            let reply = line.and_then(|line| {
                let mut context = lock_context(&context);
                handle_line(&mut context.device, &line)
            });
            match reply {
                Ok(Some(reply)) => {
                    stream.write_all(reply.as_bytes())?;
                    stream.write_all(OUT_TERMINATOR.as_bytes())?;
                }
                Ok(None) => {}
                Err(e) => warn!("Rejected command: {}", e),
            }
        }
    }
    Ok(())
}

/// Backdoor request, one JSON object per line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum BackdoorRequest {
    Get { property: String },
    Set { property: String, value: PropertyValue },
    List,
}

/// Payload of a successful `get` or `list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BackdoorValue {
    Property(PropertyValue),
    Names(Vec<String>),
}

/// Backdoor reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackdoorResponse {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<BackdoorValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BackdoorResponse {
    fn success(value: Option<BackdoorValue>) -> Self {
        Self {
            ok: true,
            value,
            error: None,
        }
    }

    fn failure(error: &BackdoorError) -> Self {
        Self {
            ok: false,
            value: None,
            error: Some(error.to_string()),
        }
    }
}

/// Decode and execute one backdoor request line.
pub fn handle_backdoor_request(context: &mut EmulatorContext, line: &str) -> BackdoorResponse {
    let result = serde_json::from_str::<BackdoorRequest>(line)
        .map_err(|e| BackdoorError::MalformedRequest(e.to_string()))
        .and_then(|request| {
            debug!("Backdoor request: {:?}", request);
            match request {
                BackdoorRequest::Get { property } => context
                    .get_property(&property)
                    .map(|value| Some(BackdoorValue::Property(value))),
                BackdoorRequest::Set { property, value } => {
                    context.set_property(&property, &value).map(|()| None)
                }
                BackdoorRequest::List => {
                    Ok(Some(BackdoorValue::Names(EmulatorContext::property_names())))
                }
            }
        });

    match result {
        Ok(value) => BackdoorResponse::success(value),
        Err(e) => {
            warn!("Backdoor request failed: {}", e);
            BackdoorResponse::failure(&e)
        }
    }
}

/// Server for backdoor property access.
pub struct BackdoorServer {
    acceptor: Acceptor,
}

impl BackdoorServer {
    pub fn bind(
        addr: impl ToSocketAddrs,
        context: SharedContext,
        running: Arc<AtomicBool>,
    ) -> io::Result<Self> {
        Ok(Self {
            acceptor: Acceptor::bind("backdoor", addr, context, running)?,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.acceptor.listener.local_addr()
    }

    /// Serve until the running flag is cleared.
    pub fn serve(self) -> io::Result<()> {
        self.acceptor.serve(serve_backdoor_connection)
    }
}

fn serve_backdoor_connection(
    stream: TcpStream,
    context: SharedContext,
    running: Arc<AtomicBool>,
) -> io::Result<()> {
    let mut writer = stream.try_clone()?;
    let mut reader = BufReader::new(stream);
    // Partial lines survive read timeouts.
    let mut pending = Vec::new();

    while running.load(Ordering::SeqCst) {
        match reader.read_until(BACKDOOR_TERMINATOR, &mut pending) {
            Ok(0) => return Ok(()),
            Ok(_) if pending.last() != Some(&BACKDOOR_TERMINATOR) => return Ok(()),
            Ok(_) => {}
            Err(e) if is_timeout(&e) => continue,
            Err(e) => return Err(e),
        }

        let line = String::from_utf8_lossy(&pending).trim().to_string();
        pending.clear();
        if line.is_empty() {
            continue;
        }

        let response = handle_backdoor_request(&mut lock_context(&context), &line);
        let mut reply = serde_json::to_string(&response).map_err(io::Error::other)?;
        reply.push(char::from(BACKDOOR_TERMINATOR));
        writer.write_all(reply.as_bytes())?;
    }
    Ok(())
}
