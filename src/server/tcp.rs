//! # Servidor TCP Concurrente
//! src/server/tcp.rs
//!
//! Transporte HTTP/1.0 de la demo: un thread por conexión, un request por
//! conexión (`Connection: close`). Cada request se entrega al motor REST
//! con un [`BufferedEndpoint`] y lo capturado se envía por el socket.

use crate::config::Config;
use crate::http::request::{find_header_end, HEADER_END};
use crate::http::{ParseError, Request, Response, StatusCode};
use crate::method::BufferedEndpoint;
use crate::rest::{Rest, VirtualHosts};
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Tamaño máximo de request line + headers
const MAX_HEAD_BYTES: usize = 64 * 1024;

/// Lo que comparten los threads de conexión
struct Shared {
    rest: Rest,
    vhosts: VirtualHosts,
}

/// Servidor HTTP/1.0 concurrente sobre el motor REST
pub struct Server {
    config: Config,
    shared: Arc<Shared>,
}

impl Server {
    pub fn new(config: Config, vhosts: VirtualHosts) -> Self {
        let rest = Rest::new(config.limits());
        Self {
            config,
            shared: Arc::new(Shared { rest, vhosts }),
        }
    }

    pub fn run(&self) -> std::io::Result<()> {
        let address = self.config.address();
        let listener = TcpListener::bind(&address)?;
        tracing::info!(address = %address, "server listening (one thread per connection)");
        self.serve(listener)
    }

    /// Acepta conexiones del listener hasta que falle
    pub fn serve(&self, listener: TcpListener) -> std::io::Result<()> {
        let timeout = Duration::from_millis(self.config.read_timeout_ms);
        for stream in listener.incoming() {
            match stream {
                Ok(stream) => {
                    let shared = Arc::clone(&self.shared);
                    let peer = stream
                        .peer_addr()
                        .map(|addr| addr.to_string())
                        .unwrap_or_else(|_| "unknown".to_string());
                    tracing::debug!(peer = %peer, "connection accepted");

                    thread::spawn(move || {
                        if let Err(e) = handle_connection(stream, &shared, timeout) {
                            tracing::warn!(peer = %peer, error = %e, "connection failed");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
        Ok(())
    }
}

fn handle_connection(mut stream: TcpStream, shared: &Shared, timeout: Duration) -> std::io::Result<()> {
    let start = Instant::now();
    stream.set_read_timeout(Some(timeout))?;

    let max_body = shared.rest.limits().max_body_bytes;
    let raw = match read_request(&mut stream, max_body)? {
        Some(raw) => raw,
        None => {
            tracing::debug!("connection closed without data");
            return Ok(());
        }
    };

    let (response, include_body) = match raw.into_request() {
        Ok(request) => {
            let include_body = request.method() != "HEAD";
            let mut endpoint = BufferedEndpoint::new();
            let disposition = shared
                .rest
                .process_vhost(request.into_parts(), &shared.vhosts, &mut endpoint);
            tracing::debug!(status = %disposition.status, exception = disposition.exception, "request processed");
            (Response::from_endpoint(endpoint), include_body)
        }
        Err(e) => {
            tracing::info!(error = %e, "malformed request");
            (bad_request(&e), true)
        }
    };

    let response = response.with_header("Connection", "close");
    stream.write_all(&response.to_bytes(include_body))?;
    stream.flush()?;

    tracing::info!(
        status = response.status().as_u16(),
        latency_ms = start.elapsed().as_secs_f64() * 1000.0,
        "response sent"
    );
    Ok(())
}

fn bad_request(err: &ParseError) -> Response {
    let body = format!("Invalid request: {}", err);
    Response::new(StatusCode::BadRequest)
        .with_header("Content-Type", "text/plain")
        .with_header("Content-Length", &body.len().to_string())
        .with_body(body.into_bytes())
}

/// Bytes leídos de un request
struct RawRequest {
    bytes: Vec<u8>,
    /// El `Content-Length` excede el límite y el body no se leyó
    oversized: bool,
}

impl RawRequest {
    fn into_request(self) -> Result<Request, ParseError> {
        if self.oversized {
            Request::parse_head(&self.bytes)
        } else {
            Request::parse(&self.bytes)
        }
    }
}

/// Lee hasta el fin de los headers y luego `Content-Length` bytes.
/// `None` si el peer cerró sin enviar nada.
fn read_request(stream: &mut TcpStream, max_body: u64) -> std::io::Result<Option<RawRequest>> {
    let mut bytes = Vec::new();
    let mut chunk = [0u8; 8192];

    loop {
        let n = stream.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        bytes.extend_from_slice(&chunk[..n]);

        if let Some(end) = find_header_end(&bytes) {
            let declared = declared_length(&bytes[..end]);
            if declared > max_body {
                return Ok(Some(RawRequest {
                    bytes,
                    oversized: true,
                }));
            }
            if bytes.len() >= end + HEADER_END.len() + declared as usize {
                break;
            }
        } else if bytes.len() > MAX_HEAD_BYTES {
            break;
        }
    }

    if bytes.is_empty() {
        return Ok(None);
    }
    Ok(Some(RawRequest {
        bytes,
        oversized: false,
    }))
}

/// `Content-Length` de los headers crudos (0 si falta o no es válido;
/// el parser reporta el error después)
fn declared_length(head: &[u8]) -> u64 {
    String::from_utf8_lossy(head)
        .split("\r\n")
        .skip(1)
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("Content-Length"))
        .and_then(|(_, value)| value.trim().parse().ok())
        .unwrap_or(0)
}
