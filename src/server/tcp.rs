//! # Servidor TCP Concurrente
//! src/server/tcp.rs
//!
//! Un thread acepta conexiones y las encola en un pool de workers de
//! tamaño fijo. Cada conexión se procesa completa en un solo worker:
//!
//! ```text
//! Accepted → Parsing → Routed → Handled
//!                   └→ ParseFailed → 400
//! ```
//!
//! Toda conexión se cierra al terminar (un request por conexión).

use crate::config::{AdmissionPolicy, Config};
use crate::error::{Result, ServerError};
use crate::http::{Limits, Method, ParseError, Request, Response, StatusCode};
use crate::router::{Handler, Router};
use crate::server::pool::WorkerPool;
use std::io::{self, BufWriter, Read, Write};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, info_span, warn};

/// Tiempo máximo que un worker descarta input después de un 400/404
const ERROR_LINGER: Duration = Duration::from_millis(250);

/// Bytes máximos de input descartados antes de cerrar
const DISCARD_MAX_BYTES: usize = 64 * 1024;

/// Cómo terminó una conexión atendida
#[derive(Debug)]
pub enum Outcome {
    /// Un handler escribió la respuesta
    Handled { method: Method, path: String },

    /// El request no se pudo parsear; se envió 400
    BadRequest(ParseError),

    /// No había ruta; se envió 404
    NotFound { method: Method, path: String },
}

/// Parámetros por conexión que los workers necesitan
#[derive(Debug, Clone, Copy)]
struct ConnectionSettings {
    limits: Limits,
    read_timeout: Option<Duration>,
}

/// Servidor HTTP/1.1 con pool de workers
pub struct Server {
    config: Config,
    router: Arc<Router>,
}

impl Server {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            router: Arc::new(Router::new()),
        }
    }

    /// Servidor con configuración por defecto y `workers` threads
    pub fn with_workers(workers: usize) -> Self {
        Self::new(Config {
            workers,
            ..Config::default()
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Tabla de rutas compartida; se puede seguir registrando después de
    /// `start` desde otro thread
    pub fn router(&self) -> Arc<Router> {
        Arc::clone(&self.router)
    }

    /// Registra un handler para (método, path exacto)
    pub fn register<H: Handler>(&self, method: Method, path: &str, handler: H) {
        self.router.register(method, path, handler);
    }

    /// Escucha en `host:port` y atiende conexiones indefinidamente
    ///
    /// Solo retorna ante un error de configuración, de bind o un error
    /// irrecuperable del listener.
    pub fn start(&self, port: u16) -> Result<()> {
        self.config.validate().map_err(ServerError::Config)?;

        let address = format!("{}:{}", self.config.host, port);
        let listener = TcpListener::bind(&address).map_err(|source| ServerError::Bind {
            address: address.clone(),
            source,
        })?;

        self.serve(listener)
    }

    /// Loop de aceptación sobre un listener ya abierto
    pub fn serve(&self, listener: TcpListener) -> Result<()> {
        self.config.validate().map_err(ServerError::Config)?;

        let settings = ConnectionSettings {
            limits: self.config.limits(),
            read_timeout: self.config.read_timeout(),
        };
        let router = Arc::clone(&self.router);
        let pool = WorkerPool::new(
            self.config.workers,
            self.config.queue_capacity,
            move |stream: TcpStream| Self::run_connection(stream, &router, settings),
        )?;

        let address = listener
            .local_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_else(|_| "unknown".to_string());
        info!(
            %address,
            workers = pool.size(),
            queue_capacity = pool.capacity(),
            admission = ?self.config.admission,
            routes = self.router.len(),
            "server listening"
        );

        for stream in listener.incoming() {
            match stream {
                Ok(stream) => self.admit(&pool, stream),
                Err(e) if is_transient_accept_error(&e) => {
                    warn!(error = %e, "accept failed, continuing");
                }
                Err(e) => {
                    // Las conexiones en cola se cierran; no se espera a los workers
                    let discarded = pool.close();
                    error!(error = %e, discarded, "listener failed, shutting down");
                    return Err(ServerError::Accept(e));
                }
            }
        }

        Ok(())
    }

    /// Entrega la conexión al pool según la política de admisión
    fn admit(&self, pool: &WorkerPool<TcpStream>, stream: TcpStream) {
        match self.config.admission {
            AdmissionPolicy::Block => {
                if let Err(stream) = pool.submit(stream) {
                    debug!(peer = %peer_label(&stream), "worker pool closed, dropping connection");
                }
            }
            AdmissionPolicy::Reject => {
                if let Err(mut stream) = pool.try_submit(stream) {
                    let peer = peer_label(&stream);
                    warn!(%peer, queued = pool.queued(), "worker queue full, rejecting connection");
                    match Response::empty(StatusCode::ServiceUnavailable).write_to(&mut stream) {
                        // Sin esperar: el accept loop no se detiene por un cliente
                        Ok(()) => discard_input(&stream, Duration::ZERO),
                        Err(e) => debug!(%peer, error = %e, "failed to write 503"),
                    }
                }
            }
        }
    }

    /// Tarea de un worker: atiende la conexión y registra el resultado
    fn run_connection(stream: TcpStream, router: &Router, settings: ConnectionSettings) {
        let peer = peer_label(&stream);
        let span = info_span!("connection", %peer);
        let _entered = span.enter();
        let start = Instant::now();

        if let Err(e) = stream.set_read_timeout(settings.read_timeout) {
            warn!(error = %e, "failed to set read timeout");
        }

        match handle_connection(&stream, router, settings.limits) {
            Ok(Outcome::Handled { method, path }) => {
                info!(%method, %path, elapsed_ms = elapsed_ms(start), "request handled");
            }
            Ok(Outcome::NotFound { method, path }) => {
                info!(%method, %path, status = 404, elapsed_ms = elapsed_ms(start), "route not found");
                discard_input(&stream, ERROR_LINGER);
            }
            Ok(Outcome::BadRequest(e)) => {
                info!(kind = e.kind(), error = %e, status = 400, "bad request");
                discard_input(&stream, ERROR_LINGER);
            }
            Err(e) => {
                warn!(error = %e, "connection aborted");
            }
        }
        // El stream se cierra al salir de esta función
    }
}

/// Atiende un único request sobre `stream`
///
/// Parsea, busca la ruta y delega la escritura al handler. Los errores de
/// parsing y las rutas inexistentes se responden acá con 400/404; los
/// errores de transporte se propagan sin responder.
pub fn handle_connection<S>(mut stream: S, router: &Router, limits: Limits) -> Result<Outcome>
where
    S: Read + Write,
{
    let request = match Request::read_from(&mut stream, limits) {
        Ok(request) => request,
        Err(ParseError::Transport(e)) => return Err(ServerError::Transport(e)),
        Err(e) => {
            Response::empty(StatusCode::BadRequest).write_to(&mut stream)?;
            return Ok(Outcome::BadRequest(e));
        }
    };

    let method = request.method();
    let path = request.path().to_string();

    let handler = match router.lookup(method, &path) {
        Ok(handler) => handler,
        Err(e) => {
            debug!(error = %e, "no handler");
            Response::empty(StatusCode::NotFound).write_to(&mut stream)?;
            return Ok(Outcome::NotFound { method, path });
        }
    };

    let mut out = BufWriter::new(&mut stream);
    handler.handle(&request, &mut out)?;
    out.flush()?;

    Ok(Outcome::Handled { method, path })
}

/// Cierra la escritura y descarta lo que el cliente siga enviando
///
/// Un socket cerrado con input sin leer responde con RST y el cliente puede
/// perder la respuesta ya escrita. Con `wait` en cero solo se descarta lo
/// que ya llegó, sin bloquear.
fn discard_input(stream: &TcpStream, wait: Duration) {
    if stream.shutdown(Shutdown::Write).is_err() {
        return;
    }

    let nonblocking = wait.is_zero();
    if nonblocking && stream.set_nonblocking(true).is_err() {
        return;
    }

    let deadline = Instant::now() + wait;
    let mut reader = stream;
    let mut sink = [0u8; 1024];
    let mut remaining = DISCARD_MAX_BYTES;

    while remaining > 0 {
        if !nonblocking {
            let left = deadline.saturating_duration_since(Instant::now());
            if left.is_zero() || stream.set_read_timeout(Some(left)).is_err() {
                break;
            }
        }

        match reader.read(&mut sink) {
            Ok(0) | Err(_) => break,
            Ok(read) => remaining = remaining.saturating_sub(read),
        }
    }
}

/// Errores de `accept` que afectan solo a la conexión entrante
fn is_transient_accept_error(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::Interrupted
            | io::ErrorKind::WouldBlock
    )
}

fn peer_label(stream: &TcpStream) -> String {
    stream
        .peer_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|_| "unknown".to_string())
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}
