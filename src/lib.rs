//! # mini_http
//! src/lib.rs
//!
//! Servidor HTTP/1.1 mínimo: un request por conexión, parser sobre un
//! buffer acotado, routing exacto por (método, path) y un pool de workers
//! de tamaño fijo.
//!
//! ## Arquitectura
//!
//! - `http`: Lectura acotada, parsing del request y construcción de responses
//! - `router`: Tabla de rutas concurrente y contrato de los handlers
//! - `server`: Accept loop, pool de workers y despacho por conexión
//! - `config`: Argumentos CLI / variables de entorno
//! - `error`: Errores del servidor
//! - `logging`: Inicialización de `tracing`
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use mini_http::http::{Method, Request, Response};
//! use mini_http::server::Server;
//! use std::io::{self, Write};
//!
//! fn hello(_req: &Request, out: &mut dyn Write) -> io::Result<()> {
//!     Response::text("Hello").write_to(out)
//! }
//!
//! let server = Server::with_workers(64);
//! server.register(Method::GET, "/hello", hello);
//! server.start(8080).expect("Error al iniciar servidor");
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod logging;
pub mod router;
pub mod server;

pub use error::ServerError;
