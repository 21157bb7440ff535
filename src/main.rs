//! # mini_http - Entry Point
//! src/main.rs
//!
//! Lee la configuración, registra las rutas de ejemplo y arranca el
//! servidor (bloquea el thread principal).

use mini_http::config::Config;
use mini_http::http::{Method, Request, Response, StatusCode};
use mini_http::logging;
use mini_http::server::Server;
use std::io::{self, Write};
use std::process::ExitCode;
use tracing::error;

/// `GET /` - saludo en texto plano
fn index_handler(_req: &Request, out: &mut dyn Write) -> io::Result<()> {
    Response::text("mini_http up\n").write_to(out)
}

/// `GET /query` - devuelve los query parameters como JSON
fn query_handler(req: &Request, out: &mut dyn Write) -> io::Result<()> {
    let response = match serde_json::to_string(req.query_params()) {
        Ok(body) => Response::json(&body),
        Err(e) => {
            error!(error = %e, "failed to serialize query parameters");
            Response::empty(StatusCode::InternalServerError)
        }
    };
    response.write_to(out)
}

/// `POST /echo` - devuelve el body recibido
fn echo_handler(req: &Request, out: &mut dyn Write) -> io::Result<()> {
    let content_type = req.header("Content-Type").unwrap_or("application/octet-stream");

    Response::new(StatusCode::Ok)
        .with_header("Content-Type", content_type)
        .with_body_bytes(req.body().to_vec())
        .with_header("Connection", "close")
        .write_to(out)
}

fn main() -> ExitCode {
    let config = Config::new();
    logging::init(&config.log_level);

    if let Err(e) = config.validate() {
        error!(error = %e, "invalid configuration");
        return ExitCode::FAILURE;
    }
    config.print_summary();

    let port = config.port;
    let server = Server::new(config);
    server.register(Method::GET, "/", index_handler);
    server.register(Method::GET, "/query", query_handler);
    server.register(Method::POST, "/echo", echo_handler);

    // Solo retorna ante un error fatal
    if let Err(e) = server.start(port) {
        error!(error = %e, "server stopped");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
