//! # Errores del servidor
//! src/error.rs
//!
//! Los errores de parsing viven en `http::request::ParseError`; acá están
//! los del dispatcher y del ciclo de vida del servidor.

use crate::http::Method;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    /// Configuración inválida (workers = 0, etc.)
    #[error("invalid configuration: {0}")]
    Config(String),

    /// No se pudo abrir el socket de escucha
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },

    /// Error irrecuperable del listener: termina el servidor
    #[error("listener failed: {0}")]
    Accept(#[source] io::Error),

    /// No hay handler para (método, path); se responde 404
    #[error("route not found: {method} {path}")]
    RouteNotFound { method: Method, path: String },

    /// Error de I/O de una conexión; aborta solo esa conexión
    #[error("transport error: {0}")]
    Transport(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, ServerError>;
