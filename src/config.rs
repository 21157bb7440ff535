//! # Configuración del Servidor
//! src/config.rs
//!
//! Configuración con soporte para argumentos CLI y variables de entorno.
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./mini_http --port 8080 \
//!   --workers 64 \
//!   --queue-capacity 1024 \
//!   --admission reject
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! HTTP_PORT=8080 HTTP_HOST=0.0.0.0 WORKERS=16 ./mini_http
//! ```

use crate::http::reader::{DEFAULT_MAX_BODY_BYTES, DEFAULT_MAX_HEAD_BYTES};
use crate::http::Limits;
use clap::{Parser, ValueEnum};
use std::time::Duration;
use tracing::info;

/// Tamaño por defecto del pool de workers
pub const DEFAULT_WORKERS: usize = 64;

/// Capacidad por defecto de la cola de conexiones pendientes
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Head mínimo aceptable: una request line corta completa
const MIN_HEAD_BYTES: usize = 16;

/// Qué hace el accept loop cuando la cola de workers está llena
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AdmissionPolicy {
    /// Responder 503 y cerrar la conexión
    Reject,

    /// Esperar a que se libere lugar en la cola
    Block,
}

/// Configuración del servidor HTTP/1.1
#[derive(Debug, Clone, Parser)]
#[command(name = "mini_http")]
#[command(about = "Servidor HTTP/1.1 mínimo con pool de workers")]
#[command(version)]
pub struct Config {
    /// Puerto en el que escucha el servidor
    #[arg(short, long, default_value = "8080", env = "HTTP_PORT")]
    pub port: u16,

    /// Host/IP en el que escucha
    #[arg(long, default_value = "127.0.0.1", env = "HTTP_HOST")]
    pub host: String,

    // === Workers ===

    /// Número de threads que atienden conexiones
    #[arg(short, long, default_value_t = DEFAULT_WORKERS, env = "WORKERS")]
    pub workers: usize,

    /// Conexiones aceptadas que pueden esperar un worker libre
    #[arg(long = "queue-capacity", default_value_t = DEFAULT_QUEUE_CAPACITY, env = "QUEUE_CAPACITY")]
    pub queue_capacity: usize,

    /// Política cuando la cola está llena
    #[arg(long, value_enum, default_value_t = AdmissionPolicy::Reject, env = "ADMISSION_POLICY")]
    pub admission: AdmissionPolicy,

    // === Límites de lectura ===

    /// Bytes máximos de request line + headers
    #[arg(long = "max-head-bytes", default_value_t = DEFAULT_MAX_HEAD_BYTES, env = "MAX_HEAD_BYTES")]
    pub max_head_bytes: usize,

    /// Bytes máximos de body
    #[arg(long = "max-body-bytes", default_value_t = DEFAULT_MAX_BODY_BYTES, env = "MAX_BODY_BYTES")]
    pub max_body_bytes: usize,

    /// Timeout de lectura del socket en milisegundos (0 = sin timeout)
    #[arg(long = "read-timeout-ms", default_value = "0", env = "READ_TIMEOUT_MS")]
    pub read_timeout_ms: u64,

    // === Logging ===

    /// Nivel de log por defecto (RUST_LOG tiene prioridad)
    #[arg(long = "log-level", default_value = "info", env = "LOG_LEVEL")]
    pub log_level: String,
}

impl Config {
    /// Crea una nueva configuración parseando argumentos CLI
    pub fn new() -> Self {
        Config::parse()
    }

    /// Obtiene la dirección completa para bind (host:port)
    ///
    /// # Ejemplo
    /// ```rust
    /// use mini_http::config::Config;
    ///
    /// let config = Config::default();
    /// assert_eq!(config.address(), "127.0.0.1:8080");
    /// ```
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Límites de lectura para el parser
    pub fn limits(&self) -> Limits {
        Limits {
            max_head_bytes: self.max_head_bytes,
            max_body_bytes: self.max_body_bytes,
        }
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        (self.read_timeout_ms > 0).then(|| Duration::from_millis(self.read_timeout_ms))
    }

    /// Valida la configuración
    ///
    /// Retorna errores si hay valores inválidos
    pub fn validate(&self) -> Result<(), String> {
        if self.workers == 0 {
            return Err("Workers must be >= 1".to_string());
        }

        if self.queue_capacity == 0 {
            return Err("Queue capacity must be >= 1".to_string());
        }

        if self.max_head_bytes < MIN_HEAD_BYTES {
            return Err(format!("Max head bytes must be >= {}", MIN_HEAD_BYTES));
        }

        Ok(())
    }

    /// Registra un resumen de la configuración
    pub fn print_summary(&self) {
        info!(
            address = %self.address(),
            workers = self.workers,
            queue_capacity = self.queue_capacity,
            admission = ?self.admission,
            "network and worker pool"
        );
        info!(
            max_head_bytes = self.max_head_bytes,
            max_body_bytes = self.max_body_bytes,
            read_timeout_ms = self.read_timeout_ms,
            "request limits"
        );
    }
}

impl Default for Config {
    /// Configuración por defecto
    fn default() -> Self {
        Self {
            port: 8080,
            host: "127.0.0.1".to_string(),
            workers: DEFAULT_WORKERS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            admission: AdmissionPolicy::Reject,
            max_head_bytes: DEFAULT_MAX_HEAD_BYTES,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            read_timeout_ms: 0,
            log_level: "info".to_string(),
        }
    }
}
