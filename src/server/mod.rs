//! # Módulo del Servidor HTTP
//! src/server/mod.rs
//!
//! Este módulo implementa el servidor TCP que:
//! 1. Escucha en un puerto
//! 2. Acepta conexiones y las encola en un pool de workers acotado
//! 3. Parsea el request y lo despacha a su handler
//! 4. Responde 400/404/503 fijos cuando corresponde y cierra la conexión

pub mod pool;
pub mod tcp;

// Re-exportar para facilitar el uso
pub use pool::WorkerPool;
pub use tcp::{handle_connection, Outcome, Server};
