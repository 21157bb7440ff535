//! # Logging
//! src/logging.rs
//!
//! Inicializa `tracing-subscriber` con salida en texto. `RUST_LOG` tiene
//! prioridad sobre el nivel configurado, por ejemplo:
//!
//! ```bash
//! RUST_LOG=mini_http=debug ./mini_http
//! ```

use tracing_subscriber::EnvFilter;

/// Instala el subscriber global
///
/// Retorna `false` si ya había uno instalado (por ejemplo en tests que
/// inicializan más de una vez).
pub fn init(default_level: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .with_target(false)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init("debug");
        assert!(!init("info"));
    }
}
