//! # Sistema de Routing
//! src/router/mod.rs
//!
//! Tabla de rutas `método → path exacto → handler`.
//!
//! ```text
//! Request → Router::lookup(method, path) → Handler → bytes al socket
//! ```
//!
//! La coincidencia es exacta: no hay prefijos, comodines ni segmentos con
//! parámetros. La tabla se lee desde todos los workers a la vez y se puede
//! registrar antes o después de arrancar el servidor (RwLock).

use crate::error::ServerError;
use crate::http::{Method, Request};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::Arc;
use tracing::debug;

/// Contrato de un handler de ruta
///
/// Recibe el request parseado y el destino de escritura. Debe escribir la
/// respuesta completa (status line, headers con `Content-Length`, body) y
/// no cerrar el destino: de eso se encarga el dispatcher.
pub trait Handler: Send + Sync + 'static {
    fn handle(&self, request: &Request, out: &mut dyn Write) -> io::Result<()>;
}

impl<F> Handler for F
where
    F: Fn(&Request, &mut dyn Write) -> io::Result<()> + Send + Sync + 'static,
{
    fn handle(&self, request: &Request, out: &mut dyn Write) -> io::Result<()> {
        self(request, out)
    }
}

type Routes = HashMap<Method, HashMap<String, Arc<dyn Handler>>>;

/// Router que mapea (método, path) a handlers
#[derive(Default)]
pub struct Router {
    routes: RwLock<Routes>,
}

impl Router {
    /// Crea un nuevo router vacío
    pub fn new() -> Self {
        Self::default()
    }

    /// Registra una ruta con su handler
    ///
    /// Registrar otra vez el mismo (método, path) reemplaza el handler.
    ///
    /// # Ejemplo
    /// ```
    /// use mini_http::http::{Method, Request, Response};
    /// use mini_http::router::Router;
    /// use std::io::{self, Write};
    ///
    /// fn hello_handler(_req: &Request, out: &mut dyn Write) -> io::Result<()> {
    ///     Response::text("Hello").write_to(out)
    /// }
    ///
    /// let router = Router::new();
    /// router.register(Method::GET, "/hello", hello_handler);
    /// assert!(router.lookup(Method::GET, "/hello").is_ok());
    /// ```
    pub fn register<H: Handler>(&self, method: Method, path: &str, handler: H) {
        let replaced = self
            .routes
            .write()
            .entry(method)
            .or_default()
            .insert(path.to_string(), Arc::new(handler))
            .is_some();

        debug!(%method, path, replaced, "route registered");
    }

    /// Busca el handler de (método, path)
    ///
    /// Retorna un `Arc` para que el lock se libere antes de ejecutar el
    /// handler.
    pub fn lookup(&self, method: Method, path: &str) -> Result<Arc<dyn Handler>, ServerError> {
        self.routes
            .read()
            .get(&method)
            .and_then(|by_path| by_path.get(path))
            .cloned()
            .ok_or_else(|| ServerError::RouteNotFound {
                method,
                path: path.to_string(),
            })
    }

    /// Cantidad total de rutas registradas
    pub fn len(&self) -> usize {
        self.routes.read().values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
