//! # Lectura acotada del socket
//! src/http/reader.rs
//!
//! El head de un request (request line + headers) se lee en un buffer que
//! crece por re-lecturas hasta encontrar `\r\n\r\n`, hasta que el cliente
//! cierra o hasta alcanzar el máximo configurado. Nunca se lee más allá de
//! ese máximo: un head que no cabe es un error de parsing, no un buffer
//! más grande.
//!
//! ```text
//!  lectura 1          lectura 2
//! ┌──────────────┐  ┌───────────────────────┐
//! │GET /a HTTP/1.│  │1\r\nHost: x\r\n\r\nab │  ← "ab" queda para el body
//! └──────────────┘  └───────────────────────┘
//! ```

use super::request::ParseError;
use std::io::{self, Read};

/// Máximo por defecto del head (request line + headers)
pub const DEFAULT_MAX_HEAD_BYTES: usize = 4096;

/// Máximo por defecto del body declarado en `Content-Length`
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Tamaño de cada lectura individual del socket
const READ_CHUNK: usize = 1024;

/// Delimitador de fin de línea HTTP
pub(crate) const CRLF: &[u8] = b"\r\n";

/// Delimitador de fin del bloque de headers
pub(crate) const HEADERS_END: &[u8] = b"\r\n\r\n";

/// Límites de lectura de un request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Bytes máximos para request line + headers
    pub max_head_bytes: usize,

    /// Bytes máximos aceptados como body
    pub max_body_bytes: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_head_bytes: DEFAULT_MAX_HEAD_BYTES,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

/// Busca `target` dentro de `haystack[start..]` y retorna la posición absoluta
pub(crate) fn find(haystack: &[u8], target: &[u8], start: usize) -> Option<usize> {
    if start > haystack.len() {
        return None;
    }
    haystack[start..]
        .windows(target.len())
        .position(|window| window == target)
        .map(|pos| start + pos)
}

/// Lector de un único request sobre una fuente de bytes
pub struct RequestReader<R> {
    inner: R,
    buffer: Vec<u8>,
    limits: Limits,
}

impl<R: Read> RequestReader<R> {
    pub fn new(inner: R, limits: Limits) -> Self {
        Self {
            inner,
            buffer: Vec::with_capacity(READ_CHUNK),
            limits,
        }
    }

    /// Lee el head del request
    ///
    /// Re-lee hasta que el buffer contenga `\r\n\r\n`, la fuente llegue a EOF
    /// o se alcance `max_head_bytes`. Retorna los bytes leídos, que pueden
    /// incluir el comienzo del body.
    pub fn fill_head(&mut self) -> io::Result<&[u8]> {
        let max = self.limits.max_head_bytes;

        let mut scan_from = 0;

        loop {
            if find(&self.buffer, HEADERS_END, scan_from).is_some() || self.buffer.len() >= max {
                break;
            }

            let start = self.buffer.len();
            // Solo hace falta revisar los bytes nuevos (y 3 de solapamiento)
            scan_from = start.saturating_sub(HEADERS_END.len() - 1);
            let want = READ_CHUNK.min(max - start);
            self.buffer.resize(start + want, 0);

            match self.inner.read(&mut self.buffer[start..]) {
                Ok(read) => {
                    self.buffer.truncate(start + read);
                    if read == 0 {
                        break;
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {
                    self.buffer.truncate(start);
                }
                Err(e) => {
                    self.buffer.truncate(start);
                    return Err(e);
                }
            }
        }

        Ok(&self.buffer)
    }

    /// Lee exactamente `length` bytes de body a partir de `offset`
    ///
    /// Primero consume lo que ya quedó en el buffer del head y luego sigue
    /// leyendo de la fuente. Si la fuente termina antes, el body está
    /// truncado.
    pub fn read_body(&mut self, offset: usize, length: usize) -> Result<Vec<u8>, ParseError> {
        if length > self.limits.max_body_bytes {
            return Err(ParseError::BodyTooLarge {
                declared: length,
                limit: self.limits.max_body_bytes,
            });
        }

        let buffered_end = self.buffer.len().min(offset.saturating_add(length));
        let mut body = Vec::with_capacity(length);
        if offset < buffered_end {
            body.extend_from_slice(&self.buffer[offset..buffered_end]);
        }

        let missing = (length - body.len()) as u64;
        if missing > 0 {
            (&mut self.inner).take(missing).read_to_end(&mut body)?;
        }

        if body.len() < length {
            return Err(ParseError::TruncatedBody {
                expected: length,
                received: body.len(),
            });
        }

        Ok(body)
    }
}
