//! # Parsing de Requests HTTP/1.1
//! src/http/request.rs
//!
//! Parser de un único request por conexión.
//!
//! ## Formato de un Request
//!
//! ```text
//! POST /path?param1=value1&param1=value2 HTTP/1.1\r\n
//! Host: localhost:8080\r\n
//! Content-Length: 5\r\n
//! \r\n
//! hello
//! ```
//!
//! ## Componentes
//!
//! 1. **Request Line**: `METHOD /path?query VERSION` (exactamente 3 tokens)
//! 2. **Headers**: líneas crudas, sin separar en nombre/valor
//! 3. **Empty Line**: `\r\n` que separa headers del body
//! 4. **Body**: solo para métodos distintos de GET, según `Content-Length`

use super::query::{parse_query, QueryParams};
use super::reader::{find, Limits, RequestReader, CRLF, HEADERS_END};
use std::fmt;
use std::io::{self, Cursor, Read};
use thiserror::Error;

/// Métodos HTTP soportados
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// GET - Obtener un recurso (nunca lleva body)
    GET,

    /// POST - Enviar datos a un recurso
    POST,
}

impl Method {
    /// Parsea un método HTTP desde un string
    ///
    /// # Errores
    ///
    /// Retorna error si el método no está en la lista permitida
    fn from_str(s: &str) -> Result<Self, ParseError> {
        match s {
            "GET" => Ok(Method::GET),
            "POST" => Ok(Method::POST),
            _ => Err(ParseError::UnsupportedMethod(s.to_string())),
        }
    }

    /// Convierte el método a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::POST => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errores que pueden ocurrir durante el parsing
///
/// Todos, salvo `Transport`, se responden con el mismo 400; la variante
/// solo sirve para el log.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Falta el `\r\n` de la request line o no tiene 3 tokens
    #[error("malformed request line")]
    MalformedRequestLine,

    /// Método fuera de la lista permitida
    #[error("unsupported method: {0}")]
    UnsupportedMethod(String),

    /// El path no empieza con '/'
    #[error("malformed path: {0}")]
    MalformedPath(String),

    /// Escape `%` inválido o bytes que no son UTF-8 en la query
    #[error("malformed query component: {0}")]
    MalformedQuery(String),

    /// No se encontró el fin del bloque de headers
    #[error("malformed header block")]
    MalformedHeaders,

    /// `Content-Length` no es un entero no negativo
    #[error("invalid Content-Length: {0}")]
    InvalidContentLength(String),

    /// El cliente cerró antes de enviar todo el body declarado
    #[error("truncated body: expected {expected} bytes, received {received}")]
    TruncatedBody { expected: usize, received: usize },

    /// El body declarado supera el límite configurado
    #[error("declared body of {declared} bytes exceeds limit of {limit}")]
    BodyTooLarge { declared: usize, limit: usize },

    /// Error de I/O leyendo del socket
    #[error("transport error while reading request: {0}")]
    Transport(#[from] io::Error),
}

impl ParseError {
    /// Nombre corto de la variante, para logs
    pub fn kind(&self) -> &'static str {
        match self {
            ParseError::MalformedRequestLine => "malformed_request_line",
            ParseError::UnsupportedMethod(_) => "unsupported_method",
            ParseError::MalformedPath(_) => "malformed_path",
            ParseError::MalformedQuery(_) => "malformed_query",
            ParseError::MalformedHeaders => "malformed_headers",
            ParseError::InvalidContentLength(_) => "invalid_content_length",
            ParseError::TruncatedBody { .. } => "truncated_body",
            ParseError::BodyTooLarge { .. } => "body_too_large",
            ParseError::Transport(_) => "transport",
        }
    }
}

/// Representa un request HTTP parseado
///
/// Inmutable una vez construido; pertenece a la conexión que lo leyó.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,

    /// Path sin query string (siempre empieza con '/')
    path: String,

    query_params: QueryParams,

    /// Líneas de header tal como llegaron
    headers: Vec<String>,

    /// Tercer token de la request line (no se valida)
    version: String,

    body: Vec<u8>,
}

impl Request {
    /// Lee y parsea un request desde una fuente de bytes
    ///
    /// # Retorna
    ///
    /// * `Ok(Request)` - Request parseado exitosamente
    /// * `Err(ParseError)` - Request inválido o error de transporte
    pub fn read_from<R: Read>(source: R, limits: Limits) -> Result<Self, ParseError> {
        let mut reader = RequestReader::new(source, limits);
        let buffer = reader.fill_head()?;

        // 1. Request line
        let request_line_end = find(buffer, CRLF, 0).ok_or(ParseError::MalformedRequestLine)?;
        let (method, path, query_params, version) =
            Self::parse_request_line(&buffer[..request_line_end])?;

        // 2. Headers: el terminador se busca después del CRLF de la request
        // line, así que un request sin ningún header no tiene terminador
        let headers_start = request_line_end + CRLF.len();
        let headers_end =
            find(buffer, HEADERS_END, headers_start).ok_or(ParseError::MalformedHeaders)?;
        let headers = Self::parse_headers(buffer, headers_start, headers_end)?;
        let body_start = headers_end + HEADERS_END.len();

        // 3. Body (GET nunca lo lee)
        let body = match method {
            Method::GET => Vec::new(),
            _ => match Self::content_length(&headers)? {
                Some(length) => reader.read_body(body_start, length)?,
                None => Vec::new(),
            },
        };

        Ok(Request {
            method,
            path,
            query_params,
            headers,
            version,
            body,
        })
    }

    /// Parsea un request completo que ya está en memoria
    ///
    /// # Ejemplo
    ///
    /// ```
    /// use mini_http::http::Request;
    ///
    /// let raw = b"GET /search?tag=a&tag=b HTTP/1.1\r\nHost: x\r\n\r\n";
    /// let request = Request::parse(raw).unwrap();
    ///
    /// assert_eq!(request.path(), "/search");
    /// assert_eq!(request.query_values("tag"), ["a", "b"]);
    /// ```
    pub fn parse(buffer: &[u8]) -> Result<Self, ParseError> {
        Self::read_from(Cursor::new(buffer), Limits::default())
    }

    /// Parsea la request line
    ///
    /// Formato: `GET /path?query HTTP/1.1`, separada por espacios simples
    fn parse_request_line(
        line: &[u8],
    ) -> Result<(Method, String, QueryParams, String), ParseError> {
        let line = std::str::from_utf8(line).map_err(|_| ParseError::MalformedRequestLine)?;
        let parts: Vec<&str> = line.split(' ').collect();

        let [method, target, version] = parts[..] else {
            return Err(ParseError::MalformedRequestLine);
        };

        let method = Method::from_str(method)?;

        if !target.starts_with('/') {
            return Err(ParseError::MalformedPath(target.to_string()));
        }

        let (path, query_params) = match target.split_once('?') {
            Some((path, query)) => (path, parse_query(query)?),
            None => (target, QueryParams::new()),
        };

        Ok((method, path.to_string(), query_params, version.to_string()))
    }

    /// Separa el bloque de headers en líneas crudas
    fn parse_headers(buffer: &[u8], start: usize, end: usize) -> Result<Vec<String>, ParseError> {
        if start >= end {
            return Ok(Vec::new());
        }

        let block = std::str::from_utf8(&buffer[start..end]).map_err(|_| ParseError::MalformedHeaders)?;
        Ok(block.split("\r\n").map(str::to_string).collect())
    }

    /// Busca `Content-Length` y lo interpreta como entero base 10
    fn content_length(headers: &[String]) -> Result<Option<usize>, ParseError> {
        match find_header(headers, "Content-Length") {
            Some(value) => value
                .parse::<usize>()
                .map(Some)
                .map_err(|_| ParseError::InvalidContentLength(value.to_string())),
            None => Ok(None),
        }
    }

    // === Métodos públicos para acceder a los campos ===

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Obtiene todos los query parameters
    pub fn query_params(&self) -> &QueryParams {
        &self.query_params
    }

    /// Obtiene el primer valor de un query parameter
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query_values(name).first().map(String::as_str)
    }

    /// Obtiene todos los valores de un query parameter, en orden
    pub fn query_values(&self, name: &str) -> &[String] {
        self.query_params.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Obtiene las líneas de header sin procesar
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Obtiene el valor del primer header con ese nombre
    ///
    /// La comparación del nombre no distingue mayúsculas.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Obtiene el body del request como String
    pub fn body_string(&self) -> Option<String> {
        String::from_utf8(self.body.clone()).ok()
    }
}

/// Busca la primera línea `Name: value` y retorna el valor recortado
fn find_header<'a>(headers: &'a [String], name: &str) -> Option<&'a str> {
    headers.iter().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        key.trim().eq_ignore_ascii_case(name).then(|| value.trim())
    })
}
