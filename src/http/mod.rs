//! # Módulo HTTP
//!
//! Implementa el subconjunto de HTTP/1.1 que usa el servidor, sin
//! librerías de alto nivel:
//!
//! - Lectura acotada del request desde el socket
//! - Parsing de request line, headers crudos y body
//! - Decodificación de query parameters
//! - Construcción de responses con framing correcto
//!
//! ### Formato de Request
//!
//! ```text
//! GET /path?query=value HTTP/1.1\r\n
//! Header-Name: Header-Value\r\n
//! \r\n
//! ```
//!
//! ### Formato de Response
//!
//! ```text
//! HTTP/1.1 200 OK\r\n
//! Content-Type: application/json\r\n
//! Content-Length: 13\r\n
//! \r\n
//! {"ok": true}
//! ```
//!
//! Una conexión lleva exactamente un request: no hay keep-alive ni
//! chunked transfer encoding.

pub mod query;     // Decodificación de query strings
pub mod reader;    // Lectura acotada del socket
pub mod request;   // Parsing de HTTP requests
pub mod response;  // Construcción de HTTP responses
pub mod status;    // Códigos de estado HTTP

// Re-exportamos los tipos principales para facilitar su uso
pub use query::QueryParams;
pub use reader::Limits;
pub use request::{Method, ParseError, Request};
pub use response::Response;
pub use status::StatusCode;
