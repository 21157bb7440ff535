//! # Query strings
//! src/http/query.rs
//!
//! Decodifica `a=1&b=hola%20mundo&a=2` en un mapa nombre → valores,
//! conservando duplicados y el orden en que aparecen.

use super::request::ParseError;
use percent_encoding::percent_decode_str;
use std::collections::BTreeMap;

/// Parámetros de query: cada nombre mapea a sus valores en orden de aparición
pub type QueryParams = BTreeMap<String, Vec<String>>;

/// Parsea una query string (sin el `?` inicial)
///
/// # Ejemplo
/// ```
/// use mini_http::http::query::parse_query;
///
/// let params = parse_query("k=v&k=v2&x=hola+mundo").unwrap();
/// assert_eq!(params["k"], vec!["v", "v2"]);
/// assert_eq!(params["x"], vec!["hola mundo"]);
/// ```
pub fn parse_query(query: &str) -> Result<QueryParams, ParseError> {
    let mut params = QueryParams::new();

    for pair in query.split('&') {
        if pair.is_empty() {
            continue;
        }

        // Parámetro sin '=' (ej: "?debug") queda con valor vacío
        let (name, value) = pair.split_once('=').unwrap_or((pair, ""));

        params
            .entry(decode_component(name)?)
            .or_default()
            .push(decode_component(value)?);
    }

    Ok(params)
}

/// Decodifica un componente `application/x-www-form-urlencoded`
///
/// `+` es un espacio; `%XX` se interpreta como byte y el resultado debe
/// ser UTF-8 válido.
fn decode_component(raw: &str) -> Result<String, ParseError> {
    let bytes = raw.as_bytes();
    let mut i = 0;
    while let Some(pos) = bytes[i..].iter().position(|&b| b == b'%') {
        let at = i + pos;
        let escape_ok = bytes
            .get(at + 1..at + 3)
            .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit));
        if !escape_ok {
            return Err(ParseError::MalformedQuery(raw.to_string()));
        }
        i = at + 3;
    }

    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|_| ParseError::MalformedQuery(raw.to_string()))
}
