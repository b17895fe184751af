//! # Parsing de Requests HTTP/1.0
//! src/http/request.rs
//!
//! Parser del transporte de demo. Sólo separa las partes del mensaje; el
//! verbo, el path y los headers los interpreta el motor REST.
//!
//! ## Formato de un Request HTTP/1.0
//!
//! ```text
//! PUT /routes/3?restPUT HTTP/1.0\r\n
//! Host: localhost:8080\r\n
//! Content-Type: application/json\r\n
//! Content-Length: 27\r\n
//! \r\n
//! {"destination":"10.0.0.0/8"}
//! ```
//!
//! ## Componentes
//!
//! 1. **Request Line**: `METHOD /path?query HTTP/1.0`
//! 2. **Headers**: Pares `Name: Value` (uno por línea)
//! 3. **Empty Line**: `\r\n` que separa headers del body
//! 4. **Body**: exactamente `Content-Length` bytes (0 si no se declara)

use super::headers::RequestHeaders;
use crate::rest::RequestParts;
use std::io::Cursor;
use thiserror::Error;

/// Separador entre headers y body
pub const HEADER_END: &[u8] = b"\r\n\r\n";

/// Errores que pueden ocurrir durante el parsing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Request incompleto o truncado
    #[error("Incomplete HTTP request")]
    IncompleteRequest,

    /// Formato inválido de la request line
    #[error("Invalid request line format")]
    InvalidRequestLine,

    /// Versión HTTP incorrecta (HTTP/1.0 o HTTP/1.1)
    #[error("Invalid HTTP version: {0}")]
    InvalidHttpVersion(String),

    /// Header malformado
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// `Content-Length` que no es un número
    #[error("Invalid Content-Length: {0}")]
    InvalidContentLength(String),

    /// Request vacío
    #[error("Empty request")]
    EmptyRequest,
}

/// Representa un request HTTP/1.0 parseado
#[derive(Debug, Clone)]
pub struct Request {
    /// Verbo tal como vino (ej: "GET"); el motor decide si lo acepta
    method: String,

    /// Request target completo (ej: "/routes/3?restPUT")
    target: String,

    /// Headers en orden de llegada
    headers: RequestHeaders,

    /// Versión HTTP
    version: String,

    /// Body del request
    body: Vec<u8>,
}

impl Request {
    /// Parsea un request HTTP/1.0 desde bytes
    ///
    /// # Ejemplo
    ///
    /// ```
    /// use restcgi::http::Request;
    ///
    /// let raw = b"GET /routes?limit=10 HTTP/1.0\r\n\r\n";
    /// let request = Request::parse(raw).unwrap();
    ///
    /// assert_eq!(request.method(), "GET");
    /// assert_eq!(request.path(), "/routes");
    /// assert_eq!(request.query(), "limit=10");
    /// ```
    pub fn parse(buffer: &[u8]) -> Result<Self, ParseError> {
        let mut request = Self::parse_head(buffer)?;

        // Body según Content-Length
        let declared = match request.headers.get("Content-Length") {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .map_err(|_| ParseError::InvalidContentLength(raw.to_string()))?,
            None => 0,
        };
        let head_end = find_header_end(buffer).ok_or(ParseError::IncompleteRequest)?;
        let rest = &buffer[head_end + HEADER_END.len()..];
        if rest.len() < declared {
            return Err(ParseError::IncompleteRequest);
        }
        request.body = rest[..declared].to_vec();
        Ok(request)
    }

    /// Parsea request line y headers, sin body. El transporte lo usa cuando
    /// el `Content-Length` declarado excede el límite y no vale la pena
    /// leer el cuerpo: el motor responde 413 a partir del header.
    pub fn parse_head(buffer: &[u8]) -> Result<Self, ParseError> {
        if buffer.iter().all(u8::is_ascii_whitespace) {
            return Err(ParseError::EmptyRequest);
        }

        let head_end = find_header_end(buffer).ok_or(ParseError::IncompleteRequest)?;
        let head = std::str::from_utf8(&buffer[..head_end])
            .map_err(|_| ParseError::InvalidRequestLine)?;
        let mut lines = head.split("\r\n");

        // 1. Request line
        let (method, target, version) =
            Self::parse_request_line(lines.next().unwrap_or(""))?;

        // 2. Headers
        let headers = Self::parse_headers(lines)?;

        Ok(Request {
            method,
            target,
            headers,
            version,
            body: Vec::new(),
        })
    }

    /// Parsea la request line: `METHOD /path?query HTTP/1.0`
    fn parse_request_line(line: &str) -> Result<(String, String, String), ParseError> {
        let parts: Vec<&str> = line.split_whitespace().collect();

        // Debe tener exactamente 3 partes: METHOD TARGET VERSION
        if parts.len() != 3 {
            return Err(ParseError::InvalidRequestLine);
        }

        let version = parts[2].to_string();
        if version != "HTTP/1.0" && version != "HTTP/1.1" {
            return Err(ParseError::InvalidHttpVersion(version));
        }

        Ok((parts[0].to_string(), parts[1].to_string(), version))
    }

    /// Parsea los headers; cada uno tiene formato "Name: Value"
    fn parse_headers<'a>(lines: impl Iterator<Item = &'a str>) -> Result<RequestHeaders, ParseError> {
        let mut headers = RequestHeaders::new();
        for line in lines {
            if line.trim().is_empty() {
                break;
            }
            match line.split_once(':') {
                Some((name, value)) if !name.trim().is_empty() => {
                    headers.insert(name.trim(), value.trim());
                }
                _ => return Err(ParseError::InvalidHeader(line.to_string())),
            }
        }
        Ok(headers)
    }

    // === Accesores ===

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Path sin query
    pub fn path(&self) -> &str {
        self.target.split_once('?').map_or(self.target.as_str(), |(p, _)| p)
    }

    /// Query string sin `?`
    pub fn query(&self) -> &str {
        self.target.split_once('?').map_or("", |(_, q)| q)
    }

    pub fn headers(&self) -> &RequestHeaders {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Convierte el request en la entrada del motor REST
    pub fn into_parts(self) -> RequestParts {
        let mut parts = RequestParts::new(&self.method, &self.target);
        parts.headers = self.headers;
        if !self.body.is_empty() {
            parts.body = Some(Box::new(Cursor::new(self.body)));
        }
        parts
    }
}

/// Posición de `\r\n\r\n` en el buffer
pub fn find_header_end(buffer: &[u8]) -> Option<usize> {
    buffer
        .windows(HEADER_END.len())
        .position(|window| window == HEADER_END)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn test_parse_simple_get() {
        let request = Request::parse(b"GET / HTTP/1.0\r\n\r\n").unwrap();
        assert_eq!(request.method(), "GET");
        assert_eq!(request.path(), "/");
        assert_eq!(request.query(), "");
        assert!(request.body().is_empty());
    }

    #[test]
    fn test_parse_with_query() {
        let request = Request::parse(b"POST /routes?restDELETE HTTP/1.0\r\n\r\n").unwrap();
        assert_eq!(request.path(), "/routes");
        assert_eq!(request.query(), "restDELETE");
    }

    #[test]
    fn test_parse_with_headers() {
        let raw = b"GET / HTTP/1.0\r\nHost: localhost:8080\r\nIf-None-Match: \"v1\"\r\n\r\n";
        let request = Request::parse(raw).unwrap();
        assert_eq!(request.header("host"), Some("localhost:8080"));
        assert_eq!(request.header("If-None-Match"), Some("\"v1\""));
    }

    #[test]
    fn test_body_uses_content_length() {
        let raw = b"PUT / HTTP/1.0\r\nContent-Length: 4\r\n\r\n{}\r\nignored";
        let request = Request::parse(raw).unwrap();
        assert_eq!(request.body(), b"{}\r\n");
    }

    #[test]
    fn test_truncated_body_is_incomplete() {
        let raw = b"PUT / HTTP/1.0\r\nContent-Length: 10\r\n\r\nabc";
        assert_eq!(Request::parse(raw).unwrap_err(), ParseError::IncompleteRequest);
    }

    #[test]
    fn test_parse_head_skips_body() {
        let raw = b"PUT / HTTP/1.0\r\nContent-Length: 9999\r\n\r\nabc";
        let request = Request::parse_head(raw).unwrap();
        assert_eq!(request.headers().content_length(), Some(9999));
        assert!(request.body().is_empty());
    }

    #[test]
    fn test_unknown_verb_is_left_to_engine() {
        let request = Request::parse(b"PATCH / HTTP/1.0\r\n\r\n").unwrap();
        assert_eq!(request.method(), "PATCH");
    }

    #[test]
    fn test_invalid_version() {
        let result = Request::parse(b"GET / HTTP/2.0\r\n\r\n");
        assert!(matches!(result, Err(ParseError::InvalidHttpVersion(_))));
    }

    #[test]
    fn test_empty_request() {
        assert_eq!(Request::parse(b"").unwrap_err(), ParseError::EmptyRequest);
    }

    #[test]
    fn test_invalid_request_line() {
        let result = Request::parse(b"GET\r\n\r\n");
        assert!(matches!(result, Err(ParseError::InvalidRequestLine)));
    }

    #[test]
    fn test_invalid_header_and_length() {
        let result = Request::parse(b"GET / HTTP/1.0\r\nno colon\r\n\r\n");
        assert!(matches!(result, Err(ParseError::InvalidHeader(_))));

        let result = Request::parse(b"GET / HTTP/1.0\r\nContent-Length: x\r\n\r\n");
        assert!(matches!(result, Err(ParseError::InvalidContentLength(_))));
    }

    #[test]
    fn test_into_parts() {
        let raw = b"PUT /routes/1?x=1 HTTP/1.0\r\nContent-Length: 2\r\n\r\n{}";
        let parts = Request::parse(raw).unwrap().into_parts();
        assert_eq!(parts.method, "PUT");
        assert_eq!(parts.path, "/routes/1");
        assert_eq!(parts.query, "x=1");
        let mut body = String::new();
        parts.body.unwrap().read_to_string(&mut body).unwrap();
        assert_eq!(body, "{}");
    }
}
