//! # Respuestas HTTP/1.0
//! src/http/response.rs
//!
//! Serializa lo que el motor dejó en un
//! [`BufferedEndpoint`](crate::method::BufferedEndpoint) como respuesta
//! HTTP/1.0 para el servidor de demo. Los headers se emiten en el orden en
//! que el motor los produjo.
//!
//! ## Formato de una respuesta HTTP/1.0
//!
//! ```text
//! HTTP/1.0 201 Created\r\n
//! Location: /routes/7\r\n
//! Content-Type: application/json\r\n
//! Content-Length: 2\r\n
//! Connection: close\r\n
//! \r\n
//! {}
//! ```

use super::StatusCode;
use crate::method::BufferedEndpoint;

/// Representa una respuesta HTTP/1.0 completa
#[derive(Debug, Clone)]
pub struct Response {
    /// Código de estado HTTP
    status: StatusCode,

    /// Headers en orden de emisión
    headers: Vec<(String, String)>,

    /// Cuerpo de la respuesta (puede ser vacío)
    body: Vec<u8>,
}

impl Response {
    /// Crea una respuesta sin headers ni body
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Toma la respuesta capturada por el endpoint. Si el motor no respondió
    /// (no debería pasar) se responde 500.
    pub fn from_endpoint(endpoint: BufferedEndpoint) -> Self {
        let (status, headers, body) = endpoint.into_parts();
        match status {
            Some(status) => Self {
                status,
                headers,
                body,
            },
            None => {
                tracing::error!("engine finished without responding");
                Self::new(StatusCode::InternalServerError).with_header("Content-Length", "0")
            }
        }
    }

    /// Agrega un header, reemplazando uno existente con el mismo nombre
    ///
    /// # Ejemplo
    /// ```
    /// use restcgi::http::{Response, StatusCode};
    ///
    /// let response = Response::new(StatusCode::Ok)
    ///     .with_header("Content-Type", "application/json");
    /// assert_eq!(response.header("content-type"), Some("application/json"));
    /// ```
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.add_header(name, value);
        self
    }

    /// Reemplaza el body
    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    /// Versión mutable de [`Response::with_header`]
    pub fn add_header(&mut self, name: &str, value: &str) {
        match self
            .headers
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
        {
            Some(field) => field.1 = value.to_string(),
            None => self.headers.push((name.to_string(), value.to_string())),
        }
    }

    /// Convierte la respuesta a bytes listos para enviar por el socket.
    ///
    /// Para HEAD se envían los headers sin body.
    pub fn to_bytes(&self, include_body: bool) -> Vec<u8> {
        let mut result = Vec::new();

        // 1. Status line
        result.extend_from_slice(format!("HTTP/1.0 {}\r\n", self.status).as_bytes());

        // 2. Headers
        for (name, value) in &self.headers {
            result.extend_from_slice(format!("{}: {}\r\n", name, value).as_bytes());
        }

        // 3. Línea vacía que separa headers del body
        result.extend_from_slice(b"\r\n");

        // 4. Body
        if include_body {
            result.extend_from_slice(&self.body);
        }
        result
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }
}
