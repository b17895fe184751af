//! # Endpoints de Respuesta
//! src/method/endpoint.rs
//!
//! Un [`Endpoint`] es el lado de salida del transporte: recibe la línea de
//! estado con los headers una sola vez y luego entrega el writer del cuerpo.
//!
//! - [`BufferedEndpoint`]: guarda todo en memoria (tests, servidor de demo)
//! - [`CgiEndpoint`]: escribe una respuesta CGI (`Status:` + headers + línea en blanco)

use crate::http::StatusCode;
use std::io::{self, Write};

/// Lado de salida del transporte
pub trait Endpoint {
    /// Envía el código de estado y los headers
    fn send_head(&mut self, status: StatusCode, fields: &[(String, String)]) -> io::Result<()>;

    /// Writer del cuerpo (válido después de `send_head`)
    fn body(&mut self) -> &mut dyn Write;
}

/// Endpoint que captura la respuesta completa en memoria
#[derive(Debug, Default)]
pub struct BufferedEndpoint {
    status: Option<StatusCode>,
    fields: Vec<(String, String)>,
    body: Vec<u8>,
}

impl BufferedEndpoint {
    pub fn new() -> Self {
        Self::default()
    }

    /// Código enviado, `None` si todavía no se respondió
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    /// Busca un header enviado sin distinguir mayúsculas
    pub fn header(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn body_bytes(&self) -> &[u8] {
        &self.body
    }

    /// Cuerpo como texto (UTF-8 con reemplazo)
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Descompone el endpoint en sus partes
    pub fn into_parts(self) -> (Option<StatusCode>, Vec<(String, String)>, Vec<u8>) {
        (self.status, self.fields, self.body)
    }
}

impl Endpoint for BufferedEndpoint {
    fn send_head(&mut self, status: StatusCode, fields: &[(String, String)]) -> io::Result<()> {
        self.status = Some(status);
        self.fields = fields.to_vec();
        Ok(())
    }

    fn body(&mut self) -> &mut dyn Write {
        &mut self.body
    }
}

/// Endpoint CGI: el servidor web completa la línea de estado a partir del
/// header `Status`.
///
/// ```text
/// Status: 201 Created\r\n
/// Location: /routes/7\r\n
/// \r\n
/// ```
pub struct CgiEndpoint<W: Write> {
    out: W,
}

impl<W: Write> CgiEndpoint<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Endpoint for CgiEndpoint<W> {
    fn send_head(&mut self, status: StatusCode, fields: &[(String, String)]) -> io::Result<()> {
        write!(self.out, "Status: {}\r\n", status)?;
        for (name, value) in fields {
            write!(self.out, "{}: {}\r\n", name, value)?;
        }
        self.out.write_all(b"\r\n")?;
        self.out.flush()
    }

    fn body(&mut self) -> &mut dyn Write {
        &mut self.out
    }
}
