//! # Método en Curso
//! src/method/mod.rs
//!
//! Un [`Method`] representa el request que se está procesando: verbo, path,
//! query, headers, cookies, cuerpo de entrada y el endpoint por donde sale la
//! respuesta. Se responde exactamente una vez; responder dos veces es un
//! error de programación y aborta el proceso del request.
//!
//! ## Verbos por query
//!
//! Un POST con el parámetro `restPUT` o `restDELETE` (el valor se ignora) se
//! procesa como PUT o DELETE, para clientes que no pueden emitir esos verbos.

pub mod endpoint;

pub use endpoint::{BufferedEndpoint, CgiEndpoint, Endpoint};

use crate::cookie::Cookies;
use crate::error::Result;
use crate::http::headers::{ContentHeaders, RequestHeaders, ResponseHeaders};
use crate::http::uri::{Query, UriPath};
use crate::http::{StatusCode, Verb};
use crate::version::VersionConstraint;
use std::io::{Read, Write};

/// Parámetro de query que convierte un POST en PUT
pub const QP_REST_PUT: &str = "restPUT";

/// Parámetro de query que convierte un POST en DELETE
pub const QP_REST_DELETE: &str = "restDELETE";

/// Partes ya validadas de un request
pub struct MethodParts {
    pub verb: Verb,
    pub uri_path: UriPath,
    pub query: Query,
    pub headers: RequestHeaders,
    pub body: Option<Box<dyn Read>>,
}

/// Request en curso
pub struct Method<'e> {
    verb: Verb,
    uri_path: UriPath,
    query: Query,
    headers: RequestHeaders,
    cookies: Cookies,
    constraint: Option<VersionConstraint>,
    body: Option<Box<dyn Read>>,
    endpoint: &'e mut dyn Endpoint,
    status: Option<StatusCode>,
}

impl<'e> Method<'e> {
    /// Recibe el request: aplica la conversión de verbo por query, parsea
    /// las cookies y arma el constraint de versión desde los headers.
    pub fn new(parts: MethodParts, endpoint: &'e mut dyn Endpoint) -> Self {
        let MethodParts {
            verb,
            uri_path,
            query,
            headers,
            body,
        } = parts;

        let verb = if verb == Verb::Post && query.contains(QP_REST_PUT) {
            Verb::Put
        } else if verb == Verb::Post && query.contains(QP_REST_DELETE) {
            Verb::Delete
        } else {
            verb
        };

        let mut cookies = Cookies::request();
        if let Some(raw) = headers.get("Cookie") {
            if !cookies.insert_header(raw) {
                tracing::warn!(header = raw, "malformed Cookie header, kept valid entries");
            }
        }

        let constraint = VersionConstraint::from_headers(&headers);

        Self {
            verb,
            uri_path,
            query,
            headers,
            cookies,
            constraint,
            body,
            endpoint,
            status: None,
        }
    }

    pub fn verb(&self) -> Verb {
        self.verb
    }

    /// Path completo del request (el localizador trabaja sobre una copia)
    pub fn uri_path(&self) -> &UriPath {
        &self.uri_path
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn headers(&self) -> &RequestHeaders {
        &self.headers
    }

    /// Cookies recibidas en el header `Cookie`
    pub fn cookies(&self) -> &Cookies {
        &self.cookies
    }

    /// Constraint de versión del request, si trajo precondiciones
    pub fn version_constraint(&self) -> Option<&VersionConstraint> {
        self.constraint.as_ref()
    }

    /// Toma el cuerpo de entrada (sólo una vez)
    pub fn take_body(&mut self) -> Option<Box<dyn Read>> {
        self.body.take()
    }

    pub fn responded(&self) -> bool {
        self.status.is_some()
    }

    /// Código con el que se respondió
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Responde sin contenido.
    ///
    /// # Panics
    /// Si ya se respondió.
    pub fn respond(&mut self, status: StatusCode, rh: ResponseHeaders) -> Result<()> {
        self.send(status, rh.to_fields())
    }

    /// Responde con contenido y retorna el writer del cuerpo. Si el código
    /// prohíbe contenido se envían sólo los headers de la respuesta.
    ///
    /// # Panics
    /// Si ya se respondió.
    pub fn respond_with_content(
        &mut self,
        ch: &ContentHeaders,
        status: StatusCode,
        rh: ResponseHeaders,
    ) -> Result<&mut dyn Write> {
        let mut fields = rh.to_fields();
        if !status.forbids_body() {
            fields.extend(ch.to_fields());
        }
        self.send(status, fields)?;
        Ok(self.endpoint.body())
    }

    fn send(&mut self, status: StatusCode, fields: Vec<(String, String)>) -> Result<()> {
        if let Some(previous) = self.status {
            tracing::error!(
                verb = %self.verb,
                path = %self.uri_path,
                previous = %previous,
                status = %status,
                "method already responded"
            );
        }
        assert!(self.status.is_none(), "method already responded");
        self.status = Some(status);
        tracing::debug!(verb = %self.verb, path = %self.uri_path, status = status.as_u16(), "responding");
        self.endpoint.send_head(status, &fields)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cookie::Cookie;
    use std::io::Cursor;

    fn parts(verb: Verb, path: &str, query: &str, headers: &[(&str, &str)]) -> MethodParts {
        MethodParts {
            verb,
            uri_path: UriPath::parse(path),
            query: Query::parse(query),
            headers: headers.iter().copied().collect(),
            body: None,
        }
    }

    #[test]
    fn test_rest_put_and_rest_delete_rewrite() {
        let mut ep = BufferedEndpoint::new();
        let m = Method::new(parts(Verb::Post, "/a", "restPUT", &[]), &mut ep);
        assert_eq!(m.verb(), Verb::Put);

        let mut ep = BufferedEndpoint::new();
        let m = Method::new(parts(Verb::Post, "/a", "restDELETE=1", &[]), &mut ep);
        assert_eq!(m.verb(), Verb::Delete);

        // Sólo aplica a POST
        let mut ep = BufferedEndpoint::new();
        let m = Method::new(parts(Verb::Get, "/a", "restPUT", &[]), &mut ep);
        assert_eq!(m.verb(), Verb::Get);
    }

    #[test]
    fn test_cookies_and_constraint_parsed_on_receive() {
        let mut ep = BufferedEndpoint::new();
        let m = Method::new(
            parts(
                Verb::Get,
                "/",
                "",
                &[("Cookie", "sid=abc; =bad"), ("If-None-Match", "\"v1\"")],
            ),
            &mut ep,
        );
        assert_eq!(m.cookies().find("sid").unwrap().value(), "abc");
        let c = m.version_constraint().unwrap();
        assert!(c.is_must_differ());
        assert_eq!(c.version().tag().as_str(), "v1");
    }

    #[test]
    fn test_respond_with_content_and_cookies() {
        let mut ep = BufferedEndpoint::new();
        {
            let mut m = Method::new(parts(Verb::Get, "/", "", &[]), &mut ep);
            let mut rh = ResponseHeaders::new();
            rh.set("ETag", "\"1\"");
            rh.cookies_mut().insert(Cookie::new("sid", "x").unwrap());
            let mut ch = ContentHeaders::new();
            ch.content_type("text/plain");
            let out = m.respond_with_content(&ch, StatusCode::Ok, rh).unwrap();
            out.write_all(b"hello").unwrap();
            assert!(m.responded());
        }
        assert_eq!(ep.status(), Some(StatusCode::Ok));
        let names: Vec<_> = ep.fields().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["ETag", "Set-Cookie", "Content-Type"]);
        assert_eq!(ep.body_text(), "hello");
    }

    #[test]
    fn test_forbidden_body_status_drops_content_headers() {
        let mut ep = BufferedEndpoint::new();
        {
            let mut m = Method::new(parts(Verb::Get, "/", "", &[]), &mut ep);
            let mut ch = ContentHeaders::new();
            ch.content_type("text/plain");
            m.respond_with_content(&ch, StatusCode::NoContent, ResponseHeaders::new())
                .unwrap();
        }
        assert!(ep.fields().is_empty());
    }

    #[test]
    fn test_take_body_once() {
        let mut ep = BufferedEndpoint::new();
        let mut p = parts(Verb::Put, "/", "", &[]);
        p.body = Some(Box::new(Cursor::new(b"data".to_vec())));
        let mut m = Method::new(p, &mut ep);
        let mut buf = String::new();
        m.take_body().unwrap().read_to_string(&mut buf).unwrap();
        assert_eq!(buf, "data");
        assert!(m.take_body().is_none());
    }

    #[test]
    #[should_panic(expected = "method already responded")]
    fn test_second_respond_panics() {
        let mut ep = BufferedEndpoint::new();
        let mut m = Method::new(parts(Verb::Delete, "/", "", &[]), &mut ep);
        m.respond(StatusCode::Ok, ResponseHeaders::new()).unwrap();
        let _ = m.respond(StatusCode::Ok, ResponseHeaders::new());
    }
}
