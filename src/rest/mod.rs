//! # Despachador REST
//! src/rest/mod.rs
//!
//! Punto de entrada del motor. Por cada request:
//!
//! 1. Valida el verbo y crea el [`Method`]
//! 2. Atiende el caso especial `OPTIONS *` sin tocar recursos
//! 3. Rechaza cuerpos más grandes que el límite (413), declarados o no
//! 4. Localiza el recurso desde la raíz consumiendo el path
//! 5. Verifica que el verbo esté permitido (405 + `Allow`)
//! 6. Aplica el ciclo de vida del verbo
//! 7. Convierte cualquier falla en la respuesta con su código de estado
//!
//! Una falla después de haber respondido (por ejemplo al escribir el
//! cuerpo) sólo se registra en el log.

pub mod vhost;

pub use vhost::{RootFactory, VirtualHosts};

use crate::error::{BodyTooLarge, RestError, Result, VARIABLE_NAME_PREFIX};
use crate::http::headers::{ContentHeaders, RequestHeaders, ResponseHeaders};
use crate::http::uri::{Query, UriPath};
use crate::http::{MethodMask, StatusCode, Verb};
use crate::method::{Endpoint, Method, MethodParts};
use crate::resource::{lifecycle, Resource, ResourceId, ResourceTree};
use std::io::{self, Read, Write};

/// Límites contra requests patológicos
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Máximo de segmentos en el path
    pub max_path_segments: usize,
    /// Máximo de llamadas a `locate` por request
    pub max_locate_steps: usize,
    /// Máximo `Content-Length` aceptado
    pub max_body_bytes: u64,
    /// Registrar enlaces padre/hijo entre los recursos localizados
    pub chain_children: bool,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_path_segments: 64,
            max_locate_steps: 128,
            max_body_bytes: 1024 * 1024,
            chain_children: false,
        }
    }
}

/// Request tal como lo entrega el transporte
pub struct RequestParts {
    /// Verbo de la request line, ej: "GET"
    pub method: String,
    /// Path codificado, ej: "/routes/7"
    pub path: String,
    /// Query string sin `?`
    pub query: String,
    pub headers: RequestHeaders,
    pub body: Option<Box<dyn Read>>,
}

impl RequestParts {
    pub fn new(method: &str, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, query),
            None => (target, ""),
        };
        Self {
            method: method.to_string(),
            path: path.to_string(),
            query: query.to_string(),
            headers: RequestHeaders::new(),
            body: None,
        }
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn body(mut self, body: impl Read + 'static) -> Self {
        self.body = Some(Box::new(body));
        self
    }
}

/// Resultado final de un request, para el log del transporte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Disposition {
    pub status: StatusCode,
    /// `true` si la respuesta la produjo una falla
    pub exception: bool,
}

/// Despachador de requests
#[derive(Debug, Clone, Default)]
pub struct Rest {
    limits: Limits,
}

impl Rest {
    pub fn new(limits: Limits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Procesa el request contra la raíz dada
    pub fn process(
        &self,
        request: RequestParts,
        root: Box<dyn Resource>,
        endpoint: &mut dyn Endpoint,
    ) -> Disposition {
        self.dispatch(request, endpoint, |_| Ok(root))
    }

    /// Procesa el request eligiendo la raíz según el header `Host`
    pub fn process_vhost(
        &self,
        request: RequestParts,
        vhosts: &VirtualHosts,
        endpoint: &mut dyn Endpoint,
    ) -> Disposition {
        self.dispatch(request, endpoint, |method| {
            let host = method.headers().get("Host").unwrap_or("");
            vhosts.root_for(host).ok_or_else(|| {
                tracing::info!(host, "unknown virtual host");
                RestError::not_found(method.uri_path().encoding())
                    .with_var(format!("{}host", VARIABLE_NAME_PREFIX), host)
            })
        })
    }

    fn dispatch(
        &self,
        request: RequestParts,
        endpoint: &mut dyn Endpoint,
        root: impl FnOnce(&Method<'_>) -> Result<Box<dyn Resource>>,
    ) -> Disposition {
        let RequestParts {
            method: verb_str,
            path,
            query,
            headers,
            body,
        } = request;

        tracing::info!(verb = %verb_str, path = %path, "request received");

        let verb = match Verb::parse(&verb_str) {
            Some(verb) => verb,
            None => {
                let err = RestError::method_not_allowed(MethodMask::all().to_allow_string())
                    .with_var(format!("{}method", VARIABLE_NAME_PREFIX), verb_str.as_str());
                return respond_without_method(endpoint, err);
            }
        };
        let ping = verb == Verb::Options && path.trim() == "*";

        let parts = MethodParts {
            verb,
            uri_path: UriPath::parse(&path),
            query: Query::parse(&query),
            headers,
            body: body.map(|b| Box::new(LimitedBody::new(b, self.limits.max_body_bytes)) as Box<dyn Read>),
        };
        let mut method = Method::new(parts, endpoint);

        let result = if ping {
            special_case(&mut method)
        } else {
            root(&method).and_then(|root| self.run(&mut method, root))
        };

        match result {
            Ok(()) => Disposition {
                status: method.status().unwrap_or(StatusCode::Ok),
                exception: false,
            },
            Err(err) => on_exception(&mut method, err),
        }
    }

    fn run(&self, method: &mut Method<'_>, root: Box<dyn Resource>) -> Result<()> {
        if let Some(len) = method.headers().content_length() {
            if len > self.limits.max_body_bytes {
                return Err(RestError::request_entity_too_large(format!(
                    "content length {} exceeds {} bytes",
                    len, self.limits.max_body_bytes
                )));
            }
        }

        let mut tree = ResourceTree::new(root, self.limits.chain_children);
        let id = self.locate(&mut tree, method)?;

        let allowed = tree.get(id).allowed();
        if !allowed.contains(method.verb()) {
            return Err(RestError::method_not_allowed(allowed.to_allow_string()));
        }
        lifecycle::apply(&mut tree, id, method)
    }

    /// Recorre el árbol desde la raíz hasta consumir el path
    fn locate(&self, tree: &mut ResourceTree, method: &Method<'_>) -> Result<ResourceId> {
        let mut path = method.uri_path().clone();
        if path.len() > self.limits.max_path_segments {
            return Err(RestError::bad_request(format!(
                "path has more than {} segments",
                self.limits.max_path_segments
            )));
        }

        let mut current = tree.root();
        if path.is_empty() {
            return Ok(current);
        }
        for _ in 0..self.limits.max_locate_steps {
            let found = tree.with_context(current, method, |res, cx| res.locate(cx, &mut path))?;
            match found {
                Some(child) => {
                    current = tree.attach(current, child);
                    if path.is_empty() {
                        break;
                    }
                }
                None if path.is_empty() => break,
                None => {
                    tracing::debug!(remaining = %path, "path not consumed by resource");
                    return Err(RestError::bad_request(format!("resource not found at: {}", path))
                        .with_var(format!("{}uri_path_rem", VARIABLE_NAME_PREFIX), path.encoding()));
                }
            }
        }
        if !path.is_empty() {
            return Err(RestError::bad_request(format!(
                "locate exceeded {} steps",
                self.limits.max_locate_steps
            )));
        }
        tracing::debug!(path = %method.uri_path(), depth = tree.depth(current), "resource located");
        Ok(current)
    }
}

/// Cuerpo del request acotado. Leer más allá del límite falla con
/// [`BodyTooLarge`], que se convierte en 413.
struct LimitedBody {
    inner: Box<dyn Read>,
    remaining: u64,
    limit: u64,
}

impl LimitedBody {
    fn new(inner: Box<dyn Read>, limit: u64) -> Self {
        Self {
            inner,
            remaining: limit,
            limit,
        }
    }
}

impl Read for LimitedBody {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if self.remaining == 0 {
            // Un byte más después del límite significa que el cuerpo no cabe
            let mut extra = [0u8; 1];
            return match self.inner.read(&mut extra)? {
                0 => Ok(0),
                _ => Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    BodyTooLarge { limit: self.limit },
                )),
            };
        }
        let max = usize::try_from(self.remaining).unwrap_or(usize::MAX).min(buf.len());
        let n = self.inner.read(&mut buf[..max])?;
        self.remaining -= n as u64;
        Ok(n)
    }
}

/// `OPTIONS *`: 200 sin contenido
fn special_case(method: &mut Method<'_>) -> Result<()> {
    let mut ch = ContentHeaders::new();
    ch.content_length(0);
    method.respond_with_content(&ch, StatusCode::Ok, ResponseHeaders::new())?;
    Ok(())
}

/// Arma la respuesta de una falla: headers propios del tipo y, si el código
/// lo permite, la tabla de variables como JSON.
fn exception_response(err: &RestError) -> (ResponseHeaders, Option<Vec<u8>>) {
    let mut rh = ResponseHeaders::new();
    for (name, value) in err.kind().header_fields() {
        rh.set(name, value);
    }
    if err.inhibit_content() {
        return (rh, None);
    }
    match serde_json::to_vec_pretty(err.vars()) {
        Ok(body) => (rh, Some(body)),
        Err(json_err) => {
            tracing::error!(error = %json_err, "could not serialize exception variables");
            (rh, None)
        }
    }
}

fn log_exception(err: &RestError) {
    let status = err.status_code();
    if status.is_server_error() {
        match std::error::Error::source(err) {
            Some(source) => tracing::error!(status = status.as_u16(), error = %err, source = %source, "request failed"),
            None => tracing::error!(status = status.as_u16(), error = %err, "request failed"),
        }
    } else {
        tracing::info!(status = status.as_u16(), error = %err, "request ended by exception");
    }
}

fn on_exception(method: &mut Method<'_>, err: RestError) -> Disposition {
    log_exception(&err);
    let status = err.status_code();
    if let Some(sent) = method.status() {
        tracing::warn!(sent = %sent, error = %err, "exception after response was sent");
        return Disposition {
            status: sent,
            exception: true,
        };
    }

    let (rh, body) = exception_response(&err);
    let result = match body {
        None => method.respond(status, rh),
        Some(body) => {
            let mut ch = ContentHeaders::new();
            ch.content_type("application/json").content_length(body.len() as u64);
            method
                .respond_with_content(&ch, status, rh)
                .and_then(|out| out.write_all(&body).map_err(RestError::from))
        }
    };
    if let Err(write_err) = result {
        tracing::error!(error = %write_err, "could not send exception response");
    }
    Disposition {
        status,
        exception: true,
    }
}

/// Falla antes de poder crear el método (verbo desconocido)
fn respond_without_method(endpoint: &mut dyn Endpoint, err: RestError) -> Disposition {
    log_exception(&err);
    let status = err.status_code();
    let (rh, body) = exception_response(&err);
    let mut fields = rh.to_fields();
    if let Some(body) = &body {
        fields.push(("Content-Type".to_string(), "application/json".to_string()));
        fields.push(("Content-Length".to_string(), body.len().to_string()));
    }
    let sent = endpoint.send_head(status, &fields).and_then(|()| match &body {
        Some(body) => endpoint.body().write_all(body),
        None => Ok(()),
    });
    if let Err(io_err) = sent {
        tracing::error!(error = %io_err, "could not send exception response");
    }
    Disposition {
        status,
        exception: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::method::BufferedEndpoint;

    struct Leaf;

    impl Resource for Leaf {
        fn allowed(&self) -> MethodMask {
            MethodMask::of(&[Verb::Get])
        }

        fn read(&mut self, _cx: &crate::resource::Context<'_>, _version_only: bool) -> Result<crate::version::Version> {
            Ok(crate::version::Version::null())
        }
    }

    /// Guarda lo que `update` leyó del cuerpo
    struct Sink {
        seen: std::rc::Rc<std::cell::RefCell<Vec<u8>>>,
    }

    impl Resource for Sink {
        fn allowed(&self) -> MethodMask {
            MethodMask::of(&[Verb::Put])
        }

        fn read(&mut self, _cx: &crate::resource::Context<'_>, _version_only: bool) -> Result<crate::version::Version> {
            Ok(crate::version::Version::null())
        }

        fn update(&mut self, _cx: &crate::resource::Context<'_>, body: &mut dyn Read) -> Result<crate::version::Version> {
            let mut seen = Vec::new();
            body.read_to_end(&mut seen)?;
            *self.seen.borrow_mut() = seen;
            Ok(crate::version::Version::null())
        }
    }

    fn run(rest: &Rest, request: RequestParts) -> (Disposition, BufferedEndpoint) {
        let mut ep = BufferedEndpoint::new();
        let disposition = rest.process(request, Box::new(Leaf), &mut ep);
        (disposition, ep)
    }

    #[test]
    fn test_options_star_is_answered_without_resources() {
        let (d, ep) = run(&Rest::default(), RequestParts::new("OPTIONS", "*"));
        assert_eq!(d.status, StatusCode::Ok);
        assert!(!d.exception);
        assert_eq!(ep.header("Content-Length"), Some("0"));
    }

    #[test]
    fn test_unknown_verb_is_method_not_allowed() {
        let (d, ep) = run(&Rest::default(), RequestParts::new("TRACE", "/"));
        assert_eq!(d.status, StatusCode::MethodNotAllowed);
        assert_eq!(ep.header("Allow"), Some("GET, PUT, POST, DELETE, OPTIONS, HEAD"));
        assert!(ep.body_text().contains("\"exception_method\": \"TRACE\""));
    }

    #[test]
    fn test_body_too_large() {
        let rest = Rest::new(Limits {
            max_body_bytes: 4,
            ..Limits::default()
        });
        let (d, _) = run(&rest, RequestParts::new("GET", "/").header("Content-Length", "5"));
        assert_eq!(d.status, StatusCode::RequestEntityTooLarge);
    }

    #[test]
    fn test_undeclared_body_over_limit() {
        let rest = Rest::new(Limits {
            max_body_bytes: 4,
            ..Limits::default()
        });
        let seen = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));

        let request = RequestParts::new("PUT", "/").body(io::Cursor::new(b"0123456789".to_vec()));
        let mut ep = BufferedEndpoint::new();
        let d = rest.process(request, Box::new(Sink { seen: seen.clone() }), &mut ep);
        assert_eq!(d.status, StatusCode::RequestEntityTooLarge);
        assert!(d.exception);
        assert!(seen.borrow().is_empty());

        let request = RequestParts::new("PUT", "/").body(io::Cursor::new(b"0123".to_vec()));
        let mut ep = BufferedEndpoint::new();
        let d = rest.process(request, Box::new(Sink { seen: seen.clone() }), &mut ep);
        assert_eq!(d.status, StatusCode::Ok);
        assert_eq!(seen.borrow().as_slice(), b"0123");
    }

    #[test]
    fn test_limited_body_reads_up_to_limit() {
        let mut body = LimitedBody::new(Box::new(io::Cursor::new(b"abcdef".to_vec())), 6);
        let mut out = String::new();
        body.read_to_string(&mut out).unwrap();
        assert_eq!(out, "abcdef");

        let mut body = LimitedBody::new(Box::new(io::Cursor::new(b"abcdefg".to_vec())), 6);
        let err = body.read_to_string(&mut String::new()).unwrap_err();
        assert_eq!(RestError::from(err).status_code(), StatusCode::RequestEntityTooLarge);
    }

    #[test]
    fn test_path_too_long() {
        let rest = Rest::new(Limits {
            max_path_segments: 2,
            ..Limits::default()
        });
        let (d, _) = run(&rest, RequestParts::new("GET", "/a/b/c"));
        assert_eq!(d.status, StatusCode::BadRequest);
    }

    #[test]
    fn test_leaf_with_remaining_path_is_bad_request() {
        let (d, ep) = run(&Rest::default(), RequestParts::new("GET", "/missing"));
        assert_eq!(d.status, StatusCode::BadRequest);
        assert_eq!(ep.header("Content-Type"), Some("application/json"));
        assert!(ep.body_text().contains("exception_uri_path_rem"));
    }

    #[test]
    fn test_verb_outside_mask() {
        let (d, ep) = run(&Rest::default(), RequestParts::new("PUT", "/"));
        assert_eq!(d.status, StatusCode::MethodNotAllowed);
        assert_eq!(ep.header("Allow"), Some("GET"));
    }

    #[test]
    fn test_request_parts_split_query() {
        let parts = RequestParts::new("POST", "/routes?restPUT&x=1");
        assert_eq!(parts.path, "/routes");
        assert_eq!(parts.query, "restPUT&x=1");
    }
}
