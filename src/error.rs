//! # Taxonomía de Fallas con Código de Estado
//! src/error.rs
//!
//! Toda falla que llega al despachador es un [`RestError`]: un tipo de falla
//! ([`ErrorKind`]) con exactamente un código de estado, un mensaje opcional y
//! una tabla de variables con nombre para armar el contenido de la respuesta.
//!
//! La tabla siempre incluye:
//! - `exception_status_code`: ej. "304 Not Modified"
//! - `exception_errmsg`: mensaje de error (puede ser vacío)
//! - `exception_what`: código de estado más el mensaje
//!
//! Los tipos con datos propios agregan su variable, ej. `not_found` agrega
//! `exception_uri_path_rem`.

use crate::http::StatusCode;
use std::collections::BTreeMap;
use thiserror::Error;

/// Result para todas las operaciones del motor
pub type Result<T> = std::result::Result<T, RestError>;

/// Prefijo de las variables insertadas por el propio motor
pub const VARIABLE_NAME_PREFIX: &str = "exception_";

/// Tipo de falla; cada variante corresponde a un único código de estado
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// 204: éxito sin contenido
    NoContent,
    /// 205: éxito, el cliente debe limpiar la vista
    ResetContent,
    /// 303: la respuesta está en `location`
    SeeOther { location: String },
    /// 304: el recurso no cambió; `etag` se reenvía si se conoce
    NotModified { etag: Option<String> },
    /// 400
    BadRequest,
    /// 401; `challenge` va en `WWW-Authenticate`
    Unauthorized { challenge: Option<String> },
    /// 404; `uri_path_rem` es el resto del path que no se encontró
    NotFound { uri_path_rem: String },
    /// 405; `allow` es la lista de métodos, ej. "GET, PUT"
    MethodNotAllowed { allow: String },
    /// 409
    Conflict,
    /// 410
    Gone,
    /// 412
    PreconditionFailed,
    /// 413
    RequestEntityTooLarge,
    /// 415
    UnsupportedMediaType,
    /// 500
    InternalServerError,
}

impl ErrorKind {
    /// Código de estado fijo de cada tipo
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorKind::NoContent => StatusCode::NoContent,
            ErrorKind::ResetContent => StatusCode::ResetContent,
            ErrorKind::SeeOther { .. } => StatusCode::SeeOther,
            ErrorKind::NotModified { .. } => StatusCode::NotModified,
            ErrorKind::BadRequest => StatusCode::BadRequest,
            ErrorKind::Unauthorized { .. } => StatusCode::Unauthorized,
            ErrorKind::NotFound { .. } => StatusCode::NotFound,
            ErrorKind::MethodNotAllowed { .. } => StatusCode::MethodNotAllowed,
            ErrorKind::Conflict => StatusCode::Conflict,
            ErrorKind::Gone => StatusCode::Gone,
            ErrorKind::PreconditionFailed => StatusCode::PreconditionFailed,
            ErrorKind::RequestEntityTooLarge => StatusCode::RequestEntityTooLarge,
            ErrorKind::UnsupportedMediaType => StatusCode::UnsupportedMediaType,
            ErrorKind::InternalServerError => StatusCode::InternalServerError,
        }
    }

    /// Indica si el código prohíbe contenido en la respuesta (204, 205, 304)
    pub fn inhibit_content(&self) -> bool {
        self.status_code().forbids_body()
    }

    /// Headers propios del tipo, en el orden en que se emiten
    pub fn header_fields(&self) -> Vec<(&'static str, String)> {
        match self {
            ErrorKind::SeeOther { location } => vec![("Location", location.clone())],
            ErrorKind::NotModified { etag: Some(etag) } if !etag.is_empty() => {
                vec![("ETag", crate::http::syntax::quote(etag))]
            }
            ErrorKind::MethodNotAllowed { allow } if !allow.is_empty() => {
                vec![("Allow", allow.clone())]
            }
            ErrorKind::Unauthorized {
                challenge: Some(challenge),
            } => vec![("WWW-Authenticate", challenge.clone())],
            _ => Vec::new(),
        }
    }
}

/// Falla con código de estado, mensaje y tabla de variables
#[derive(Debug, Error)]
#[error("{what}")]
pub struct RestError {
    kind: ErrorKind,
    errmsg: String,
    what: String,
    vars: BTreeMap<String, String>,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl RestError {
    /// Crea la falla con el mensaje dado (puede ser vacío)
    pub fn new(kind: ErrorKind, errmsg: impl Into<String>) -> Self {
        let errmsg = errmsg.into();
        let status = kind.status_code();
        let what = if errmsg.is_empty() {
            status.to_string()
        } else {
            format!("{}: {}", status, errmsg)
        };

        let mut err = Self {
            kind,
            errmsg,
            what,
            vars: BTreeMap::new(),
            source: None,
        };
        err.exception_insert("status_code", &status.to_string());
        err.exception_insert("errmsg", &err.errmsg.clone());
        err.exception_insert("what", &err.what.clone());

        match err.kind.clone() {
            ErrorKind::SeeOther { location } => {
                err.exception_insert("location", &location);
            }
            ErrorKind::NotModified { etag } => {
                err.exception_insert("etag", etag.as_deref().unwrap_or(""));
            }
            ErrorKind::NotFound { uri_path_rem } => {
                err.exception_insert("uri_path_rem", &uri_path_rem);
            }
            ErrorKind::MethodNotAllowed { allow } => {
                err.exception_insert("allow", &allow);
            }
            _ => {}
        }
        err
    }

    // === Constructores por tipo ===

    pub fn no_content() -> Self {
        Self::new(ErrorKind::NoContent, "successful, no content")
    }

    pub fn reset_content() -> Self {
        Self::new(ErrorKind::ResetContent, "successful, reset content")
    }

    pub fn see_other(location: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::SeeOther {
                location: location.into(),
            },
            "see other resource",
        )
    }

    pub fn not_modified(etag: Option<String>) -> Self {
        Self::new(
            ErrorKind::NotModified { etag },
            "document has not been modified",
        )
    }

    pub fn bad_request(errmsg: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, errmsg)
    }

    pub fn unauthorized(errmsg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthorized { challenge: None }, errmsg)
    }

    /// 401 con el desafío para `WWW-Authenticate`, ej. `Basic realm="api"`
    pub fn unauthorized_with_challenge(
        errmsg: impl Into<String>,
        challenge: impl Into<String>,
    ) -> Self {
        Self::new(
            ErrorKind::Unauthorized {
                challenge: Some(challenge.into()),
            },
            errmsg,
        )
    }

    pub fn not_found(uri_path_rem: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::NotFound {
                uri_path_rem: uri_path_rem.into(),
            },
            "",
        )
    }

    pub fn method_not_allowed(allow: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::MethodNotAllowed {
                allow: allow.into(),
            },
            "requested method is not allowed by resource",
        )
    }

    pub fn conflict(errmsg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, errmsg)
    }

    /// 410; un mensaje vacío usa el mensaje por defecto
    pub fn gone(errmsg: impl Into<String>) -> Self {
        let errmsg = errmsg.into();
        let errmsg = if errmsg.is_empty() {
            "resource is no longer available and address is not known".to_string()
        } else {
            errmsg
        };
        Self::new(ErrorKind::Gone, errmsg)
    }

    pub fn precondition_failed(errmsg: impl Into<String>) -> Self {
        Self::new(ErrorKind::PreconditionFailed, errmsg)
    }

    pub fn request_entity_too_large(errmsg: impl Into<String>) -> Self {
        Self::new(ErrorKind::RequestEntityTooLarge, errmsg)
    }

    /// 415; un mensaje vacío usa el mensaje por defecto
    pub fn unsupported_media_type(errmsg: impl Into<String>) -> Self {
        let errmsg = errmsg.into();
        let errmsg = if errmsg.is_empty() {
            "unsupported media type".to_string()
        } else {
            errmsg
        };
        Self::new(ErrorKind::UnsupportedMediaType, errmsg)
    }

    pub fn internal_server_error(errmsg: impl Into<String>) -> Self {
        Self::new(ErrorKind::InternalServerError, errmsg)
    }

    /// Envuelve una falla no reconocida como 500. La causa queda disponible
    /// para logs pero no se expone en la respuesta.
    pub fn internal<E>(source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        let mut err = Self::new(ErrorKind::InternalServerError, "");
        err.source = Some(Box::new(source));
        err
    }

    // === Accesores ===

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn status_code(&self) -> StatusCode {
        self.kind.status_code()
    }

    pub fn errmsg(&self) -> &str {
        &self.errmsg
    }

    pub fn what(&self) -> &str {
        &self.what
    }

    pub fn inhibit_content(&self) -> bool {
        self.kind.inhibit_content()
    }

    /// Tabla de variables con nombre
    pub fn vars(&self) -> &BTreeMap<String, String> {
        &self.vars
    }

    /// Inserta la variable si el nombre no existe; retorna si se insertó.
    /// La aplicación puede usarlo antes de retornar la falla.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> bool {
        let name = name.into();
        if self.vars.contains_key(&name) {
            return false;
        }
        self.vars.insert(name, value.into());
        true
    }

    /// Igual que [`RestError::insert`] pero consumiendo el error
    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    fn exception_insert(&mut self, name: &str, value: &str) -> bool {
        self.insert(format!("{}{}", VARIABLE_NAME_PREFIX, name), value)
    }
}

/// Falla de lectura cuando el cuerpo del request supera el límite
#[derive(Debug, Error)]
#[error("request body exceeds {limit} bytes")]
pub struct BodyTooLarge {
    pub limit: u64,
}

impl From<std::io::Error> for RestError {
    fn from(err: std::io::Error) -> Self {
        let too_large = err
            .get_ref()
            .and_then(|inner| inner.downcast_ref::<BodyTooLarge>())
            .map(|inner| inner.to_string());
        match too_large {
            Some(errmsg) => RestError::request_entity_too_large(errmsg),
            None => RestError::internal(err),
        }
    }
}

impl From<serde_json::Error> for RestError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_io() {
            return RestError::from(std::io::Error::from(err));
        }
        RestError::internal(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_table() {
        let table = [
            (RestError::no_content(), 204),
            (RestError::reset_content(), 205),
            (RestError::see_other("/x"), 303),
            (RestError::not_modified(None), 304),
            (RestError::bad_request("x"), 400),
            (RestError::unauthorized("x"), 401),
            (RestError::not_found("/x"), 404),
            (RestError::method_not_allowed("GET"), 405),
            (RestError::conflict("x"), 409),
            (RestError::gone(""), 410),
            (RestError::precondition_failed("x"), 412),
            (RestError::request_entity_too_large("x"), 413),
            (RestError::unsupported_media_type(""), 415),
            (RestError::internal_server_error(""), 500),
        ];
        for (err, code) in table {
            assert_eq!(err.status_code().as_u16(), code);
        }
    }

    #[test]
    fn test_base_variables_always_present() {
        let err = RestError::bad_request("missing id");
        assert_eq!(err.vars()["exception_status_code"], "400 Bad Request");
        assert_eq!(err.vars()["exception_errmsg"], "missing id");
        assert_eq!(err.vars()["exception_what"], "400 Bad Request: missing id");
    }

    #[test]
    fn test_what_without_message() {
        let err = RestError::internal_server_error("");
        assert_eq!(err.what(), "500 Internal Server Error");
        assert_eq!(err.to_string(), "500 Internal Server Error");
        assert_eq!(err.vars()["exception_errmsg"], "");
    }

    #[test]
    fn test_kind_specific_variables() {
        assert_eq!(RestError::not_found("/a/b").vars()["exception_uri_path_rem"], "/a/b");
        assert_eq!(RestError::see_other("/next").vars()["exception_location"], "/next");
        assert_eq!(
            RestError::method_not_allowed("GET, PUT").vars()["exception_allow"],
            "GET, PUT"
        );
        assert_eq!(
            RestError::not_modified(Some("v1".into())).vars()["exception_etag"],
            "v1"
        );
    }

    #[test]
    fn test_insert_only_if_absent() {
        let mut err = RestError::conflict("busy");
        assert!(err.insert("owner", "alice"));
        assert!(!err.insert("owner", "bob"));
        assert!(!err.insert("exception_errmsg", "override"));
        assert_eq!(err.vars()["owner"], "alice");
        assert_eq!(err.vars()["exception_errmsg"], "busy");
    }

    #[test]
    fn test_inhibit_content() {
        assert!(RestError::no_content().inhibit_content());
        assert!(RestError::reset_content().inhibit_content());
        assert!(RestError::not_modified(None).inhibit_content());
        assert!(!RestError::see_other("/x").inhibit_content());
        assert!(!RestError::bad_request("x").inhibit_content());
    }

    #[test]
    fn test_header_fields() {
        assert_eq!(
            RestError::see_other("/x").kind().header_fields(),
            vec![("Location", "/x".to_string())]
        );
        assert_eq!(
            RestError::not_modified(Some("7".into())).kind().header_fields(),
            vec![("ETag", "\"7\"".to_string())]
        );
        assert!(RestError::not_modified(None).kind().header_fields().is_empty());
        assert_eq!(
            RestError::method_not_allowed("GET").kind().header_fields(),
            vec![("Allow", "GET".to_string())]
        );
        assert_eq!(
            RestError::unauthorized_with_challenge("login", "Basic realm=\"api\"")
                .kind()
                .header_fields(),
            vec![("WWW-Authenticate", "Basic realm=\"api\"".to_string())]
        );
    }

    #[test]
    fn test_default_messages() {
        assert_eq!(
            RestError::gone("").errmsg(),
            "resource is no longer available and address is not known"
        );
        assert_eq!(RestError::gone("moved away").errmsg(), "moved away");
        assert_eq!(RestError::unsupported_media_type("").errmsg(), "unsupported media type");
    }

    #[test]
    fn test_io_error_maps_to_internal_without_leaking() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let err: RestError = io.into();
        assert_eq!(err.status_code(), StatusCode::InternalServerError);
        assert!(!err.what().contains("disk on fire"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_body_too_large_maps_to_413() {
        let io = std::io::Error::new(std::io::ErrorKind::InvalidData, BodyTooLarge { limit: 4 });
        let err: RestError = io.into();
        assert_eq!(err.status_code(), StatusCode::RequestEntityTooLarge);
        assert_eq!(err.errmsg(), "request body exceeds 4 bytes");

        struct Overflowing;
        impl std::io::Read for Overflowing {
            fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
                Err(std::io::Error::new(std::io::ErrorKind::InvalidData, BodyTooLarge { limit: 4 }))
            }
        }
        let json_err = serde_json::from_reader::<_, serde_json::Value>(Overflowing).unwrap_err();
        let err: RestError = json_err.into();
        assert_eq!(err.status_code(), StatusCode::RequestEntityTooLarge);
    }
}
