//! # Cookies HTTP
//! src/cookie/mod.rs
//!
//! Implementa las cookies del RFC 2109/2965 tal como se usan en CGI:
//!
//! - Request: `Cookie: $Version=1; sid="abc"; $Path="/"; lang=es`
//! - Response: `Set-Cookie: sid=abc; Domain=".example.com"; Path="/"; Version=1`
//!
//! ## Identidad
//!
//! La identidad de una cookie es `nombre:dominio:path`. Del lado de la
//! respuesta no se admiten dos cookies con la misma identidad.

pub mod jar;

pub use jar::{Cookies, CookiesObserver};

use crate::http::syntax::{quote, HttpToken, HttpWord};
use std::fmt;
use thiserror::Error;

/// Separador entre atributos al serializar
pub const ATTR_SEPARATOR: &str = "; ";

/// Versión emitida cuando la cookie no tiene una explícita
pub const DEFAULT_VERSION: u32 = 1;

/// Errores al fijar atributos directamente desde la aplicación
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CookieError {
    /// Dominio que no empieza con punto, muy corto, sin un segundo punto o con espacios
    #[error("invalid HTTP cookie domain attribute: \"{0}\"")]
    InvalidDomain(String),

    /// Nombre que no es un token HTTP
    #[error("invalid HTTP cookie name: \"{0}\"")]
    InvalidName(String),
}

/// Valida el atributo domain: vacío (sin dominio) o `.x.y` con al menos
/// 4 caracteres, un punto después del primer label y sin espacios internos
pub fn validate_domain(domain: &str) -> Result<(), CookieError> {
    if domain.is_empty() {
        return Ok(());
    }
    let bytes = domain.as_bytes();
    let invalid = bytes[0] != b'.'
        || bytes.len() < 4
        || !bytes[2..].contains(&b'.')
        || bytes[2..].contains(&b' ');
    if invalid {
        return Err(CookieError::InvalidDomain(domain.to_string()));
    }
    Ok(())
}

/// Atributos de una cookie
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieAttrs {
    domain: String,
    path: String,
    max_age: u64,
    discard: bool,
    secure: bool,
    http_only: bool,
    version: u32,
    comment: String,
}

impl CookieAttrs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Fija el dominio validándolo; un dominio inválido es error del llamador
    pub fn set_domain(&mut self, domain: &str) -> Result<(), CookieError> {
        validate_domain(domain)?;
        self.domain = domain.to_string();
        Ok(())
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn set_path(&mut self, path: &str) {
        self.path = path.to_string();
    }

    pub fn max_age(&self) -> u64 {
        self.max_age
    }

    /// Un max-age distinto de cero anula `discard`
    pub fn set_max_age(&mut self, secs: u64) {
        self.max_age = secs;
        if secs != 0 {
            self.discard = false;
        }
    }

    pub fn discard(&self) -> bool {
        self.discard
    }

    /// `discard` fija max-age en cero (la cookie se borra en el cliente)
    pub fn set_discard(&mut self, discard: bool) {
        self.discard = discard;
        if discard {
            self.max_age = 0;
        }
    }

    pub fn secure(&self) -> bool {
        self.secure
    }

    pub fn set_secure(&mut self, secure: bool) {
        self.secure = secure;
    }

    pub fn http_only(&self) -> bool {
        self.http_only
    }

    pub fn set_http_only(&mut self, http_only: bool) {
        self.http_only = http_only;
    }

    /// Versión explícita (0 si no se indicó)
    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn set_version(&mut self, version: u32) {
        self.version = version;
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn set_comment(&mut self, comment: &str) {
        self.comment = comment.to_string();
    }

    /// Fija un atributo recibido en un request (`$Domain`, `$Path`, `$Version`).
    ///
    /// Retorna `false` para atributos desconocidos o una versión no numérica.
    /// Un dominio inválido no es error de sintaxis: el atributo queda sin fijar.
    pub(crate) fn set_from_request(&mut self, name: &HttpToken, value: &HttpWord) -> bool {
        if name.eq_ignore_case("domain") {
            if let Err(err) = self.set_domain(value.as_str()) {
                tracing::debug!(error = %err, "ignoring cookie domain from request");
            }
            true
        } else if name.eq_ignore_case("path") {
            self.set_path(value.as_str());
            true
        } else if name.eq_ignore_case("version") {
            match value.as_str().parse() {
                Ok(version) => {
                    self.version = version;
                    true
                }
                Err(_) => false,
            }
        } else {
            false
        }
    }
}

impl fmt::Display for CookieAttrs {
    /// Orden fijo: Domain, Path, Max-Age, Secure, HttpOnly, Comment, Version
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.domain.is_empty() {
            write!(f, "{}Domain={}", ATTR_SEPARATOR, quote(&self.domain))?;
        }
        if !self.path.is_empty() {
            write!(f, "{}Path={}", ATTR_SEPARATOR, quote(&self.path))?;
        }
        if self.max_age != 0 || self.discard {
            write!(f, "{}Max-Age={}", ATTR_SEPARATOR, self.max_age)?;
        }
        if self.secure {
            write!(f, "{}Secure", ATTR_SEPARATOR)?;
        }
        if self.http_only {
            write!(f, "{}HttpOnly", ATTR_SEPARATOR)?;
        }
        if !self.comment.is_empty() {
            write!(f, "{}Comment={}", ATTR_SEPARATOR, HttpWord::new(self.comment.as_str()).encoding())?;
        }
        let version = if self.version != 0 {
            self.version
        } else {
            DEFAULT_VERSION
        };
        write!(f, "{}Version={}", ATTR_SEPARATOR, version)
    }
}

/// Una cookie: nombre, valor y atributos
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    name: String,
    value: HttpWord,
    attrs: CookieAttrs,
}

impl Cookie {
    /// Crea una cookie sin atributos; el nombre debe ser un token
    ///
    /// # Ejemplo
    /// ```
    /// use restcgi::cookie::Cookie;
    ///
    /// let cookie = Cookie::new("sid", "a b").unwrap();
    /// assert_eq!(cookie.to_string(), "sid=\"a b\"; Version=1");
    /// ```
    pub fn new(name: &str, value: &str) -> Result<Self, CookieError> {
        Self::with_attrs(name, value, CookieAttrs::default())
    }

    pub fn with_attrs(name: &str, value: &str, attrs: CookieAttrs) -> Result<Self, CookieError> {
        let name = HttpToken::new(name).ok_or_else(|| CookieError::InvalidName(name.to_string()))?;
        Ok(Self::from_parts(name, HttpWord::new(value), attrs))
    }

    pub(crate) fn from_parts(name: HttpToken, value: HttpWord, attrs: CookieAttrs) -> Self {
        Self {
            name: name.as_str().to_string(),
            value,
            attrs,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        self.value.as_str()
    }

    pub fn attrs(&self) -> &CookieAttrs {
        &self.attrs
    }

    /// Identidad para deduplicar: `nombre:dominio:path`
    pub fn id(&self) -> String {
        format!("{}:{}:{}", self.name, self.attrs.domain, self.attrs.path)
    }
}

impl fmt::Display for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}{}", self.name, self.value.encoding(), self.attrs)
    }
}
