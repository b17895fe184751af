//! # Versiones de Recursos
//! src/version/mod.rs
//!
//! Una [`Version`] identifica un estado del contenido de un recurso con un
//! tag opaco (el `ETag`) y/o una fecha de modificación (`Last-Modified`).
//! Las fechas se guardan truncadas a segundos, que es la resolución de las
//! fechas HTTP.
//!
//! ## Formato de fechas HTTP (RFC 2616, sección 3.3.1)
//!
//! ```text
//! Sun, 06 Nov 1994 08:49:37 GMT    ; RFC 1123 (el que se emite)
//! Sunday, 06-Nov-94 08:49:37 GMT   ; RFC 850
//! Sun Nov  6 08:49:37 1994         ; asctime()
//! ```

pub mod constraint;

pub use constraint::VersionConstraint;

use crate::http::syntax::quote;
use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};
use std::fmt;

/// Formato RFC 1123 para `Last-Modified`
const RFC1123_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";
const RFC850_FORMAT: &str = "%A, %d-%b-%y %H:%M:%S GMT";
const ASCTIME_FORMAT: &str = "%a %b %d %H:%M:%S %Y";

/// Formatea una fecha como HTTP-date (RFC 1123)
pub fn format_http_date(dt: &DateTime<Utc>) -> String {
    dt.format(RFC1123_FORMAT).to_string()
}

/// Parsea una HTTP-date en cualquiera de los tres formatos aceptados.
/// Retorna `None` si no se reconoce.
pub fn parse_http_date(s: &str) -> Option<DateTime<Utc>> {
    let normalized = s.split_whitespace().collect::<Vec<_>>().join(" ");
    if normalized.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(&normalized) {
        return Some(dt.with_timezone(&Utc));
    }
    [RFC850_FORMAT, ASCTIME_FORMAT]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(&normalized, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Tag de versión. Sólo necesita ser único para un recurso; lo más simple
/// es un número que aumenta con cada modificación.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct VersionTag(String);

impl VersionTag {
    /// Tag comodín de `If-None-Match: *`
    pub const WILDCARD: &'static str = "*";

    pub fn new(tag: impl Into<String>) -> Self {
        VersionTag(tag.into())
    }

    /// Tag nulo (sin tag)
    pub fn null() -> Self {
        VersionTag(String::new())
    }

    pub fn is_null(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_wildcard(&self) -> bool {
        self.0 == Self::WILDCARD
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for VersionTag {
    fn from(tag: &str) -> Self {
        VersionTag::new(tag)
    }
}

impl From<String> for VersionTag {
    fn from(tag: String) -> Self {
        VersionTag(tag)
    }
}

impl From<u64> for VersionTag {
    fn from(tag: u64) -> Self {
        VersionTag(tag.to_string())
    }
}

impl From<i64> for VersionTag {
    fn from(tag: i64) -> Self {
        VersionTag(tag.to_string())
    }
}

impl fmt::Display for VersionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Versión de un recurso: tag y/o fecha de modificación
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Version {
    tag: VersionTag,
    modified: Option<DateTime<Utc>>,
}

impl Version {
    /// Versión nula: constraints contra ella no se pueden evaluar
    pub fn null() -> Self {
        Self::default()
    }

    /// Versión con sólo tag
    ///
    /// # Ejemplo
    /// ```
    /// use restcgi::version::Version;
    ///
    /// let v = Version::tagged(7u64);
    /// assert_eq!(v.tag().as_str(), "7");
    /// assert!(v.modified().is_none());
    /// ```
    pub fn tagged(tag: impl Into<VersionTag>) -> Self {
        Self {
            tag: tag.into(),
            modified: None,
        }
    }

    /// Versión con sólo fecha de modificación
    pub fn modified_at(dt: DateTime<Utc>) -> Self {
        Self {
            tag: VersionTag::null(),
            modified: Some(dt.trunc_subsecs(0)),
        }
    }

    pub fn new(tag: impl Into<VersionTag>, modified: Option<DateTime<Utc>>) -> Self {
        Self {
            tag: tag.into(),
            modified: modified.map(|dt| dt.trunc_subsecs(0)),
        }
    }

    pub fn is_null(&self) -> bool {
        self.tag.is_null() && self.modified.is_none()
    }

    pub fn tag(&self) -> &VersionTag {
        &self.tag
    }

    pub fn modified(&self) -> Option<DateTime<Utc>> {
        self.modified
    }

    /// Headers que reportan la versión: `ETag` y `Last-Modified`
    pub fn header_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = Vec::new();
        if !self.tag.is_null() {
            fields.push(("ETag", quote(self.tag.as_str())));
        }
        if let Some(dt) = &self.modified {
            fields.push(("Last-Modified", format_http_date(dt)));
        }
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_http_date_format() {
        let dt = Utc.with_ymd_and_hms(1994, 11, 6, 8, 49, 37).unwrap();
        assert_eq!(format_http_date(&dt), "Sun, 06 Nov 1994 08:49:37 GMT");
    }

    #[test]
    fn test_http_date_parse() {
        let expected = Utc.with_ymd_and_hms(1994, 11, 6, 8, 49, 37).unwrap();
        assert_eq!(parse_http_date("Sun, 06 Nov 1994 08:49:37 GMT"), Some(expected));
        assert_eq!(parse_http_date("  Sun, 06 Nov 1994 08:49:37 GMT "), Some(expected));
        assert_eq!(parse_http_date("Sunday, 06-Nov-94 08:49:37 GMT"), Some(expected));
        assert_eq!(parse_http_date("yesterday"), None);
        assert_eq!(parse_http_date(""), None);
    }

    #[test]
    fn test_null_version() {
        assert!(Version::null().is_null());
        assert!(!Version::tagged("a").is_null());
        assert!(Version::tagged("").is_null());
    }

    #[test]
    fn test_modified_truncated_to_seconds() {
        let dt = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()
            + chrono::Duration::milliseconds(750);
        let v = Version::modified_at(dt);
        assert_eq!(v.modified(), Some(Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()));
    }

    #[test]
    fn test_header_fields() {
        let dt = Utc.with_ymd_and_hms(1994, 11, 6, 8, 49, 37).unwrap();
        let v = Version::new("v2", Some(dt));
        assert_eq!(
            v.header_fields(),
            vec![
                ("ETag", "\"v2\"".to_string()),
                ("Last-Modified", "Sun, 06 Nov 1994 08:49:37 GMT".to_string()),
            ]
        );
        assert!(Version::null().header_fields().is_empty());
    }
}
