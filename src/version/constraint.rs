//! # Constraints de Versión
//! src/version/constraint.rs
//!
//! Precondiciones del request sobre la versión del recurso:
//!
//! | Headers                               | Constraint      |
//! |---------------------------------------|-----------------|
//! | `If-Match`, `If-Unmodified-Since`     | debe ser igual  |
//! | `If-None-Match`, `If-Modified-Since`  | debe diferir    |
//!
//! Si llegan los dos pares, gana el de "debe ser igual".

use super::{parse_http_date, Version, VersionTag};
use crate::error::{RestError, Result};
use crate::http::headers::RequestHeaders;
use crate::http::syntax::Cursor;
use crate::http::Verb;

/// Requisito sobre la versión del recurso para que el método proceda
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionConstraint {
    version: Version,
    must_differ: bool,
}

impl VersionConstraint {
    pub fn new(version: Version, must_differ: bool) -> Self {
        Self {
            version,
            must_differ,
        }
    }

    /// El recurso no debe haber cambiado (`If-Match`)
    pub fn must_equal(version: Version) -> Self {
        Self::new(version, false)
    }

    /// El recurso debe haber cambiado (`If-None-Match`)
    pub fn must_differ(version: Version) -> Self {
        Self::new(version, true)
    }

    pub fn is_null(&self) -> bool {
        self.version.is_null()
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    pub fn is_must_differ(&self) -> bool {
        self.must_differ
    }

    /// Arma el constraint a partir de los headers del request.
    ///
    /// Sólo se usa el primer entity tag de la lista. `If-Match: *` no
    /// restringe el tag; `If-None-Match: *` se conserva como comodín.
    /// Fechas que no se pueden parsear se ignoran.
    pub fn from_headers(headers: &RequestHeaders) -> Option<Self> {
        let tag = headers
            .get("If-Match")
            .and_then(first_entity_tag)
            .filter(|tag| !tag.is_wildcard())
            .unwrap_or_default();
        let date = headers.get("If-Unmodified-Since").and_then(parse_http_date);
        let unmodified = Version::new(tag, date);
        if !unmodified.is_null() {
            return Some(Self::must_equal(unmodified));
        }

        let tag = headers
            .get("If-None-Match")
            .and_then(first_entity_tag)
            .unwrap_or_default();
        let date = headers.get("If-Modified-Since").and_then(parse_http_date);
        let modified = Version::new(tag, date);
        if !modified.is_null() {
            return Some(Self::must_differ(modified));
        }
        None
    }

    /// Verifica que la versión actual del recurso cumpla el constraint.
    ///
    /// Una versión actual nula no se puede evaluar y siempre cumple.
    ///
    /// "Debe diferir": el tag tiene precedencia. Con tags iguales (o `*`)
    /// falla salvo que ambos lados tengan fecha y la actual sea
    /// estrictamente más nueva; es decir, una fecha más nueva anula la
    /// coincidencia de tags. Para GET y HEAD la falla es 304 Not Modified,
    /// para el resto 412 Precondition Failed.
    ///
    /// "Debe ser igual": tags distintos (si ambos existen) o una fecha
    /// actual más nueva que la requerida es 412.
    pub fn assert_satisfied(&self, actual: &Version, verb: Verb) -> Result<()> {
        let required = &self.version;
        if self.must_differ {
            let both_tagged = !required.tag().is_null() && !actual.tag().is_null();
            let not_newer = match (required.modified(), actual.modified()) {
                (Some(req), Some(act)) => act <= req,
                _ => true,
            };
            if both_tagged {
                let same_tag = required.tag().is_wildcard() || required.tag() == actual.tag();
                if same_tag && not_newer {
                    return Err(unchanged(
                        actual,
                        verb,
                        format!(
                            "resource tag is the same (and modified date is not given or is same or older): {}",
                            actual.tag()
                        ),
                    ));
                }
            } else if required.modified().is_some() && actual.modified().is_some() && not_newer {
                return Err(unchanged(
                    actual,
                    verb,
                    "resource modified date is same or older".to_string(),
                ));
            }
        } else {
            if !required.tag().is_null() && !actual.tag().is_null() && required.tag() != actual.tag() {
                return Err(RestError::precondition_failed(format!(
                    "resource tag is different: {}",
                    actual.tag()
                )));
            }
            if let (Some(req), Some(act)) = (required.modified(), actual.modified()) {
                if req < act {
                    return Err(RestError::precondition_failed(format!(
                        "resource modified date is more recent: {}",
                        super::format_http_date(&act)
                    )));
                }
            }
        }
        Ok(())
    }
}

/// 304 para lecturas, 412 para el resto
fn unchanged(actual: &Version, verb: Verb, errmsg: String) -> RestError {
    tracing::debug!(verb = %verb, tag = %actual.tag(), "version constraint not satisfied");
    if verb.is_read() {
        let etag = (!actual.tag().is_null()).then(|| actual.tag().to_string());
        RestError::not_modified(etag)
    } else {
        RestError::precondition_failed(errmsg)
    }
}

/// Primer entity tag de una lista, sin comillas ni prefijo débil `W/`
fn first_entity_tag(raw: &str) -> Option<VersionTag> {
    let mut cur = Cursor::new(raw);
    if cur.literal(VersionTag::WILDCARD) {
        return Some(VersionTag::new(VersionTag::WILDCARD));
    }
    cur.literal("W/");
    let tag = match cur.quoted() {
        Some(word) => word.as_str().to_string(),
        None => cur.text_until(",").to_string(),
    };
    (!tag.is_empty()).then(|| VersionTag::new(tag))
}
