//! # Colecciones de Header Fields
//! src/http/headers.rs
//!
//! - [`RequestHeaders`]: headers del request, búsqueda sin distinguir
//!   mayúsculas; con nombres duplicados gana el último (política del transporte).
//! - [`ResponseHeaders`]: headers de la respuesta en orden de inserción, más
//!   las cookies a enviar con `Set-Cookie`.
//! - [`ContentHeaders`]: headers que describen el contenido (tipo, largo).

use crate::cookie::Cookies;

/// Headers del request
#[derive(Debug, Clone, Default)]
pub struct RequestHeaders {
    fields: Vec<(String, String)>,
}

impl RequestHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Agrega un header; un nombre repetido reemplaza el valor anterior
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self
            .fields
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(&name))
        {
            Some(field) => field.1 = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Obtiene un header sin distinguir mayúsculas
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// `Content-Length` declarado, si es un número válido
    pub fn content_length(&self) -> Option<u64> {
        self.get("Content-Length")
            .and_then(|v| v.trim().parse().ok())
    }

    /// `Content-Type` sin parámetros, en minúsculas (ej: "application/json")
    pub fn media_type(&self) -> Option<String> {
        self.get("Content-Type").map(|v| {
            v.split(';')
                .next()
                .unwrap_or("")
                .trim()
                .to_ascii_lowercase()
        })
    }
}

impl<N, V> FromIterator<(N, V)> for RequestHeaders
where
    N: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut headers = RequestHeaders::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}

/// Headers de la respuesta en orden de inserción
#[derive(Debug, Default)]
pub struct ResponseHeaders {
    fields: Vec<(String, String)>,
    cookies: Cookies,
}

impl ResponseHeaders {
    pub fn new() -> Self {
        Self {
            fields: Vec::new(),
            cookies: Cookies::response(),
        }
    }

    /// Fija un header, reemplazando uno existente con el mismo nombre
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self
            .fields
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
        {
            Some(field) => field.1 = value,
            None => self.fields.push((name.to_string(), value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        let idx = self
            .fields
            .iter()
            .position(|(n, _)| n.eq_ignore_ascii_case(name))?;
        Some(self.fields.remove(idx).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Cookies a enviar con `Set-Cookie`
    pub fn cookies(&self) -> &Cookies {
        &self.cookies
    }

    pub fn cookies_mut(&mut self) -> &mut Cookies {
        &mut self.cookies
    }

    /// Lista final de campos: los headers y, si hay cookies, `Set-Cookie`
    pub fn to_fields(&self) -> Vec<(String, String)> {
        let mut fields = self.fields.clone();
        if !self.cookies.is_empty() {
            fields.push(("Set-Cookie".to_string(), self.cookies.to_string()));
        }
        fields
    }
}

/// Headers que describen el contenido de la respuesta
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentHeaders {
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
    pub content_encoding: Option<String>,
    pub content_language: Option<String>,
}

impl ContentHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tipo de contenido, ej: "application/json"
    pub fn content_type(&mut self, value: impl Into<String>) -> &mut Self {
        self.content_type = Some(value.into());
        self
    }

    pub fn content_length(&mut self, len: u64) -> &mut Self {
        self.content_length = Some(len);
        self
    }

    /// Verifica si la aplicación describió algún contenido
    pub fn describes_content(&self) -> bool {
        self.content_type.is_some() || self.content_length.map_or(false, |len| len > 0)
    }

    /// Campos en orden fijo: tipo, largo, encoding, idioma
    pub fn to_fields(&self) -> Vec<(String, String)> {
        let mut fields = Vec::new();
        if let Some(ct) = &self.content_type {
            fields.push(("Content-Type".to_string(), ct.clone()));
        }
        if let Some(len) = self.content_length {
            fields.push(("Content-Length".to_string(), len.to_string()));
        }
        if let Some(enc) = &self.content_encoding {
            fields.push(("Content-Encoding".to_string(), enc.clone()));
        }
        if let Some(lang) = &self.content_language {
            fields.push(("Content-Language".to_string(), lang.clone()));
        }
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cookie::Cookie;

    #[test]
    fn test_request_headers_case_insensitive() {
        let headers: RequestHeaders =
            [("If-None-Match", "\"abc\""), ("content-length", "12")].into_iter().collect();
        assert_eq!(headers.get("if-none-match"), Some("\"abc\""));
        assert_eq!(headers.content_length(), Some(12));
        assert!(!headers.contains("Cookie"));
    }

    #[test]
    fn test_request_headers_last_duplicate_wins() {
        let mut headers = RequestHeaders::new();
        headers.insert("Host", "a");
        headers.insert("host", "b");
        assert_eq!(headers.get("HOST"), Some("b"));
        assert_eq!(headers.iter().count(), 1);
    }

    #[test]
    fn test_media_type() {
        let mut headers = RequestHeaders::new();
        headers.insert("Content-Type", "Application/JSON; charset=utf-8");
        assert_eq!(headers.media_type().as_deref(), Some("application/json"));
    }

    #[test]
    fn test_response_headers_keep_order_and_replace() {
        let mut rh = ResponseHeaders::new();
        rh.set("ETag", "\"1\"");
        rh.set("Location", "/x");
        rh.set("etag", "\"2\"");
        let fields: Vec<_> = rh.iter().collect();
        assert_eq!(fields, vec![("ETag", "\"2\""), ("Location", "/x")]);
        assert_eq!(rh.remove("location").as_deref(), Some("/x"));
    }

    #[test]
    fn test_response_cookies_become_set_cookie() {
        let mut rh = ResponseHeaders::new();
        assert!(rh.cookies_mut().insert(Cookie::new("sid", "abc").unwrap()));
        let fields = rh.to_fields();
        assert_eq!(fields.last().unwrap().0, "Set-Cookie");
        assert_eq!(fields.last().unwrap().1, "sid=abc; Version=1");
    }

    #[test]
    fn test_content_headers_fields() {
        let mut ch = ContentHeaders::new();
        assert!(!ch.describes_content());
        ch.content_type("text/plain").content_length(5);
        assert!(ch.describes_content());
        assert_eq!(
            ch.to_fields(),
            vec![
                ("Content-Type".to_string(), "text/plain".to_string()),
                ("Content-Length".to_string(), "5".to_string()),
            ]
        );
    }
}
