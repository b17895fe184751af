//! # Path y Query de la URI
//! src/http/uri.rs
//!
//! [`UriPath`] es la lista de segmentos ya decodificados que el localizador
//! de recursos va consumiendo con `pop_front`. [`Query`] conserva los
//! parámetros en el orden en que llegaron.

use std::collections::VecDeque;
use std::fmt;

/// Decodifica `%XX` y `+` (sólo en query). Secuencias inválidas se dejan tal cual.
pub fn percent_decode(s: &str, plus_as_space: bool) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' if i + 2 < bytes.len() => {
                match (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                    (Some(hi), Some(lo)) => {
                        out.push(hi * 16 + lo);
                        i += 3;
                        continue;
                    }
                    _ => out.push(b'%'),
                }
            }
            b'+' if plus_as_space => out.push(b' '),
            b => out.push(b),
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Codifica un segmento de path (todo lo que no es "unreserved" va como `%XX`)
pub fn percent_encode_segment(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~') {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{:02X}", b));
        }
    }
    out
}

/// Path de la URI como segmentos decodificados
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UriPath {
    segments: VecDeque<String>,
}

impl UriPath {
    /// Parsea un path codificado, ej: "/routes/a%20b". Los segmentos vacíos
    /// (dobles barras o barra final) se descartan.
    pub fn parse(encoded: &str) -> Self {
        let segments = encoded
            .split('/')
            .filter(|seg| !seg.is_empty())
            .map(|seg| percent_decode(seg, false))
            .collect();
        Self { segments }
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Primer segmento sin consumirlo
    pub fn front(&self) -> Option<&str> {
        self.segments.front().map(String::as_str)
    }

    /// Consume el primer segmento
    pub fn pop_front(&mut self) -> Option<String> {
        self.segments.pop_front()
    }

    pub fn clear(&mut self) {
        self.segments.clear();
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(String::as_str)
    }

    /// Nuevo path con `segment` agregado al final
    pub fn join(&self, segment: &str) -> UriPath {
        let mut path = self.clone();
        path.segments.push_back(segment.to_string());
        path
    }

    /// Codificación para el wire, ej: "/routes/a%20b"; el path vacío es "/"
    pub fn encoding(&self) -> String {
        if self.segments.is_empty() {
            return "/".to_string();
        }
        self.segments
            .iter()
            .map(|seg| format!("/{}", percent_encode_segment(seg)))
            .collect()
    }
}

impl fmt::Display for UriPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encoding())
    }
}

/// Parámetros de la query en orden de llegada
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    params: Vec<(String, String)>,
}

impl Query {
    /// Parsea una query string, ej: "num=10&text=hello%20world&debug"
    pub fn parse(query: &str) -> Self {
        let params = query
            .split('&')
            .filter(|param| !param.is_empty())
            .map(|param| match param.find('=') {
                Some(eq_pos) => (
                    percent_decode(&param[..eq_pos], true),
                    percent_decode(&param[eq_pos + 1..], true),
                ),
                // Parámetro sin valor (ej: "?restPUT")
                None => (percent_decode(param, true), String::new()),
            })
            .collect();
        Self { params }
    }

    /// Primer valor del parámetro
    pub fn get(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.params.iter().any(|(n, _)| n == name)
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}
