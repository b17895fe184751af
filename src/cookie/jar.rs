//! # Colección de Cookies
//! src/cookie/jar.rs
//!
//! Multi-mapa ordenado por nombre. Se comporta distinto según el lado:
//!
//! - **Request**: se admiten duplicados con la misma identidad; `find`
//!   retorna la primera cookie insertada con ese nombre y `find_last` la última.
//! - **Response**: insertar una cookie cuya identidad ya existe no hace nada
//!   y retorna `false`.
//!
//! ## Parsing del header `Cookie`
//!
//! ```text
//! cookie        = [ "$Version" "=" value ( ";" | "," ) ] cookie-value *( (";" | ",") cookie-value )
//! cookie-value  = NAME "=" VALUE [ ";" path ] [ ";" domain ]
//! path          = "$Path" "=" value
//! domain        = "$Domain" "=" value
//! ```
//!
//! Un error de sintaxis en una cookie no aborta el header: se resincroniza en
//! el siguiente `;` o `,` y se sigue. El resultado sólo indica, en conjunto,
//! si hubo algún error.

use super::{Cookie, CookieAttrs};
use crate::http::syntax::{Cursor, HttpWord};
use std::collections::BTreeMap;
use std::fmt;

/// Separador entre cookies al serializar
pub const COOKIE_SEPARATOR: &str = ", ";

/// Observador notificado después de cada modificación de la colección
pub trait CookiesObserver {
    fn on_updated(&mut self, cookies: &Cookies);
}

/// Resultado de escanear una parte del header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scan {
    /// Sin errores
    Clean,
    /// Hubo un error pero se encontró dónde seguir
    Resynced,
    /// Hubo un error y no queda dónde resincronizar
    Lost,
}

/// Colección de cookies ordenada por nombre
pub struct Cookies {
    is_request: bool,
    by_name: BTreeMap<String, Vec<Cookie>>,
    observer: Option<Box<dyn CookiesObserver>>,
}

impl Cookies {
    /// Colección para cookies recibidas en el request
    pub fn request() -> Self {
        Self {
            is_request: true,
            by_name: BTreeMap::new(),
            observer: None,
        }
    }

    /// Colección para cookies a enviar en la respuesta
    pub fn response() -> Self {
        Self {
            is_request: false,
            by_name: BTreeMap::new(),
            observer: None,
        }
    }

    pub fn is_request(&self) -> bool {
        self.is_request
    }

    pub fn len(&self) -> usize {
        self.by_name.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Itera por nombre y, dentro de un nombre, en orden de inserción
    pub fn iter(&self) -> impl Iterator<Item = &Cookie> {
        self.by_name.values().flatten()
    }

    /// Primera cookie insertada con el nombre dado
    pub fn find(&self, name: &str) -> Option<&Cookie> {
        self.by_name.get(name).and_then(|list| list.first())
    }

    /// Última cookie insertada con el nombre dado
    pub fn find_last(&self, name: &str) -> Option<&Cookie> {
        self.by_name.get(name).and_then(|list| list.last())
    }

    /// Todas las cookies con el nombre dado, en orden de inserción
    pub fn find_all(&self, name: &str) -> &[Cookie] {
        self.by_name.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Elimina todas las cookies y notifica al observador
    pub fn clear(&mut self) {
        self.by_name.clear();
        self.notify();
    }

    /// Inserta una cookie. Del lado de la respuesta, una identidad repetida
    /// no se inserta y retorna `false`.
    pub fn insert(&mut self, cookie: Cookie) -> bool {
        if !self.is_request {
            let id = cookie.id();
            if self.iter().any(|existing| existing.id() == id) {
                return false;
            }
        }
        self.by_name
            .entry(cookie.name().to_string())
            .or_default()
            .push(cookie);
        self.notify();
        true
    }

    /// Parsea el valor de un header `Cookie` e inserta cada cookie válida.
    ///
    /// Retorna `false` si hubo algún error de sintaxis; aun así, todas las
    /// cookies que se pudieron extraer quedan insertadas.
    pub fn insert_header(&mut self, raw: &str) -> bool {
        let mut cur = Cursor::new(raw);
        let mut version = 0;
        let mut clean = match parse_version(&mut cur, &mut version) {
            Scan::Clean => true,
            Scan::Resynced => false,
            Scan::Lost => return false,
        };

        while !cur.at_end() {
            let mut se = false;
            match cur.token() {
                // Un nombre con '$' es un atributo sin cookie
                Some(name) if name.as_str().starts_with('$') => se = true,
                Some(name) => {
                    if !cur.literal("=") {
                        se = true;
                    } else if let Some(value) = parse_value(&mut cur) {
                        let mut attrs = CookieAttrs::new();
                        attrs.set_version(version);
                        let scan = parse_attributes(&mut cur, &mut attrs);
                        self.insert(Cookie::from_parts(name, value, attrs));
                        match scan {
                            Scan::Clean => {}
                            Scan::Resynced => clean = false,
                            Scan::Lost => return false,
                        }
                    } else {
                        se = true;
                    }
                }
                None => {
                    if cur.eor() {
                        break;
                    }
                    se = true;
                }
            }

            if se {
                clean = false;
                if !cur.skip_past(";,") {
                    break;
                }
            }
        }

        clean
    }

    /// Conecta el observador; retorna el anterior si había uno
    pub fn attach(&mut self, observer: Box<dyn CookiesObserver>) -> Option<Box<dyn CookiesObserver>> {
        self.observer.replace(observer)
    }

    /// Desconecta y retorna el observador
    pub fn detach(&mut self) -> Option<Box<dyn CookiesObserver>> {
        self.observer.take()
    }

    fn notify(&mut self) {
        if let Some(mut observer) = self.observer.take() {
            observer.on_updated(self);
            self.observer = Some(observer);
        }
    }
}

impl Default for Cookies {
    fn default() -> Self {
        Self::response()
    }
}

impl fmt::Debug for Cookies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cookies")
            .field("is_request", &self.is_request)
            .field("cookies", &self.iter().collect::<Vec<_>>())
            .field("observed", &self.observer.is_some())
            .finish()
    }
}

impl fmt::Display for Cookies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, cookie) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(COOKIE_SEPARATOR)?;
            }
            write!(f, "{}", cookie)?;
        }
        Ok(())
    }
}

/// `$Version=N` opcional al inicio del header
fn parse_version(cur: &mut Cursor<'_>, version: &mut u32) -> Scan {
    cur.push();
    let prefixed = cur.literal("$")
        && cur.token().is_some_and(|name| name.eq_ignore_case("version"))
        && cur.literal("=");
    if !prefixed {
        // Otro `$Attr` o una cookie: lo procesa el ciclo principal
        cur.pop();
        return Scan::Clean;
    }
    cur.commit();

    if let Some(v) = cur.word().and_then(|value| value.as_str().parse::<u32>().ok()) {
        *version = v;
        if cur.literal(";") || cur.literal(",") || cur.eor() {
            return Scan::Clean;
        }
    }

    if cur.skip_past(";,") {
        Scan::Resynced
    } else {
        Scan::Lost
    }
}

/// Valor de una cookie o atributo: quoted-string o texto hasta `;`, `,` o
/// espacio. Al final del header el valor es vacío, igual que antes de `;`.
fn parse_value(cur: &mut Cursor<'_>) -> Option<HttpWord> {
    if !cur.any() {
        return Some(HttpWord::default());
    }
    if cur.peek() == Some('"') {
        let word = cur.quoted();
        if word.is_none() {
            // Comilla sin cerrar o carácter corrupto: no hay forma de seguir
            cur.exhaust();
        }
        return word;
    }
    Some(HttpWord::new(cur.text_until(";, ")))
}

/// Cero o más `; $Attr=value` después del valor de la cookie
fn parse_attributes(cur: &mut Cursor<'_>, attrs: &mut CookieAttrs) -> Scan {
    let mut result = Scan::Clean;
    loop {
        if !cur.any() {
            break;
        }
        match cur.peek() {
            Some(',') => {
                cur.bump();
                break;
            }
            Some(';') => {
                cur.bump();
            }
            _ => break,
        }
        if !cur.any() || cur.peek() != Some('$') {
            break;
        }
        cur.bump();

        let ok = match cur.token() {
            Some(name) if cur.literal("=") => match parse_value(cur) {
                Some(value) => attrs.set_from_request(&name, &value),
                None => false,
            },
            _ => false,
        };

        if !ok {
            if !cur.skip_to(";,") {
                return Scan::Lost;
            }
            result = Scan::Resynced;
        }
    }
    result
}
