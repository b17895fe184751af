//! # Gramática de Valores de Headers
//! src/http/syntax.rs
//!
//! Primitivas de parsing según la gramática del RFC 2616 (sección 2.2):
//!
//! ```text
//! token          = 1*<any CHAR except CTLs or separators>
//! separators     = "(" | ")" | "<" | ">" | "@" | "," | ";" | ":" | "\"
//!                | <"> | "/" | "[" | "]" | "?" | "=" | "{" | "}" | SP | HT
//! quoted-string  = ( <"> *(qdtext | quoted-pair ) <"> )
//! quoted-pair    = "\" CHAR
//! ```
//!
//! Cada primitiva del [`Cursor`] avanza y retorna éxito, o deja el cursor
//! donde estaba y retorna fallo. Nunca hay errores por input malformado: es
//! quien llama el que decide si resincroniza (`skip_past`, `skip_to`) o
//! aborta (`exhaust`). Para backtracking de varias primitivas se usa la
//! pila de posiciones (`push`/`pop`/`commit`).

use std::fmt;

/// Verifica si el carácter es un separador del RFC 2616
pub fn is_separator(c: char) -> bool {
    matches!(
        c,
        '(' | ')' | '<' | '>' | '@' | ',' | ';' | ':' | '\\' | '"' | '/' | '[' | ']' | '?'
            | '=' | '{' | '}' | ' ' | '\t'
    )
}

/// Verifica si el carácter puede formar parte de un token
pub fn is_token_char(c: char) -> bool {
    c.is_ascii() && !c.is_ascii_control() && !is_separator(c)
}

/// Verifica si el string completo es un token válido
pub fn is_token(s: &str) -> bool {
    !s.is_empty() && s.chars().all(is_token_char)
}

/// Un token HTTP (se preserva mayúsculas/minúsculas)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HttpToken(String);

impl HttpToken {
    /// Crea un token validando su sintaxis
    pub fn new(s: &str) -> Option<Self> {
        is_token(s).then(|| HttpToken(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compara sin distinguir mayúsculas (nombres de atributos, ej: `$Path`)
    pub fn eq_ignore_case(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }
}

impl fmt::Display for HttpToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Una palabra HTTP: `word = token | quoted-string`.
///
/// Guarda el valor ya sin comillas ni escapes; [`HttpWord::encoding`] lo
/// vuelve a citar sólo si hace falta.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct HttpWord(String);

impl HttpWord {
    pub fn new(s: impl Into<String>) -> Self {
        HttpWord(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Codificación para el wire: el valor tal cual si es token, o
    /// quoted-string con `"` y `\` escapados
    pub fn encoding(&self) -> String {
        if is_token(&self.0) {
            self.0.clone()
        } else {
            quote(&self.0)
        }
    }
}

impl fmt::Display for HttpWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Produce un quoted-string
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// Cursor sobre el valor de un header con pila de posiciones para backtracking
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    input: &'a str,
    pos: usize,
    stack: Vec<usize>,
}

impl<'a> Cursor<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            stack: Vec::new(),
        }
    }

    /// Posición actual (byte offset)
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Lo que queda por consumir
    pub fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    /// Verifica si no quedan caracteres
    pub fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Guarda la posición actual
    pub fn push(&mut self) {
        self.stack.push(self.pos);
    }

    /// Restaura la última posición guardada
    pub fn pop(&mut self) {
        if let Some(pos) = self.stack.pop() {
            self.pos = pos;
        }
    }

    /// Descarta la última posición guardada sin restaurarla
    pub fn commit(&mut self) {
        self.stack.pop();
    }

    /// Siguiente carácter sin consumirlo
    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// Consume un carácter cualquiera
    pub fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Consume espacios lineales (SP, HT, CR, LF). Retorna si consumió algo.
    pub fn skip_space(&mut self) -> bool {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if matches!(c, ' ' | '\t' | '\r' | '\n') {
                self.pos += 1;
            } else {
                break;
            }
        }
        self.pos > start
    }

    /// Salta espacios y verifica si queda algún carácter
    pub fn any(&mut self) -> bool {
        self.skip_space();
        !self.at_end()
    }

    /// Salta espacios y verifica si se llegó al final ("end of record")
    pub fn eor(&mut self) -> bool {
        self.skip_space();
        self.at_end()
    }

    /// Consume el literal (después de espacios opcionales)
    pub fn literal(&mut self, lit: &str) -> bool {
        let start = self.pos;
        self.skip_space();
        if self.rest().starts_with(lit) {
            self.pos += lit.len();
            true
        } else {
            self.pos = start;
            false
        }
    }

    /// Consume un token (después de espacios opcionales)
    pub fn token(&mut self) -> Option<HttpToken> {
        let start = self.pos;
        self.skip_space();
        let begin = self.pos;
        while let Some(c) = self.peek() {
            if is_token_char(c) {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
        if self.pos == begin {
            self.pos = start;
            return None;
        }
        Some(HttpToken(self.input[begin..self.pos].to_string()))
    }

    /// Consume un quoted-string y retorna su contenido sin escapes.
    /// Falla sin avanzar si falta la comilla final o hay un carácter de control.
    pub fn quoted(&mut self) -> Option<HttpWord> {
        let start = self.pos;
        self.skip_space();
        if self.bump() != Some('"') {
            self.pos = start;
            return None;
        }
        let mut value = String::new();
        loop {
            match self.bump() {
                Some('"') => return Some(HttpWord(value)),
                Some('\\') => match self.bump() {
                    Some(c) if c.is_ascii() => value.push(c),
                    _ => break,
                },
                Some(c) if c == '\t' || !c.is_control() => value.push(c),
                _ => break,
            }
        }
        self.pos = start;
        None
    }

    /// Consume un `word`: quoted-string si empieza con comilla, token si no
    pub fn word(&mut self) -> Option<HttpWord> {
        self.skip_space();
        if self.peek() == Some('"') {
            self.quoted()
        } else {
            self.token().map(|t| HttpWord(t.0))
        }
    }

    /// Consume texto hasta (sin incluir) alguno de los delimitadores o el
    /// final. El texto puede ser vacío; se recortan espacios finales.
    pub fn text_until(&mut self, delims: &str) -> &'a str {
        self.skip_space();
        let begin = self.pos;
        while let Some(c) = self.peek() {
            if delims.contains(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
        self.input[begin..self.pos].trim_end()
    }

    /// Avanza hasta el primer delimitador sin consumirlo.
    /// Retorna `false`, dejando el cursor al final, si no hay delimitador.
    pub fn skip_to(&mut self, delims: &str) -> bool {
        while let Some(c) = self.peek() {
            if delims.contains(c) {
                return true;
            }
            self.pos += c.len_utf8();
        }
        false
    }

    /// Descarta todo lo que queda
    pub fn exhaust(&mut self) {
        self.pos = self.input.len();
    }

    /// Avanza hasta pasar el primer delimitador encontrado (resincronización).
    /// Retorna `false`, dejando el cursor al final, si no hay delimitador.
    pub fn skip_past(&mut self, delims: &str) -> bool {
        while let Some(c) = self.bump() {
            if delims.contains(c) {
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_chars() {
        assert!(is_token("Customer"));
        assert!(is_token("$Version"));
        assert!(!is_token("a b"));
        assert!(!is_token("a=b"));
        assert!(!is_token(""));
    }

    #[test]
    fn test_token_skips_leading_space_and_stops_at_separator() {
        let mut cur = Cursor::new("  name=value");
        assert_eq!(cur.token().unwrap().as_str(), "name");
        assert!(cur.literal("="));
        assert_eq!(cur.rest(), "value");
    }

    #[test]
    fn test_token_failure_leaves_cursor() {
        let mut cur = Cursor::new("  =x");
        assert!(cur.token().is_none());
        assert_eq!(cur.position(), 0);
    }

    #[test]
    fn test_quoted_with_escapes() {
        let mut cur = Cursor::new(r#""a \"b\" c"; rest"#);
        let word = cur.quoted().unwrap();
        assert_eq!(word.as_str(), r#"a "b" c"#);
        assert_eq!(cur.rest(), "; rest");
    }

    #[test]
    fn test_unterminated_quote_fails_without_moving() {
        let mut cur = Cursor::new(r#""abc"#);
        assert!(cur.quoted().is_none());
        assert_eq!(cur.position(), 0);
    }

    #[test]
    fn test_text_until_delimiters() {
        let mut cur = Cursor::new("some value ; next");
        assert_eq!(cur.text_until(";,"), "some value");
        assert_eq!(cur.peek(), Some(';'));
    }

    #[test]
    fn test_skip_past() {
        let mut cur = Cursor::new("garbage, next");
        assert!(cur.skip_past(";,"));
        assert_eq!(cur.rest(), " next");

        let mut cur = Cursor::new("no delimiter");
        assert!(!cur.skip_past(";,"));
        assert!(cur.at_end());
    }

    #[test]
    fn test_push_pop_backtracking() {
        let mut cur = Cursor::new("abc def");
        cur.push();
        assert!(cur.token().is_some());
        assert!(cur.token().is_some());
        cur.pop();
        assert_eq!(cur.position(), 0);

        cur.push();
        assert!(cur.token().is_some());
        cur.commit();
        assert_eq!(cur.rest(), " def");
    }

    #[test]
    fn test_eor_and_any() {
        let mut cur = Cursor::new("   ");
        assert!(!cur.any());
        assert!(cur.eor());
    }

    #[test]
    fn test_word_encoding() {
        assert_eq!(HttpWord::new("abc").encoding(), "abc");
        assert_eq!(HttpWord::new("a b").encoding(), "\"a b\"");
        assert_eq!(HttpWord::new("/path").encoding(), "\"/path\"");
        assert_eq!(HttpWord::new("").encoding(), "\"\"");
    }
}
