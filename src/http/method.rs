//! # Métodos HTTP y Máscaras de Métodos Permitidos
//! src/http/method.rs
//!
//! Cada verbo es un bit, de modo que un recurso declara los métodos que
//! acepta combinándolos en una [`MethodMask`]. El orden de declaración
//! (GET, PUT, POST, DELETE, OPTIONS, HEAD) es también el orden en que se
//! listan en el header `Allow`.

use std::fmt;
use std::ops::BitOr;

/// Verbos HTTP soportados por el motor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    /// GET - Obtener una representación del recurso
    Get = 1 << 0,

    /// PUT - Actualizar un recurso existente
    Put = 1 << 1,

    /// POST - Crear un recurso hijo
    Post = 1 << 2,

    /// DELETE - Eliminar el recurso
    Delete = 1 << 3,

    /// OPTIONS - Consultar los métodos permitidos
    Options = 1 << 4,

    /// HEAD - Como GET pero sin body
    Head = 1 << 5,
}

impl Verb {
    /// Todos los verbos en orden de declaración
    pub const ALL: [Verb; 6] = [
        Verb::Get,
        Verb::Put,
        Verb::Post,
        Verb::Delete,
        Verb::Options,
        Verb::Head,
    ];

    /// Parsea un verbo desde el string de la request line.
    /// Retorna `None` si el verbo no es reconocido.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "GET" => Some(Verb::Get),
            "PUT" => Some(Verb::Put),
            "POST" => Some(Verb::Post),
            "DELETE" => Some(Verb::Delete),
            "OPTIONS" => Some(Verb::Options),
            "HEAD" => Some(Verb::Head),
            _ => None,
        }
    }

    /// Convierte el verbo a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Put => "PUT",
            Verb::Post => "POST",
            Verb::Delete => "DELETE",
            Verb::Options => "OPTIONS",
            Verb::Head => "HEAD",
        }
    }

    /// Bit del verbo dentro de una máscara
    pub fn bit(&self) -> u8 {
        *self as u8
    }

    /// GET y HEAD: lectura idempotente, cacheable
    pub fn is_read(&self) -> bool {
        matches!(self, Verb::Get | Verb::Head)
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Conjunto de verbos permitidos por un recurso
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MethodMask(u8);

impl MethodMask {
    /// Máscara vacía
    pub const NONE: MethodMask = MethodMask(0);

    /// Todos los verbos
    pub fn all() -> Self {
        Verb::ALL.iter().fold(Self::NONE, |mask, verb| mask | *verb)
    }

    /// Construye la máscara desde una lista de verbos
    ///
    /// # Ejemplo
    /// ```
    /// use restcgi::http::{MethodMask, Verb};
    ///
    /// let mask = MethodMask::of(&[Verb::Delete, Verb::Get]);
    /// assert_eq!(mask.to_allow_string(), "GET, DELETE");
    /// ```
    pub fn of(verbs: &[Verb]) -> Self {
        verbs.iter().fold(Self::NONE, |mask, verb| mask | *verb)
    }

    /// Verifica si el verbo está en la máscara
    pub fn contains(&self, verb: Verb) -> bool {
        self.0 & verb.bit() != 0
    }

    /// Verbos de ambas máscaras
    pub fn union(&self, other: MethodMask) -> MethodMask {
        *self | other
    }

    /// Verifica si la máscara está vacía
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Valor numérico de la máscara
    pub fn bits(&self) -> u8 {
        self.0
    }

    /// Itera los verbos presentes en orden de declaración
    pub fn verbs(&self) -> impl Iterator<Item = Verb> + '_ {
        Verb::ALL.into_iter().filter(move |verb| self.contains(*verb))
    }

    /// Valor para el header `Allow`, ej: "GET, PUT"
    pub fn to_allow_string(&self) -> String {
        self.verbs()
            .map(|verb| verb.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl BitOr<Verb> for MethodMask {
    type Output = MethodMask;

    fn bitor(self, verb: Verb) -> MethodMask {
        MethodMask(self.0 | verb.bit())
    }
}

impl BitOr for MethodMask {
    type Output = MethodMask;

    fn bitor(self, other: MethodMask) -> MethodMask {
        MethodMask(self.0 | other.0)
    }
}

impl BitOr for Verb {
    type Output = MethodMask;

    fn bitor(self, other: Verb) -> MethodMask {
        MethodMask(self.bit() | other.bit())
    }
}

impl From<Verb> for MethodMask {
    fn from(verb: Verb) -> Self {
        MethodMask(verb.bit())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_verbs() {
        assert_eq!(Verb::parse("GET"), Some(Verb::Get));
        assert_eq!(Verb::parse("DELETE"), Some(Verb::Delete));
        assert_eq!(Verb::parse("OPTIONS"), Some(Verb::Options));
        assert_eq!(Verb::parse("get"), None);
        assert_eq!(Verb::parse("TRACE"), None);
    }

    #[test]
    fn test_bits_follow_declaration_order() {
        assert_eq!(Verb::Get.bit(), 1);
        assert_eq!(Verb::Put.bit(), 2);
        assert_eq!(Verb::Post.bit(), 4);
        assert_eq!(Verb::Delete.bit(), 8);
        assert_eq!(Verb::Options.bit(), 16);
        assert_eq!(Verb::Head.bit(), 32);
    }

    #[test]
    fn test_mask_contains() {
        let mask = Verb::Get | Verb::Delete;
        assert!(mask.contains(Verb::Get));
        assert!(mask.contains(Verb::Delete));
        assert!(!mask.contains(Verb::Put));
        assert!(!MethodMask::NONE.contains(Verb::Get));

        let wider = mask.union(MethodMask::from(Verb::Put));
        assert!(wider.contains(Verb::Put));
        assert_eq!(wider.bits(), mask.bits() | Verb::Put.bit());
    }

    #[test]
    fn test_allow_string_uses_declaration_order() {
        let mask = MethodMask::of(&[Verb::Head, Verb::Delete, Verb::Get]);
        assert_eq!(mask.to_allow_string(), "GET, DELETE, HEAD");
        assert_eq!(
            MethodMask::all().to_allow_string(),
            "GET, PUT, POST, DELETE, OPTIONS, HEAD"
        );
        assert_eq!(MethodMask::NONE.to_allow_string(), "");
    }

    #[test]
    fn test_is_read() {
        assert!(Verb::Get.is_read());
        assert!(Verb::Head.is_read());
        assert!(!Verb::Put.is_read());
        assert!(!Verb::Delete.is_read());
    }
}
