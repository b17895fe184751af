//! # Códigos de Estado HTTP
//! src/http/status.rs
//!
//! Este módulo define los códigos de estado que el motor REST puede emitir.
//! Según el RFC 2616 se agrupan en categorías:
//!
//! - **2xx**: Éxito (200, 201, 204, 205)
//! - **3xx**: Redirección (303, 304)
//! - **4xx**: Error del cliente (400, 401, 404, 405, 409, 410, 412, 413, 415)
//! - **5xx**: Error del servidor (500)

/// Representa los códigos de estado HTTP que soporta el motor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    /// 200 OK - La petición fue exitosa
    Ok = 200,

    /// 201 Created - Se creó un recurso hijo (respuesta normal de POST)
    Created = 201,

    /// 204 No Content - Petición exitosa sin contenido en el body
    NoContent = 204,

    /// 205 Reset Content - Éxito, el cliente debe limpiar su formulario
    ResetContent = 205,

    /// 303 See Other - La respuesta está en otra URI (header Location)
    SeeOther = 303,

    /// 304 Not Modified - El recurso no cambió respecto a la versión del cliente
    NotModified = 304,

    /// 400 Bad Request - Header malformado o path no reconocido
    BadRequest = 400,

    /// 401 Unauthorized - Falta autenticación
    Unauthorized = 401,

    /// 404 Not Found - Recurso no encontrado
    NotFound = 404,

    /// 405 Method Not Allowed - El recurso no acepta ese método (header Allow)
    MethodNotAllowed = 405,

    /// 409 Conflict - Conflicto con el estado actual del recurso
    Conflict = 409,

    /// 410 Gone - El recurso ya no existe
    Gone = 410,

    /// 412 Precondition Failed - No se cumplió If-Match / If-Unmodified-Since
    PreconditionFailed = 412,

    /// 413 Request Entity Too Large - El body excede lo aceptado
    RequestEntityTooLarge = 413,

    /// 415 Unsupported Media Type - Formato del body no soportado
    UnsupportedMediaType = 415,

    /// 500 Internal Server Error - Error interno del servidor
    InternalServerError = 500,
}

impl StatusCode {
    /// Convierte el código a su valor numérico
    ///
    /// # Ejemplo
    /// ```
    /// use restcgi::http::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// ```
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }

    /// Obtiene el código a partir de su valor numérico
    pub fn from_u16(code: u16) -> Option<Self> {
        let status = match code {
            200 => StatusCode::Ok,
            201 => StatusCode::Created,
            204 => StatusCode::NoContent,
            205 => StatusCode::ResetContent,
            303 => StatusCode::SeeOther,
            304 => StatusCode::NotModified,
            400 => StatusCode::BadRequest,
            401 => StatusCode::Unauthorized,
            404 => StatusCode::NotFound,
            405 => StatusCode::MethodNotAllowed,
            409 => StatusCode::Conflict,
            410 => StatusCode::Gone,
            412 => StatusCode::PreconditionFailed,
            413 => StatusCode::RequestEntityTooLarge,
            415 => StatusCode::UnsupportedMediaType,
            500 => StatusCode::InternalServerError,
            _ => return None,
        };
        Some(status)
    }

    /// Retorna el texto de razón (reason phrase) asociado al código
    ///
    /// # Ejemplo
    /// ```
    /// use restcgi::http::StatusCode;
    /// assert_eq!(StatusCode::NotModified.reason_phrase(), "Not Modified");
    /// ```
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::Created => "Created",
            StatusCode::NoContent => "No Content",
            StatusCode::ResetContent => "Reset Content",
            StatusCode::SeeOther => "See Other",
            StatusCode::NotModified => "Not Modified",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::Unauthorized => "Unauthorized",
            StatusCode::NotFound => "Not Found",
            StatusCode::MethodNotAllowed => "Method Not Allowed",
            StatusCode::Conflict => "Conflict",
            StatusCode::Gone => "Gone",
            StatusCode::PreconditionFailed => "Precondition Failed",
            StatusCode::RequestEntityTooLarge => "Request Entity Too Large",
            StatusCode::UnsupportedMediaType => "Unsupported Media Type",
            StatusCode::InternalServerError => "Internal Server Error",
        }
    }

    /// Indica si el RFC prohíbe enviar contenido con este código (204, 205, 304)
    pub fn forbids_body(&self) -> bool {
        matches!(
            self,
            StatusCode::NoContent | StatusCode::ResetContent | StatusCode::NotModified
        )
    }

    /// Verifica si el código indica éxito (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.as_u16())
    }

    /// Verifica si el código indica error del cliente (4xx)
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.as_u16())
    }

    /// Verifica si el código indica error del servidor (5xx)
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.as_u16())
    }
}

impl std::fmt::Display for StatusCode {
    /// Formato: "304 Not Modified"
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.reason_phrase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_values() {
        assert_eq!(StatusCode::Created.as_u16(), 201);
        assert_eq!(StatusCode::SeeOther.as_u16(), 303);
        assert_eq!(StatusCode::PreconditionFailed.as_u16(), 412);
        assert_eq!(StatusCode::UnsupportedMediaType.as_u16(), 415);
    }

    #[test]
    fn test_from_u16_roundtrip() {
        for code in [200, 201, 204, 205, 303, 304, 400, 401, 404, 405, 409, 410, 412, 413, 415, 500] {
            assert_eq!(StatusCode::from_u16(code).map(|s| s.as_u16()), Some(code));
        }
        assert_eq!(StatusCode::from_u16(418), None);
    }

    #[test]
    fn test_forbids_body() {
        assert!(StatusCode::NoContent.forbids_body());
        assert!(StatusCode::ResetContent.forbids_body());
        assert!(StatusCode::NotModified.forbids_body());
        assert!(!StatusCode::Ok.forbids_body());
        assert!(!StatusCode::SeeOther.forbids_body());
    }

    #[test]
    fn test_categories() {
        assert!(StatusCode::Created.is_success());
        assert!(!StatusCode::NotModified.is_success());
        assert!(StatusCode::Gone.is_client_error());
        assert!(StatusCode::InternalServerError.is_server_error());
    }

    #[test]
    fn test_display() {
        assert_eq!(StatusCode::Ok.to_string(), "200 OK");
        assert_eq!(StatusCode::NotModified.to_string(), "304 Not Modified");
        assert_eq!(
            StatusCode::RequestEntityTooLarge.to_string(),
            "413 Request Entity Too Large"
        );
    }
}
