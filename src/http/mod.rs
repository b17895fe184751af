//! # Módulo HTTP
//! src/http/mod.rs
//!
//! Piezas del protocolo que usa el motor REST:
//!
//! - `status`: códigos de estado y reason phrases
//! - `method`: verbos y máscaras de métodos permitidos
//! - `syntax`: gramática de valores de headers (tokens, quoted-strings)
//! - `uri`: path decodificado y query
//! - `headers`: headers de request, respuesta y contenido
//!
//! Y el transporte HTTP/1.0 del servidor de demo:
//!
//! - `request`: parsing de requests HTTP/1.0
//! - `response`: serialización de respuestas HTTP/1.0
//!
//! ### Formato de Request
//!
//! ```text
//! GET /path?query=value HTTP/1.0\r\n
//! Header-Name: Header-Value\r\n
//! \r\n
//! ```

pub mod headers;
pub mod method;
pub mod request;
pub mod response;
pub mod status;
pub mod syntax;
pub mod uri;

// Re-exportamos los tipos principales para facilitar su uso
pub use headers::{ContentHeaders, RequestHeaders, ResponseHeaders};
pub use method::{MethodMask, Verb};
pub use request::{ParseError, Request};
pub use response::Response;
pub use status::StatusCode;
pub use uri::{Query, UriPath};
