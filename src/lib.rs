//! # restcgi
//! src/lib.rs
//!
//! Motor REST para aplicaciones CGI. La aplicación describe su jerarquía de
//! recursos implementando [`resource::Resource`]; el motor localiza el
//! recurso a partir del path, evalúa las precondiciones de versión
//! (`If-Match`, `If-None-Match`, ...), ejecuta la secuencia fija de pasos
//! del verbo y convierte cada falla en la respuesta HTTP correspondiente.
//!
//! ## Arquitectura
//!
//! - `http`: verbos, códigos de estado, headers, gramática de headers y URI
//! - `cookie`: cookies de request y de respuesta
//! - `version`: versiones de recursos y constraints condicionales
//! - `method`: el request en curso y el endpoint que recibe la respuesta
//! - `resource`: el trait de recursos, el árbol localizado y el ciclo de vida
//! - `rest`: el despachador y los hosts virtuales
//! - `error`: la taxonomía de fallas con código de estado
//! - `config`, `server`, `demo`: el binario de demo sobre HTTP/1.0
//!
//! ## Ejemplo de uso
//!
//! ```
//! use restcgi::error::Result;
//! use restcgi::http::{MethodMask, Verb};
//! use restcgi::method::BufferedEndpoint;
//! use restcgi::resource::{Context, Resource};
//! use restcgi::rest::{RequestParts, Rest};
//! use restcgi::version::Version;
//! use std::io::Write;
//!
//! struct Hello;
//!
//! impl Resource for Hello {
//!     fn allowed(&self) -> MethodMask {
//!         MethodMask::of(&[Verb::Get])
//!     }
//!
//!     fn read(&mut self, _cx: &Context<'_>, _version_only: bool) -> Result<Version> {
//!         Ok(Version::tagged(1u64))
//!     }
//!
//!     fn write(&mut self, out: &mut dyn Write) -> Result<()> {
//!         out.write_all(b"hello")?;
//!         Ok(())
//!     }
//! }
//!
//! let mut endpoint = BufferedEndpoint::new();
//! Rest::default().process(RequestParts::new("GET", "/"), Box::new(Hello), &mut endpoint);
//! assert_eq!(endpoint.header("ETag"), Some("\"1\""));
//! assert_eq!(endpoint.body_text(), "hello");
//! ```

pub mod config;
pub mod cookie;
pub mod demo;
pub mod error;
pub mod http;
pub mod method;
pub mod resource;
pub mod rest;
pub mod server;
pub mod version;
