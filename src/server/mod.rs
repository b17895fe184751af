//! # Módulo del Servidor HTTP
//! src/server/mod.rs
//!
//! Transporte de la demo:
//! 1. Escucha en un puerto
//! 2. Acepta conexiones entrantes, un thread por conexión
//! 3. Lee el request HTTP/1.0 (headers + `Content-Length` bytes)
//! 4. Lo procesa con el motor REST y envía la respuesta capturada

pub mod tcp;

// Re-exportar para facilitar el uso
pub use tcp::Server;
