//! # Configuración
//! src/config.rs
//!
//! Configuración del servidor de demo y de los límites del motor REST, con
//! soporte para argumentos CLI y variables de entorno.
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./restcgi-demo --port 8080 \
//!   --max-path-segments 32 \
//!   --max-body-bytes 65536 \
//!   --chain-children
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! HTTP_PORT=8080 HTTP_HOST=0.0.0.0 RESTCGI_LOG=restcgi=debug ./restcgi-demo
//! ```

use crate::rest::Limits;
use clap::Parser;

/// Configuración del servidor y del motor
#[derive(Debug, Clone, Parser)]
#[command(name = "restcgi-demo")]
#[command(about = "Servidor de demo del motor REST: configuración de red y rutas")]
#[command(version = "0.1.0")]
pub struct Config {
    /// Puerto en el que escucha el servidor
    #[arg(short, long, default_value = "8080", env = "HTTP_PORT")]
    pub port: u16,

    /// Host/IP en el que escucha
    #[arg(long, default_value = "127.0.0.1", env = "HTTP_HOST")]
    pub host: String,

    // === Límites del motor ===

    /// Máximo de segmentos en el path (más es 400)
    #[arg(long = "max-path-segments", default_value = "64", env = "RESTCGI_MAX_PATH_SEGMENTS")]
    pub max_path_segments: usize,

    /// Máximo de pasos de localización por request (más es 400)
    #[arg(long = "max-locate-steps", default_value = "128", env = "RESTCGI_MAX_LOCATE_STEPS")]
    pub max_locate_steps: usize,

    /// Máximo Content-Length aceptado en bytes (más es 413)
    #[arg(long = "max-body-bytes", default_value = "1048576", env = "RESTCGI_MAX_BODY_BYTES")]
    pub max_body_bytes: u64,

    /// Registrar enlaces padre/hijo entre los recursos localizados
    #[arg(long = "chain-children", env = "RESTCGI_CHAIN_CHILDREN")]
    pub chain_children: bool,

    // === Transporte ===

    /// Timeout de lectura del socket en milisegundos
    #[arg(long = "read-timeout-ms", default_value = "5000", env = "HTTP_READ_TIMEOUT_MS")]
    pub read_timeout_ms: u64,

    // === Logging ===

    /// Filtro de logs cuando RUST_LOG no está definido
    #[arg(long = "log-filter", default_value = "restcgi=info", env = "RESTCGI_LOG")]
    pub log_filter: String,
}

impl Config {
    /// Crea una nueva configuración parseando argumentos CLI
    pub fn new() -> Self {
        Config::parse()
    }

    /// Obtiene la dirección completa para bind (host:port)
    ///
    /// # Ejemplo
    /// ```rust
    /// use restcgi::config::Config;
    ///
    /// let config = Config::default();
    /// assert_eq!(config.address(), "127.0.0.1:8080");
    /// ```
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Límites para el despachador
    pub fn limits(&self) -> Limits {
        Limits {
            max_path_segments: self.max_path_segments,
            max_locate_steps: self.max_locate_steps,
            max_body_bytes: self.max_body_bytes,
            chain_children: self.chain_children,
        }
    }

    /// Valida la configuración
    pub fn validate(&self) -> Result<(), String> {
        if self.max_path_segments == 0 {
            return Err("Max path segments must be >= 1".to_string());
        }
        if self.max_locate_steps == 0 {
            return Err("Max locate steps must be >= 1".to_string());
        }
        if self.max_locate_steps < self.max_path_segments {
            return Err("Max locate steps must be >= max path segments".to_string());
        }
        if self.read_timeout_ms == 0 {
            return Err("Read timeout must be > 0".to_string());
        }
        if self.log_filter.trim().is_empty() {
            return Err("Log filter must not be empty".to_string());
        }
        Ok(())
    }

    /// Registra un resumen de la configuración
    pub fn log_summary(&self) {
        tracing::info!(
            address = %self.address(),
            read_timeout_ms = self.read_timeout_ms,
            "server configuration"
        );
        tracing::info!(
            max_path_segments = self.max_path_segments,
            max_locate_steps = self.max_locate_steps,
            max_body_bytes = self.max_body_bytes,
            chain_children = self.chain_children,
            "engine limits"
        );
    }
}

impl Default for Config {
    /// Configuración por defecto
    fn default() -> Self {
        let limits = Limits::default();
        Self {
            port: 8080,
            host: "127.0.0.1".to_string(),
            max_path_segments: limits.max_path_segments,
            max_locate_steps: limits.max_locate_steps,
            max_body_bytes: limits.max_body_bytes,
            chain_children: limits.chain_children,
            read_timeout_ms: 5_000,
            log_filter: "restcgi=info".to_string(),
        }
    }
}
