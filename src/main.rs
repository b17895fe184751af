//! # Servidor de Demo - Entry Point
//! src/main.rs
//!
//! Servicio de configuración de red sobre el motor REST.
//!
//! ## Uso
//!
//! ```bash
//! restcgi-demo --port 8080
//! curl -i http://127.0.0.1:8080/
//! curl -i -X POST -H 'Content-Type: application/json' \
//!   -d '{"destination":"10.0.0.0/8","gateway":"192.168.1.1"}' \
//!   http://127.0.0.1:8080/routes
//! ```

use restcgi::config::Config;
use restcgi::demo::{self, Store};
use restcgi::server::Server;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

fn main() {
    let config = Config::new();

    // RUST_LOG tiene prioridad sobre --log-filter
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = config.validate() {
        tracing::error!(error = %e, "invalid configuration");
        std::process::exit(2);
    }
    config.log_summary();

    let server = Server::new(config, demo::virtual_hosts(Store::default()));
    if let Err(e) = server.run() {
        tracing::error!(error = %e, "server stopped");
        std::process::exit(1);
    }
}
