//! # Aplicación de Demo
//! src/demo/mod.rs
//!
//! Servicio de configuración de red montado sobre el motor: la raíz sirve
//! la dirección, máscara y gateway del equipo, y `/routes` la tabla de
//! rutas estáticas.
//!
//! ## Ejemplo
//!
//! ```
//! use restcgi::demo::{self, Store};
//! use restcgi::method::BufferedEndpoint;
//! use restcgi::rest::{RequestParts, Rest};
//!
//! let vhosts = demo::virtual_hosts(Store::default());
//! let mut endpoint = BufferedEndpoint::new();
//! let disposition = Rest::default().process_vhost(
//!     RequestParts::new("GET", "/"),
//!     &vhosts,
//!     &mut endpoint,
//! );
//! assert_eq!(disposition.status.as_u16(), 200);
//! assert!(endpoint.body_text().contains("\"gateway\""));
//! ```

pub mod resources;
pub mod store;

pub use resources::{NetworkRoot, RouteItem, RoutesCollection};
pub use store::{NetworkConfig, Route, Store};

use crate::resource::Resource;
use crate::rest::VirtualHosts;

/// Fábrica de la raíz; cada request recibe un árbol nuevo sobre el mismo store
pub fn root_factory(store: Store) -> impl Fn() -> Box<dyn Resource> + Send + Sync + 'static {
    move || Box::new(NetworkRoot::new(store.clone()))
}

/// Hosts de la demo: cualquier `Host` (o ninguno) sirve la misma raíz
pub fn virtual_hosts(store: Store) -> VirtualHosts {
    let mut vhosts = VirtualHosts::new();
    vhosts.set_fallback(root_factory(store));
    vhosts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::StatusCode;
    use crate::method::BufferedEndpoint;
    use crate::rest::{Disposition, RequestParts, Rest};
    use std::cell::RefCell;
    use std::io::{Cursor, Read};
    use std::rc::Rc;

    fn send(store: &Store, request: RequestParts) -> (Disposition, BufferedEndpoint) {
        let mut ep = BufferedEndpoint::new();
        let d = Rest::default().process(request, root_factory(store.clone())(), &mut ep);
        (d, ep)
    }

    fn json(method: &str, target: &str, body: &str) -> RequestParts {
        RequestParts::new(method, target)
            .header("Content-Type", "application/json")
            .header("Content-Length", &body.len().to_string())
            .body(Cursor::new(body.as_bytes().to_vec()))
    }

    const ROUTE: &str = r#"{"destination":"10.0.0.0/8","gateway":"192.168.1.1"}"#;

    #[test]
    fn test_get_network_config() {
        let (d, ep) = send(&Store::default(), RequestParts::new("GET", "/"));
        assert_eq!(d.status, StatusCode::Ok);
        assert_eq!(ep.header("Content-Type"), Some("application/json"));
        assert!(ep.header("ETag").is_some());
        assert!(ep.header("Last-Modified").is_some());
        let cfg: NetworkConfig = serde_json::from_slice(ep.body_bytes()).unwrap();
        assert_eq!(cfg, NetworkConfig::default());
    }

    #[test]
    fn test_put_network_requires_json() {
        let store = Store::default();
        let request = RequestParts::new("PUT", "/")
            .header("Content-Type", "text/plain")
            .body(Cursor::new(b"x".to_vec()));
        let (d, _) = send(&store, request);
        assert_eq!(d.status, StatusCode::UnsupportedMediaType);

        let (d, _) = send(&store, json("PUT", "/", "{not json"));
        assert_eq!(d.status, StatusCode::BadRequest);
    }

    #[test]
    fn test_put_network_with_stale_etag() {
        let store = Store::default();
        let body = r#"{"address":"10.1.1.5","netmask":"255.0.0.0","gateway":"10.0.0.1"}"#;
        let (d, _) = send(&store, json("PUT", "/", body).header("If-Match", "\"stale\""));
        assert_eq!(d.status, StatusCode::PreconditionFailed);
        assert_eq!(store.network().unwrap().value, NetworkConfig::default());

        let (d, ep) = send(&store, json("PUT", "/", body));
        assert_eq!(d.status, StatusCode::Ok);
        assert!(ep.body_text().contains("10.1.1.5"));
    }

    /// Cuerpo que, al empezar a leerse, deja pasar otro PUT completo con el
    /// mismo `If-Match`
    struct Interleaved {
        store: Store,
        etag: String,
        competing: Option<&'static str>,
        outcome: Rc<RefCell<Option<StatusCode>>>,
        inner: Cursor<Vec<u8>>,
    }

    impl Read for Interleaved {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if let Some(body) = self.competing.take() {
                let (d, _) = send(&self.store, json("PUT", "/", body).header("If-Match", &self.etag));
                *self.outcome.borrow_mut() = Some(d.status);
            }
            self.inner.read(buf)
        }
    }

    #[test]
    fn test_concurrent_put_with_same_etag() {
        let store = Store::default();
        let (_, ep) = send(&store, RequestParts::new("GET", "/"));
        let etag = ep.header("ETag").unwrap().to_string();

        let winner = r#"{"address":"10.1.1.5","netmask":"255.0.0.0","gateway":"10.0.0.1"}"#;
        let loser = r#"{"address":"10.2.2.5","netmask":"255.0.0.0","gateway":"10.0.0.2"}"#;
        let outcome = Rc::new(RefCell::new(None));
        let body = Interleaved {
            store: store.clone(),
            etag: etag.clone(),
            competing: Some(winner),
            outcome: outcome.clone(),
            inner: Cursor::new(loser.as_bytes().to_vec()),
        };
        let request = RequestParts::new("PUT", "/")
            .header("Content-Type", "application/json")
            .header("If-Match", &etag)
            .body(body);

        let (d, _) = send(&store, request);
        assert_eq!(*outcome.borrow(), Some(StatusCode::Ok));
        assert_eq!(d.status, StatusCode::PreconditionFailed);
        assert_eq!(store.network().unwrap().value.address, "10.1.1.5");
    }

    #[test]
    fn test_route_lifecycle() {
        let store = Store::default();
        let (d, ep) = send(&store, json("POST", "/routes", ROUTE));
        assert_eq!(d.status, StatusCode::Created);
        assert_eq!(ep.header("Location"), Some("/routes/1"));

        let (d, ep) = send(&store, RequestParts::new("GET", "/routes/1"));
        assert_eq!(d.status, StatusCode::Ok);
        assert!(ep.body_text().contains("10.0.0.0/8"));

        let (d, ep) = send(&store, RequestParts::new("DELETE", "/routes/1"));
        assert_eq!(d.status, StatusCode::NoContent);
        assert!(ep.body_bytes().is_empty());

        let (d, _) = send(&store, RequestParts::new("GET", "/routes/1"));
        assert_eq!(d.status, StatusCode::NotFound);
    }

    #[test]
    fn test_unknown_route_id() {
        let (d, ep) = send(&Store::default(), RequestParts::new("GET", "/routes/abc"));
        assert_eq!(d.status, StatusCode::NotFound);
        assert!(ep.body_text().contains("\"exception_uri_path_rem\": \"/abc\""));
    }

    #[test]
    fn test_collection_rejects_put() {
        let (d, ep) = send(&Store::default(), json("PUT", "/routes", ROUTE));
        assert_eq!(d.status, StatusCode::MethodNotAllowed);
        assert_eq!(ep.header("Allow"), Some("GET, POST, OPTIONS, HEAD"));
    }

    #[test]
    fn test_any_host_uses_fallback() {
        let vhosts = virtual_hosts(Store::default());
        let mut ep = BufferedEndpoint::new();
        let request = RequestParts::new("GET", "/routes").header("Host", "router.lan:8080");
        let d = Rest::default().process_vhost(request, &vhosts, &mut ep);
        assert_eq!(d.status, StatusCode::Ok);
        assert_eq!(ep.body_text(), "[]");
    }
}
