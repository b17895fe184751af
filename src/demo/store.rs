//! # Estado Compartido de la Demo
//! src/demo/store.rs
//!
//! Configuración de red y tabla de rutas en memoria, compartidas entre los
//! threads del servidor con `Arc<Mutex<..>>`. Cada registro guarda la fecha
//! de su última modificación para armar su [`Version`].
//!
//! Las escrituras reciben la precondición del request y la vuelven a
//! verificar con el lock tomado, así dos `If-Match` con el mismo ETag no
//! pueden ganar ambos.

use crate::error::{RestError, Result};
use crate::http::Verb;
use crate::version::{Version, VersionConstraint};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::net::Ipv4Addr;
use std::sync::{Arc, Mutex, MutexGuard};

/// Configuración de red del equipo
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub address: String,
    pub netmask: String,
    pub gateway: String,
}

impl NetworkConfig {
    /// Verifica que los tres campos sean direcciones IPv4
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("address", &self.address),
            ("netmask", &self.netmask),
            ("gateway", &self.gateway),
        ] {
            if value.parse::<Ipv4Addr>().is_err() {
                return Err(RestError::bad_request(format!("{} is not an IPv4 address: {}", field, value)));
            }
        }
        Ok(())
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            address: "192.168.1.10".to_string(),
            netmask: "255.255.255.0".to_string(),
            gateway: "192.168.1.1".to_string(),
        }
    }
}

/// Una ruta estática
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    /// Red destino en notación CIDR, ej: "10.0.0.0/8"
    pub destination: String,
    pub gateway: String,
    #[serde(default)]
    pub metric: u32,
}

impl Route {
    pub fn validate(&self) -> Result<()> {
        let (network, prefix) = self
            .destination
            .split_once('/')
            .ok_or_else(|| RestError::bad_request(format!("destination is not CIDR: {}", self.destination)))?;
        let prefix_ok = prefix.parse::<u8>().map(|p| p <= 32).unwrap_or(false);
        if network.parse::<Ipv4Addr>().is_err() || !prefix_ok {
            return Err(RestError::bad_request(format!("destination is not CIDR: {}", self.destination)));
        }
        if self.gateway.parse::<Ipv4Addr>().is_err() {
            return Err(RestError::bad_request(format!("gateway is not an IPv4 address: {}", self.gateway)));
        }
        Ok(())
    }
}

/// Ruta con su id, tal como se lista en la colección
#[derive(Debug, Clone, Serialize)]
pub struct RouteEntry {
    pub id: u64,
    #[serde(flatten)]
    pub route: Route,
}

/// Valor con su fecha de modificación
#[derive(Debug, Clone)]
pub struct Stamped<T> {
    pub value: T,
    pub modified: DateTime<Utc>,
}

impl<T: Serialize> Stamped<T> {
    fn new(value: T) -> Self {
        Self {
            value,
            modified: Utc::now(),
        }
    }

    /// Representación JSON y versión derivada de ella
    pub fn representation(&self) -> Result<(Vec<u8>, Version)> {
        let body = serde_json::to_vec_pretty(&self.value)?;
        let version = Version::new(digest(&body), Some(self.modified));
        Ok((body, version))
    }
}

#[derive(Debug)]
struct State {
    network: Stamped<NetworkConfig>,
    routes: BTreeMap<u64, Stamped<Route>>,
    routes_modified: DateTime<Utc>,
    next_id: u64,
}

/// Store compartido; clonar comparte el mismo estado
#[derive(Debug, Clone)]
pub struct Store {
    state: Arc<Mutex<State>>,
}

impl Store {
    pub fn new(network: NetworkConfig) -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                network: Stamped::new(network),
                routes: BTreeMap::new(),
                routes_modified: Utc::now(),
                next_id: 1,
            })),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| RestError::internal_server_error("store lock poisoned"))
    }

    pub fn network(&self) -> Result<Stamped<NetworkConfig>> {
        Ok(self.lock()?.network.clone())
    }

    /// Reemplaza la configuración si `constraint` se cumple contra la vigente
    pub fn set_network(
        &self,
        network: NetworkConfig,
        constraint: Option<&VersionConstraint>,
    ) -> Result<Stamped<NetworkConfig>> {
        let mut state = self.lock()?;
        check(&state.network, constraint, Verb::Put)?;
        state.network = Stamped::new(network);
        tracing::info!(address = %state.network.value.address, "network configuration replaced");
        Ok(state.network.clone())
    }

    /// Rutas ordenadas por id, con la fecha del último cambio a la tabla
    pub fn routes(&self) -> Result<Stamped<Vec<RouteEntry>>> {
        let state = self.lock()?;
        let entries = state
            .routes
            .iter()
            .map(|(id, route)| RouteEntry {
                id: *id,
                route: route.value.clone(),
            })
            .collect();
        Ok(Stamped {
            value: entries,
            modified: state.routes_modified,
        })
    }

    pub fn route(&self, id: u64) -> Result<Option<Stamped<Route>>> {
        Ok(self.lock()?.routes.get(&id).cloned())
    }

    pub fn insert_route(&self, route: Route) -> Result<(u64, Stamped<Route>)> {
        let mut state = self.lock()?;
        let id = state.next_id;
        state.next_id += 1;
        let stamped = Stamped::new(route);
        state.routes_modified = stamped.modified;
        state.routes.insert(id, stamped.clone());
        tracing::info!(id, destination = %stamped.value.destination, "route added");
        Ok((id, stamped))
    }

    /// Reemplaza la ruta `id`; `None` si no existe
    pub fn replace_route(
        &self,
        id: u64,
        route: Route,
        constraint: Option<&VersionConstraint>,
    ) -> Result<Option<Stamped<Route>>> {
        let mut state = self.lock()?;
        match state.routes.get(&id) {
            Some(current) => check(current, constraint, Verb::Put)?,
            None => return Ok(None),
        }
        let stamped = Stamped::new(route);
        state.routes_modified = stamped.modified;
        state.routes.insert(id, stamped.clone());
        Ok(Some(stamped))
    }

    pub fn remove_route(&self, id: u64, constraint: Option<&VersionConstraint>) -> Result<bool> {
        let mut state = self.lock()?;
        match state.routes.get(&id) {
            Some(current) => check(current, constraint, Verb::Delete)?,
            None => return Ok(false),
        }
        let removed = state.routes.remove(&id).is_some();
        if removed {
            state.routes_modified = Utc::now();
            tracing::info!(id, "route removed");
        }
        Ok(removed)
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new(NetworkConfig::default())
    }
}

/// Verifica la precondición contra el valor vigente
fn check<T: Serialize>(current: &Stamped<T>, constraint: Option<&VersionConstraint>, verb: Verb) -> Result<()> {
    match constraint {
        Some(constraint) => {
            let (_, version) = current.representation()?;
            constraint.assert_satisfied(&version, verb)
        }
        None => Ok(()),
    }
}

/// SHA-256 en hexadecimal
pub fn digest(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(destination: &str) -> Route {
        Route {
            destination: destination.to_string(),
            gateway: "192.168.1.1".to_string(),
            metric: 0,
        }
    }

    #[test]
    fn test_digest_is_sha256_hex() {
        let hex = digest(b"abc");
        assert_eq!(hex.len(), 64);
        assert!(hex.starts_with("ba7816bf"));
    }

    #[test]
    fn test_network_validation() {
        assert!(NetworkConfig::default().validate().is_ok());
        let mut cfg = NetworkConfig::default();
        cfg.netmask = "255.255.255".to_string();
        assert_eq!(cfg.validate().unwrap_err().status_code().as_u16(), 400);
    }

    #[test]
    fn test_route_validation() {
        assert!(route("10.0.0.0/8").validate().is_ok());
        assert!(route("10.0.0.0").validate().is_err());
        assert!(route("10.0.0.0/33").validate().is_err());
        assert!(route("ten/8").validate().is_err());
    }

    #[test]
    fn test_routes_ids_are_sequential() {
        let store = Store::default();
        let (a, _) = store.insert_route(route("10.0.0.0/8")).unwrap();
        let (b, _) = store.insert_route(route("172.16.0.0/12")).unwrap();
        assert_eq!((a, b), (1, 2));

        assert!(store.remove_route(a, None).unwrap());
        assert!(!store.remove_route(a, None).unwrap());
        let (c, _) = store.insert_route(route("10.0.0.0/8")).unwrap();
        assert_eq!(c, 3);

        let ids: Vec<u64> = store.routes().unwrap().value.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn test_replace_missing_route() {
        let store = Store::default();
        assert!(store.replace_route(9, route("10.0.0.0/8"), None).unwrap().is_none());
    }

    #[test]
    fn test_conditional_writes_with_same_etag() {
        let store = Store::default();
        let (_, seen) = store.network().unwrap().representation().unwrap();
        let expected = VersionConstraint::must_equal(seen);

        let mut first = NetworkConfig::default();
        first.gateway = "192.168.1.254".to_string();
        assert!(store.set_network(first.clone(), Some(&expected)).is_ok());

        let mut second = NetworkConfig::default();
        second.gateway = "192.168.1.253".to_string();
        let err = store.set_network(second, Some(&expected)).unwrap_err();
        assert_eq!(err.status_code().as_u16(), 412);
        assert_eq!(store.network().unwrap().value, first);
    }

    #[test]
    fn test_conditional_route_writes() {
        let store = Store::default();
        let (id, stamped) = store.insert_route(route("10.0.0.0/8")).unwrap();
        let (_, seen) = stamped.representation().unwrap();
        let expected = VersionConstraint::must_equal(seen);

        assert!(store.replace_route(id, route("172.16.0.0/12"), Some(&expected)).unwrap().is_some());
        let err = store.remove_route(id, Some(&expected)).unwrap_err();
        assert_eq!(err.status_code().as_u16(), 412);
        assert!(store.route(id).unwrap().is_some());
    }

    #[test]
    fn test_clones_share_state() {
        let store = Store::default();
        let other = store.clone();
        other.insert_route(route("10.0.0.0/8")).unwrap();
        assert_eq!(store.routes().unwrap().value.len(), 1);
    }

    #[test]
    fn test_representation_version_follows_content() {
        let a = Stamped::new(NetworkConfig::default());
        let mut b = a.clone();
        let (_, va) = a.representation().unwrap();
        let (_, vb) = b.representation().unwrap();
        assert_eq!(va, vb);

        b.value.gateway = "192.168.1.254".to_string();
        let (_, vb) = b.representation().unwrap();
        assert_ne!(va.tag(), vb.tag());
    }
}
