//! # Hosts Virtuales
//! src/rest/vhost.rs
//!
//! Asocia nombres de host con la fábrica de su recurso raíz. El header
//! `Host` se compara sin distinguir mayúsculas y sin el puerto.

use crate::resource::Resource;

/// Crea una raíz nueva por request
pub type RootFactory = Box<dyn Fn() -> Box<dyn Resource> + Send + Sync>;

/// Tabla de hosts virtuales
#[derive(Default)]
pub struct VirtualHosts {
    hosts: Vec<(String, RootFactory)>,
    fallback: Option<RootFactory>,
}

impl VirtualHosts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registra la raíz de `name`; un nombre repetido reemplaza al anterior
    pub fn add<F>(&mut self, name: &str, factory: F)
    where
        F: Fn() -> Box<dyn Resource> + Send + Sync + 'static,
    {
        let name = name.to_ascii_lowercase();
        self.hosts.retain(|(n, _)| *n != name);
        self.hosts.push((name, Box::new(factory)));
    }

    /// Raíz para hosts no registrados (o requests sin `Host`)
    pub fn set_fallback<F>(&mut self, factory: F)
    where
        F: Fn() -> Box<dyn Resource> + Send + Sync + 'static,
    {
        self.fallback = Some(Box::new(factory));
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    /// Crea la raíz para el valor del header `Host`, ej: "api.local:8080"
    pub fn root_for(&self, host: &str) -> Option<Box<dyn Resource>> {
        let name = host_name(host);
        self.hosts
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, factory)| factory())
            .or_else(|| self.fallback.as_ref().map(|factory| factory()))
    }
}

/// Nombre del host sin puerto; respeta literales IPv6 como "[::1]:80"
fn host_name(host: &str) -> &str {
    let host = host.trim();
    if host.starts_with('[') {
        return match host.find(']') {
            Some(end) => &host[..=end],
            None => host,
        };
    }
    match host.rsplit_once(':') {
        Some((name, port)) if port.chars().all(|c| c.is_ascii_digit()) => name,
        _ => host,
    }
}
