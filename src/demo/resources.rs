//! # Recursos de la Demo
//! src/demo/resources.rs
//!
//! | Path           | Recurso              | Verbos                        |
//! |----------------|----------------------|-------------------------------|
//! | `/`            | [`NetworkRoot`]      | GET, HEAD, PUT, OPTIONS       |
//! | `/routes`      | [`RoutesCollection`] | GET, HEAD, POST, OPTIONS      |
//! | `/routes/<id>` | [`RouteItem`]        | GET, HEAD, PUT, DELETE, OPTIONS |
//!
//! Las representaciones son JSON y el ETag es el SHA-256 del JSON servido.
//! Como `write` no recibe contexto, cada paso que produce contenido deja el
//! cuerpo preparado en el recurso.

use super::store::{NetworkConfig, Route, Store};
use crate::error::{RestError, Result};
use crate::http::headers::{ContentHeaders, ResponseHeaders};
use crate::http::uri::UriPath;
use crate::http::{MethodMask, StatusCode, Verb};
use crate::resource::{Context, CreatedChild, Resource};
use crate::version::Version;
use serde::de::DeserializeOwned;
use std::io::{Read, Write};

const JSON: &str = "application/json";

/// Lee el cuerpo como JSON; exige `Content-Type: application/json`
fn parse_json<T: DeserializeOwned>(cx: &Context<'_>, body: &mut dyn Read) -> Result<T> {
    match cx.headers().media_type() {
        Some(media) if media == JSON => {}
        other => {
            return Err(RestError::unsupported_media_type(format!(
                "expected {}, got {}",
                JSON,
                other.as_deref().unwrap_or("nothing")
            )))
        }
    }
    serde_json::from_reader(body).map_err(|e| {
        if e.is_io() {
            RestError::from(e)
        } else {
            RestError::bad_request(format!("invalid JSON: {}", e))
        }
    })
}

/// Describe el cuerpo preparado salvo en verbos que no lo envían
fn describe_json(cx: &Context<'_>, ch: &mut ContentHeaders, body: &[u8]) {
    if matches!(cx.verb(), Verb::Options | Verb::Delete) {
        return;
    }
    ch.content_type(JSON).content_length(body.len() as u64);
}

// ============================================================================
// Raíz: configuración de red
// ============================================================================

/// Configuración de red del equipo
pub struct NetworkRoot {
    store: Store,
    body: Vec<u8>,
}

impl NetworkRoot {
    pub fn new(store: Store) -> Self {
        Self {
            store,
            body: Vec::new(),
        }
    }
}

impl Resource for NetworkRoot {
    fn allowed(&self) -> MethodMask {
        MethodMask::of(&[Verb::Get, Verb::Head, Verb::Put, Verb::Options])
    }

    fn locate(&mut self, _cx: &Context<'_>, path: &mut UriPath) -> Result<Option<Box<dyn Resource>>> {
        if path.front() != Some("routes") {
            return Ok(None);
        }
        path.pop_front();
        Ok(Some(Box::new(RoutesCollection::new(self.store.clone()))))
    }

    fn read(&mut self, _cx: &Context<'_>, _version_only: bool) -> Result<Version> {
        let (body, version) = self.store.network()?.representation()?;
        self.body = body;
        Ok(version)
    }

    fn update(&mut self, cx: &Context<'_>, body: &mut dyn Read) -> Result<Version> {
        let network: NetworkConfig = parse_json(cx, body)?;
        network.validate()?;
        let (body, version) = self
            .store
            .set_network(network, cx.version_constraint())?
            .representation()?;
        self.body = body;
        Ok(version)
    }

    fn on_responding(
        &mut self,
        cx: &Context<'_>,
        _status: &mut StatusCode,
        _rh: &mut ResponseHeaders,
        ch: &mut ContentHeaders,
    ) -> Result<()> {
        describe_json(cx, ch, &self.body);
        Ok(())
    }

    fn write(&mut self, out: &mut dyn Write) -> Result<()> {
        out.write_all(&self.body)?;
        Ok(())
    }
}

// ============================================================================
// /routes
// ============================================================================

/// Tabla de rutas estáticas
pub struct RoutesCollection {
    store: Store,
    body: Vec<u8>,
}

impl RoutesCollection {
    pub fn new(store: Store) -> Self {
        Self {
            store,
            body: Vec::new(),
        }
    }
}

impl Resource for RoutesCollection {
    fn allowed(&self) -> MethodMask {
        MethodMask::of(&[Verb::Get, Verb::Head, Verb::Post, Verb::Options])
    }

    fn locate(&mut self, _cx: &Context<'_>, path: &mut UriPath) -> Result<Option<Box<dyn Resource>>> {
        let id = match path.front().map(str::parse::<u64>) {
            Some(Ok(id)) => id,
            Some(Err(_)) => return Err(RestError::not_found(path.encoding())),
            None => return Ok(None),
        };
        if self.store.route(id)?.is_none() {
            tracing::debug!(id, "unknown route");
            return Err(RestError::not_found(path.encoding()));
        }
        path.pop_front();
        Ok(Some(Box::new(RouteItem::existing(self.store.clone(), id))))
    }

    fn read(&mut self, _cx: &Context<'_>, _version_only: bool) -> Result<Version> {
        let (body, version) = self.store.routes()?.representation()?;
        self.body = body;
        Ok(version)
    }

    fn create_child(&mut self, _cx: &Context<'_>) -> Result<Box<dyn Resource>> {
        Ok(Box::new(RouteItem::pending(self.store.clone())))
    }

    fn on_responding(
        &mut self,
        cx: &Context<'_>,
        _status: &mut StatusCode,
        _rh: &mut ResponseHeaders,
        ch: &mut ContentHeaders,
    ) -> Result<()> {
        describe_json(cx, ch, &self.body);
        Ok(())
    }

    fn write(&mut self, out: &mut dyn Write) -> Result<()> {
        out.write_all(&self.body)?;
        Ok(())
    }
}

// ============================================================================
// /routes/<id>
// ============================================================================

/// Una ruta de la tabla. Sin id mientras se crea con POST.
pub struct RouteItem {
    store: Store,
    id: Option<u64>,
    body: Vec<u8>,
}

impl RouteItem {
    pub fn existing(store: Store, id: u64) -> Self {
        Self {
            store,
            id: Some(id),
            body: Vec::new(),
        }
    }

    pub fn pending(store: Store) -> Self {
        Self {
            store,
            id: None,
            body: Vec::new(),
        }
    }

    fn id(&self) -> Result<u64> {
        self.id
            .ok_or_else(|| RestError::internal_server_error("route has no id yet"))
    }
}

impl Resource for RouteItem {
    fn allowed(&self) -> MethodMask {
        MethodMask::of(&[Verb::Get, Verb::Head, Verb::Put, Verb::Delete, Verb::Options])
    }

    fn read(&mut self, cx: &Context<'_>, _version_only: bool) -> Result<Version> {
        let id = self.id()?;
        let route = self
            .store
            .route(id)?
            .ok_or_else(|| RestError::not_found(cx.uri_path().encoding()))?;
        let (body, version) = route.representation()?;
        self.body = body;
        Ok(version)
    }

    fn update(&mut self, cx: &Context<'_>, body: &mut dyn Read) -> Result<Version> {
        let id = self.id()?;
        let route: Route = parse_json(cx, body)?;
        route.validate()?;
        let stamped = self
            .store
            .replace_route(id, route, cx.version_constraint())?
            .ok_or_else(|| RestError::not_found(cx.uri_path().encoding()))?;
        let (body, version) = stamped.representation()?;
        self.body = body;
        Ok(version)
    }

    fn create(&mut self, cx: &Context<'_>, body: &mut dyn Read) -> Result<CreatedChild> {
        let route: Route = parse_json(cx, body)?;
        route.validate()?;
        let (id, stamped) = self.store.insert_route(route)?;
        let (body, version) = stamped.representation()?;
        self.id = Some(id);
        self.body = body;
        Ok((id.to_string(), version))
    }

    fn delete(&mut self, cx: &Context<'_>) -> Result<()> {
        if !self.store.remove_route(self.id()?, cx.version_constraint())? {
            return Err(RestError::not_found(cx.uri_path().encoding()));
        }
        Ok(())
    }

    fn on_responding(
        &mut self,
        cx: &Context<'_>,
        status: &mut StatusCode,
        _rh: &mut ResponseHeaders,
        ch: &mut ContentHeaders,
    ) -> Result<()> {
        if cx.verb() == Verb::Delete {
            *status = StatusCode::NoContent;
        }
        describe_json(cx, ch, &self.body);
        Ok(())
    }

    fn write(&mut self, out: &mut dyn Write) -> Result<()> {
        out.write_all(&self.body)?;
        Ok(())
    }
}
