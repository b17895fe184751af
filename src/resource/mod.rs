//! # Recursos REST
//! src/resource/mod.rs
//!
//! La aplicación implementa [`Resource`] para cada nodo de su jerarquía. El
//! motor se encarga del resto:
//!
//! 1. `locate()` se llama en cadena, desde la raíz, sobre los recursos que la
//!    aplicación va creando, hasta consumir el path.
//! 2. Sobre el recurso localizado se ejecuta la secuencia fija de pasos del
//!    verbo (ver [`lifecycle`]): `read`, `update`, `create_child`, `create`,
//!    `delete`, `on_responding` y `write`.
//! 3. Cualquier [`RestError`](crate::error::RestError) que retorne un paso
//!    termina el request con el código de estado correspondiente.
//!
//! Los pasos requeridos que no se implementan retornan 500. La máscara de
//! [`Resource::allowed`] debe mantenerse sincronizada con los pasos que el
//! recurso sí implementa.

pub mod lifecycle;
pub mod tree;

pub use tree::{ResourceId, ResourceTree};

use crate::cookie::Cookies;
use crate::error::{RestError, Result};
use crate::http::headers::{ContentHeaders, RequestHeaders, ResponseHeaders};
use crate::http::uri::{Query, UriPath};
use crate::http::{MethodMask, StatusCode, Verb};
use crate::method::Method;
use crate::version::{Version, VersionConstraint};
use std::io::{Read, Write};

/// Id de un hijo creado con POST (un único segmento) y su versión
pub type CreatedChild = (String, Version);

/// Un recurso direccionable
pub trait Resource {
    /// Verbos que acepta el recurso
    fn allowed(&self) -> MethodMask;

    /// Si es `true` se omiten `on_responding` y `write`
    fn default_response(&self) -> bool {
        false
    }

    /// Consume cero o más segmentos del inicio de `path`.
    ///
    /// - `None` con el path vacío: el método se aplica a este recurso
    /// - `None` con path restante: 400 Bad Request
    /// - `Some(hijo)`: se sigue localizando en el hijo si queda path; si no,
    ///   el método se aplica al hijo
    fn locate(&mut self, cx: &Context<'_>, path: &mut UriPath) -> Result<Option<Box<dyn Resource>>> {
        let _ = (cx, path);
        Ok(None)
    }

    /// Lee el recurso y retorna su versión actual (nula si no se versiona).
    /// Con `version_only` basta la versión (DELETE con precondiciones).
    fn read(&mut self, cx: &Context<'_>, version_only: bool) -> Result<Version> {
        let _ = (cx, version_only);
        Err(unimplemented_step("read"))
    }

    /// Actualiza el recurso desde el cuerpo del request (PUT)
    fn update(&mut self, cx: &Context<'_>, body: &mut dyn Read) -> Result<Version> {
        let _ = (cx, body);
        Err(unimplemented_step("update"))
    }

    /// Crea el recurso hijo sobre el que se ejecutará `create` (POST)
    fn create_child(&mut self, cx: &Context<'_>) -> Result<Box<dyn Resource>> {
        let _ = cx;
        Err(unimplemented_step("create_child"))
    }

    /// Crea este recurso desde el cuerpo del request. Se llama sobre el
    /// hijo retornado por `create_child` del padre.
    fn create(&mut self, cx: &Context<'_>, body: &mut dyn Read) -> Result<CreatedChild> {
        let _ = (cx, body);
        Err(unimplemented_step("create"))
    }

    /// Elimina el recurso (DELETE)
    fn delete(&mut self, cx: &Context<'_>) -> Result<()> {
        let _ = cx;
        Err(unimplemented_step("delete"))
    }

    /// Ajusta código de estado y headers antes de responder. Los headers de
    /// versión ya están en `rh`. Para métodos sin contenido los cambios a
    /// `ch` sólo cuentan si describen contenido (DELETE, OPTIONS).
    fn on_responding(
        &mut self,
        cx: &Context<'_>,
        status: &mut StatusCode,
        rh: &mut ResponseHeaders,
        ch: &mut ContentHeaders,
    ) -> Result<()> {
        let _ = (cx, status, rh, ch);
        Ok(())
    }

    /// Escribe la representación del recurso. Los headers ya se enviaron.
    fn write(&mut self, out: &mut dyn Write) -> Result<()> {
        let _ = out;
        Ok(())
    }
}

fn unimplemented_step(step: &str) -> RestError {
    RestError::internal_server_error(format!("resource does not implement {}", step))
}

/// Vista de los ancestros del recurso en curso. Sólo hay enlaces cuando el
/// árbol se creó con `chain_children`.
#[derive(Clone, Copy)]
pub struct Lineage<'a> {
    nodes: &'a [tree::Node],
    parent: Option<ResourceId>,
    depth: usize,
}

impl<'a> Lineage<'a> {
    /// Profundidad en el árbol (la raíz es 0); se conoce aunque no haya enlaces
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn parent_id(&self) -> Option<ResourceId> {
        self.parent
    }

    /// Recurso padre, si hay enlaces
    pub fn parent(&self) -> Option<&'a dyn Resource> {
        self.parent.map(|id| self.nodes[id.index()].resource())
    }

    /// Ancestros desde el padre hasta la raíz
    pub fn ancestors(&self) -> impl Iterator<Item = &'a dyn Resource> + 'a {
        let nodes = self.nodes;
        std::iter::successors(self.parent, move |id| nodes[id.index()].parent())
            .map(move |id| nodes[id.index()].resource())
    }
}

/// Lo que un paso del ciclo de vida puede consultar del request
pub struct Context<'a> {
    verb: Verb,
    uri_path: &'a UriPath,
    query: &'a Query,
    headers: &'a RequestHeaders,
    cookies: &'a Cookies,
    constraint: Option<&'a VersionConstraint>,
    lineage: Lineage<'a>,
}

impl<'a> Context<'a> {
    pub(crate) fn new(method: &'a Method<'_>, lineage: Lineage<'a>) -> Self {
        Self {
            verb: method.verb(),
            uri_path: method.uri_path(),
            query: method.query(),
            headers: method.headers(),
            cookies: method.cookies(),
            constraint: method.version_constraint(),
            lineage,
        }
    }

    /// Verbo efectivo (después de `restPUT`/`restDELETE`)
    pub fn verb(&self) -> Verb {
        self.verb
    }

    /// Path completo del request
    pub fn uri_path(&self) -> &'a UriPath {
        self.uri_path
    }

    pub fn query(&self) -> &'a Query {
        self.query
    }

    pub fn headers(&self) -> &'a RequestHeaders {
        self.headers
    }

    pub fn cookies(&self) -> &'a Cookies {
        self.cookies
    }

    pub fn version_constraint(&self) -> Option<&'a VersionConstraint> {
        self.constraint
    }

    pub fn lineage(&self) -> &Lineage<'a> {
        &self.lineage
    }
}
