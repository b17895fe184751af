//! # Ciclo de Vida por Verbo
//! src/resource/lifecycle.rs
//!
//! Secuencia fija de pasos sobre el recurso localizado. El orden
//! lectura → constraint → mutación → respuesta no se altera.
//!
//! | Verbo   | Pasos                                                               |
//! |---------|---------------------------------------------------------------------|
//! | GET     | read → constraint → 200 + versión → on_responding → write           |
//! | HEAD    | read → constraint → 200 + versión → on_responding                   |
//! | PUT     | read → constraint → update → 200 + versión → on_responding → write  |
//! | POST    | create_child → (hijo) create → 201 + Location → on_responding → write |
//! | DELETE  | [read(versión) → constraint] → delete → 200 → on_responding         |
//! | OPTIONS | 200 + Allow → on_responding                                         |
//!
//! DELETE y OPTIONS sólo escriben contenido si `on_responding` lo describió.
//! Con `default_response` no se llaman `on_responding` ni `write`.

use super::{ResourceId, ResourceTree};
use crate::error::Result;
use crate::http::headers::{ContentHeaders, ResponseHeaders};
use crate::http::{StatusCode, Verb};
use crate::method::Method;
use crate::version::Version;
use std::io::{self, Read};

/// Cuándo se llama a `write` después de responder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Body {
    /// Siempre (GET, PUT, POST)
    Always,
    /// Sólo si `on_responding` describió contenido (DELETE, OPTIONS)
    IfDescribed,
    /// Nunca, pero se envían los headers de contenido (HEAD)
    HeadersOnly,
}

/// Aplica el verbo del método al recurso `id`
pub fn apply(tree: &mut ResourceTree, id: ResourceId, method: &mut Method<'_>) -> Result<()> {
    let verb = method.verb();
    tracing::debug!(verb = %verb, path = %method.uri_path(), depth = tree.depth(id), "applying method");
    match verb {
        Verb::Get => get(tree, id, method, Body::Always),
        Verb::Head => get(tree, id, method, Body::HeadersOnly),
        Verb::Put => put(tree, id, method),
        Verb::Post => post(tree, id, method),
        Verb::Delete => delete(tree, id, method),
        Verb::Options => options(tree, id, method),
    }
}

fn get(tree: &mut ResourceTree, id: ResourceId, method: &mut Method<'_>, body: Body) -> Result<()> {
    let version = tree.with_context(id, method, |res, cx| res.read(cx, false))?;
    check_constraint(method, &version)?;
    let rh = version_headers(&version);
    respond(tree, id, method, StatusCode::Ok, rh, body)
}

fn put(tree: &mut ResourceTree, id: ResourceId, method: &mut Method<'_>) -> Result<()> {
    let current = tree.with_context(id, method, |res, cx| res.read(cx, false))?;
    check_constraint(method, &current)?;
    let mut input = take_body(method);
    let updated = tree.with_context(id, method, |res, cx| res.update(cx, &mut *input))?;
    let rh = version_headers(&updated);
    respond(tree, id, method, StatusCode::Ok, rh, Body::Always)
}

fn post(tree: &mut ResourceTree, id: ResourceId, method: &mut Method<'_>) -> Result<()> {
    let child = tree.with_context(id, method, |res, cx| res.create_child(cx))?;
    let child_id = tree.attach(id, child);
    let mut input = take_body(method);
    let (child_name, version) =
        tree.with_context(child_id, method, |res, cx| res.create(cx, &mut *input))?;

    let location = method.uri_path().join(&child_name);
    tracing::info!(location = %location, "child resource created");
    let mut rh = version_headers(&version);
    rh.set("Location", location.encoding());
    respond(tree, child_id, method, StatusCode::Created, rh, Body::Always)
}

fn delete(tree: &mut ResourceTree, id: ResourceId, method: &mut Method<'_>) -> Result<()> {
    if method.version_constraint().is_some() {
        let version = tree.with_context(id, method, |res, cx| res.read(cx, true))?;
        check_constraint(method, &version)?;
    }
    tree.with_context(id, method, |res, cx| res.delete(cx))?;
    respond(tree, id, method, StatusCode::Ok, ResponseHeaders::new(), Body::IfDescribed)
}

fn options(tree: &mut ResourceTree, id: ResourceId, method: &mut Method<'_>) -> Result<()> {
    let mut rh = ResponseHeaders::new();
    rh.set("Allow", tree.get(id).allowed().to_allow_string());
    respond(tree, id, method, StatusCode::Ok, rh, Body::IfDescribed)
}

fn check_constraint(method: &Method<'_>, version: &Version) -> Result<()> {
    match method.version_constraint() {
        Some(constraint) => constraint.assert_satisfied(version, method.verb()),
        None => Ok(()),
    }
}

fn version_headers(version: &Version) -> ResponseHeaders {
    let mut rh = ResponseHeaders::new();
    for (name, value) in version.header_fields() {
        rh.set(name, value);
    }
    rh
}

fn take_body(method: &mut Method<'_>) -> Box<dyn Read> {
    method.take_body().unwrap_or_else(|| Box::new(io::empty()))
}

/// Paso común: `on_responding`, envío de headers y `write`
fn respond(
    tree: &mut ResourceTree,
    id: ResourceId,
    method: &mut Method<'_>,
    mut status: StatusCode,
    mut rh: ResponseHeaders,
    body: Body,
) -> Result<()> {
    let mut ch = ContentHeaders::new();
    let customized = !tree.get(id).default_response();
    if customized {
        tree.with_context(id, method, |res, cx| {
            res.on_responding(cx, &mut status, &mut rh, &mut ch)
        })?;
    }

    let write = customized
        && !status.forbids_body()
        && match body {
            Body::Always => true,
            Body::IfDescribed => ch.describes_content(),
            Body::HeadersOnly => false,
        };

    if write {
        let (resource, _) = tree.split(id);
        let out = method.respond_with_content(&ch, status, rh)?;
        resource.write(out)?;
        out.flush()?;
        return Ok(());
    }

    match body {
        Body::HeadersOnly if customized => {
            method.respond_with_content(&ch, status, rh)?;
        }
        // OPTIONS sin contenido declara largo cero
        Body::IfDescribed if method.verb() == Verb::Options => {
            ch.content_length(0);
            method.respond_with_content(&ch, status, rh)?;
        }
        _ => method.respond(status, rh)?,
    }
    Ok(())
}
