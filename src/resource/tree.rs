//! # Árbol de Recursos
//! src/resource/tree.rs
//!
//! Arena con los recursos creados durante un request. La raíz está en el
//! índice 0 y cada hijo se agrega al final, así que el padre siempre tiene
//! un índice menor. Las aristas padre/hijo sólo se registran con
//! `chain_children`; sin ellas cada recurso sólo conoce su profundidad.

use super::{Context, Lineage, Resource};
use crate::method::Method;

/// Handle de un recurso dentro del árbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceId(usize);

impl ResourceId {
    pub fn index(&self) -> usize {
        self.0
    }
}

pub(crate) struct Node {
    resource: Box<dyn Resource>,
    parent: Option<ResourceId>,
    child: Option<ResourceId>,
    depth: usize,
}

impl Node {
    pub(crate) fn resource(&self) -> &dyn Resource {
        self.resource.as_ref()
    }

    pub(crate) fn parent(&self) -> Option<ResourceId> {
        self.parent
    }
}

/// Recursos localizados en un request
pub struct ResourceTree {
    nodes: Vec<Node>,
    chain_children: bool,
}

impl ResourceTree {
    pub fn new(root: Box<dyn Resource>, chain_children: bool) -> Self {
        Self {
            nodes: vec![Node {
                resource: root,
                parent: None,
                child: None,
                depth: 0,
            }],
            chain_children,
        }
    }

    pub fn root(&self) -> ResourceId {
        ResourceId(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn chain_children(&self) -> bool {
        self.chain_children
    }

    /// Agrega `child` bajo `parent` y retorna su handle
    pub fn attach(&mut self, parent: ResourceId, child: Box<dyn Resource>) -> ResourceId {
        let id = ResourceId(self.nodes.len());
        let depth = self.nodes[parent.0].depth + 1;
        let link = self.chain_children.then_some(parent);
        if link.is_some() {
            self.nodes[parent.0].child = Some(id);
        }
        self.nodes.push(Node {
            resource: child,
            parent: link,
            child: None,
            depth,
        });
        id
    }

    pub fn get(&self, id: ResourceId) -> &dyn Resource {
        self.nodes[id.0].resource.as_ref()
    }

    pub fn parent(&self, id: ResourceId) -> Option<ResourceId> {
        self.nodes[id.0].parent
    }

    pub fn child(&self, id: ResourceId) -> Option<ResourceId> {
        self.nodes[id.0].child
    }

    pub fn depth(&self, id: ResourceId) -> usize {
        self.nodes[id.0].depth
    }

    /// El recurso mutable junto con la vista de sus ancestros
    pub fn split(&mut self, id: ResourceId) -> (&mut dyn Resource, Lineage<'_>) {
        let (ancestors, rest) = self.nodes.split_at_mut(id.0);
        let node = &mut rest[0];
        let lineage = Lineage {
            nodes: ancestors,
            parent: node.parent,
            depth: node.depth,
        };
        (node.resource.as_mut(), lineage)
    }

    /// Ejecuta `f` con el recurso y el contexto del request
    pub(crate) fn with_context<T>(
        &mut self,
        id: ResourceId,
        method: &Method<'_>,
        f: impl FnOnce(&mut dyn Resource, &Context<'_>) -> T,
    ) -> T {
        let (resource, lineage) = self.split(id);
        let cx = Context::new(method, lineage);
        f(resource, &cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{MethodMask, Verb};

    struct Named(MethodMask);

    impl Resource for Named {
        fn allowed(&self) -> MethodMask {
            self.0
        }
    }

    fn leaf(verbs: &[Verb]) -> Box<dyn Resource> {
        Box::new(Named(MethodMask::of(verbs)))
    }

    #[test]
    fn test_chained_tree_links_parent_and_child() {
        let mut tree = ResourceTree::new(leaf(&[Verb::Get]), true);
        let a = tree.attach(tree.root(), leaf(&[Verb::Put]));
        let b = tree.attach(a, leaf(&[Verb::Delete]));

        assert_eq!(tree.child(tree.root()), Some(a));
        assert_eq!(tree.parent(b), Some(a));
        assert_eq!(tree.depth(b), 2);

        let (_, lineage) = tree.split(b);
        assert_eq!(lineage.depth(), 2);
        assert!(lineage.parent().unwrap().allowed().contains(Verb::Put));
        let masks: Vec<_> = lineage.ancestors().map(|r| r.allowed()).collect();
        assert_eq!(masks, vec![MethodMask::of(&[Verb::Put]), MethodMask::of(&[Verb::Get])]);
    }

    #[test]
    fn test_unchained_tree_has_no_links() {
        let mut tree = ResourceTree::new(leaf(&[Verb::Get]), false);
        let a = tree.attach(tree.root(), leaf(&[Verb::Get]));
        assert_eq!(tree.parent(a), None);
        assert_eq!(tree.child(tree.root()), None);

        let (_, lineage) = tree.split(a);
        assert_eq!(lineage.depth(), 1);
        assert!(lineage.parent().is_none());
        assert_eq!(lineage.ancestors().count(), 0);
    }
}
