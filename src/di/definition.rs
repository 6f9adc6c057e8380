use crate::di::capability::Caster;
use crate::di::{Instance, Key, ProviderWrapper};
use crate::error::{MeshwireError, Result};
use once_cell::sync::OnceCell;
use std::sync::Arc;

/// Index of a definition in the container's arena.
pub(crate) type NodeId = usize;

/// A resolved dependency: the target definition and, when resolved through a
/// capability, the cast into that capability.
#[derive(Clone)]
pub(crate) struct Edge {
    pub(crate) node: NodeId,
    pub(crate) caster: Option<Caster>,
}

impl Edge {
    pub(crate) fn direct(node: NodeId) -> Self {
        Self { node, caster: None }
    }

    pub(crate) fn through(node: NodeId, caster: Caster) -> Self {
        Self {
            node,
            caster: Some(caster),
        }
    }

    /// Views the target's instance the way the requesting key expects it.
    pub(crate) fn project(&self, instance: &Instance, requested: &Key) -> Result<Instance> {
        match &self.caster {
            None => Ok(Arc::clone(instance)),
            Some(caster) => caster(instance).ok_or_else(|| MeshwireError::DowncastFailed {
                type_name: requested.to_string(),
            }),
        }
    }
}

/// A node of the compiled graph.
pub(crate) struct Definition {
    key: Key,
    provider: ProviderWrapper,
    implements: Vec<Key>,
    edges: Vec<Edge>,
    instance: OnceCell<Instance>,
}

impl Definition {
    pub(crate) fn new(key: Key, provider: ProviderWrapper) -> Self {
        Self {
            key,
            provider,
            implements: Vec::new(),
            edges: Vec::new(),
            instance: OnceCell::new(),
        }
    }

    pub(crate) fn key(&self) -> &Key {
        &self.key
    }

    pub(crate) fn provider(&self) -> &ProviderWrapper {
        &self.provider
    }

    pub(crate) fn implements(&self) -> &[Key] {
        &self.implements
    }

    /// Records a capability; returns `false` if it was already recorded.
    pub(crate) fn add_capability(&mut self, capability: Key) -> bool {
        if self.implements.contains(&capability) {
            return false;
        }
        self.implements.push(capability);
        true
    }

    pub(crate) fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub(crate) fn link(&mut self, edges: Vec<Edge>) {
        debug_assert!(self.edges.is_empty(), "{} linked twice", self.key);
        self.edges = edges;
    }

    /// Returns the cached instance, building it with `build` on first use.
    ///
    /// Concurrent callers block until the in-flight build finishes. A failed
    /// build leaves the cell empty.
    pub(crate) fn get_or_build<F>(&self, build: F) -> Result<Instance>
    where
        F: FnOnce() -> Result<Instance>,
    {
        self.instance.get_or_try_init(build).cloned()
    }

    pub(crate) fn is_built(&self) -> bool {
        self.instance.get().is_some()
    }
}
