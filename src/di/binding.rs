use crate::di::Key;
use crate::di::capability::Caster;
use crate::di::definition::NodeId;
use std::collections::HashMap;

/// A definition registered under a capability key.
#[derive(Clone)]
pub(crate) struct Binding {
    pub(crate) node: NodeId,
    pub(crate) caster: Caster,
}

/// Capability key -> implementing definitions, in registration order.
#[derive(Default)]
pub(crate) struct BindingRegistry {
    entries: HashMap<Key, Vec<Binding>>,
}

impl BindingRegistry {
    /// Appends `node` under `key`. Registering the same node twice is a no-op.
    pub(crate) fn insert(&mut self, key: Key, node: NodeId, caster: Caster) -> bool {
        let bindings = self.entries.entry(key).or_default();
        if bindings.iter().any(|binding| binding.node == node) {
            return false;
        }
        bindings.push(Binding { node, caster });
        true
    }

    pub(crate) fn get(&self, key: &Key) -> &[Binding] {
        self.entries.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::di::Instance;
    use std::sync::Arc;

    trait Logger {}

    fn caster() -> Caster {
        Arc::new(|instance: &Instance| Some(Arc::clone(instance)))
    }

    #[test]
    fn test_registration_order() {
        let mut registry = BindingRegistry::default();
        let key = Key::of::<dyn Logger>();
        assert!(registry.insert(key.clone(), 3, caster()));
        assert!(registry.insert(key.clone(), 1, caster()));
        assert!(!registry.insert(key.clone(), 3, caster()));

        let nodes: Vec<_> = registry.get(&key).iter().map(|b| b.node).collect();
        assert_eq!(nodes, vec![3, 1]);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unknown_key() {
        let registry = BindingRegistry::default();
        assert!(registry.get(&Key::of::<dyn Logger>()).is_empty());
    }
}
