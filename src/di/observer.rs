use crate::di::{Key, ProviderKind};
use crate::error::MeshwireError;
use std::time::Duration;

/// Hook notified of graph events while a container compiles and resolves.
///
/// All methods default to no-ops, so an implementation only overrides what it
/// cares about.
pub trait Observer: Send + Sync {
    /// A provider was registered as a graph node.
    fn registered(&self, _key: &Key, _kind: ProviderKind) {}

    /// A definition was added under a capability key.
    fn bound(&self, _capability: &Key, _target: &Key) {}

    /// A definition's arguments were resolved to other definitions.
    fn linked(&self, _key: &Key, _dependencies: &[Key]) {}

    /// A provider ran successfully.
    fn constructed(&self, _key: &Key, _elapsed: Duration) {}

    /// A provider reported failure; the definition stays unbuilt.
    fn construction_failed(&self, _key: &Key, _error: &MeshwireError) {}
}

/// Default observer; emits `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn registered(&self, key: &Key, kind: ProviderKind) {
        tracing::debug!(%key, %kind, "Provide");
    }

    fn bound(&self, capability: &Key, target: &Key) {
        tracing::debug!(%capability, %target, "Bind");
    }

    fn linked(&self, key: &Key, dependencies: &[Key]) {
        tracing::trace!(%key, ?dependencies, "Linked");
    }

    fn constructed(&self, key: &Key, elapsed: Duration) {
        tracing::debug!(%key, ?elapsed, "Constructed");
    }

    fn construction_failed(&self, key: &Key, error: &MeshwireError) {
        tracing::warn!(%key, %error, "Construction failed");
    }
}

/// Observer that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentObserver;

impl Observer for SilentObserver {}
