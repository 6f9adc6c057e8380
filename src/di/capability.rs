//! Capability descriptors.
//!
//! A capability is an abstract contract, expressed as a trait object type
//! such as `dyn Logger`. Rust cannot upcast a type-erased value to a trait
//! object on its own, so every concrete type that satisfies a capability is
//! declared up front together with the cast that proves it:
//!
//! ```rust
//! use meshwire::Capability;
//! use std::sync::Arc;
//!
//! trait Logger: Send + Sync {
//!     fn log(&self, message: &str);
//! }
//!
//! struct ConsoleLogger;
//!
//! impl Logger for ConsoleLogger {
//!     fn log(&self, message: &str) {
//!         println!("{message}");
//!     }
//! }
//!
//! let logger = Capability::<dyn Logger>::new()
//!     .implemented_by::<ConsoleLogger>(|it| it as Arc<dyn Logger>);
//! ```
//!
//! The [`capability!`](crate::capability) macro writes the casts for you.
//! Bindings (`As` modifiers and `Bind` directives) are checked against these
//! declarations while the container compiles.

use crate::di::provider::into_instance;
use crate::di::{Instance, TypeInfo};
use crate::error::{MeshwireError, Result};
use std::any::TypeId;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

/// Projects an instance of a concrete type into a capability view.
pub(crate) type Caster = Arc<dyn Fn(&Instance) -> Option<Instance> + Send + Sync>;

/// Typed declaration of a capability and the types that implement it.
pub struct Capability<C: ?Sized> {
    descriptor: CapabilityDescriptor,
    _marker: PhantomData<fn(Arc<C>)>,
}

impl<C: ?Sized + Send + Sync + 'static> Capability<C> {
    pub fn new() -> Self {
        Self {
            descriptor: CapabilityDescriptor {
                capability: TypeInfo::of::<C>(),
                implementers: HashMap::new(),
            },
            _marker: PhantomData,
        }
    }

    /// Declares that `T` satisfies `C`; `cast` is usually `|it| it as Arc<dyn C>`.
    pub fn implemented_by<T: Send + Sync + 'static>(mut self, cast: fn(Arc<T>) -> Arc<C>) -> Self {
        let caster: Caster = Arc::new(move |instance: &Instance| {
            let concrete = instance.downcast_ref::<Arc<T>>()?;
            Some(into_instance(cast(Arc::clone(concrete))))
        });
        self.descriptor.implementers.insert(
            TypeId::of::<T>(),
            Implementer {
                ty: TypeInfo::of::<T>(),
                caster,
            },
        );
        self
    }

    pub fn into_descriptor(self) -> CapabilityDescriptor {
        self.descriptor
    }
}

impl<C: ?Sized + Send + Sync + 'static> Default for Capability<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone)]
struct Implementer {
    ty: TypeInfo,
    caster: Caster,
}

/// Type-erased form of [`Capability`].
#[derive(Clone)]
pub struct CapabilityDescriptor {
    capability: TypeInfo,
    implementers: HashMap<TypeId, Implementer>,
}

impl CapabilityDescriptor {
    pub fn capability(&self) -> TypeInfo {
        self.capability
    }

    pub fn implementers(&self) -> impl Iterator<Item = TypeInfo> + '_ {
        self.implementers.values().map(|implementer| implementer.ty)
    }
}

impl std::fmt::Debug for CapabilityDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilityDescriptor")
            .field("capability", &self.capability)
            .field("implementers", &self.implementers().collect::<Vec<_>>())
            .finish()
    }
}

/// All capability declarations known to one container build.
#[derive(Default)]
pub(crate) struct CapabilityCatalog {
    capabilities: HashMap<TypeId, CapabilityDescriptor>,
}

impl CapabilityCatalog {
    /// Adds a declaration, merging with earlier ones for the same capability.
    pub(crate) fn declare(&mut self, descriptor: CapabilityDescriptor) {
        match self.capabilities.get_mut(&descriptor.capability.id()) {
            Some(existing) => existing.implementers.extend(descriptor.implementers),
            None => {
                self.capabilities.insert(descriptor.capability.id(), descriptor);
            }
        }
    }

    /// Returns the cast from `implementer` to `capability`, checking that the
    /// capability is abstract and declared, and that `implementer` satisfies it.
    pub(crate) fn caster(&self, capability: TypeInfo, implementer: TypeInfo) -> Result<Caster> {
        let descriptor = self
            .capabilities
            .get(&capability.id())
            .filter(|_| capability.is_abstract())
            .ok_or_else(|| MeshwireError::InvalidCapabilityArgument {
                argument: capability.name().to_string(),
            })?;

        descriptor
            .implementers
            .get(&implementer.id())
            .map(|implementer| Arc::clone(&implementer.caster))
            .ok_or_else(|| MeshwireError::CapabilityNotImplemented {
                result: implementer.name().to_string(),
                capability: capability.name().to_string(),
            })
    }

    pub(crate) fn len(&self) -> usize {
        self.capabilities.len()
    }
}

/// Builds a [`Capability`] declaration for a trait object type and its
/// implementers.
///
/// ```rust
/// use meshwire::capability;
///
/// trait Store: Send + Sync {}
///
/// struct MemoryStore;
/// impl Store for MemoryStore {}
///
/// struct DiskStore;
/// impl Store for DiskStore {}
///
/// let stores = capability!(dyn Store => MemoryStore, DiskStore);
/// ```
#[macro_export]
macro_rules! capability {
    ($capability:ty => $($implementer:ty),+ $(,)?) => {
        $crate::Capability::<$capability>::new()
            $(.implemented_by::<$implementer>(
                |it: ::std::sync::Arc<$implementer>| -> ::std::sync::Arc<$capability> { it }
            ))+
    };
}
