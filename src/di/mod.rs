mod binding;
mod builder;
mod capability;
mod container;
mod definition;
mod injectable;
mod key;
mod observer;
mod provider;
mod snapshot;

pub use builder::{
    Bind, ContainerBuilder, Directive, Provide, blueprint, package, provide, try_provide,
};
pub use capability::{Capability, CapabilityDescriptor};
pub use container::Container;
pub use injectable::Injectable;
pub use key::{Key, TypeInfo};
pub use observer::{Observer, SilentObserver, TracingObserver};
pub use provider::{
    Arguments, Constructor, Dependency, FallibleConstructor, Instance, ProviderKind,
    ProviderWrapper,
};
pub use snapshot::{GraphSnapshot, NodeSnapshot};
