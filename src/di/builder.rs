use crate::config::{ConfigService, ContainerConfig};
use crate::di::capability::{Capability, CapabilityDescriptor};
use crate::di::observer::{Observer, TracingObserver};
use crate::di::provider::RawProvider;
use crate::di::{Constructor, Container, FallibleConstructor, Injectable, Key, TypeInfo};
use crate::error::Result;
use crate::module::Module;
use std::sync::Arc;

/// A single configuration directive.
///
/// Directives only accumulate; nothing is validated until the container
/// is compiled.
pub enum Directive {
    Provide(Provide),
    Bind(Bind),
    Capability(CapabilityDescriptor),
    Package(Vec<Directive>),
}

impl Directive {
    /// Groups directives so they can be passed around as one.
    pub fn package(directives: impl IntoIterator<Item = Directive>) -> Self {
        Directive::Package(directives.into_iter().collect())
    }
}

impl From<Provide> for Directive {
    fn from(provide: Provide) -> Self {
        Directive::Provide(provide)
    }
}

impl From<Bind> for Directive {
    fn from(bind: Bind) -> Self {
        Directive::Bind(bind)
    }
}

impl From<CapabilityDescriptor> for Directive {
    fn from(descriptor: CapabilityDescriptor) -> Self {
        Directive::Capability(descriptor)
    }
}

impl<C: ?Sized + Send + Sync + 'static> From<Capability<C>> for Directive {
    fn from(capability: Capability<C>) -> Self {
        Directive::Capability(capability.into_descriptor())
    }
}

/// Registers a provider, with optional `name`, `as_` and `arg_name` modifiers.
pub struct Provide {
    raw: RawProvider,
    name: String,
    capabilities: Vec<TypeInfo>,
    argument_names: Vec<(usize, String)>,
}

impl Provide {
    fn from_raw(raw: RawProvider) -> Self {
        Self {
            raw,
            name: String::new(),
            capabilities: Vec::new(),
            argument_names: Vec::new(),
        }
    }

    /// A function returning the instance.
    pub fn function<M, C: Constructor<M>>(constructor: C) -> Self {
        Self::from_raw(RawProvider::function(constructor))
    }

    /// A function returning `Result<T, E>`.
    pub fn fallible<M, C: FallibleConstructor<M>>(constructor: C) -> Self {
        Self::from_raw(RawProvider::fallible(constructor))
    }

    /// A struct whose fields are injected.
    pub fn injectable<T: Injectable>() -> Self {
        Self::from_raw(RawProvider::injectable::<T>())
    }

    /// A ready value, used as the instance as-is.
    pub fn blueprint<T: Send + Sync + 'static>(value: T) -> Self {
        Self::from_raw(RawProvider::blueprint(value))
    }

    /// Registers the result under a named key instead of the default one.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Declares that the result also satisfies capability `C`.
    pub fn as_<C: ?Sized + 'static>(mut self) -> Self {
        self.capabilities.push(TypeInfo::of::<C>());
        self
    }

    /// Resolves the argument at `index` by a named key.
    pub fn arg_name(mut self, index: usize, name: impl Into<String>) -> Self {
        self.argument_names.push((index, name.into()));
        self
    }

    pub(crate) fn into_parts(self) -> (RawProvider, String, Vec<TypeInfo>, Vec<(usize, String)>) {
        (self.raw, self.name, self.capabilities, self.argument_names)
    }
}

/// Shorthand for [`Provide::function`].
pub fn provide<M, C: Constructor<M>>(constructor: C) -> Provide {
    Provide::function(constructor)
}

/// Shorthand for [`Provide::fallible`].
pub fn try_provide<M, C: FallibleConstructor<M>>(constructor: C) -> Provide {
    Provide::fallible(constructor)
}

/// Shorthand for [`Provide::blueprint`].
pub fn blueprint<T: Send + Sync + 'static>(value: T) -> Provide {
    Provide::blueprint(value)
}

/// Shorthand for [`Directive::package`].
pub fn package(directives: impl IntoIterator<Item = Directive>) -> Directive {
    Directive::package(directives)
}

/// Declares that already provided types implement a capability.
///
/// ```rust
/// use meshwire::{Bind, Container, capability, provide};
///
/// trait Clock: Send + Sync {}
///
/// struct SystemClock;
/// impl Clock for SystemClock {}
///
/// let container = Container::new([
///     provide(|| SystemClock).into(),
///     capability!(dyn Clock => SystemClock).into(),
///     Bind::new::<dyn Clock>().to::<SystemClock>().into(),
/// ])
/// .unwrap();
/// assert!(container.resolve::<dyn Clock>().is_ok());
/// ```
pub struct Bind {
    capability: TypeInfo,
    targets: Vec<Key>,
}

impl Bind {
    pub fn new<C: ?Sized + 'static>() -> Self {
        Self {
            capability: TypeInfo::of::<C>(),
            targets: Vec::new(),
        }
    }

    pub fn to<T: 'static>(mut self) -> Self {
        self.targets.push(Key::of::<T>());
        self
    }

    pub fn to_named<T: 'static>(mut self, name: impl Into<String>) -> Self {
        self.targets.push(Key::named::<T>(name));
        self
    }

    pub(crate) fn capability(&self) -> TypeInfo {
        self.capability
    }

    pub(crate) fn targets(&self) -> &[Key] {
        &self.targets
    }
}

/// Builder for constructing a dependency injection container
///
/// Collect providers, bindings and capability declarations, then compile
/// them into an immutable container with [`build`](Self::build).
///
/// # Example
/// ```
/// use meshwire::{ContainerBuilder, capability, provide};
/// use std::sync::Arc;
///
/// trait Database: Send + Sync {}
///
/// struct PostgresDatabase;
/// impl Database for PostgresDatabase {}
///
/// struct UserService {
///     database: Arc<dyn Database>,
/// }
///
/// let container = ContainerBuilder::new()
///     .capability(capability!(dyn Database => PostgresDatabase))
///     .provide(provide(|| PostgresDatabase).as_::<dyn Database>())
///     .provide(provide(|database: Arc<dyn Database>| UserService { database }))
///     .build()
///     .unwrap();
///
/// let service = container.resolve::<UserService>().unwrap();
/// ```
pub struct ContainerBuilder {
    directives: Vec<Directive>,
    config: ContainerConfig,
    observer: Arc<dyn Observer>,
}

impl ContainerBuilder {
    /// Create a new container builder
    ///
    /// The configuration is read from the environment (`MESHWIRE_AMBIGUITY`);
    /// an invalid value is logged and the defaults are used.
    pub fn new() -> Self {
        Self {
            directives: Vec::new(),
            config: ContainerConfig::load_or_default(&ConfigService::new()),
            observer: Arc::new(TracingObserver),
        }
    }

    /// Add any directive
    pub fn directive(mut self, directive: impl Into<Directive>) -> Self {
        self.directives.push(directive.into());
        self
    }

    /// Add several directives, in order
    pub fn directives(mut self, directives: impl IntoIterator<Item = Directive>) -> Self {
        self.directives.extend(directives);
        self
    }

    /// Register a provider
    pub fn provide(self, provide: Provide) -> Self {
        self.directive(provide)
    }

    /// Bind provided types to a capability
    pub fn bind(self, bind: Bind) -> Self {
        self.directive(bind)
    }

    /// Declare a capability and its implementers
    pub fn capability(self, capability: impl Into<Directive>) -> Self {
        self.directive(capability)
    }

    /// Add a nested group of directives
    pub fn package(self, directives: impl IntoIterator<Item = Directive>) -> Self {
        self.directive(Directive::package(directives))
    }

    /// Add all directives of a module
    pub fn module<M: Module>(self) -> Self {
        self.package(M::directives())
    }

    pub fn config(mut self, config: ContainerConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the default tracing observer
    pub fn observer(mut self, observer: impl Observer + 'static) -> Self {
        self.observer = Arc::new(observer);
        self
    }

    /// Compile the container
    ///
    /// # Errors
    /// Returns the first compilation error; no container is produced then.
    pub fn build(self) -> Result<Container> {
        Container::compile(self.directives, self.config, self.observer).map_err(|error| {
            tracing::error!(%error, "Container compilation failed");
            error
        })
    }
}

impl Default for ContainerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
