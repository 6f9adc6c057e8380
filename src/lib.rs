//! # Meshwire
//!
//! A dependency injection container for Rust.
//!
//! Providers are registered as directives, compiled once into a linked graph,
//! and resolved lazily: each definition is constructed at most once, on first
//! request, and shared from then on.
//!
//! ## Features
//!
//! - **Two-phase compilation**: every dependency is checked before anything is built
//! - **Capabilities**: request `Arc<dyn Trait>` and get the registered implementer
//! - **Named keys**: several instances of one type side by side
//! - **Thread-safe singletons**: concurrent first requests share one construction
//! - **Modules**: group providers with `#[module]` and `#[derive(Injectable)]`
//!
//! ## Quick Start
//!
//! ```rust
//! use meshwire::prelude::*;
//!
//! trait Logger: Send + Sync {
//!     fn log(&self, message: &str) -> String;
//! }
//!
//! struct ConsoleLogger;
//!
//! impl Logger for ConsoleLogger {
//!     fn log(&self, message: &str) -> String {
//!         format!("[console] {message}")
//!     }
//! }
//!
//! struct Greeter {
//!     logger: Arc<dyn Logger>,
//! }
//!
//! let container = Container::builder()
//!     .capability(capability!(dyn Logger => ConsoleLogger))
//!     .provide(provide(|| ConsoleLogger).as_::<dyn Logger>())
//!     .provide(provide(|logger: Arc<dyn Logger>| Greeter { logger }))
//!     .build()?;
//!
//! let greeter = container.resolve::<Greeter>()?;
//! assert_eq!(greeter.logger.log("hello"), "[console] hello");
//! # Ok::<(), meshwire::MeshwireError>(())
//! ```

extern crate self as meshwire;

pub mod config;
pub mod di;
pub mod error;
pub mod module;

// Re-export core types
pub use config::{AmbiguityPolicy, ConfigService, ContainerConfig};
pub use di::{
    Arguments, Bind, Capability, CapabilityDescriptor, Constructor, Container, ContainerBuilder,
    Dependency, Directive, FallibleConstructor, GraphSnapshot, Injectable, Instance, Key,
    NodeSnapshot, Observer, Provide, ProviderKind, ProviderWrapper, SilentObserver,
    TracingObserver, TypeInfo, blueprint, package, provide, try_provide,
};
pub use error::{BoxError, MeshwireError, Result};
pub use module::Module;

// Re-export macros
pub use meshwire_macro::{Injectable as DeriveInjectable, module};

/// Prelude module for convenient imports
///
/// ```
/// use meshwire::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{AmbiguityPolicy, ContainerConfig};
    pub use crate::di::{
        Bind, Capability, Container, ContainerBuilder, Directive, Injectable, Key, Provide,
        blueprint, package, provide, try_provide,
    };
    pub use crate::error::{MeshwireError, Result};
    pub use crate::module::Module;
    pub use crate::{DeriveInjectable as Injectable, capability, module};
    pub use std::sync::Arc;
}
