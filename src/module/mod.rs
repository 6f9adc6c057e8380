use crate::di::Directive;

/// Trait for groups of related directives
///
/// Modules are typically defined using the `#[module]` macro, which automatically
/// implements this trait from its providers, bindings and imported modules.
///
/// # Example
/// ```
/// use meshwire::prelude::*;
///
/// trait UserRepository: Send + Sync {}
///
/// #[derive(Injectable)]
/// pub struct MemoryUserRepository {}
/// impl UserRepository for MemoryUserRepository {}
///
/// #[derive(Injectable)]
/// pub struct UserService {
///     repository: Arc<dyn UserRepository>,
/// }
///
/// #[module(
///     providers = [MemoryUserRepository, UserService],
///     bindings = [(dyn UserRepository => MemoryUserRepository)],
/// )]
/// pub struct UserModule;
///
/// let container = UserModule::create_container().unwrap();
/// assert!(container.resolve::<UserService>().is_ok());
/// ```
pub trait Module {
    /// The directives this module contributes, imports first
    fn directives() -> Vec<Directive>;
}
