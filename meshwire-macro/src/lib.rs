use proc_macro::TokenStream;

mod injectable;
mod module;

/// Derive macro for making a struct injectable into the DI container
///
/// Every field must be an `Arc<T>` or `Arc<dyn Trait>`, resolved from the
/// container in declaration order. Field attributes:
///
/// - `#[inject(name = "replica")]` resolves the field by a named key
/// - `#[inject(default)]` fills the field with `Default::default()` instead
///
/// # Example
/// ```ignore
/// use meshwire::prelude::*;
///
/// #[derive(Injectable)]
/// pub struct UserService {
///     repository: Arc<dyn UserRepository>,
///     #[inject(name = "audit")]
///     audit: Arc<dyn UserRepository>,
/// }
/// ```
#[proc_macro_derive(Injectable, attributes(inject))]
pub fn derive_injectable(input: TokenStream) -> TokenStream {
    injectable::derive_injectable(input)
}

/// Attribute macro for defining a module with imports, providers and bindings
///
/// # Example
/// ```ignore
/// use meshwire::module;
///
/// #[module(
///     imports = [DatabaseModule],
///     providers = [UserService, MemoryUserRepository],
///     bindings = [(dyn UserRepository => MemoryUserRepository)],
/// )]
/// pub struct AppModule;
/// ```
#[proc_macro_attribute]
pub fn module(attr: TokenStream, item: TokenStream) -> TokenStream {
    module::module_attribute(attr, item)
}
