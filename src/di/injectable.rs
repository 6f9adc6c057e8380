use crate::di::{Arguments, Key};
use crate::error::Result;

/// Trait for struct-shaped providers whose fields are their dependencies
///
/// This trait is typically implemented automatically via the `#[derive(Injectable)]` macro,
/// and registered with [`Provide::injectable`](crate::Provide::injectable).
///
/// # Example
/// ```
/// use meshwire::prelude::*;
///
/// trait UserRepository: Send + Sync {}
///
/// #[derive(Injectable)]
/// pub struct UserService {
///     // Resolved from the container, through the capability binding
///     repository: Arc<dyn UserRepository>,
///     #[inject(name = "replica")]
///     audit: Arc<dyn UserRepository>,
/// }
/// ```
pub trait Injectable: Sized + Send + Sync + 'static {
    /// Keys of the dependencies, in the order `inject` takes them
    fn dependencies() -> Vec<Key>;

    /// Create an instance from the resolved dependencies
    ///
    /// # Errors
    /// Returns an error if an argument does not have the expected type.
    fn inject(arguments: &mut Arguments) -> Result<Self>;
}
