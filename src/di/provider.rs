use crate::di::{Injectable, Key, TypeInfo};
use crate::error::{BoxError, MeshwireError, Result};
use serde::Serialize;
use std::any::{Any, type_name};
use std::fmt;
use std::sync::Arc;
use strum_macros::Display;

/// A type-erased instance held by the container.
///
/// Always wraps an `Arc<X>`: the concrete value for a definition, or the
/// trait object when viewed through a capability.
pub type Instance = Arc<dyn Any + Send + Sync>;

type Invoke = Box<dyn Fn(Vec<Instance>) -> std::result::Result<Instance, BoxError> + Send + Sync>;

pub(crate) fn into_instance<X: ?Sized + Send + Sync + 'static>(value: Arc<X>) -> Instance {
    Arc::new(value)
}

/// A handle type that can be requested from the container.
///
/// Implemented for `Arc<X>`, where `X` is either a provided type or a
/// capability trait object such as `dyn Logger`.
pub trait Dependency: Sized + Send + Sync + 'static {
    fn type_info() -> TypeInfo;

    fn from_instance(instance: &Instance) -> Option<Self>;
}

impl<X: ?Sized + Send + Sync + 'static> Dependency for Arc<X> {
    fn type_info() -> TypeInfo {
        TypeInfo::of::<X>()
    }

    fn from_instance(instance: &Instance) -> Option<Self> {
        instance.downcast_ref::<Arc<X>>().cloned()
    }
}

/// Resolved argument values handed to a provider, in declaration order.
pub struct Arguments {
    values: std::vec::IntoIter<Instance>,
    position: usize,
}

impl Arguments {
    pub(crate) fn new(values: Vec<Instance>) -> Self {
        Self {
            values: values.into_iter(),
            position: 0,
        }
    }

    /// Takes the next argument as `D`.
    pub fn take<D: Dependency>(&mut self) -> Result<D> {
        let position = self.position;
        self.position += 1;
        let instance = self
            .values
            .next()
            .ok_or_else(|| MeshwireError::DowncastFailed {
                type_name: format!("missing argument #{position} ({})", type_name::<D>()),
            })?;
        D::from_instance(&instance).ok_or_else(|| MeshwireError::DowncastFailed {
            type_name: type_name::<D>().to_string(),
        })
    }

    /// Number of arguments not yet taken.
    pub fn remaining(&self) -> usize {
        self.values.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProviderKind {
    /// A callable taking dependencies and returning the instance.
    Function,
    /// A ready value that becomes the instance itself.
    Blueprint,
}

/// Unvalidated constructor description, as captured by a `Provide` directive.
pub(crate) struct RawProvider {
    kind: ProviderKind,
    result: TypeInfo,
    arguments: Vec<Key>,
    invoke: Invoke,
}

impl RawProvider {
    pub(crate) fn function<M, C: Constructor<M>>(constructor: C) -> Self {
        Self {
            kind: ProviderKind::Function,
            result: TypeInfo::of::<C::Output>(),
            arguments: C::arguments(),
            invoke: Box::new(move |values| {
                let mut arguments = Arguments::new(values);
                let value = constructor.construct(&mut arguments)?;
                Ok(into_instance(Arc::new(value)))
            }),
        }
    }

    pub(crate) fn fallible<M, C: FallibleConstructor<M>>(constructor: C) -> Self {
        Self {
            kind: ProviderKind::Function,
            result: TypeInfo::of::<C::Output>(),
            arguments: C::arguments(),
            invoke: Box::new(move |values| {
                let mut arguments = Arguments::new(values);
                let value = constructor.construct(&mut arguments)?;
                Ok(into_instance(Arc::new(value)))
            }),
        }
    }

    pub(crate) fn injectable<T: Injectable>() -> Self {
        Self {
            kind: ProviderKind::Function,
            result: TypeInfo::of::<T>(),
            arguments: T::dependencies(),
            invoke: Box::new(|values| {
                let mut arguments = Arguments::new(values);
                let value = T::inject(&mut arguments)?;
                Ok(into_instance(Arc::new(value)))
            }),
        }
    }

    pub(crate) fn blueprint<T: Send + Sync + 'static>(value: T) -> Self {
        let instance = into_instance(Arc::new(value));
        Self {
            kind: ProviderKind::Blueprint,
            result: TypeInfo::of::<T>(),
            arguments: Vec::new(),
            invoke: Box::new(move |_| Ok(Arc::clone(&instance))),
        }
    }
}

/// Normalized constructor: result type, argument keys and invocation.
pub struct ProviderWrapper {
    kind: ProviderKind,
    result: TypeInfo,
    arguments: Vec<Key>,
    invoke: Invoke,
}

impl ProviderWrapper {
    /// Validates a raw provider and applies argument name annotations.
    pub(crate) fn wrap(raw: RawProvider, argument_names: &[(usize, String)]) -> Result<Self> {
        let invalid = |reason: String| MeshwireError::InvalidProviderShape {
            result: raw.result.name().to_string(),
            reason,
        };

        if raw.result.is_unit() {
            return Err(invalid("provider must produce a value".to_string()));
        }
        if raw.kind == ProviderKind::Blueprint && raw.result.is_primitive() {
            return Err(invalid("blueprint must be a struct value, not a primitive".to_string()));
        }

        let mut arguments = raw.arguments;
        let count = arguments.len();
        for (index, name) in argument_names {
            let argument = arguments.get_mut(*index).ok_or_else(|| {
                invalid(format!(
                    "argument #{index} cannot be named {name:?}, provider takes {count} argument(s)"
                ))
            })?;
            *argument = argument.with_name(name.clone());
        }

        Ok(Self {
            kind: raw.kind,
            result: raw.result,
            arguments,
            invoke: raw.invoke,
        })
    }

    pub fn kind(&self) -> ProviderKind {
        self.kind
    }

    pub fn result(&self) -> TypeInfo {
        self.result
    }

    pub fn arguments(&self) -> &[Key] {
        &self.arguments
    }

    pub fn invoke(&self, values: Vec<Instance>) -> std::result::Result<Instance, BoxError> {
        (self.invoke)(values)
    }
}

impl fmt::Debug for ProviderWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderWrapper")
            .field("kind", &self.kind)
            .field("result", &self.result)
            .field("arguments", &self.arguments)
            .finish()
    }
}

/// A callable provider returning its value directly.
///
/// Implemented for every `Fn(A1, ..., An) -> T` with up to eight
/// [`Dependency`] arguments.
pub trait Constructor<Args>: Send + Sync + 'static {
    type Output: Send + Sync + 'static;

    fn arguments() -> Vec<Key>;

    fn construct(&self, arguments: &mut Arguments) -> std::result::Result<Self::Output, BoxError>;
}

/// A callable provider returning `Result<T, E>`; an `Err` fails construction.
pub trait FallibleConstructor<Args>: Send + Sync + 'static {
    type Output: Send + Sync + 'static;

    fn arguments() -> Vec<Key>;

    fn construct(&self, arguments: &mut Arguments) -> std::result::Result<Self::Output, BoxError>;
}

macro_rules! impl_constructor {
    ($($arg:ident),*) => {
        impl<F, T, $($arg,)*> Constructor<($($arg,)*)> for F
        where
            F: Fn($($arg),*) -> T + Send + Sync + 'static,
            T: Send + Sync + 'static,
            $($arg: Dependency,)*
        {
            type Output = T;

            fn arguments() -> Vec<Key> {
                vec![$(Key::new($arg::type_info(), String::new())),*]
            }

            #[allow(non_snake_case, unused_variables)]
            fn construct(&self, arguments: &mut Arguments) -> std::result::Result<T, BoxError> {
                $(let $arg = arguments.take::<$arg>()?;)*
                Ok(self($($arg),*))
            }
        }

        impl<F, T, E, $($arg,)*> FallibleConstructor<($($arg,)*)> for F
        where
            F: Fn($($arg),*) -> std::result::Result<T, E> + Send + Sync + 'static,
            T: Send + Sync + 'static,
            E: Into<BoxError>,
            $($arg: Dependency,)*
        {
            type Output = T;

            fn arguments() -> Vec<Key> {
                vec![$(Key::new($arg::type_info(), String::new())),*]
            }

            #[allow(non_snake_case, unused_variables)]
            fn construct(&self, arguments: &mut Arguments) -> std::result::Result<T, BoxError> {
                $(let $arg = arguments.take::<$arg>()?;)*
                self($($arg),*).map_err(Into::into)
            }
        }
    };
}

impl_constructor!();
impl_constructor!(A1);
impl_constructor!(A1, A2);
impl_constructor!(A1, A2, A3);
impl_constructor!(A1, A2, A3, A4);
impl_constructor!(A1, A2, A3, A4, A5);
impl_constructor!(A1, A2, A3, A4, A5, A6);
impl_constructor!(A1, A2, A3, A4, A5, A6, A7);
impl_constructor!(A1, A2, A3, A4, A5, A6, A7, A8);

#[cfg(test)]
mod tests {
    use super::*;

    struct Repository {
        url: String,
    }

    struct Service {
        repository: Arc<Repository>,
    }

    fn new_service(repository: Arc<Repository>) -> Service {
        Service { repository }
    }

    fn wrap(raw: RawProvider) -> ProviderWrapper {
        ProviderWrapper::wrap(raw, &[]).unwrap()
    }

    #[test]
    fn test_function_provider_shape() {
        let wrapper = wrap(RawProvider::function(new_service));
        assert_eq!(wrapper.kind(), ProviderKind::Function);
        assert_eq!(wrapper.result(), TypeInfo::of::<Service>());
        assert_eq!(wrapper.arguments(), &[Key::of::<Repository>()]);
    }

    #[test]
    fn test_function_provider_invoke() {
        let wrapper = wrap(RawProvider::function(new_service));
        let repository = Arc::new(Repository {
            url: "memory://".to_string(),
        });
        let instance = wrapper
            .invoke(vec![into_instance(Arc::clone(&repository))])
            .unwrap();
        let service = <Arc<Service>>::from_instance(&instance).unwrap();
        assert!(Arc::ptr_eq(&service.repository, &repository));
        assert_eq!(service.repository.url, "memory://");
    }

    #[test]
    fn test_fallible_provider_error() {
        let wrapper = wrap(RawProvider::fallible(|| -> anyhow::Result<Repository> {
            anyhow::bail!("connection refused")
        }));
        let error = wrapper.invoke(Vec::new()).err().unwrap();
        assert_eq!(error.to_string(), "connection refused");
    }

    #[test]
    fn test_blueprint_provider() {
        let wrapper = wrap(RawProvider::blueprint(Repository {
            url: "postgres://localhost".to_string(),
        }));
        assert_eq!(wrapper.kind(), ProviderKind::Blueprint);
        assert!(wrapper.arguments().is_empty());

        let first = wrapper.invoke(Vec::new()).unwrap();
        let second = wrapper.invoke(Vec::new()).unwrap();
        let first = <Arc<Repository>>::from_instance(&first).unwrap();
        let second = <Arc<Repository>>::from_instance(&second).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_unit_result_rejected() {
        let result = ProviderWrapper::wrap(RawProvider::function(|| ()), &[]);
        assert!(matches!(
            result,
            Err(MeshwireError::InvalidProviderShape { .. })
        ));
    }

    #[test]
    fn test_primitive_blueprint_rejected() {
        for raw in [RawProvider::blueprint(7u16), RawProvider::blueprint(3.5f64)] {
            assert!(matches!(
                ProviderWrapper::wrap(raw, &[]),
                Err(MeshwireError::InvalidProviderShape { .. })
            ));
        }

        // Functions may still produce primitives.
        assert!(ProviderWrapper::wrap(RawProvider::function(|| 7u16), &[]).is_ok());
    }

    #[test]
    fn test_argument_names() {
        let wrapper = ProviderWrapper::wrap(
            RawProvider::function(new_service),
            &[(0, "primary".to_string())],
        )
        .unwrap();
        assert_eq!(wrapper.arguments(), &[Key::named::<Repository>("primary")]);

        let result = ProviderWrapper::wrap(
            RawProvider::function(new_service),
            &[(1, "replica".to_string())],
        );
        assert!(matches!(
            result,
            Err(MeshwireError::InvalidProviderShape { .. })
        ));
    }

    #[test]
    fn test_arguments_type_mismatch() {
        let mut arguments = Arguments::new(vec![into_instance(Arc::new(7u32))]);
        assert_eq!(arguments.remaining(), 1);
        assert!(matches!(
            arguments.take::<Arc<String>>(),
            Err(MeshwireError::DowncastFailed { .. })
        ));
    }
}
