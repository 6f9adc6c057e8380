use std::any::{TypeId, type_name};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::mem::size_of;

/// Runtime identity of a Rust type.
///
/// Two `TypeInfo`s are equal when their `TypeId`s are equal; the name is kept
/// for diagnostics only.
#[derive(Clone, Copy)]
pub struct TypeInfo {
    id: TypeId,
    name: &'static str,
    is_abstract: bool,
}

impl TypeInfo {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
            // Pointers to dynamically sized types are fat.
            is_abstract: size_of::<*const T>() != size_of::<*const ()>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether the type is dynamically sized, i.e. a trait object that can
    /// stand for a capability.
    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    /// `true` for `()`, which no provider may produce.
    pub fn is_unit(&self) -> bool {
        self.id == TypeId::of::<()>()
    }

    /// `true` for `bool`, `char`, the integer and float types and `&'static str`.
    pub fn is_primitive(&self) -> bool {
        primitive_ids().contains(&self.id)
    }
}

fn primitive_ids() -> [TypeId; 17] {
    [
        TypeId::of::<bool>(),
        TypeId::of::<char>(),
        TypeId::of::<i8>(),
        TypeId::of::<i16>(),
        TypeId::of::<i32>(),
        TypeId::of::<i64>(),
        TypeId::of::<i128>(),
        TypeId::of::<isize>(),
        TypeId::of::<u8>(),
        TypeId::of::<u16>(),
        TypeId::of::<u32>(),
        TypeId::of::<u64>(),
        TypeId::of::<u128>(),
        TypeId::of::<usize>(),
        TypeId::of::<f32>(),
        TypeId::of::<f64>(),
        TypeId::of::<&'static str>(),
    ]
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeInfo {}

impl Hash for TypeInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Identity of a node in the dependency graph: a type plus an optional name.
///
/// An empty name is the default key for a type.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Key {
    ty: TypeInfo,
    name: String,
}

impl Key {
    pub fn new(ty: TypeInfo, name: impl Into<String>) -> Self {
        Self {
            ty,
            name: name.into(),
        }
    }

    /// The default (unnamed) key for `T`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::new(TypeInfo::of::<T>(), String::new())
    }

    pub fn named<T: ?Sized + 'static>(name: impl Into<String>) -> Self {
        Self::new(TypeInfo::of::<T>(), name)
    }

    pub fn with_name(&self, name: impl Into<String>) -> Self {
        Self::new(self.ty, name)
    }

    pub fn type_info(&self) -> TypeInfo {
        self.ty
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_named(&self) -> bool {
        !self.name.is_empty()
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            write!(f, "{}", self.ty)
        } else {
            write!(f, "{}[{}]", self.ty, self.name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Greeter {}

    struct Repository;

    #[test]
    fn test_key_equality() {
        assert_eq!(Key::of::<Repository>(), Key::of::<Repository>());
        assert_ne!(Key::of::<Repository>(), Key::named::<Repository>("replica"));
        assert_ne!(Key::of::<Repository>(), Key::of::<String>());
        assert_eq!(
            Key::named::<Repository>("replica"),
            Key::of::<Repository>().with_name("replica")
        );
    }

    #[test]
    fn test_abstract_types() {
        assert!(TypeInfo::of::<dyn Greeter>().is_abstract());
        assert!(!TypeInfo::of::<Repository>().is_abstract());
        assert!(TypeInfo::of::<()>().is_unit());
    }

    #[test]
    fn test_primitive_types() {
        assert!(TypeInfo::of::<u16>().is_primitive());
        assert!(TypeInfo::of::<f64>().is_primitive());
        assert!(TypeInfo::of::<&'static str>().is_primitive());
        assert!(!TypeInfo::of::<Repository>().is_primitive());
        assert!(!TypeInfo::of::<String>().is_primitive());
    }

    #[test]
    fn test_key_display() {
        let key = Key::named::<u32>("port");
        assert_eq!(key.to_string(), "u32[port]");
        assert_eq!(Key::of::<u32>().to_string(), "u32");
    }
}
