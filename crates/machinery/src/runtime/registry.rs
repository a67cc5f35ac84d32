//! Registry of known kinds.

use std::any::TypeId;
use std::collections::HashMap;

use crate::error::Error;

use super::{Object, ObjectList, VersionKind};

enum Constructor {
    Object(fn() -> Box<dyn Object>),
    List(fn() -> Box<dyn ObjectList>),
}

fn make_object<T: Object + Default>() -> Box<dyn Object> {
    Box::new(T::default())
}

fn make_list<T: ObjectList + Default>() -> Box<dyn ObjectList> {
    Box::new(T::default())
}

/// Maps `(version, kind)` identifiers to constructors and back.
///
/// Populated once at startup and immutable afterwards; registration mistakes
/// are programmer errors and panic, lookups return typed errors. Tests build
/// their own isolated registries.
#[derive(Default)]
pub struct Registry {
    constructors: HashMap<VersionKind, Constructor>,
    kinds: HashMap<TypeId, VersionKind>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a kind under `(version, kind)`.
    ///
    /// Panics on an empty version or a duplicate registration.
    pub fn register_object<T: Object + Default>(&mut self, version: &str, kind: &str) {
        self.insert::<T>(version, kind, Constructor::Object(make_object::<T>));
    }

    /// Registers the list form of a kind.
    pub fn register_list<T: ObjectList + Default>(&mut self, version: &str, kind: &str) {
        self.insert::<T>(version, kind, Constructor::List(make_list::<T>));
    }

    fn insert<T: 'static>(&mut self, version: &str, kind: &str, constructor: Constructor) {
        if version.is_empty() {
            panic!("version is required on all registered kinds");
        }
        let vk = VersionKind::new(version, kind);
        if self.constructors.insert(vk.clone(), constructor).is_some() {
            panic!("kind {vk} is registered twice");
        }
        if let Some(previous) = self.kinds.insert(TypeId::of::<T>(), vk) {
            panic!("type registered under a second kind (already {previous})");
        }
    }

    /// Constructs a fresh object of the given kind, with its type meta
    /// stamped from the key.
    pub fn new_object(&self, vk: &VersionKind) -> Result<Box<dyn Object>, Error> {
        match self.constructors.get(vk) {
            Some(Constructor::Object(make)) => {
                let mut obj = make();
                obj.type_meta_mut().set_version_kind(vk);
                Ok(obj)
            }
            _ => Err(Error::NotRegistered { vk: vk.clone() }),
        }
    }

    /// Constructs a fresh list of the given list kind.
    pub fn new_list(&self, vk: &VersionKind) -> Result<Box<dyn ObjectList>, Error> {
        match self.constructors.get(vk) {
            Some(Constructor::List(make)) => {
                let mut list = make();
                list.type_meta_mut().set_version_kind(vk);
                Ok(list)
            }
            _ => Err(Error::NotRegistered { vk: vk.clone() }),
        }
    }

    /// Reverse lookup: the registered identity of `obj`'s concrete type.
    pub fn kind_of(&self, obj: &dyn Object) -> Result<VersionKind, Error> {
        self.kinds
            .get(&obj.as_any().type_id())
            .cloned()
            .ok_or_else(|| Error::NotRegistered {
                vk: obj.type_meta().version_kind(),
            })
    }

    /// Reverse lookup for list types.
    pub fn kind_of_list(&self, list: &dyn ObjectList) -> Result<VersionKind, Error> {
        self.kinds
            .get(&list.as_any().type_id())
            .cloned()
            .ok_or_else(|| Error::NotRegistered {
                vk: list.type_meta().version_kind(),
            })
    }

    /// The registered list kind belonging to `obj`'s kind.
    pub fn list_kind_of(&self, obj: &dyn Object) -> Result<VersionKind, Error> {
        let list_vk = self.kind_of(obj)?.list_kind();
        match self.constructors.get(&list_vk) {
            Some(Constructor::List(_)) => Ok(list_vk),
            _ => Err(Error::NotRegistered { vk: list_vk }),
        }
    }

    /// All registered non-list kinds.
    pub fn known_object_kinds(&self) -> Vec<VersionKind> {
        self.constructors
            .iter()
            .filter(|(_, constructor)| matches!(constructor, Constructor::Object(_)))
            .map(|(vk, _)| vk.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::{test_registry, TestObject};

    use super::*;

    #[test]
    fn constructs_fresh_objects_with_stamped_type_meta() {
        let registry = test_registry();
        let vk = VersionKind::new("v1", "TestObject");

        let obj = registry.new_object(&vk).unwrap();
        assert_eq!(obj.type_meta().version_kind(), vk);
        assert!(obj.as_any().downcast_ref::<TestObject>().is_some());
    }

    #[test]
    fn rejects_unknown_kinds() {
        let registry = test_registry();
        let vk = VersionKind::new("v1", "Nope");

        let err = registry.new_object(&vk).unwrap_err();
        assert!(matches!(err, Error::NotRegistered { .. }));
    }

    #[test]
    fn list_kinds_are_not_object_kinds() {
        let registry = test_registry();
        let vk = VersionKind::new("v1", "TestObjectList");

        assert!(registry.new_object(&vk).is_err());
        assert!(registry.new_list(&vk).is_ok());
    }

    #[test]
    fn reverse_lookup_matches_registration() {
        let registry = test_registry();
        let obj = TestObject::default();

        let vk = registry.kind_of(&obj).unwrap();
        assert_eq!(vk, VersionKind::new("v1", "TestObject"));
        assert_eq!(
            registry.list_kind_of(&obj).unwrap(),
            VersionKind::new("v1", "TestObjectList")
        );
    }

    #[test]
    fn known_object_kinds_skips_lists() {
        let registry = test_registry();

        let kinds = registry.known_object_kinds();
        assert!(kinds.contains(&VersionKind::new("v1", "TestObject")));
        assert!(kinds.contains(&VersionKind::new("v1", "OtherObject")));
        assert!(!kinds.iter().any(|vk| vk.kind.ends_with("List")));
    }

    #[test]
    #[should_panic(expected = "version is required")]
    fn registration_requires_a_version() {
        let mut registry = Registry::new();
        registry.register_object::<TestObject>("", "TestObject");
    }

    #[test]
    #[should_panic(expected = "registered twice")]
    fn duplicate_registration_panics() {
        let mut registry = Registry::new();
        registry.register_object::<TestObject>("v1", "TestObject");
        registry.register_object::<TestObject>("v1", "TestObject");
    }
}
