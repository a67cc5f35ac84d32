//! Object vocabulary: identity, metadata and the type-erased traits every
//! stored kind implements.

mod registry;

pub use registry::Registry;

use std::any::Any;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identity of a kind: `(version, kind)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionKind {
    pub version: String,
    pub kind: String,
}

impl VersionKind {
    pub fn new(version: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            kind: kind.into(),
        }
    }

    /// Identity of the list kind belonging to this kind.
    pub fn list_kind(&self) -> VersionKind {
        VersionKind {
            version: self.version.clone(),
            kind: format!("{}List", self.kind),
        }
    }
}

impl fmt::Display for VersionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.version, self.kind)
    }
}

/// Kind identity carried inline at the top of every document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeMeta {
    pub kind: String,
    pub version: String,
}

impl TypeMeta {
    pub fn version_kind(&self) -> VersionKind {
        VersionKind::new(&self.version, &self.kind)
    }

    pub fn set_version_kind(&mut self, vk: &VersionKind) {
        self.version = vk.version.clone();
        self.kind = vk.kind.clone();
    }
}

/// Per-object metadata, serialized under `metadata`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ObjectMeta {
    /// Unique within a kind.
    pub name: String,
    /// Incremented on every spec change.
    pub generation: i64,
    /// Opaque token for optimistic concurrency.
    pub resource_version: String,
}

/// A named, stored record.
///
/// The carry hooks implement the spec/status separation: `update` carries
/// status forward from the stored object, `update_status` carries spec and
/// metadata. Implementations downcast `existing` to `Self` and copy the
/// relevant sub-structs.
pub trait Object: Any + Send + Sync + fmt::Debug {
    fn type_meta(&self) -> &TypeMeta;
    fn type_meta_mut(&mut self) -> &mut TypeMeta;
    fn meta(&self) -> &ObjectMeta;
    fn meta_mut(&mut self) -> &mut ObjectMeta;

    /// Encodes the object with the store codec.
    fn to_json(&self) -> Result<Vec<u8>, serde_json::Error>;
    /// Replaces the object with the decoded form of `data`.
    fn from_json(&mut self, data: &[u8]) -> Result<(), serde_json::Error>;

    fn carry_status_from(&mut self, existing: &dyn Object);
    fn carry_spec_and_meta_from(&mut self, existing: &dyn Object);

    fn clone_object(&self) -> Box<dyn Object>;
    fn as_any(&self) -> &dyn Any;
}

/// The list form of a kind: a type meta plus an `items` sequence.
pub trait ObjectList: Any + Send + Sync + fmt::Debug {
    fn type_meta(&self) -> &TypeMeta;
    fn type_meta_mut(&mut self) -> &mut TypeMeta;

    /// Downcasts `item` and appends it to `items`. Returns false when the
    /// item is of a different kind.
    fn push_object(&mut self, item: &dyn Object) -> bool;

    fn as_any(&self) -> &dyn Any;
}
