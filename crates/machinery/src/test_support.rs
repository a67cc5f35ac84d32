//! Test kinds shared by the machinery test suites.

use std::any::Any;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::runtime::{Object, ObjectList, ObjectMeta, Registry, TypeMeta};

/// Registry with the test kinds registered, the way the daemon registers its
/// real kinds at startup.
pub fn test_registry() -> Arc<Registry> {
    let mut registry = Registry::new();
    registry.register_object::<TestObject>("v1", "TestObject");
    registry.register_list::<TestObjectList>("v1", "TestObjectList");
    registry.register_object::<OtherObject>("v1", "OtherObject");
    registry.register_list::<OtherObjectList>("v1", "OtherObjectList");
    Arc::new(registry)
}

pub fn named(name: &str) -> TestObject {
    TestObject {
        metadata: ObjectMeta {
            name: name.to_string(),
            ..Default::default()
        },
        ..Default::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestObject {
    #[serde(flatten)]
    pub type_meta: TypeMeta,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: TestSpec,
    #[serde(default)]
    pub status: TestStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestSpec {
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TestStatus {
    pub observed_value: String,
}

impl Object for TestObject {
    fn type_meta(&self) -> &TypeMeta {
        &self.type_meta
    }

    fn type_meta_mut(&mut self) -> &mut TypeMeta {
        &mut self.type_meta
    }

    fn meta(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn meta_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }

    fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    fn from_json(&mut self, data: &[u8]) -> Result<(), serde_json::Error> {
        *self = serde_json::from_slice(data)?;
        Ok(())
    }

    fn carry_status_from(&mut self, existing: &dyn Object) {
        if let Some(existing) = existing.as_any().downcast_ref::<Self>() {
            self.status = existing.status.clone();
        }
    }

    fn carry_spec_and_meta_from(&mut self, existing: &dyn Object) {
        if let Some(existing) = existing.as_any().downcast_ref::<Self>() {
            self.metadata = existing.metadata.clone();
            self.spec = existing.spec.clone();
        }
    }

    fn clone_object(&self) -> Box<dyn Object> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TestObjectList {
    #[serde(flatten)]
    pub type_meta: TypeMeta,
    #[serde(default)]
    pub items: Vec<TestObject>,
}

impl ObjectList for TestObjectList {
    fn type_meta(&self) -> &TypeMeta {
        &self.type_meta
    }

    fn type_meta_mut(&mut self) -> &mut TypeMeta {
        &mut self.type_meta
    }

    fn push_object(&mut self, item: &dyn Object) -> bool {
        match item.as_any().downcast_ref::<TestObject>() {
            Some(obj) => {
                self.items.push(obj.clone());
                true
            }
            None => false,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A second kind, for exercising kind routing and wrong-kind rejection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OtherObject {
    #[serde(flatten)]
    pub type_meta: TypeMeta,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: TestSpec,
}

impl Object for OtherObject {
    fn type_meta(&self) -> &TypeMeta {
        &self.type_meta
    }

    fn type_meta_mut(&mut self) -> &mut TypeMeta {
        &mut self.type_meta
    }

    fn meta(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn meta_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }

    fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    fn from_json(&mut self, data: &[u8]) -> Result<(), serde_json::Error> {
        *self = serde_json::from_slice(data)?;
        Ok(())
    }

    fn carry_status_from(&mut self, _existing: &dyn Object) {}

    fn carry_spec_and_meta_from(&mut self, existing: &dyn Object) {
        if let Some(existing) = existing.as_any().downcast_ref::<Self>() {
            self.metadata = existing.metadata.clone();
            self.spec = existing.spec.clone();
        }
    }

    fn clone_object(&self) -> Box<dyn Object> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OtherObjectList {
    #[serde(flatten)]
    pub type_meta: TypeMeta,
    #[serde(default)]
    pub items: Vec<OtherObject>,
}

impl ObjectList for OtherObjectList {
    fn type_meta(&self) -> &TypeMeta {
        &self.type_meta
    }

    fn type_meta_mut(&mut self) -> &mut TypeMeta {
        &mut self.type_meta
    }

    fn push_object(&mut self, item: &dyn Object) -> bool {
        match item.as_any().downcast_ref::<OtherObject>() {
            Some(obj) => {
                self.items.push(obj.clone());
                true
            }
            None => false,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
