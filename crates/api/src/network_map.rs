//! NetworkMap: maps one IPv6 network onto another with NPT.

use std::any::Any;

use serde::{Deserialize, Serialize};

use machinery::runtime::{Object, ObjectList, ObjectMeta, TypeMeta};

/// Maps private IPv6 networks onto public ones via Network Prefix
/// Translation on a WAN interface.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkMap {
    #[serde(flatten)]
    pub type_meta: TypeMeta,
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: NetworkMapSpec,
    #[serde(default)]
    pub status: NetworkMapStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NetworkMapSpec {
    /// Egress interface, used as `-i <iface>` / `-o <iface>` in the rule
    /// spec.
    pub wan_interface: String,
    /// How private networks are mapped to public networks.
    pub netmap: Vec<NetMap>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetMap {
    /// Private network, typically in the fd00::/8 range.
    pub private: NetworkPointer,
    /// Public network.
    pub public: NetworkPointer,
}

/// Names a network directly, or tells the controller how to look it up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkPointer {
    /// A literal CIDR.
    Static(String),
    /// An interface; its last non-link-local IPv6 network is used.
    Interface(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NetworkMapStatus {
    /// The spec generation the controller last acted on.
    pub observed_generation: i64,
    /// The networks actually materialized into rules, one entry per
    /// successfully resolved spec entry.
    pub netmap: Vec<NetMapStatus>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetMapStatus {
    pub private: String,
    pub public: String,
}

impl Object for NetworkMap {
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
pub struct NetworkMapList {
    #[serde(flatten)]
    pub type_meta: TypeMeta,
    #[serde(default)]
    pub items: Vec<NetworkMap>,
}

impl ObjectList for NetworkMapList {
    fn type_meta(&self) -> &TypeMeta {
        &self.type_meta
    }

    fn type_meta_mut(&mut self) -> &mut TypeMeta {
        &mut self.type_meta
    }

    fn push_object(&mut self, item: &dyn Object) -> bool {
        match item.as_any().downcast_ref::<NetworkMap>() {
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
