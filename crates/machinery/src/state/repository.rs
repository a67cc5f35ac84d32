//! In-memory store for a single kind.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::Error;
use crate::runtime::{Object, ObjectList, Registry, VersionKind};

use super::events::{EventHub, Subscription};
use super::Client;

/// Typed store for one kind with optimistic concurrency, spec/status
/// separation and watch.
///
/// All state sits behind one mutex; events are broadcast inside the critical
/// section, so per-subscription event order equals commit order. Objects are
/// stored as encoded blobs, which detaches them from caller memory.
pub struct Repository {
    registry: Arc<Registry>,
    obj_vk: VersionKind,
    list_vk: VersionKind,
    data: Mutex<HashMap<String, Vec<u8>>>,
    hub: EventHub,
}

impl Repository {
    pub fn new(
        registry: Arc<Registry>,
        obj: &dyn Object,
        list: &dyn ObjectList,
    ) -> Result<Self, Error> {
        let obj_vk = registry.kind_of(obj)?;
        let list_vk = registry.kind_of_list(list)?;
        Ok(Self {
            registry,
            obj_vk,
            list_vk,
            data: Mutex::new(HashMap::new()),
            hub: EventHub::default(),
        })
    }

    /// Closes every open watch subscription.
    pub fn shutdown(&self) {
        self.hub.shutdown();
    }

    fn check_object(&self, obj: &dyn Object) -> Result<(), Error> {
        let vk = self.registry.kind_of(obj)?;
        if vk != self.obj_vk {
            return Err(Error::WrongKind {
                want: self.obj_vk.clone(),
                got: vk,
            });
        }
        Ok(())
    }

    fn check_list(&self, list: &dyn ObjectList) -> Result<(), Error> {
        let vk = self.registry.kind_of_list(list)?;
        if vk != self.list_vk {
            return Err(Error::WrongKind {
                want: self.list_vk.clone(),
                got: vk,
            });
        }
        Ok(())
    }

    fn load_into(
        &self,
        data: &HashMap<String, Vec<u8>>,
        name: &str,
        obj: &mut dyn Object,
    ) -> Result<(), Error> {
        let bytes = data.get(name).ok_or_else(|| Error::NotFound {
            vk: self.obj_vk.clone(),
            name: name.to_string(),
        })?;
        obj.from_json(bytes).map_err(|source| Error::Codec {
            context: format!("decoding {} {name}", self.obj_vk),
            source,
        })
    }

    fn store(&self, data: &mut HashMap<String, Vec<u8>>, obj: &mut dyn Object) -> Result<(), Error> {
        obj.type_meta_mut().set_version_kind(&self.obj_vk);
        let bytes = obj.to_json().map_err(|source| Error::Codec {
            context: format!("encoding {} {}", self.obj_vk, obj.meta().name),
            source,
        })?;
        data.insert(obj.meta().name.clone(), bytes);
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn insert_raw(&self, name: &str, bytes: &[u8]) {
        self.data
            .lock()
            .expect("repository lock poisoned")
            .insert(name.to_string(), bytes.to_vec());
    }

    #[cfg(test)]
    pub(crate) fn raw(&self, name: &str) -> Option<Vec<u8>> {
        self.data
            .lock()
            .expect("repository lock poisoned")
            .get(name)
            .cloned()
    }
}

fn next_resource_version(current: &str) -> String {
    let version: u64 = current.parse().unwrap_or(0);
    (version + 1).to_string()
}

fn snapshot(obj: &dyn Object) -> Arc<dyn Object> {
    Arc::from(obj.clone_object())
}

impl Client for Repository {
    fn get(&self, name: &str, obj: &mut dyn Object) -> Result<(), Error> {
        self.check_object(obj)?;

        let data = self.data.lock().expect("repository lock poisoned");
        self.load_into(&data, name, obj)
    }

    fn list(&self, list: &mut dyn ObjectList) -> Result<(), Error> {
        self.check_list(list)?;

        let data = self.data.lock().expect("repository lock poisoned");
        for bytes in data.values() {
            let mut obj = self.registry.new_object(&self.obj_vk)?;
            obj.from_json(bytes).map_err(|source| Error::Codec {
                context: format!("decoding {} list entry", self.obj_vk),
                source,
            })?;
            list.push_object(obj.as_ref());
        }
        Ok(())
    }

    fn watch(&self, _obj: &dyn Object) -> Result<Subscription, Error> {
        Ok(self.hub.register())
    }

    fn create(&self, obj: &mut dyn Object) -> Result<(), Error> {
        self.check_object(obj)?;

        let mut data = self.data.lock().expect("repository lock poisoned");
        let name = obj.meta().name.clone();
        if data.contains_key(&name) {
            return Err(Error::AlreadyExists {
                vk: self.obj_vk.clone(),
                name,
            });
        }

        let meta = obj.meta_mut();
        meta.generation = 1;
        meta.resource_version = "1".to_string();

        self.store(&mut data, obj)?;
        self.hub.broadcast(None, Some(snapshot(obj)));
        Ok(())
    }

    fn update(&self, obj: &mut dyn Object) -> Result<(), Error> {
        self.check_object(obj)?;

        let mut data = self.data.lock().expect("repository lock poisoned");
        let mut existing = self.registry.new_object(&self.obj_vk)?;
        let name = obj.meta().name.clone();
        self.load_into(&data, &name, existing.as_mut())?;

        if existing.meta().resource_version != obj.meta().resource_version {
            return Err(Error::Conflict {
                vk: self.obj_vk.clone(),
                name,
            });
        }

        let generation = existing.meta().generation + 1;
        let resource_version = next_resource_version(&existing.meta().resource_version);
        let meta = obj.meta_mut();
        meta.generation = generation;
        meta.resource_version = resource_version;

        // Updates never touch status.
        obj.carry_status_from(existing.as_ref());

        self.store(&mut data, obj)?;
        self.hub.broadcast(Some(Arc::from(existing)), Some(snapshot(obj)));
        Ok(())
    }

    fn update_status(&self, obj: &mut dyn Object) -> Result<(), Error> {
        self.check_object(obj)?;

        let mut data = self.data.lock().expect("repository lock poisoned");
        let mut existing = self.registry.new_object(&self.obj_vk)?;
        let name = obj.meta().name.clone();
        self.load_into(&data, &name, existing.as_mut())?;

        if existing.meta().resource_version != obj.meta().resource_version {
            return Err(Error::Conflict {
                vk: self.obj_vk.clone(),
                name,
            });
        }

        // Status updates never touch spec or metadata, and leave the
        // generation alone.
        obj.carry_spec_and_meta_from(existing.as_ref());
        obj.meta_mut().resource_version =
            next_resource_version(&existing.meta().resource_version);

        self.store(&mut data, obj)?;
        self.hub.broadcast(Some(Arc::from(existing)), Some(snapshot(obj)));
        Ok(())
    }

    fn delete(&self, obj: &mut dyn Object) -> Result<(), Error> {
        self.check_object(obj)?;

        let mut data = self.data.lock().expect("repository lock poisoned");
        let name = obj.meta().name.clone();
        self.load_into(&data, &name, obj)?;
        data.remove(&name);
        self.hub.broadcast(Some(snapshot(obj)), None);
        Ok(())
    }
}
