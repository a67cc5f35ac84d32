//! Kind-routed composite over per-kind repositories.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;
use walkdir::WalkDir;

use crate::error::Error;
use crate::runtime::{Object, ObjectList, Registry, TypeMeta, VersionKind};

use super::events::Subscription;
use super::repository::Repository;
use super::Client;

/// One repository per known kind, addressed through a single [`Client`].
///
/// The object kind and its list kind both route to the same repository.
pub struct MetaRepository {
    registry: Arc<Registry>,
    repositories: HashMap<VersionKind, Arc<Repository>>,
}

impl MetaRepository {
    /// Builds a repository for every non-list kind the registry knows.
    pub fn new(registry: Arc<Registry>) -> Result<Self, Error> {
        let mut repositories = HashMap::new();
        for vk in registry.known_object_kinds() {
            let obj = registry.new_object(&vk)?;
            let list_vk = registry.list_kind_of(obj.as_ref())?;
            let list = registry.new_list(&list_vk)?;

            let repository = Arc::new(Repository::new(
                Arc::clone(&registry),
                obj.as_ref(),
                list.as_ref(),
            )?);
            repositories.insert(vk, Arc::clone(&repository));
            repositories.insert(list_vk, repository);
        }
        Ok(Self {
            registry,
            repositories,
        })
    }

    /// Seeds the store from a directory of multi-document YAML files,
    /// walked recursively.
    ///
    /// Every document is created through the regular `create` path, so
    /// duplicate names surface as [`Error::AlreadyExists`] and abort the
    /// bootstrap. The stop signal is checked at each file boundary.
    pub fn load_from_directory(
        &self,
        folder: impl AsRef<Path>,
        stop: &watch::Receiver<bool>,
    ) -> Result<(), Error> {
        for entry in WalkDir::new(folder.as_ref()).follow_links(true) {
            if *stop.borrow() {
                return Ok(());
            }
            let entry = entry.map_err(|err| {
                let path = err
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| folder.as_ref().to_path_buf());
                Error::ReadConfig {
                    path,
                    source: err.into(),
                }
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let contents = fs::read_to_string(path).map_err(|source| Error::ReadConfig {
                path: path.to_path_buf(),
                source,
            })?;

            for document in contents.split("\n---") {
                self.import_document(path, document)?;
            }
        }
        Ok(())
    }

    fn import_document(&self, path: &Path, document: &str) -> Result<(), Error> {
        // First pass: just the type meta, to pick the kind.
        let type_meta: TypeMeta =
            serde_yaml::from_str(document).map_err(|err| Error::ParseDocument {
                path: path.to_path_buf(),
                message: err.to_string(),
            })?;
        let vk = type_meta.version_kind();

        let mut obj = self
            .registry
            .new_object(&vk)
            .map_err(|err| Error::ParseDocument {
                path: path.to_path_buf(),
                message: err.to_string(),
            })?;

        // Second pass through the store codec, so user documents and stored
        // blobs share one wire form.
        let value: serde_json::Value =
            serde_yaml::from_str(document).map_err(|err| Error::ParseDocument {
                path: path.to_path_buf(),
                message: err.to_string(),
            })?;
        let bytes = serde_json::to_vec(&value).map_err(|source| Error::Codec {
            context: format!("re-encoding document from {}", path.display()),
            source,
        })?;
        obj.from_json(&bytes).map_err(|err| Error::ParseDocument {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;

        info!("imported {} {} from {}", vk, obj.meta().name, path.display());
        self.create(obj.as_mut())
    }

    /// Closes all watch subscriptions on every repository.
    pub fn shutdown(&self) {
        for repository in self.repositories.values() {
            repository.shutdown();
        }
    }

    fn repository_for(&self, obj: &dyn Object) -> Result<&Arc<Repository>, Error> {
        let vk = self.registry.kind_of(obj)?;
        self.repositories
            .get(&vk)
            .ok_or(Error::NoRepository { vk })
    }

    fn repository_for_list(&self, list: &dyn ObjectList) -> Result<&Arc<Repository>, Error> {
        let vk = self.registry.kind_of_list(list)?;
        self.repositories
            .get(&vk)
            .ok_or(Error::NoRepository { vk })
    }
}

impl Client for MetaRepository {
    fn get(&self, name: &str, obj: &mut dyn Object) -> Result<(), Error> {
        self.repository_for(obj)?.get(name, obj)
    }

    fn list(&self, list: &mut dyn ObjectList) -> Result<(), Error> {
        self.repository_for_list(list)?.list(list)
    }

    fn watch(&self, obj: &dyn Object) -> Result<Subscription, Error> {
        self.repository_for(obj)?.watch(obj)
    }

    fn create(&self, obj: &mut dyn Object) -> Result<(), Error> {
        self.repository_for(obj)?.create(obj)
    }

    fn update(&self, obj: &mut dyn Object) -> Result<(), Error> {
        self.repository_for(obj)?.update(obj)
    }

    fn update_status(&self, obj: &mut dyn Object) -> Result<(), Error> {
        self.repository_for(obj)?.update_status(obj)
    }

    fn delete(&self, obj: &mut dyn Object) -> Result<(), Error> {
        self.repository_for(obj)?.delete(obj)
    }
}
