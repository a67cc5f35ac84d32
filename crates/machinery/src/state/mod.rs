//! The in-memory object store: per-kind repositories composed behind a
//! single client, with watch and YAML-directory bootstrap.

mod events;
mod meta_repository;
mod repository;

#[cfg(test)]
mod repository_test;

pub use events::{Event, EventType, Subscription};
pub use meta_repository::MetaRepository;
pub use repository::Repository;

use crate::error::Error;
use crate::runtime::{Object, ObjectList};

/// The operation vocabulary shared by [`Repository`] and
/// [`MetaRepository`].
///
/// Readers decode into caller-provided objects; writers mutate the caller's
/// object in place so it observes the assigned generation and resource
/// version.
pub trait Client: Send + Sync {
    fn get(&self, name: &str, obj: &mut dyn Object) -> Result<(), Error>;
    fn list(&self, list: &mut dyn ObjectList) -> Result<(), Error>;
    /// Opens an event stream for the kind of `obj`. Events begin after
    /// registration; callers needing a consistent snapshot should `list`
    /// after `watch` and merge.
    fn watch(&self, obj: &dyn Object) -> Result<Subscription, Error>;
    fn create(&self, obj: &mut dyn Object) -> Result<(), Error>;
    fn update(&self, obj: &mut dyn Object) -> Result<(), Error>;
    fn update_status(&self, obj: &mut dyn Object) -> Result<(), Error>;
    fn delete(&self, obj: &mut dyn Object) -> Result<(), Error>;
}
