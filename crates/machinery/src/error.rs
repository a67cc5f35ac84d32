//! Error types shared across the machinery crate.

use std::path::PathBuf;

use thiserror::Error;

use crate::runtime::VersionKind;

/// Errors returned by the registry, the repositories and the config
/// bootstrap.
#[derive(Debug, Error)]
pub enum Error {
    /// Key absent from a repository.
    #[error("{vk}: {name} not found")]
    NotFound { vk: VersionKind, name: String },

    /// Duplicate create.
    #[error("{vk}: {name} already exists")]
    AlreadyExists { vk: VersionKind, name: String },

    /// Optimistic-concurrency mismatch on update.
    #[error("{vk}: {name} conflicting resource version")]
    Conflict { vk: VersionKind, name: String },

    /// An object of a different kind reached a repository boundary.
    #[error("wrong kind given to repository: want {want}, got {got}")]
    WrongKind { want: VersionKind, got: VersionKind },

    /// Lookup of a kind the registry does not know.
    #[error("kind {vk} is not registered")]
    NotRegistered { vk: VersionKind },

    /// The meta-repository received a kind without a repository.
    #[error("no repository registered for kind {vk}")]
    NoRepository { vk: VersionKind },

    /// Serialization or deserialization failure in the store codec.
    #[error("{context}: {source}")]
    Codec {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// A config file could not be read during bootstrap.
    #[error("reading config file {}: {source}", path.display())]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A config document could not be decoded during bootstrap.
    #[error("parsing document in {}: {message}", path.display())]
    ParseDocument { path: PathBuf, message: String },
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, Error::AlreadyExists { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Conflict { .. })
    }
}
