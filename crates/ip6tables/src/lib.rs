//! ip6tables driver
//!
//! A thin async wrapper around the `ip6tables` binary, reduced to the two
//! operations a reconciler needs: check whether a rule exists and append it
//! if not. The trait exists so reconcilers can be tested against the
//! in-memory mock (feature `test-util`) instead of a live kernel.

pub mod client;
pub mod error;
#[path = "trait.rs"]
pub mod ip6tables_trait;
#[cfg(feature = "test-util")]
pub mod mock;

pub use client::Ip6TablesClient;
pub use error::Ip6TablesError;
pub use ip6tables_trait::Ip6TablesClientTrait;
#[cfg(feature = "test-util")]
pub use mock::{MockIp6TablesClient, Rule};
