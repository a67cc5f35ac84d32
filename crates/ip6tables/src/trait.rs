//! Client trait for mocking.

use async_trait::async_trait;

use crate::error::Ip6TablesError;

/// The driver surface the reconciler consumes.
///
/// All methods are `Send` so implementations work under Tokio's
/// work-stealing runtime.
#[async_trait]
pub trait Ip6TablesClientTrait: Send + Sync {
    /// Whether the exact rule spec is present in the given table and chain.
    async fn exists(
        &self,
        table: &str,
        chain: &str,
        rule_spec: &[String],
    ) -> Result<bool, Ip6TablesError>;

    /// Appends the rule spec to the given table and chain.
    async fn append(
        &self,
        table: &str,
        chain: &str,
        rule_spec: &[String],
    ) -> Result<(), Ip6TablesError>;
}
