//! The real client: shells out to the `ip6tables` binary.

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::error::Ip6TablesError;
use crate::ip6tables_trait::Ip6TablesClientTrait;

const DEFAULT_COMMAND: &str = "ip6tables";

/// Drives the kernel's IPv6 packet filter through the `ip6tables` binary.
///
/// Every invocation passes `-w` so concurrent xtables users block on the
/// lock instead of failing.
pub struct Ip6TablesClient {
    command: String,
}

impl Ip6TablesClient {
    pub fn new() -> Self {
        Self {
            command: DEFAULT_COMMAND.to_string(),
        }
    }

    /// Uses a different binary, e.g. `ip6tables-legacy`.
    pub fn with_command(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    async fn run(&self, args: &[&str], rule_spec: &[String]) -> Result<std::process::Output, Ip6TablesError> {
        debug!("{} {} {}", self.command, args.join(" "), rule_spec.join(" "));
        Command::new(&self.command)
            .arg("-w")
            .args(args)
            .args(rule_spec)
            .output()
            .await
            .map_err(|source| Ip6TablesError::Exec {
                command: self.command.clone(),
                source,
            })
    }
}

impl Default for Ip6TablesClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Ip6TablesClientTrait for Ip6TablesClient {
    async fn exists(
        &self,
        table: &str,
        chain: &str,
        rule_spec: &[String],
    ) -> Result<bool, Ip6TablesError> {
        let output = self.run(&["-t", table, "-C", chain], rule_spec).await?;
        match output.status.code() {
            Some(0) => Ok(true),
            // `-C` reports a missing rule with exit code 1.
            Some(1) => Ok(false),
            _ => Err(Ip6TablesError::CommandFailed {
                command: self.command.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }),
        }
    }

    async fn append(
        &self,
        table: &str,
        chain: &str,
        rule_spec: &[String],
    ) -> Result<(), Ip6TablesError> {
        let output = self.run(&["-t", table, "-A", chain], rule_spec).await?;
        if !output.status.success() {
            return Err(Ip6TablesError::CommandFailed {
                command: self.command.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}
