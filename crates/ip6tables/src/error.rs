//! ip6tables driver errors.

use std::process::ExitStatus;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Ip6TablesError {
    /// The binary could not be spawned.
    #[error("running {command}: {source}")]
    Exec {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The binary ran but reported failure.
    #[error("{command} failed ({status}): {stderr}")]
    CommandFailed {
        command: String,
        status: ExitStatus,
        stderr: String,
    },
}
