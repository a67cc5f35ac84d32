//! Controller-specific error types.

use thiserror::Error;

/// Errors raised while reconciling a NetworkMap.
#[derive(Debug, Error)]
pub enum NptError {
    /// State store error.
    #[error("state error: {0}")]
    State(#[from] machinery::Error),

    /// A static pointer did not parse as an IPv6 network.
    #[error("invalid network {cidr}: {source}")]
    InvalidNetwork {
        cidr: String,
        #[source]
        source: ipnet::AddrParseError,
    },

    /// Netlink trouble while resolving an interface pointer.
    #[error("looking up interface {name}: {message}")]
    InterfaceLookup { name: String, message: String },

    /// The interface exists but carries no usable IPv6 network.
    #[error("interface {name} has no global IPv6 address")]
    NoGlobalAddress { name: String },

    /// Probing the packet filter for an existing rule failed.
    #[error("checking rule exists: {0}")]
    RuleCheck(#[source] ip6tables::Ip6TablesError),

    /// Appending a rule failed.
    #[error("appending rule: {0}")]
    RuleAppend(#[source] ip6tables::Ip6TablesError),
}
