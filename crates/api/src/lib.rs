//! The record kinds nptd manages.
//!
//! One concrete kind today: [`NetworkMap`], which declares how private IPv6
//! networks map onto public ones via Network Prefix Translation.

mod network_map;

pub use network_map::*;

use machinery::runtime::Registry;

/// API version of every kind in this crate.
pub const VERSION: &str = "v1";

/// Registers all kinds with the given registry.
pub fn add_to_registry(registry: &mut Registry) {
    registry.register_object::<NetworkMap>(VERSION, "NetworkMap");
    registry.register_list::<NetworkMapList>(VERSION, "NetworkMapList");
}
