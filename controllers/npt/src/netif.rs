//! Interface address lookup via netlink.

use std::net::{IpAddr, Ipv6Addr};

use futures::TryStreamExt;
use ipnet::Ipv6Net;
use rtnetlink::packet_route::address::AddressAttribute;

use crate::error::NptError;

/// Resolves an interface name to the IPv6 network it sits in.
///
/// IPv4 and link-local addresses are skipped; of the remaining networks the
/// last one the kernel reports wins (enumeration order is stable on a given
/// kernel).
pub async fn interface_network(name: &str) -> Result<Ipv6Net, NptError> {
    let lookup_err = |message: String| NptError::InterfaceLookup {
        name: name.to_string(),
        message,
    };

    let (connection, handle, _) =
        rtnetlink::new_connection().map_err(|err| lookup_err(err.to_string()))?;
    tokio::spawn(connection);

    let mut links = handle.link().get().match_name(name.to_string()).execute();
    let link = links
        .try_next()
        .await
        .map_err(|err| lookup_err(err.to_string()))?
        .ok_or_else(|| lookup_err("no such interface".to_string()))?;

    let mut addresses = handle
        .address()
        .get()
        .set_link_index_filter(link.header.index)
        .execute();

    let mut networks = Vec::new();
    while let Some(message) = addresses
        .try_next()
        .await
        .map_err(|err| lookup_err(err.to_string()))?
    {
        let prefix_len = message.header.prefix_len;
        for attribute in message.attributes {
            if let AddressAttribute::Address(IpAddr::V6(addr)) = attribute {
                if let Ok(net) = Ipv6Net::new(addr, prefix_len) {
                    networks.push(net);
                }
            }
        }
    }

    last_global(networks).ok_or_else(|| NptError::NoGlobalAddress {
        name: name.to_string(),
    })
}

/// Keeps non-link-local networks and picks the last one, truncated to its
/// network address.
fn last_global(networks: impl IntoIterator<Item = Ipv6Net>) -> Option<Ipv6Net> {
    networks
        .into_iter()
        .filter(|net| !is_link_local(net.addr()))
        .last()
        .map(|net| net.trunc())
}

/// fe80::/10
fn is_link_local(addr: Ipv6Addr) -> bool {
    (addr.segments()[0] & 0xffc0) == 0xfe80
}

#[cfg(test)]
mod tests {
    use super::*;

    fn net(s: &str) -> Ipv6Net {
        s.parse().unwrap()
    }

    #[test]
    fn skips_link_local_addresses() {
        let picked = last_global(vec![net("fe80::1/64"), net("2001:db8::1/64")]);
        assert_eq!(picked, Some(net("2001:db8::/64")));
    }

    #[test]
    fn picks_the_last_global_network() {
        let picked = last_global(vec![
            net("2001:db8::1/64"),
            net("fe80::1/64"),
            net("2001:db8:1::1/64"),
        ]);
        assert_eq!(picked, Some(net("2001:db8:1::/64")));
    }

    #[test]
    fn empty_when_only_link_local() {
        assert_eq!(last_global(vec![net("fe80::1/64")]), None);
    }
}
