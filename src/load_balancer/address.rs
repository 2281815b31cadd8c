//! Sequential local address derivation.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("address range starting at {base} cannot hold {count} addresses")]
    Exhausted { base: IpAddr, count: usize },
}

/// The address immediately after `addr`, or `None` at the end of the address space.
pub fn successor(addr: IpAddr) -> Option<IpAddr> {
    match addr {
        IpAddr::V4(v4) => u32::from(v4)
            .checked_add(1)
            .map(|n| IpAddr::V4(Ipv4Addr::from(n))),
        IpAddr::V6(v6) => u128::from(v6)
            .checked_add(1)
            .map(|n| IpAddr::V6(Ipv6Addr::from(n))),
    }
}

/// `count` consecutive addresses starting at `base` (inclusive).
pub fn sequential(base: IpAddr, count: usize) -> Result<Vec<IpAddr>, AddressError> {
    let mut addresses = Vec::with_capacity(count);
    let mut current = Some(base);

    for _ in 0..count {
        let addr = current.ok_or(AddressError::Exhausted { base, count })?;
        addresses.push(addr);
        current = successor(addr);
    }

    Ok(addresses)
}

/// Shell command that assigns `addr` to `interface`.
pub fn provisioning_command(addr: IpAddr, interface: &str) -> String {
    match addr {
        IpAddr::V6(_) => format!("sudo ip -6 addr add {}/64 dev {}", addr, interface),
        IpAddr::V4(_) => format!("sudo ip addr add {}/32 dev {}", addr, interface),
    }
}
