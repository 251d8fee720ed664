//! IPAM request translation.
//!
//! Address allocation itself belongs to the network controller. This module only
//! turns the pools a client asked for into per-family controller configuration.

use crate::error::{BerthError, Result};
use crate::types::IpamPool;
use std::collections::HashMap;
use std::net::IpAddr;

/// Pool configuration handed to the controller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IpamConf {
    /// Pool the network should be carved from
    pub preferred_pool: String,
    /// Sub-range to allocate container addresses from
    pub sub_pool: String,
    /// Gateway address
    pub gateway: String,
    /// Reserved auxiliary addresses
    pub aux_addresses: HashMap<String, String>,
}

impl From<&IpamPool> for IpamConf {
    fn from(pool: &IpamPool) -> Self {
        Self {
            preferred_pool: pool.subnet.clone(),
            sub_pool: pool.ip_range.clone(),
            gateway: pool.gateway.clone(),
            aux_addresses: pool.aux_addresses.clone(),
        }
    }
}

/// Parse a CIDR string into its address and prefix length.
pub fn parse_cidr(cidr: &str) -> std::result::Result<(IpAddr, u8), String> {
    let invalid = || format!("invalid CIDR address: {}", cidr);

    let (addr, prefix) = cidr.split_once('/').ok_or_else(invalid)?;
    let addr: IpAddr = addr.parse().map_err(|_| invalid())?;
    if prefix.is_empty() || !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let prefix: u8 = prefix.parse().map_err(|_| invalid())?;

    let max = if addr.is_ipv4() { 32 } else { 128 };
    if prefix > max {
        return Err(invalid());
    }

    Ok((addr, prefix))
}

/// Split requested pools into IPv4 and IPv6 configuration, in request order.
///
/// Every pool must carry a valid CIDR subnet; its address family decides the list.
/// IPv4-mapped IPv6 subnets count as IPv4.
pub fn split_ipam_config(pools: &[IpamPool]) -> Result<(Vec<IpamConf>, Vec<IpamConf>)> {
    let mut v4 = Vec::new();
    let mut v6 = Vec::new();

    for pool in pools {
        let (addr, _) = parse_cidr(&pool.subnet).map_err(|reason| BerthError::InvalidSubnet {
            subnet: pool.subnet.clone(),
            reason,
        })?;

        let is_v4 = matches!(addr, IpAddr::V4(_))
            || matches!(addr, IpAddr::V6(a) if a.to_ipv4_mapped().is_some());
        if is_v4 {
            v4.push(IpamConf::from(pool));
        } else {
            v6.push(IpamConf::from(pool));
        }
    }

    Ok((v4, v6))
}
