use std::fmt;
use std::net::Ipv4Addr;

use pnet::util::MacAddr;

/// One genuine ARP reply: `ip` is at `mac`, seen on `iface`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DiscoveryRecord {
    pub ip: Ipv4Addr,
    pub mac: MacAddr,
    pub iface: String,
}

impl DiscoveryRecord {
    pub fn new(ip: Ipv4Addr, mac: MacAddr, iface: impl Into<String>) -> Self {
        Self {
            ip,
            mac,
            iface: iface.into(),
        }
    }
}

impl fmt::Display for DiscoveryRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} is at {} ({})", self.ip, self.mac, self.iface)
    }
}
