use pnet::datalink::NetworkInterface;
use pnet::ipnetwork::{IpNetwork, Ipv4Network};
use pnet::util::MacAddr;

use crate::error::ValidationError;
use crate::network::range::SubnetTarget;

pub trait NetworkInterfaceExtension {
    /// The first IPv4 network assigned to the interface, in OS order.
    fn first_ipv4_net(&self) -> Option<Ipv4Network>;
    /// The hardware address, unless it is absent or all zeroes.
    fn hardware_addr(&self) -> Option<MacAddr>;
}

impl NetworkInterfaceExtension for NetworkInterface {
    fn first_ipv4_net(&self) -> Option<Ipv4Network> {
        self.ips.iter().find_map(|ip| match ip {
            IpNetwork::V4(ipv4) => Some(*ipv4),
            IpNetwork::V6(_) => None,
        })
    }

    fn hardware_addr(&self) -> Option<MacAddr> {
        self.mac.filter(|mac| *mac != MacAddr::zero())
    }
}

/// A validated interface, ready to be probed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeTarget {
    pub iface: String,
    pub mac: MacAddr,
    pub subnet: SubnetTarget,
}

impl TryFrom<&NetworkInterface> for ProbeTarget {
    type Error = ValidationError;

    fn try_from(interface: &NetworkInterface) -> Result<Self, Self::Error> {
        let subnet = subnet_target(interface)?;
        let mac = interface
            .hardware_addr()
            .ok_or(ValidationError::NoHardwareAddress)?;

        Ok(Self {
            iface: interface.name.clone(),
            mac,
            subnet,
        })
    }
}

/// Derives the sweep range from the interface's first IPv4 address.
///
/// Loopback networks are refused, and so is anything wider than a /16.
pub fn subnet_target(interface: &NetworkInterface) -> Result<SubnetTarget, ValidationError> {
    let net = interface
        .first_ipv4_net()
        .ok_or(ValidationError::NoAddress)?;
    let subnet = SubnetTarget::new(net.ip(), net.mask());

    if subnet.addr.octets()[0] == 127 {
        return Err(ValidationError::Loopback);
    }
    let mask = subnet.mask.octets();
    if mask[0] != 0xff || mask[1] != 0xff {
        return Err(ValidationError::SubnetTooLarge);
    }

    Ok(subnet)
}

pub fn find_by_name<'a>(interfaces: &'a [NetworkInterface], name: &str) -> Option<&'a NetworkInterface> {
    interfaces.iter().find(|interface| interface.name == name)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
