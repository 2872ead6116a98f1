use std::fmt;
use std::iter::FusedIterator;
use std::net::Ipv4Addr;

/// Decides which addresses of a subnet end up in the probe plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HostPolicy {
    /// Every host address: the network and broadcast addresses are left out.
    #[default]
    HostsOnly,
    /// Walk from the network address until the mask counter saturates.
    ///
    /// Includes the network address, stops short of the broadcast address.
    MaskWalk,
}

/// The IPv4 network a probe sweeps: the interface's own address and its mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubnetTarget {
    pub addr: Ipv4Addr,
    pub mask: Ipv4Addr,
}

impl SubnetTarget {
    pub fn new(addr: Ipv4Addr, mask: Ipv4Addr) -> Self {
        Self { addr, mask }
    }

    pub fn network(&self) -> Ipv4Addr {
        Ipv4Addr::from(u32::from(self.addr) & u32::from(self.mask))
    }

    pub fn prefix(&self) -> u32 {
        u32::from(self.mask).leading_ones()
    }

    pub fn contains(&self, ip: Ipv4Addr) -> bool {
        let mask = u32::from(self.mask);
        u32::from(ip) & mask == u32::from(self.addr) & mask
    }

    /// A fresh, lazy plan over this subnet. Calling it again restarts the walk.
    pub fn plan(&self, policy: HostPolicy) -> AddressPlan {
        AddressPlan::new(*self, policy)
    }
}

impl fmt::Display for SubnetTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.addr, self.prefix())
    }
}

/// Ascending walk over the addresses of a [`SubnetTarget`].
///
/// The running address and a counter seeded from the mask advance together;
/// the walk ends once the counter reaches all-ones.
#[derive(Debug, Clone)]
pub struct AddressPlan {
    next: u32,
    counter: u32,
}

impl AddressPlan {
    pub fn new(subnet: SubnetTarget, policy: HostPolicy) -> Self {
        let mask = u32::from(subnet.mask);
        let mut plan = Self {
            next: u32::from(subnet.addr) & mask,
            counter: mask,
        };
        if policy == HostPolicy::HostsOnly {
            plan.advance();
        }
        plan
    }

    fn advance(&mut self) {
        if self.counter < u32::MAX {
            self.next = self.next.wrapping_add(1);
            self.counter += 1;
        }
    }
}

impl Iterator for AddressPlan {
    type Item = Ipv4Addr;

    fn next(&mut self) -> Option<Ipv4Addr> {
        if self.counter == u32::MAX {
            return None;
        }
        let addr = Ipv4Addr::from(self.next);
        self.advance();
        Some(addr)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (u32::MAX - self.counter) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for AddressPlan {}

impl FusedIterator for AddressPlan {}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
