//! Wire formats spoken by `dug`: Ethernet II framing and ARP over IPv4.

pub mod arp;
pub mod ethernet;

pub const ETH_HDR_LEN: usize = 14;
pub const ARP_LEN: usize = 28;
/// An Ethernet header followed by an IPv4-over-Ethernet ARP body, unpadded.
pub const ARP_FRAME_LEN: usize = ETH_HDR_LEN + ARP_LEN;
