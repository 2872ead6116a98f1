use std::net::Ipv4Addr;

use dug_common::error::CodecError;
use pnet::packet::Packet;
use pnet::packet::arp::{ArpHardwareTypes, ArpOperation, ArpOperations, ArpPacket, MutableArpPacket};
use pnet::packet::ethernet::EtherTypes;
use pnet::util::MacAddr;

use crate::{ARP_FRAME_LEN, ARP_LEN, ETH_HDR_LEN, ethernet};

/// The fields of an IPv4-over-Ethernet ARP body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArpFrame {
    pub operation: ArpOperation,
    pub sender_mac: MacAddr,
    pub sender_ip: Ipv4Addr,
    pub target_mac: MacAddr,
    pub target_ip: Ipv4Addr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArpReply {
    pub sender_ip: Ipv4Addr,
    pub sender_mac: MacAddr,
}

/// Outcome of inspecting one captured frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoded {
    /// Not ARP, or too short or oddly sized to be read as ARP.
    NotArp,
    /// A well-formed ARP frame that is not somebody else's reply.
    Ignored,
    Reply(ArpReply),
}

/// Builds a broadcast who-has request for `dst_addr`, sourced from `src_mac`/`src_addr`.
pub fn encode_request(src_mac: MacAddr, src_addr: Ipv4Addr, dst_addr: Ipv4Addr) -> Result<Vec<u8>, CodecError> {
    let mut buffer = vec![0u8; ARP_FRAME_LEN];
    ethernet::make_header(&mut buffer, src_mac, MacAddr::broadcast(), EtherTypes::Arp)?;
    request_payload(&mut buffer, src_mac, src_addr, dst_addr)?;
    Ok(buffer)
}

fn request_payload(
    buffer: &mut [u8],
    src_mac: MacAddr,
    src_addr: Ipv4Addr,
    target_addr: Ipv4Addr,
) -> Result<(), CodecError> {
    let len = buffer.len();
    let too_small = CodecError::BufferTooSmall { layer: "ARP", len };
    if ETH_HDR_LEN + ARP_LEN > len {
        return Err(too_small);
    }
    let mut arp = MutableArpPacket::new(&mut buffer[ETH_HDR_LEN..ETH_HDR_LEN + ARP_LEN]).ok_or(too_small)?;
    arp.set_hardware_type(ArpHardwareTypes::Ethernet);
    arp.set_protocol_type(EtherTypes::Ipv4);
    arp.set_hw_addr_len(6);
    arp.set_proto_addr_len(4);
    arp.set_operation(ArpOperations::Request);
    arp.set_sender_hw_addr(src_mac);
    arp.set_sender_proto_addr(src_addr);
    arp.set_target_hw_addr(MacAddr::zero());
    arp.set_target_proto_addr(target_addr);
    Ok(())
}

/// Reads the ARP body of an Ethernet frame, if there is a well-formed one.
pub fn parse(frame: &[u8]) -> Option<ArpFrame> {
    let eth = ethernet::get_packet_from_u8(frame)?;
    if eth.get_ethertype() != EtherTypes::Arp {
        return None;
    }
    let arp = ArpPacket::new(eth.payload())?;
    if arp.get_hw_addr_len() != 6 || arp.get_proto_addr_len() != 4 {
        return None;
    }

    Some(ArpFrame {
        operation: arp.get_operation(),
        sender_mac: arp.get_sender_hw_addr(),
        sender_ip: arp.get_sender_proto_addr(),
        target_mac: arp.get_target_hw_addr(),
        target_ip: arp.get_target_proto_addr(),
    })
}

/// Classifies a captured frame as seen from the interface owning `local_mac`.
///
/// Only replies sent by another station are reported. Requests, and anything
/// carrying our own hardware address as sender, are ignored.
pub fn decode_reply(frame: &[u8], local_mac: MacAddr) -> Decoded {
    let Some(arp) = parse(frame) else {
        return Decoded::NotArp;
    };
    if arp.operation != ArpOperations::Reply || arp.sender_mac == local_mac {
        return Decoded::Ignored;
    }

    Decoded::Reply(ArpReply {
        sender_ip: arp.sender_ip,
        sender_mac: arp.sender_mac,
    })
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
