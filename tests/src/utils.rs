//! A simulated LAN behind the engine's datalink seam.

use std::collections::HashMap;
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, mpsc};
use std::time::Duration;

use dug_core::capture::ChannelOpener;
use dug_protocols::arp;
use pnet::datalink::{Channel, Config, DataLinkReceiver, DataLinkSender, MacAddr, NetworkInterface};
use pnet::ipnetwork::{IpNetwork, Ipv4Network, Ipv6Network};
use pnet::packet::arp::{ArpHardwareTypes, ArpOperations, MutableArpPacket};
use pnet::packet::ethernet::{EtherTypes, MutableEthernetPacket};

pub fn ni(name: &str, index: u32, mac: Option<MacAddr>, ips: &[IpNetwork], flags: u32) -> NetworkInterface {
    NetworkInterface {
        name: name.into(),
        description: "".into(),
        index,
        mac,
        ips: ips.to_vec(),
        flags,
    }
}

pub fn v4(a: u8, b: u8, c: u8, d: u8, p: u8) -> IpNetwork {
    IpNetwork::V4(Ipv4Network::new(Ipv4Addr::new(a, b, c, d), p).unwrap())
}

pub fn v6(s: &str, p: u8) -> IpNetwork {
    IpNetwork::V6(Ipv6Network::new(s.parse::<Ipv6Addr>().unwrap(), p).unwrap())
}

pub fn mac(last: u8) -> MacAddr {
    MacAddr::new(0x02, 0x00, 0x5e, 0x00, 0x00, last)
}

pub fn reply_frame(to: MacAddr, to_ip: Ipv4Addr, from: MacAddr, from_ip: Ipv4Addr) -> Vec<u8> {
    let mut buffer = vec![0u8; 42];
    {
        let mut eth = MutableEthernetPacket::new(&mut buffer).unwrap();
        eth.set_destination(to);
        eth.set_source(from);
        eth.set_ethertype(EtherTypes::Arp);
    }
    let mut packet = MutableArpPacket::new(&mut buffer[14..]).unwrap();
    packet.set_hardware_type(ArpHardwareTypes::Ethernet);
    packet.set_protocol_type(EtherTypes::Ipv4);
    packet.set_hw_addr_len(6);
    packet.set_proto_addr_len(4);
    packet.set_operation(ArpOperations::Reply);
    packet.set_sender_hw_addr(from);
    packet.set_sender_proto_addr(from_ip);
    packet.set_target_hw_addr(to);
    packet.set_target_proto_addr(to_ip);
    buffer
}

#[derive(Default)]
struct Segment {
    hosts: Vec<(Ipv4Addr, MacAddr)>,
    chatter: Vec<Vec<u8>>,
    sent: Vec<Vec<u8>>,
    refuse: bool,
    broken_tx: bool,
}

/// One broadcast segment per interface name. Hosts on a segment answer
/// requests for their address; `chatter` is on the wire before any request.
#[derive(Clone, Default)]
pub struct FakeLan {
    segments: Arc<Mutex<HashMap<String, Segment>>>,
    live_handles: Arc<AtomicUsize>,
}

impl FakeLan {
    pub fn host(self, iface: &str, ip: Ipv4Addr, mac: MacAddr) -> Self {
        self.segment(iface, |s| s.hosts.push((ip, mac)));
        self
    }

    pub fn chatter(self, iface: &str, frame: Vec<u8>) -> Self {
        self.segment(iface, |s| s.chatter.push(frame));
        self
    }

    pub fn refuse(self, iface: &str) -> Self {
        self.segment(iface, |s| s.refuse = true);
        self
    }

    /// The capture opens, but every transmission on it fails.
    pub fn break_tx(self, iface: &str) -> Self {
        self.segment(iface, |s| s.broken_tx = true);
        self
    }

    pub fn sent(&self, iface: &str) -> Vec<Vec<u8>> {
        self.segments
            .lock()
            .unwrap()
            .get(iface)
            .map(|s| s.sent.clone())
            .unwrap_or_default()
    }

    /// Send and receive halves not yet dropped.
    pub fn live_handles(&self) -> usize {
        self.live_handles.load(Ordering::SeqCst)
    }

    fn segment(&self, iface: &str, f: impl FnOnce(&mut Segment)) {
        f(self.segments.lock().unwrap().entry(iface.to_string()).or_default());
    }
}

impl ChannelOpener for FakeLan {
    fn open(&self, intf: &NetworkInterface, cfg: Config) -> io::Result<Channel> {
        let (wire, frames) = mpsc::channel();
        {
            let mut segments = self.segments.lock().unwrap();
            let segment = segments.entry(intf.name.clone()).or_default();
            if segment.refuse {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "Operation not permitted"));
            }
            for frame in &segment.chatter {
                let _ = wire.send(frame.clone());
            }
        }

        self.live_handles.fetch_add(2, Ordering::SeqCst);
        let tx = SegmentSender {
            iface: intf.name.clone(),
            lan: self.clone(),
            wire,
        };
        let rx = SegmentReceiver {
            frames,
            current: Vec::new(),
            poll: cfg.read_timeout.unwrap_or(Duration::from_millis(10)),
            live_handles: self.live_handles.clone(),
        };
        Ok(Channel::Ethernet(Box::new(tx), Box::new(rx)))
    }
}

struct SegmentSender {
    iface: String,
    lan: FakeLan,
    wire: mpsc::Sender<Vec<u8>>,
}

impl DataLinkSender for SegmentSender {
    fn build_and_send(
        &mut self,
        _num_packets: usize,
        _packet_size: usize,
        _func: &mut dyn for<'a> FnMut(&'a mut [u8]),
    ) -> Option<io::Result<()>> {
        Some(Ok(()))
    }

    fn send_to(&mut self, packet: &[u8], _dst: Option<NetworkInterface>) -> Option<io::Result<()>> {
        let hosts = {
            let mut segments = self.lan.segments.lock().unwrap();
            let segment = segments.entry(self.iface.clone()).or_default();
            if segment.broken_tx {
                return Some(Err(io::Error::other("boom")));
            }
            segment.sent.push(packet.to_vec());
            segment.hosts.clone()
        };

        // A capture sees its own transmissions.
        let _ = self.wire.send(packet.to_vec());
        if let Some(request) = arp::parse(packet) {
            for (ip, hw) in hosts {
                if ip == request.target_ip {
                    let _ = self.wire.send(reply_frame(request.sender_mac, request.sender_ip, hw, ip));
                }
            }
        }
        Some(Ok(()))
    }
}

impl Drop for SegmentSender {
    fn drop(&mut self) {
        self.lan.live_handles.fetch_sub(1, Ordering::SeqCst);
    }
}

struct SegmentReceiver {
    frames: mpsc::Receiver<Vec<u8>>,
    current: Vec<u8>,
    poll: Duration,
    live_handles: Arc<AtomicUsize>,
}

impl DataLinkReceiver for SegmentReceiver {
    fn next(&mut self) -> io::Result<&[u8]> {
        match self.frames.recv_timeout(self.poll) {
            Ok(frame) => {
                self.current = frame;
                Ok(&self.current)
            }
            Err(_) => Err(io::Error::new(io::ErrorKind::TimedOut, "Timed out")),
        }
    }
}

impl Drop for SegmentReceiver {
    fn drop(&mut self) {
        self.live_handles.fetch_sub(1, Ordering::SeqCst);
    }
}
