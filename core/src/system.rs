use std::io;

use dug_common::error::ScanError;
use pnet::datalink::{self, NetworkInterface};

/// Source of the interface snapshot a scan works from.
pub trait InterfaceProvider: Send + Sync {
    fn get_network_interfaces(&self) -> Result<Vec<NetworkInterface>, ScanError>;
}

/// Asks the operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemInterfaces;

impl InterfaceProvider for SystemInterfaces {
    fn get_network_interfaces(&self) -> Result<Vec<NetworkInterface>, ScanError> {
        from_os(datalink::interfaces())
    }
}

// pnet hides a failed getifaddrs behind an empty list, and a live host
// always reports at least loopback.
fn from_os(interfaces: Vec<NetworkInterface>) -> Result<Vec<NetworkInterface>, ScanError> {
    if interfaces.is_empty() {
        return Err(ScanError::InterfaceEnumeration(io::Error::other(
            "no network interfaces reported",
        )));
    }
    Ok(interfaces)
}

/// A fixed list, taken once and handed out on every call.
#[derive(Debug, Default, Clone)]
pub struct StaticInterfaces(pub Vec<NetworkInterface>);

impl InterfaceProvider for StaticInterfaces {
    fn get_network_interfaces(&self) -> Result<Vec<NetworkInterface>, ScanError> {
        Ok(self.0.clone())
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
