use std::io;

use thiserror::Error;

/// Reasons an interface is not probed. Fatal to that interface only.
#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum ValidationError {
    #[error("no good IP network found")]
    NoAddress,
    #[error("skipping localhost")]
    Loopback,
    #[error("mask means network is too large")]
    SubnetTooLarge,
    /// The interface has no hardware address to source Ethernet frames from.
    #[error("no hardware address")]
    NoHardwareAddress,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("buffer too small for {layer} header ({len} bytes)")]
    BufferTooSmall { layer: &'static str, len: usize },
}

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("failed to enumerate network interfaces: {0}")]
    InterfaceEnumeration(#[source] io::Error),

    #[error("could not find interface: {0}")]
    InterfaceNotFound(String),

    #[error("interface {iface}: {source}")]
    Validation {
        iface: String,
        #[source]
        source: ValidationError,
    },

    #[error("opening capture on {iface}: {source}")]
    CaptureOpen {
        iface: String,
        #[source]
        source: io::Error,
    },

    #[error("non-ethernet channel for {iface}")]
    UnsupportedChannel { iface: String },

    #[error("error writing packets on {iface}: {source}")]
    CaptureWrite {
        iface: String,
        #[source]
        source: io::Error,
    },

    #[error("listener on {iface} terminated abnormally")]
    Listener { iface: String },

    /// The task scanning `iface` panicked or was cancelled.
    #[error("scan task for {iface} failed: {reason}")]
    ScanTask { iface: String, reason: String },

    #[error(transparent)]
    Codec(#[from] CodecError),
}

impl ScanError {
    /// True when the interface was skipped before any capture handle was opened.
    pub fn is_validation(&self) -> bool {
        matches!(self, ScanError::Validation { .. })
    }
}
