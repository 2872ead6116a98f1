//! The ARP discovery engine.
//!
//! [`scanner::ArpScanner`] fans a [`scanner::probe::Prober`] out over one or all
//! interfaces. Each prober owns a [`capture::CaptureSession`] for its lifetime,
//! runs a reply listener next to its sender, and reports what answered.

pub mod capture;
pub mod resolver;
pub mod scanner;
pub mod system;
