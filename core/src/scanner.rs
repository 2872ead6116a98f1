//! Scan coordination.
//!
//! [`ArpScanner`] takes one snapshot of the system's interfaces and runs a
//! [`probe::Prober`] against the requested one, or against all of them
//! concurrently. A failing interface never stops its siblings.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use dug_common::{
    config::ScanConfig,
    error::ScanError,
    network::{host::DiscoveryRecord, interface::find_by_name},
};
use tokio::{sync::mpsc::UnboundedSender, task::JoinSet};
use tracing::{debug, error, info, warn};

use crate::{
    capture::{ChannelOpener, LiveChannelOpener},
    system::{InterfaceProvider, SystemInterfaces},
};

pub mod probe;

pub use probe::{ProbeReport, ProbeState, Prober};

/// Outcome of a scan across every interface.
#[derive(Debug, Default)]
pub struct ScanReport {
    pub reports: BTreeMap<String, ProbeReport>,
    pub failures: BTreeMap<String, ScanError>,
}

impl ScanReport {
    /// All discoveries across interfaces, grouped by interface name.
    pub fn discoveries(&self) -> impl Iterator<Item = &DiscoveryRecord> {
        self.reports.values().flat_map(|report| report.discoveries.iter())
    }

    /// Interfaces that failed for a reason other than being ineligible.
    pub fn hard_failures(&self) -> impl Iterator<Item = (&String, &ScanError)> {
        self.failures.iter().filter(|(_, e)| !e.is_validation())
    }
}

pub struct ArpScanner {
    cfg: ScanConfig,
    interfaces: Arc<dyn InterfaceProvider>,
    opener: Arc<dyn ChannelOpener>,
    sink: Option<UnboundedSender<DiscoveryRecord>>,
}

impl ArpScanner {
    pub fn new(cfg: ScanConfig) -> Self {
        Self {
            cfg,
            interfaces: Arc::new(SystemInterfaces),
            opener: Arc::new(LiveChannelOpener),
            sink: None,
        }
    }

    pub fn with_interfaces(mut self, interfaces: Arc<dyn InterfaceProvider>) -> Self {
        self.interfaces = interfaces;
        self
    }

    pub fn with_opener(mut self, opener: Arc<dyn ChannelOpener>) -> Self {
        self.opener = opener;
        self
    }

    /// Streams every discovery as it is observed, before the scan returns.
    pub fn with_sink(mut self, sink: UnboundedSender<DiscoveryRecord>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Probes the interface called `name`.
    pub async fn scan_one(&self, name: &str) -> Result<ProbeReport, ScanError> {
        let interfaces = self.interfaces.get_network_interfaces()?;
        let intf = find_by_name(&interfaces, name)
            .cloned()
            .ok_or_else(|| ScanError::InterfaceNotFound(name.to_string()))?;

        info!(iface = %intf.name, "arp scanning");
        self.prober(intf).run().await
    }

    /// Probes every interface at once and waits for all of them.
    ///
    /// Only a failure to enumerate interfaces is an error here. Per-interface
    /// failures land in [`ScanReport::failures`].
    pub async fn scan_all(&self) -> Result<ScanReport, ScanError> {
        let interfaces = self.interfaces.get_network_interfaces()?;
        debug!(count = interfaces.len(), "interfaces enumerated");

        let mut set = JoinSet::new();
        let mut names = HashMap::new();
        for intf in interfaces {
            let name = intf.name.clone();
            let prober = self.prober(intf);
            let handle = set.spawn(prober.run());
            names.insert(handle.id(), name);
        }

        let mut report = ScanReport::default();
        while let Some(joined) = set.join_next_with_id().await {
            let (name, outcome) = match joined {
                Ok((id, outcome)) => (names.remove(&id).unwrap_or_default(), outcome),
                Err(e) => {
                    let name = names.remove(&e.id()).unwrap_or_default();
                    error!(iface = %name, "scan task failed: {e}");
                    let failure = ScanError::ScanTask {
                        iface: name.clone(),
                        reason: e.to_string(),
                    };
                    (name, Err(failure))
                }
            };

            match outcome {
                Ok(probe) => {
                    report.reports.insert(name, probe);
                }
                Err(e) => {
                    if e.is_validation() {
                        debug!(iface = %name, "{e}");
                    } else if !matches!(e, ScanError::ScanTask { .. }) {
                        warn!(iface = %name, "{e}");
                    }
                    report.failures.insert(name, e);
                }
            }
        }

        Ok(report)
    }

    fn prober(&self, intf: pnet::datalink::NetworkInterface) -> Prober {
        Prober::new(intf, self.cfg, self.opener.clone()).with_sink(self.sink.clone())
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
