//! Per-interface ARP probe.
//!
//! A probe walks `Validating → Listening → Sending → Draining → Done`, or ends
//! in `Aborted` from any of them. The capture handle opened on entry to
//! `Listening` is closed, and its reader joined, before [`Prober::run`] returns.

use std::{collections::HashSet, sync::Arc, time::Duration};

use dug_common::{
    config::{ProbeMode, ScanConfig},
    error::ScanError,
    network::{host::DiscoveryRecord, interface::ProbeTarget, range::SubnetTarget},
};
use dug_protocols::arp::{self, Decoded};
use pnet::datalink::NetworkInterface;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use crate::capture::{CaptureSession, ChannelOpener};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeState {
    Validating,
    Listening,
    Sending,
    Draining,
    Done,
    Aborted,
}

/// What one interface's probe found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    pub iface: String,
    pub subnet: SubnetTarget,
    pub mode: ProbeMode,
    pub frames_sent: usize,
    /// Unique (ip, mac) pairs in arrival order.
    pub discoveries: Vec<DiscoveryRecord>,
}

pub struct Prober {
    intf: NetworkInterface,
    cfg: ScanConfig,
    opener: Arc<dyn ChannelOpener>,
    sink: Option<UnboundedSender<DiscoveryRecord>>,
}

impl Prober {
    pub fn new(intf: NetworkInterface, cfg: ScanConfig, opener: Arc<dyn ChannelOpener>) -> Self {
        Self {
            intf,
            cfg,
            opener,
            sink: None,
        }
    }

    /// Every discovery is also pushed here as it arrives.
    pub fn with_sink(mut self, sink: Option<UnboundedSender<DiscoveryRecord>>) -> Self {
        self.sink = sink;
        self
    }

    pub async fn run(self) -> Result<ProbeReport, ScanError> {
        let name = self.intf.name.clone();
        self.enter(ProbeState::Validating);

        let target = match ProbeTarget::try_from(&self.intf) {
            Ok(target) => target,
            Err(source) => {
                self.enter(ProbeState::Aborted);
                return Err(ScanError::Validation { iface: name, source });
            }
        };
        debug!(
            iface = %name,
            subnet = %target.subnet,
            network = %target.subnet.network(),
            "using network range"
        );

        let mut session = match CaptureSession::open(&self.intf, self.opener.as_ref(), &self.cfg.capture) {
            Ok(session) => session,
            Err(e) => {
                self.enter(ProbeState::Aborted);
                return Err(e);
            }
        };

        let outcome = self.drive(&target, &mut session).await;
        session.close().await;

        match &outcome {
            Ok(report) => {
                self.enter(ProbeState::Done);
                debug!(
                    iface = %name,
                    sent = report.frames_sent,
                    found = report.discoveries.len(),
                    "probe finished"
                );
            }
            Err(_) => self.enter(ProbeState::Aborted),
        }
        outcome
    }

    async fn drive(&self, target: &ProbeTarget, session: &mut CaptureSession) -> Result<ProbeReport, ScanError> {
        self.enter(ProbeState::Listening);
        let frames = session.start_reader()?;
        let stop = session.stop_token();
        let listener = tokio::spawn(listen(frames, stop.clone(), target.clone(), self.sink.clone()));

        let sent = match self.cfg.mode {
            ProbeMode::ProbeAndListen => {
                self.enter(ProbeState::Sending);
                self.send_requests(target, session).await
            }
            ProbeMode::ListenOnly => Ok(0),
        };

        if sent.is_ok() {
            self.enter(ProbeState::Draining);
            tokio::time::sleep(self.cfg.timeout).await;
        }

        stop.cancel();
        let discoveries = listener.await.map_err(|_| ScanError::Listener {
            iface: target.iface.clone(),
        })?;

        Ok(ProbeReport {
            iface: target.iface.clone(),
            subnet: target.subnet,
            mode: self.cfg.mode,
            frames_sent: sent?,
            discoveries,
        })
    }

    async fn send_requests(&self, target: &ProbeTarget, session: &mut CaptureSession) -> Result<usize, ScanError> {
        let mut sent = 0;
        for dst_addr in target.subnet.plan(self.cfg.host_policy) {
            let frame = arp::encode_request(target.mac, target.subnet.addr, dst_addr)?;
            session.send(&frame)?;
            sent += 1;
            trace!(iface = %target.iface, %dst_addr, "request sent");
            pause(self.cfg.delay).await;
        }
        Ok(sent)
    }

    fn enter(&self, state: ProbeState) {
        trace!(iface = %self.intf.name, ?state, "probe state");
    }
}

async fn pause(delay: Duration) {
    if delay.is_zero() {
        tokio::task::yield_now().await;
    } else {
        tokio::time::sleep(delay).await;
    }
}

/// Consumes captured frames until `stop` fires or the reader goes away.
async fn listen(
    mut frames: UnboundedReceiver<Vec<u8>>,
    stop: CancellationToken,
    target: ProbeTarget,
    sink: Option<UnboundedSender<DiscoveryRecord>>,
) -> Vec<DiscoveryRecord> {
    let mut seen = HashSet::new();
    let mut discoveries = Vec::new();

    loop {
        // Frames already queued are handled before a stop is honoured.
        let bytes = tokio::select! {
            biased;
            frame = frames.recv() => match frame {
                Some(bytes) => bytes,
                None => break,
            },
            _ = stop.cancelled() => break,
        };

        let Decoded::Reply(reply) = arp::decode_reply(&bytes, target.mac) else {
            continue;
        };
        let record = DiscoveryRecord::new(reply.sender_ip, reply.sender_mac, target.iface.as_str());
        if !target.subnet.contains(record.ip) {
            debug!(subnet = %target.subnet, "off-subnet reply: {record}");
        }
        info!(
            target: "dug::arp",
            ip = %record.ip,
            mac = %record.mac,
            iface = %record.iface,
            "host discovered"
        );
        if let Some(tx) = &sink {
            let _ = tx.send(record.clone());
        }
        if seen.insert((record.ip, record.mac)) {
            discoveries.push(record);
        }
    }

    discoveries
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
