//! Live layer-2 capture bound to a single interface.
//!
//! Opening a capture requires **root privileges** (or `CAP_NET_RAW`) on most
//! systems. The receive half is drained by a dedicated blocking reader which
//! forwards frames into an async queue; the send half stays with the session.

use std::io;

use dug_common::{config::CaptureConfig, error::ScanError};
use pnet::datalink::{self, Channel, Config, DataLinkReceiver, DataLinkSender, NetworkInterface};
use tokio::{sync::mpsc, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Opens datalink channels. The seam between the engine and the OS.
pub trait ChannelOpener: Send + Sync {
    fn open(&self, intf: &NetworkInterface, cfg: Config) -> io::Result<Channel>;
}

/// Opens real channels through `pnet::datalink`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LiveChannelOpener;

impl ChannelOpener for LiveChannelOpener {
    fn open(&self, intf: &NetworkInterface, cfg: Config) -> io::Result<Channel> {
        datalink::channel(intf, cfg)
    }
}

pub struct CaptureSession {
    iface: String,
    tx: Box<dyn DataLinkSender>,
    rx: Option<Box<dyn DataLinkReceiver>>,
    stop: CancellationToken,
    reader: Option<JoinHandle<()>>,
}

impl CaptureSession {
    pub fn open(intf: &NetworkInterface, opener: &dyn ChannelOpener, cfg: &CaptureConfig) -> Result<Self, ScanError> {
        let channel = opener
            .open(intf, channel_config(cfg))
            .map_err(|source| ScanError::CaptureOpen {
                iface: intf.name.clone(),
                source,
            })?;

        match channel {
            Channel::Ethernet(tx, rx) => {
                debug!(iface = %intf.name, "capture opened");
                Ok(Self {
                    iface: intf.name.clone(),
                    tx,
                    rx: Some(rx),
                    stop: CancellationToken::new(),
                    reader: None,
                })
            }
            _ => Err(ScanError::UnsupportedChannel {
                iface: intf.name.clone(),
            }),
        }
    }

    pub fn iface(&self) -> &str {
        &self.iface
    }

    /// The token that ends both the reader and anything listening to its queue.
    pub fn stop_token(&self) -> CancellationToken {
        self.stop.clone()
    }

    /// Moves the receive half onto a blocking reader and returns the frame queue.
    ///
    /// May be called once per session.
    pub fn start_reader(&mut self) -> Result<mpsc::UnboundedReceiver<Vec<u8>>, ScanError> {
        let rx = self.rx.take().ok_or_else(|| ScanError::Listener {
            iface: self.iface.clone(),
        })?;
        let (queue_tx, queue_rx) = mpsc::unbounded_channel();
        let stop = self.stop.clone();
        let iface = self.iface.clone();

        self.reader = Some(tokio::task::spawn_blocking(move || {
            let mut rx = rx;
            read_frames(rx.as_mut(), &queue_tx, &stop, &iface);
        }));

        Ok(queue_rx)
    }

    pub fn send(&mut self, frame: &[u8]) -> Result<(), ScanError> {
        let result = self
            .tx
            .send_to(frame, None)
            .unwrap_or_else(|| Err(io::Error::other("frame was not handed to the interface")));

        result.map_err(|source| ScanError::CaptureWrite {
            iface: self.iface.clone(),
            source,
        })
    }

    /// Stops the reader, waits for it to let go of the receive half, then
    /// drops the send half.
    pub async fn close(mut self) {
        self.stop.cancel();
        if let Some(reader) = self.reader.take()
            && let Err(e) = reader.await
        {
            warn!(iface = %self.iface, "capture reader failed: {e}");
        }
        debug!(iface = %self.iface, "capture closed");
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.stop.cancel();
    }
}

fn channel_config(cfg: &CaptureConfig) -> Config {
    Config {
        read_buffer_size: cfg.snaplen,
        read_timeout: Some(cfg.poll_interval),
        promiscuous: cfg.promiscuous,
        ..Default::default()
    }
}

fn read_frames(
    rx: &mut dyn DataLinkReceiver,
    queue: &mpsc::UnboundedSender<Vec<u8>>,
    stop: &CancellationToken,
    iface: &str,
) {
    while !stop.is_cancelled() {
        match rx.next() {
            Ok(frame) => {
                if queue.send(frame.to_vec()).is_err() {
                    break;
                }
            }
            Err(e) if is_idle(&e) => continue,
            Err(e) => {
                warn!(iface, "capture read failed: {e}");
                break;
            }
        }
    }
    debug!(iface, "capture reader stopped");
}

fn is_idle(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    )
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
