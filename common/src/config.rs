use std::time::Duration;

use crate::network::range::HostPolicy;

/// Frame size ceiling handed to the capture backend.
pub const DEFAULT_SNAPLEN: usize = 65_536;

/// How long a single capture read may wait before the reader re-checks its stop signal.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

pub const DEFAULT_TIMEOUT_SECS: f64 = 1.0;
pub const DEFAULT_DELAY_SECS: f64 = 0.0;

/// Selects whether a probe transmits requests or only watches the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProbeMode {
    /// Send one request per planned address, then drain replies.
    #[default]
    ProbeAndListen,
    /// Never transmit. Replies to other hosts' requests are still reported.
    ListenOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureConfig {
    pub snaplen: usize,
    pub promiscuous: bool,
    pub poll_interval: Duration,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            snaplen: DEFAULT_SNAPLEN,
            promiscuous: true,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Everything a probe needs to know about timing and behaviour.
///
/// Built once by the caller and passed down by value, so no task ever consults
/// process-wide state to decide what to do.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanConfig {
    /// Quiescence window after the last request before the probe finishes.
    pub timeout: Duration,
    /// Pause between two transmitted requests.
    pub delay: Duration,
    pub mode: ProbeMode,
    pub host_policy: HostPolicy,
    pub capture: CaptureConfig,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self::from_secs(DEFAULT_TIMEOUT_SECS, DEFAULT_DELAY_SECS)
    }
}

impl ScanConfig {
    pub fn from_secs(timeout: f64, delay: f64) -> Self {
        Self {
            timeout: secs_to_duration(timeout),
            delay: secs_to_duration(delay),
            mode: ProbeMode::default(),
            host_policy: HostPolicy::default(),
            capture: CaptureConfig::default(),
        }
    }

    pub fn with_mode(mut self, mode: ProbeMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_host_policy(mut self, host_policy: HostPolicy) -> Self {
        self.host_policy = host_policy;
        self
    }

    pub fn with_capture(mut self, capture: CaptureConfig) -> Self {
        self.capture = capture;
        self
    }
}

/// Converts floating seconds to a duration with nanosecond resolution.
///
/// The value is scaled by 1e9 and truncated. Negative, NaN and infinite inputs
/// yield a zero duration.
pub fn secs_to_duration(secs: f64) -> Duration {
    if !secs.is_finite() || secs <= 0.0 {
        return Duration::ZERO;
    }
    Duration::from_nanos((secs * 1e9) as u64)
}
