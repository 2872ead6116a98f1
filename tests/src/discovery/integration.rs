#![cfg(test)]
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dug_common::config::{CaptureConfig, ProbeMode, ScanConfig};
use dug_common::error::{ScanError, ValidationError};
use dug_common::network::range::HostPolicy;
use dug_core::scanner::ArpScanner;
use dug_core::system::StaticInterfaces;
use dug_protocols::arp;
use pnet::datalink::NetworkInterface;
use tokio::sync::mpsc;

use crate::utils::{FakeLan, mac, ni, reply_frame, v4, v6};

const IFF_UP: u32 = 1;
const IFF_BROADCAST: u32 = 1 << 1;
const IFF_LOOPBACK: u32 = 1 << 3;

fn config(timeout: f64, delay: f64) -> ScanConfig {
    ScanConfig::from_secs(timeout, delay).with_capture(CaptureConfig {
        poll_interval: Duration::from_millis(10),
        ..CaptureConfig::default()
    })
}

fn scanner(cfg: ScanConfig, interfaces: Vec<NetworkInterface>, lan: &FakeLan) -> ArpScanner {
    ArpScanner::new(cfg)
        .with_interfaces(Arc::new(StaticInterfaces(interfaces)))
        .with_opener(Arc::new(lan.clone()))
}

fn lo() -> NetworkInterface {
    ni("lo", 1, Some(mac(0)), &[v4(127, 0, 0, 1, 8), v6("::1", 128)], IFF_UP | IFF_LOOPBACK)
}

fn eth0() -> NetworkInterface {
    ni("eth0", 2, Some(mac(5)), &[v4(10, 0, 0, 5, 24)], IFF_UP | IFF_BROADCAST)
}

fn wlan0() -> NetworkInterface {
    ni(
        "wlan0",
        3,
        Some(mac(9)),
        &[v6("fe80::9", 64), v4(192, 168, 1, 9, 24)],
        IFF_UP | IFF_BROADCAST,
    )
}

fn corp0() -> NetworkInterface {
    ni("corp0", 4, Some(mac(44)), &[v4(10, 44, 0, 1, 8)], IFF_UP | IFF_BROADCAST)
}

fn tun0() -> NetworkInterface {
    ni("tun0", 5, None, &[v4(10, 96, 0, 57, 24)], IFF_UP)
}

fn ipv6only0() -> NetworkInterface {
    ni("ipv6only0", 6, Some(mac(66)), &[v6("fe80::66", 64)], IFF_UP | IFF_BROADCAST)
}

#[tokio::test]
async fn quiet_slash24_sends_254_requests_and_finds_nothing() {
    let lan = FakeLan::default();
    let s = scanner(config(0.05, 0.0), vec![eth0()], &lan);

    let report = s.scan_one("eth0").await.unwrap();

    assert_eq!(report.frames_sent, 254);
    assert!(report.discoveries.is_empty());

    let sent = lan.sent("eth0");
    assert_eq!(sent.len(), 254);
    let targets: Vec<Ipv4Addr> = sent.iter().map(|f| arp::parse(f).unwrap().target_ip).collect();
    assert_eq!(targets.first(), Some(&Ipv4Addr::new(10, 0, 0, 1)));
    assert_eq!(targets.last(), Some(&Ipv4Addr::new(10, 0, 0, 254)));
    for frame in &sent {
        let request = arp::parse(frame).unwrap();
        assert_eq!(request.sender_mac, mac(5));
        assert_eq!(request.sender_ip, Ipv4Addr::new(10, 0, 0, 5));
    }
    assert_eq!(lan.live_handles(), 0);
}

#[tokio::test]
async fn answering_hosts_are_discovered_and_streamed() {
    let lan = FakeLan::default()
        .host("eth0", Ipv4Addr::new(10, 0, 0, 1), mac(1))
        .host("eth0", Ipv4Addr::new(10, 0, 0, 200), mac(200));
    let (tx, mut rx) = mpsc::unbounded_channel();
    let s = scanner(config(0.2, 0.0), vec![eth0()], &lan).with_sink(tx);

    let report = s.scan_one("eth0").await.unwrap();

    let mut found: Vec<(Ipv4Addr, String)> = report
        .discoveries
        .iter()
        .map(|r| (r.ip, r.mac.to_string()))
        .collect();
    found.sort();
    assert_eq!(
        found,
        vec![
            (Ipv4Addr::new(10, 0, 0, 1), "02:00:5e:00:00:01".to_string()),
            (Ipv4Addr::new(10, 0, 0, 200), "02:00:5e:00:00:c8".to_string()),
        ]
    );

    drop(s);
    let mut streamed = Vec::new();
    while let Some(record) = rx.recv().await {
        assert_eq!(record.iface, "eth0");
        streamed.push(record.ip);
    }
    streamed.sort();
    assert_eq!(streamed, vec![Ipv4Addr::new(10, 0, 0, 1), Ipv4Addr::new(10, 0, 0, 200)]);
}

#[tokio::test]
async fn wide_subnet_is_refused_without_transmitting() {
    let lan = FakeLan::default();
    let s = scanner(config(0.05, 0.0), vec![corp0()], &lan);

    let err = s.scan_one("corp0").await.unwrap_err();

    assert!(matches!(
        err,
        ScanError::Validation { source: ValidationError::SubnetTooLarge, .. }
    ));
    assert_eq!(err.to_string(), "interface corp0: mask means network is too large");
    assert!(lan.sent("corp0").is_empty());
}

#[tokio::test]
async fn loopback_is_skipped() {
    let lan = FakeLan::default();
    let s = scanner(config(0.05, 0.0), vec![lo()], &lan);

    let err = s.scan_one("lo").await.unwrap_err();

    assert!(matches!(err, ScanError::Validation { source: ValidationError::Loopback, .. }));
    assert!(lan.sent("lo").is_empty());
}

#[tokio::test]
async fn missing_ipv4_is_reported() {
    let lan = FakeLan::default();
    let s = scanner(config(0.05, 0.0), vec![ipv6only0()], &lan);

    let err = s.scan_one("ipv6only0").await.unwrap_err();

    assert!(matches!(err, ScanError::Validation { source: ValidationError::NoAddress, .. }));
}

#[tokio::test]
async fn scan_all_keeps_going_past_bad_interfaces() {
    let lan = FakeLan::default()
        .host("eth0", Ipv4Addr::new(10, 0, 0, 1), mac(1))
        .host("wlan0", Ipv4Addr::new(192, 168, 1, 1), mac(101))
        .refuse("wlan0");
    let interfaces = vec![lo(), eth0(), wlan0(), corp0(), tun0(), ipv6only0()];
    let s = scanner(config(0.1, 0.0), interfaces, &lan);

    let report = s.scan_all().await.unwrap();

    assert_eq!(report.reports.keys().collect::<Vec<_>>(), vec!["eth0"]);
    assert_eq!(report.reports["eth0"].discoveries.len(), 1);
    assert_eq!(
        report.failures.keys().collect::<Vec<_>>(),
        vec!["corp0", "ipv6only0", "lo", "tun0", "wlan0"]
    );
    assert!(matches!(report.failures["wlan0"], ScanError::CaptureOpen { .. }));
    assert!(matches!(
        report.failures["tun0"],
        ScanError::Validation { source: ValidationError::NoHardwareAddress, .. }
    ));
    assert_eq!(report.hard_failures().count(), 1);
    assert_eq!(lan.live_handles(), 0);
}

#[tokio::test]
async fn interfaces_are_probed_concurrently() {
    let lan = FakeLan::default();
    let s = scanner(config(0.5, 0.0), vec![eth0(), wlan0()], &lan);

    let start = Instant::now();
    let report = s.scan_all().await.unwrap();

    assert_eq!(report.reports.len(), 2);
    // Two sequential probes would need at least twice the timeout.
    assert!(start.elapsed() < Duration::from_millis(1000));
}

#[tokio::test]
async fn listen_only_reports_chatter_without_sending() {
    let chatter = reply_frame(mac(77), Ipv4Addr::new(10, 0, 0, 77), mac(1), Ipv4Addr::new(10, 0, 0, 1));
    let lan = FakeLan::default().chatter("eth0", chatter);
    let cfg = config(0.1, 0.0).with_mode(ProbeMode::ListenOnly);
    let s = scanner(cfg, vec![eth0()], &lan);

    let report = s.scan_one("eth0").await.unwrap();

    assert!(lan.sent("eth0").is_empty());
    assert_eq!(report.discoveries.len(), 1);
    assert_eq!(report.discoveries[0].ip, Ipv4Addr::new(10, 0, 0, 1));
}

#[tokio::test]
async fn mask_walk_starts_at_network_address() {
    let lan = FakeLan::default();
    let cfg = config(0.0, 0.0).with_host_policy(HostPolicy::MaskWalk);
    let s = scanner(cfg, vec![eth0()], &lan);

    let report = s.scan_one("eth0").await.unwrap();

    assert_eq!(report.frames_sent, 255);
    let first = arp::parse(&lan.sent("eth0")[0]).unwrap();
    assert_eq!(first.target_ip, Ipv4Addr::new(10, 0, 0, 0));
}

#[tokio::test]
async fn delay_paces_transmissions() {
    let small = ni("eth9", 9, Some(mac(9)), &[v4(10, 9, 9, 1, 29)], IFF_UP | IFF_BROADCAST);
    let lan = FakeLan::default();
    let s = scanner(config(0.0, 0.02), vec![small], &lan);

    let start = Instant::now();
    let report = s.scan_one("eth9").await.unwrap();

    // Six hosts in a /29, each followed by the delay.
    assert_eq!(report.frames_sent, 6);
    assert!(start.elapsed() >= Duration::from_millis(120));
}

#[tokio::test]
async fn repeated_scans_give_the_same_answer() {
    let lan = FakeLan::default().host("eth0", Ipv4Addr::new(10, 0, 0, 42), mac(42));
    let s = scanner(config(0.1, 0.0), vec![eth0()], &lan);

    let first = s.scan_one("eth0").await.unwrap();
    let second = s.scan_one("eth0").await.unwrap();

    assert_eq!(first.discoveries, second.discoveries);
    assert_eq!(first.frames_sent, second.frames_sent);
    assert_eq!(lan.sent("eth0").len(), 508);
    assert_eq!(lan.live_handles(), 0);
}

#[tokio::test]
async fn transmit_failure_releases_capture_and_skips_drain() {
    let lan = FakeLan::default().break_tx("eth0");
    let s = scanner(config(5.0, 0.0), vec![eth0()], &lan);

    let start = Instant::now();
    let err = s.scan_one("eth0").await.unwrap_err();

    assert!(matches!(err, ScanError::CaptureWrite { ref iface, .. } if iface == "eth0"));
    assert_eq!(err.to_string(), "error writing packets on eth0: boom");
    assert!(lan.sent("eth0").is_empty());
    assert_eq!(lan.live_handles(), 0);
    // The five second drain never ran.
    assert!(start.elapsed() < Duration::from_secs(2));
}
