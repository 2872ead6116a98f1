use std::collections::HashSet;
use std::time::{Duration, Instant};

use anyhow::{Context, bail};
use colored::*;
use dug_common::config::{ProbeMode, ScanConfig};
use dug_common::network::host::DiscoveryRecord;
use dug_common::network::range::HostPolicy;
use dug_core::scanner::{ArpScanner, ProbeReport, ScanReport};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::{debug, warn};

use crate::commands::ArpscanArgs;
use crate::terminal::{colors, print, spinner};
use crate::vendors;

type Detail = (String, ColoredString);

impl ArpscanArgs {
    pub fn scan_config(&self) -> ScanConfig {
        let mode = if self.listen_only {
            ProbeMode::ListenOnly
        } else {
            ProbeMode::ProbeAndListen
        };
        let policy = if self.mask_walk {
            HostPolicy::MaskWalk
        } else {
            HostPolicy::HostsOnly
        };
        ScanConfig::from_secs(self.timeout, self.delay)
            .with_mode(mode)
            .with_host_policy(policy)
    }
}

pub async fn arpscan(args: ArpscanArgs, json: bool) -> anyhow::Result<()> {
    let (tx, rx) = mpsc::unbounded_channel();
    let scanner = ArpScanner::new(args.scan_config()).with_sink(tx);

    if !json {
        print::header("arp scan");
        spinner::start("Sending ARP requests...");
    }
    let progress = tokio::spawn(track_progress(rx, !json));
    let start_time = Instant::now();

    let outcome = match &args.iface {
        Some(name) => scanner.scan_one(name).await.map(single),
        None => scanner.scan_all().await,
    };

    // The sink closes with the scanner, which ends the progress task.
    drop(scanner);
    match progress.await {
        Ok(hosts) => debug!(hosts, "discovery stream closed"),
        Err(e) => warn!("progress task failed: {e}"),
    }
    spinner::finish();

    let report = outcome.with_context(|| match &args.iface {
        Some(name) => format!("arp scan of {name} failed"),
        None => "arp scan failed".to_string(),
    })?;

    if !json {
        scan_ends(&report, start_time.elapsed());
    }

    if args.iface.is_none() && report.reports.is_empty() {
        bail!("no interface could be scanned");
    }
    Ok(())
}

fn single(probe: ProbeReport) -> ScanReport {
    let mut report = ScanReport::default();
    report.reports.insert(probe.iface.clone(), probe);
    report
}

/// Counts distinct hosts as they stream in. Ends when the sink closes.
async fn track_progress(mut rx: UnboundedReceiver<DiscoveryRecord>, show: bool) -> usize {
    let mut seen = HashSet::new();
    while let Some(record) = rx.recv().await {
        if seen.insert((record.ip, record.mac)) && show {
            spinner::report_discovery_progress(seen.len());
        }
    }
    seen.len()
}

fn scan_ends(report: &ScanReport, total_time: Duration) {
    for (iface, e) in report.hard_failures() {
        warn!("{iface}: {e}");
    }

    let mut records: Vec<&DiscoveryRecord> = report.discoveries().collect();
    if records.is_empty() {
        print::header("zero hosts detected");
        print::no_results();
        return;
    }

    records.sort_by_key(|record| (record.iface.clone(), record.ip));
    print::header("arp scan results");
    for (idx, record) in records.iter().enumerate() {
        print::tree_head(idx, record.ip.to_string().color(colors::IPV4_ADDR));
        print::as_tree_one_level(record_details(record));
        if idx + 1 != records.len() {
            print::print("");
        }
    }
    print_summary(records.len(), report.reports.len(), total_time);
}

fn record_details(record: &DiscoveryRecord) -> Vec<Detail> {
    let mut details: Vec<Detail> = vec![
        ("MAC".to_string(), record.mac.to_string().color(colors::MAC_ADDR)),
        ("Iface".to_string(), record.iface.color(colors::PRIMARY)),
    ];
    if let Some(vendor) = vendors::vendor_of(record.mac) {
        details.push(("Vendor".to_string(), vendor.color(colors::VENDOR)));
    }
    details
}

fn print_summary(hosts: usize, interfaces: usize, total_time: Duration) {
    let plain = format!(
        "Scan Complete: {hosts} hosts on {interfaces} interfaces in {:.2}s",
        total_time.as_secs_f64()
    );
    let output = format!(
        "Scan Complete: {} on {} in {}",
        format!("{hosts} hosts").bold().green(),
        format!("{interfaces} interfaces").bold(),
        format!("{:.2}s", total_time.as_secs_f64()).bold().yellow()
    )
    .color(colors::TEXT_DEFAULT);

    print::fat_separator();
    print::centerln(&output.to_string(), &plain);
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
