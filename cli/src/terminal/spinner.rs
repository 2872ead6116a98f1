use std::io::{self, Write};
use std::sync::OnceLock;
use std::time::Duration;

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

use crate::terminal::colors;

static SPINNER: OnceLock<ProgressBar> = OnceLock::new();

fn init_spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(style.tick_strings(&[
            "▁▁▁▁▁",
            "▁▂▂▂▁",
            "▁▄▂▄▁",
            "▂▄▆▄▂",
            "▄▆█▆▄",
            "▂▄▆▄▂",
            "▁▄▂▄▁",
            "▁▂▂▂▁",
        ]));
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

pub fn start(msg: &str) {
    SPINNER
        .get_or_init(init_spinner)
        .set_message(msg.color(colors::TEXT_DEFAULT).to_string());
}

pub fn report_discovery_progress(count: usize) {
    if let Some(pb) = SPINNER.get() {
        pb.set_message(
            format!(
                "Identified {} so far...",
                format!("{count} hosts").green().bold()
            )
            .color(colors::TEXT_DEFAULT)
            .to_string(),
        );
    }
}

pub fn finish() {
    if let Some(pb) = SPINNER.get() {
        pb.finish_and_clear();
    }
}

/// Log sink that keeps lines from tearing through a running spinner.
pub struct SpinnerWriter;

impl Write for SpinnerWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match SPINNER.get() {
            Some(pb) => pb.suspend(|| io::stdout().write_all(buf))?,
            None => io::stdout().write_all(buf)?,
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stdout().flush()
    }
}
