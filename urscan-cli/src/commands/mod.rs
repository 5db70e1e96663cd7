//! Subcommand implementations

pub mod debug;
pub mod decode;
pub mod encode;
pub mod inspect;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::io::{self, Read};
use tracing::{debug, warn};
use urscan_core::ScanSession;

/// Read UR parts from a file, or stdin for `-`, one per line
pub fn read_parts(input: &str) -> Result<Vec<String>> {
    let text = if input == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read parts from stdin")?;
        buf
    } else {
        fs::read_to_string(input)
            .with_context(|| format!("Failed to read input file: {}", input))?
    };

    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Feed parts into a fresh session until it completes or fails.
///
/// Unreadable and foreign parts are skipped, as a camera loop would.
pub fn scan_parts(parts: &[String], show_progress: bool) -> Result<ScanSession> {
    let mut session = ScanSession::new();

    let bar = if show_progress {
        ProgressBar::new(1000)
    } else {
        ProgressBar::hidden()
    };
    bar.set_style(
        ProgressStyle::with_template("{bar:40} {percent:>3}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    for (line, part) in parts.iter().enumerate() {
        match session.feed(part) {
            Ok(outcome) => debug!("Line {}: {:?}", line + 1, outcome),
            Err(err) if err.is_recoverable() => {
                warn!("Line {}: skipped ({})", line + 1, err);
            }
            Err(err) => {
                bar.abandon();
                return Err(err).with_context(|| format!("Transfer failed at line {}", line + 1));
            }
        }
        bar.set_position((session.progress() * 1000.0) as u64);
        bar.set_message(format!("{} parts", line + 1));
        if session.is_complete() {
            break;
        }
    }
    bar.finish_and_clear();

    Ok(session)
}
