//! Timing-line extraction from raw PerformanceLog files.
//!
//! A timing line looks like
//! `09:00:01.250 Mail - loading_time: 300 ms` (or `elapsed:` instead of
//! `loading_time:`, in any letter case). Every other line is ignored.

use std::path::Path;

use regex::Regex;
use spm_core::error::{Result, SpmError};
use spm_core::models::Sample;
use tracing::{debug, warn};

const TIMING_LINE_PATTERN: &str =
    r"(?i)^\d{2}:\d{2}:\d{2}\.\d{3}\s+(.*?)\s+-\s+(?:loading_time|elapsed):\s+(\d+)\s+ms";

// ── LogLineParser ─────────────────────────────────────────────────────────────

/// Extracts `(service, duration_ms)` samples from log lines.
#[derive(Debug, Clone)]
pub struct LogLineParser {
    pattern: Regex,
}

impl Default for LogLineParser {
    fn default() -> Self {
        Self::new()
    }
}

impl LogLineParser {
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(TIMING_LINE_PATTERN).expect("regex is valid"),
        }
    }

    /// Parse one line.
    ///
    /// Returns `None` when the line does not match, when the label is empty
    /// after trimming, or when the number does not fit in a `u64`.
    pub fn parse_line(&self, line: &str) -> Option<Sample> {
        let caps = self.pattern.captures(line)?;
        let duration_ms: u64 = caps.get(2)?.as_str().parse().ok()?;
        Sample::new(caps.get(1)?.as_str(), duration_ms)
    }

    /// Parse every line of `text`, keeping line order.
    ///
    /// `\n`, `\r\n` and a lone `\r` all end a line.
    pub fn parse_text(&self, text: &str) -> Vec<Sample> {
        text.split(|c: char| c == '\n' || c == '\r')
            .filter_map(|line| self.parse_line(line))
            .collect()
    }

    /// Read and parse one log file.
    pub fn parse_file(&self, path: &Path) -> Result<Vec<Sample>> {
        let bytes = std::fs::read(path).map_err(|source| SpmError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let text = decode_log_bytes(&bytes, path);
        let samples = self.parse_text(&text);
        debug!("{}: {} timing lines", path.display(), samples.len());
        Ok(samples)
    }
}

// ── Decoding ──────────────────────────────────────────────────────────────────

/// Decode raw log bytes as UTF-8, dropping a leading byte-order mark.
///
/// Invalid sequences fall back to a lossy decode so that one bad byte never
/// discards a whole file; the fallback is logged.
pub fn decode_log_bytes(bytes: &[u8], path: &Path) -> String {
    let body = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(body) {
        Ok(text) => text.to_string(),
        Err(e) => {
            warn!(
                "{} is not valid UTF-8 ({}); decoding lossily",
                path.display(),
                e
            );
            String::from_utf8_lossy(body).into_owned()
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
