use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};

const LOG_FILE_NAME: &str = "diagnostics.log";
const MAX_LOG_BYTES: u64 = 1_500_000;
const PATH_PREFIXES: &[&str] = &["/Users/", "/home/", "/root/", "/var/", "/private/", "C:\\", "D:\\"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEvent {
    pub ts: String,
    pub kind: String,
    pub message: String,
}

/// Append-only JSON-lines log for failures that are never surfaced to the user.
#[derive(Debug, Clone)]
pub struct DiagnosticsLog {
    dir: PathBuf,
}

impl DiagnosticsLog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(LOG_FILE_NAME)
    }

    pub fn record(&self, kind: &str, message: &str) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path();
        trim_log(&path)?;
        let event = LogEvent {
            ts: Utc::now().to_rfc3339(),
            kind: kind.to_string(),
            message: sanitize(message),
        };
        let line = serde_json::to_string(&event).unwrap_or_else(|_| "{}".to_string());
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        writeln!(file, "{}", line)?;
        Ok(())
    }

    /// Parsed events, oldest first. Unreadable lines are skipped.
    pub fn events(&self) -> io::Result<Vec<LogEvent>> {
        let path = self.path();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let raw = fs::read_to_string(&path)?;
        Ok(raw
            .lines()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect())
    }
}

fn sanitize(input: &str) -> String {
    let mut out = input.to_string();
    for prefix in PATH_PREFIXES {
        if let Some(idx) = out.find(prefix) {
            out.replace_range(idx.., "[redacted]");
            break;
        }
    }
    // long digit runs are phone numbers more often than not
    out.split_whitespace()
        .map(|token| {
            let digits = token.chars().filter(|c| c.is_ascii_digit()).count();
            if digits >= 10 {
                "[redacted]".to_string()
            } else {
                token.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn trim_log(path: &Path) -> io::Result<()> {
    if !path.exists() {
        return Ok(());
    }
    let meta = fs::metadata(path)?;
    if meta.len() <= MAX_LOG_BYTES {
        return Ok(());
    }
    let data = fs::read(path)?;
    let mut keep_from = data.len().saturating_sub((MAX_LOG_BYTES / 2) as usize);
    // restart at a line boundary so every kept line stays valid JSON
    if let Some(offset) = data[keep_from..].iter().position(|b| *b == b'\n') {
        keep_from += offset + 1;
    }
    fs::write(path, &data[keep_from..])?;
    Ok(())
}
