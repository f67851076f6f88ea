//! Ledger persistence as pretty JSON arrays of records.
//!
//! Both directions are best-effort: a missing or corrupt file loads as an
//! empty ledger and a failed write is logged, because the next cycle starts
//! from a fresh scrape anyway. Writes go through a temp file + rename so a
//! crash mid-write never leaves a truncated ledger behind.

use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::ledger::Ledger;
use crate::quake::{KeyKind, QuakeRecord};

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);
const TEMP_PREFIX: &str = ".quake.tmp.";

#[derive(Debug, Clone)]
pub struct LedgerStore {
    path: PathBuf,
}

impl LedgerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load and index by `kind`. Never fails.
    pub fn load(&self, kind: KeyKind) -> Ledger {
        match self.try_load() {
            Ok(records) => Ledger::from_records(kind, records),
            Err(e) => {
                tracing::warn!(
                    target: "store",
                    file = %self.path.display(),
                    error = %format!("{e:#}"),
                    "ledger unavailable, starting fresh"
                );
                Ledger::new(kind)
            }
        }
    }

    pub fn try_load(&self) -> Result<Vec<QuakeRecord>> {
        let data = fs::read_to_string(&self.path)
            .with_context(|| format!("reading {}", self.path.display()))?;
        serde_json::from_str(&data).with_context(|| format!("parsing {}", self.path.display()))
    }

    /// Persist `records`; failures are logged and swallowed.
    pub fn save(&self, records: &[QuakeRecord]) {
        if let Err(e) = self.try_save(records) {
            tracing::warn!(
                target: "store",
                file = %self.path.display(),
                error = %format!("{e:#}"),
                "failed to write ledger"
            );
        }
    }

    pub fn try_save(&self, records: &[QuakeRecord]) -> Result<()> {
        let data = serde_json::to_vec_pretty(records).context("serializing ledger")?;
        atomic_write(&self.path, &data)
            .with_context(|| format!("writing {}", self.path.display()))
    }
}

fn atomic_write(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent)?;

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("ledger.json");
    let tmp_path = parent.join(format!(
        "{TEMP_PREFIX}{file_name}.{}.{}",
        std::process::id(),
        TMP_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));

    let result = (|| -> std::io::Result<()> {
        let mut tmp: File = OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(&tmp_path)?;
        tmp.write_all(bytes)?;
        tmp.sync_all()?;
        drop(tmp);
        fs::rename(&tmp_path, path)
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    result
}
