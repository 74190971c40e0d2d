use crate::{
    models::{CurveRecord, RunSummary},
    Result,
};
use csv::{ReaderBuilder, Writer};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

pub const SINGLE_SUFFIX: &str = "_single.csv";
pub const REPEATED_SUFFIX: &str = "_repeated.csv";
pub const SUMMARY_SUFFIX: &str = "_summary.json";

/// Persists simulated curves as `days,plasma_level` tables.
pub struct ResultStore;

impl ResultStore {
    /// Write `{prefix}_single.csv` and, when present, `{prefix}_repeated.csv`.
    ///
    /// Nothing is written without a single-dose curve. Returns the files written.
    pub fn save<P: AsRef<Path>>(
        prefix: P,
        curve: Option<&[f64]>,
        plasma: Option<&[f64]>,
    ) -> Result<Vec<PathBuf>> {
        let prefix = prefix.as_ref();
        let mut written = Vec::new();

        let curve = match curve {
            Some(curve) => curve,
            None => {
                log::warn!("No single-dose curve to save for {}", prefix.display());
                return Ok(written);
            }
        };

        Self::ensure_parent(prefix)?;

        let single_path = Self::record_path(prefix, SINGLE_SUFFIX);
        Self::write_curve(&single_path, curve)?;
        written.push(single_path);

        if let Some(plasma) = plasma {
            let repeated_path = Self::record_path(prefix, REPEATED_SUFFIX);
            Self::write_curve(&repeated_path, plasma)?;
            written.push(repeated_path);
        }

        log::info!("Saved {} curve record(s) under {}", written.len(), prefix.display());
        Ok(written)
    }

    /// Read back a curve record as (day index, plasma level) columns.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<(Vec<usize>, Vec<f64>)> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .from_path(path)?;

        let mut days = Vec::new();
        let mut levels = Vec::new();
        for record in reader.deserialize() {
            let record: CurveRecord = record?;
            days.push(record.days);
            levels.push(record.plasma_level);
        }

        Ok((days, levels))
    }

    pub fn save_summary<P: AsRef<Path>>(prefix: P, summary: &RunSummary) -> Result<PathBuf> {
        let prefix = prefix.as_ref();
        Self::ensure_parent(prefix)?;

        let path = Self::record_path(prefix, SUMMARY_SUFFIX);
        fs::write(&path, serde_json::to_string_pretty(summary)?)?;
        Ok(path)
    }

    pub fn record_path(prefix: &Path, suffix: &str) -> PathBuf {
        let mut name = OsString::from(prefix.as_os_str());
        name.push(suffix);
        PathBuf::from(name)
    }

    fn write_curve(path: &Path, levels: &[f64]) -> Result<()> {
        let mut writer = Writer::from_path(path)?;
        for (days, &plasma_level) in levels.iter().enumerate() {
            writer.serialize(CurveRecord { days, plasma_level })?;
        }
        writer.flush()?;
        Ok(())
    }

    fn ensure_parent(prefix: &Path) -> Result<()> {
        match prefix.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                fs::create_dir_all(parent)?;
                Ok(())
            }
            _ => Ok(()),
        }
    }
}
