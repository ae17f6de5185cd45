use crate::config::{OutputMode, ProcessConfig};
use crate::error::{CredSweepError, Result};
use crate::results::{ResultRecord, ResultStore};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

const FILE_STEM: &str = "credentials";

#[derive(Serialize)]
struct JsonReport<'a> {
    generated_at: DateTime<Utc>,
    version: &'static str,
    credentials_found: usize,
    modules_failed: usize,
    results: &'a [ResultRecord],
}

/// Persists the final result store in the requested formats.
pub struct OutputWriter {
    output_dir: PathBuf,
    mode: OutputMode,
    generated_at: DateTime<Utc>,
}

impl OutputWriter {
    pub fn new(output_dir: PathBuf, mode: OutputMode) -> Self {
        Self {
            output_dir,
            mode,
            generated_at: Utc::now(),
        }
    }

    pub fn from_config(config: &ProcessConfig) -> Self {
        Self::new(config.output_dir.clone(), config.output_mode)
    }

    pub fn with_timestamp(mut self, generated_at: DateTime<Utc>) -> Self {
        self.generated_at = generated_at;
        self
    }

    /// Write every requested format; returns the files written.
    pub fn write(&self, store: &ResultStore) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();
        if !self.mode.persists() {
            return Ok(written);
        }

        if !self.output_dir.is_dir() {
            return Err(CredSweepError::OutputDestination {
                path: self.output_dir.display().to_string(),
            });
        }

        if self.mode.writes_text() {
            let path = self.file_path("txt");
            self.write_text(&path, store)?;
            written.push(path);
        }

        if self.mode.writes_json() {
            let path = self.file_path("json");
            self.write_json(&path, store)?;
            written.push(path);
        }

        Ok(written)
    }

    pub fn file_path(&self, extension: &str) -> PathBuf {
        self.output_dir.join(format!(
            "{}_{}.{}",
            FILE_STEM,
            self.generated_at.format("%Y%m%d_%H%M%S"),
            extension
        ))
    }

    fn write_json(&self, path: &Path, store: &ResultStore) -> Result<()> {
        let report = JsonReport {
            generated_at: self.generated_at,
            version: crate::version_info(),
            credentials_found: store.credential_count(),
            modules_failed: store.diagnostic_count(),
            results: store.records(),
        };

        let content = serde_json::to_string_pretty(&report)?;
        fs::write(path, content).map_err(CredSweepError::Io)?;
        Ok(())
    }

    fn write_text(&self, path: &Path, store: &ResultStore) -> Result<()> {
        let mut file = fs::File::create(path).map_err(CredSweepError::Io)?;

        let title = format!("credsweep {} results", crate::version_info());
        writeln!(file, "{}", title)?;
        writeln!(file, "{}", "=".repeat(title.len()))?;
        writeln!(
            file,
            "Generated at: {}",
            self.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        )?;
        writeln!(file)?;

        let mut current_category: Option<&str> = None;
        for group in store.by_module() {
            if current_category != Some(group.category) {
                writeln!(file, "########## {} ##########", group.category)?;
                writeln!(file)?;
                current_category = Some(group.category);
            }

            writeln!(file, "------------------- {} -------------------", group.module)?;
            for record in group.records {
                if record.is_diagnostic() {
                    let error = record
                        .get("error")
                        .and_then(|v| v.as_str())
                        .unwrap_or("unknown error");
                    writeln!(file, "[!] {}", error)?;
                } else {
                    for line in record.display_lines() {
                        writeln!(file, "{}", line)?;
                    }
                }
                writeln!(file)?;
            }
        }

        writeln!(
            file,
            "{} credentials found, {} modules failed",
            store.credential_count(),
            store.diagnostic_count()
        )?;

        Ok(())
    }
}
