use crate::cli::GlobalOptions;
use crate::error::{CredSweepError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Which result files are written at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Console only.
    #[default]
    None,
    Text,
    Json,
    Both,
}

impl OutputMode {
    /// Flags refine each other in the order `-oN`, `-oJ`, `-oA`: only `-oA`
    /// selects both formats, and `-oJ` overrides `-oN`.
    pub fn from_flags(normal: bool, json: bool, all: bool) -> Self {
        if all {
            OutputMode::Both
        } else if json {
            OutputMode::Json
        } else if normal {
            OutputMode::Text
        } else {
            OutputMode::None
        }
    }

    pub fn writes_text(&self) -> bool {
        matches!(self, OutputMode::Text | OutputMode::Both)
    }

    pub fn writes_json(&self) -> bool {
        matches!(self, OutputMode::Json | OutputMode::Both)
    }

    pub fn persists(&self) -> bool {
        *self != OutputMode::None
    }
}

/// Run configuration shared by the runner, modules and writers.
///
/// Built once from the parsed globals and passed by reference afterwards.
#[derive(Clone, PartialEq, Eq)]
pub struct ProcessConfig {
    pub output_mode: OutputMode,
    pub output_dir: PathBuf,
    pub quiet: bool,
    pub verbosity: u8,
    pub unlock_credential: Option<String>,
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self {
            output_mode: OutputMode::None,
            output_dir: PathBuf::from("."),
            quiet: false,
            verbosity: 0,
            unlock_credential: None,
        }
    }
}

impl fmt::Debug for ProcessConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessConfig")
            .field("output_mode", &self.output_mode)
            .field("output_dir", &self.output_dir)
            .field("quiet", &self.quiet)
            .field("verbosity", &self.verbosity)
            .field(
                "unlock_credential",
                &self.unlock_credential.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// A configuration plus the non-fatal problems met while resolving it.
#[derive(Debug)]
pub struct ResolvedConfig {
    pub config: ProcessConfig,
    pub warnings: Vec<CredSweepError>,
}

impl ProcessConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply the parsed global options on top of the defaults and prepare
    /// the output destination.
    ///
    /// A destination that exists but is not a directory downgrades the run to
    /// console-only and is reported as a warning. Directory creation failures
    /// are errors.
    pub fn resolve(globals: &GlobalOptions) -> Result<ResolvedConfig> {
        let mut config = Self::default().merge_with_globals(globals);
        let mut warnings = Vec::new();

        if let Err(err) = config.prepare_output_dir() {
            match err {
                CredSweepError::OutputDestination { .. } => {
                    config.output_mode = OutputMode::None;
                    warnings.push(err);
                }
                other => return Err(other),
            }
        }

        Ok(ResolvedConfig { config, warnings })
    }

    pub fn merge_with_globals(mut self, globals: &GlobalOptions) -> Self {
        self.output_mode =
            OutputMode::from_flags(globals.write_normal, globals.write_json, globals.write_all);
        self.output_dir = globals.output.clone();
        self.quiet = globals.quiet;
        self.verbosity = if globals.quiet { 0 } else { globals.verbosity };
        self.unlock_credential = globals.password.clone().filter(|p| !p.is_empty());
        self
    }

    pub fn with_output(mut self, mode: OutputMode, dir: impl Into<PathBuf>) -> Self {
        self.output_mode = mode;
        self.output_dir = dir.into();
        self
    }

    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn with_unlock_credential<S: Into<String>>(mut self, credential: S) -> Self {
        self.unlock_credential = Some(credential.into());
        self
    }

    /// Make sure the destination exists when results will be persisted.
    /// Nothing is touched when the mode is console-only.
    pub fn prepare_output_dir(&self) -> Result<()> {
        if !self.output_mode.persists() {
            return Ok(());
        }

        ensure_directory(&self.output_dir)
    }

    pub fn unlock_credential(&self) -> Option<&str> {
        self.unlock_credential.as_deref()
    }
}

fn ensure_directory(path: &Path) -> Result<()> {
    if path.exists() {
        if path.is_dir() {
            return Ok(());
        }
        return Err(CredSweepError::OutputDestination {
            path: path.display().to_string(),
        });
    }

    fs::create_dir_all(path).map_err(CredSweepError::Io)?;
    Ok(())
}
