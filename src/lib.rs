pub mod cli;
pub mod config;
pub mod error;
pub mod registry;
pub mod results;
pub mod runner;
pub mod ui;

// Public API re-exports
pub use cli::{build_surface, CategorySelection, CommandSurface, GlobalOptions, ResolvedSelection};
pub use config::{OutputMode, ProcessConfig, ResolvedConfig};
pub use error::{CredSweepError, RegistryError, Result, UserFriendlyError};

// Core functionality re-exports
pub use registry::{
    CategoryDescriptor, FnModule, Module, ModuleContext, ModuleDescriptor, ModuleRegistry,
    OptionKind, OptionValue, RecordStream, RegistryBuilder, SuboptionDescriptor, ValueType,
};
pub use results::{
    AccumulationPolicy, OutputWriter, RecordKind, ResultAggregator, ResultRecord, ResultStore,
};
pub use runner::{RunStream, Runner};
pub use ui::Console;

use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Outcome of one [`CredSweep::execute`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub records_appended: usize,
    pub modules_started: usize,
    pub modules_failed: usize,
    pub elapsed: Duration,
}

/// Main library interface: registry, configuration and result store of a run.
pub struct CredSweep {
    registry: ModuleRegistry,
    config: ProcessConfig,
    console: Console,
    aggregator: ResultAggregator,
}

impl CredSweep {
    /// Create an instance whose store is reset on every `execute`.
    pub fn new(registry: ModuleRegistry, config: ProcessConfig) -> Self {
        Self::with_policy(registry, config, AccumulationPolicy::ResetPerRun)
    }

    pub fn with_policy(
        registry: ModuleRegistry,
        config: ProcessConfig,
        policy: AccumulationPolicy,
    ) -> Self {
        let console = Console::new(config.verbosity, config.quiet);
        Self {
            registry,
            config,
            console,
            aggregator: ResultAggregator::new(policy),
        }
    }

    /// Run the selected modules, streaming every record to the console and
    /// into the result store.
    pub fn execute(&mut self, selection: &ResolvedSelection) -> RunSummary {
        let start = Instant::now();
        let console = &self.console;
        let mut last_category: Option<String> = None;

        let mut stream = Runner::new(&self.registry, &self.config)
            .run(selection)
            .on_module_start(move |category, module| {
                if last_category.as_deref() != Some(category) {
                    console.category_title(category);
                    last_category = Some(category.to_string());
                }
                console.module_title(module);
            });

        let records_appended = self
            .aggregator
            .consume_with(stream.by_ref(), |record| console.record(record));

        RunSummary {
            records_appended,
            modules_started: stream.modules_started(),
            modules_failed: stream.modules_failed(),
            elapsed: start.elapsed(),
        }
    }

    /// Write the current store in the configured formats.
    pub fn persist(&self) -> Result<Vec<PathBuf>> {
        OutputWriter::from_config(&self.config).write(self.aggregator.snapshot())
    }

    pub fn store(&self) -> &ResultStore {
        self.aggregator.snapshot()
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    pub fn config(&self) -> &ProcessConfig {
        &self.config
    }

    pub fn console(&self) -> &Console {
        &self.console
    }

    /// Handle error with user-friendly output
    pub fn handle_error(&self, error: &CredSweepError) {
        self.console.print_user_friendly_error(error);
    }
}

/// Get version information
pub fn version_info() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Get build information
pub fn build_info() -> BuildInfo {
    BuildInfo {
        version: env!("CARGO_PKG_VERSION"),
        git_hash: option_env!("GIT_HASH").unwrap_or("unknown"),
        target: std::env::consts::ARCH.to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct BuildInfo {
    pub version: &'static str,
    pub git_hash: &'static str,
    pub target: String,
}

impl std::fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "credsweep {} ({}) for {}",
            self.version, self.git_hash, self.target
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::testing::{failing_module, static_module, two_category_registry};
    use tempfile::TempDir;

    fn quiet_config() -> ProcessConfig {
        ProcessConfig::default().with_quiet(true)
    }

    #[test]
    fn test_execute_all_collects_every_record() {
        let mut app = CredSweep::new(two_category_registry(), quiet_config());
        let summary = app.execute(&ResolvedSelection::new(CategorySelection::All));

        assert_eq!(summary.records_appended, 5);
        assert_eq!(summary.modules_started, 4);
        assert_eq!(summary.modules_failed, 0);
        assert_eq!(app.store().len(), 5);
    }

    #[test]
    fn test_failure_is_isolated_outside_quiet_mode() {
        let registry = ModuleRegistry::builder()
            .category("stores", "Stores")
            .register("stores", failing_module("a"))
            .register("stores", static_module("b", 1))
            .build()
            .unwrap();
        let mut app = CredSweep::new(registry, ProcessConfig::default());

        let summary = app.execute(&ResolvedSelection::new(CategorySelection::One(
            "stores".to_string(),
        )));

        assert_eq!(summary.modules_failed, 1);
        assert_eq!(app.store().diagnostic_count(), 1);
        assert_eq!(app.store().credential_count(), 1);
        assert_eq!(app.store().records()[1].module, "b");
    }

    #[test]
    fn test_accumulation_policy_across_executes() {
        let selection = ResolvedSelection::new(CategorySelection::One("mails".to_string()));

        let mut resetting = CredSweep::new(two_category_registry(), quiet_config());
        resetting.execute(&selection);
        resetting.execute(&selection);
        assert_eq!(resetting.store().len(), 3);

        let mut accumulating = CredSweep::with_policy(
            two_category_registry(),
            quiet_config(),
            AccumulationPolicy::Accumulate,
        );
        accumulating.execute(&selection);
        accumulating.execute(&selection);
        assert_eq!(accumulating.store().len(), 6);
    }

    #[test]
    fn test_persist_writes_configured_formats() {
        let temp_dir = TempDir::new().unwrap();
        let config = quiet_config().with_output(OutputMode::Json, temp_dir.path());
        let mut app = CredSweep::new(two_category_registry(), config);

        app.execute(&ResolvedSelection::new(CategorySelection::All));
        let written = app.persist().unwrap();

        assert_eq!(written.len(), 1);
        assert!(written[0].extension().is_some_and(|e| e == "json"));
    }

    #[test]
    fn test_version_info() {
        assert!(!version_info().is_empty());
        let build_info = build_info();
        assert!(build_info.to_string().contains("credsweep"));
        assert!(build_info.to_string().contains(build_info.version));
    }
}
