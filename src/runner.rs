//! Sequential module dispatch.
//!
//! [`Runner::run`] returns a lazy [`RunStream`]: a module is only invoked once
//! the previous one is exhausted, and each record is handed to the consumer
//! as soon as the module produces it. A failing module is turned into a
//! diagnostic record (or dropped in quiet mode) and the stream moves on.

use crate::cli::{CategorySelection, ResolvedSelection};
use crate::config::ProcessConfig;
use crate::error::CredSweepError;
use crate::registry::{
    CategoryDescriptor, Module, ModuleContext, ModuleDescriptor, ModuleRegistry, OptionValue,
    RecordStream,
};
use crate::results::ResultRecord;
use std::any::Any;
use std::cell::Cell;
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::panic::{self, catch_unwind, AssertUnwindSafe};
use std::sync::Once;

/// A module chosen for execution together with its suboption values.
pub struct PlannedModule<'r> {
    pub category: &'r CategoryDescriptor,
    pub module: &'r dyn Module,
    pub options: BTreeMap<String, OptionValue>,
}

impl fmt::Debug for PlannedModule<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlannedModule")
            .field("category", &self.category.key)
            .field("module", &self.module.name())
            .field("options", &self.options)
            .finish()
    }
}

pub struct Runner<'r> {
    registry: &'r ModuleRegistry,
    config: &'r ProcessConfig,
}

impl<'r> Runner<'r> {
    pub fn new(registry: &'r ModuleRegistry, config: &'r ProcessConfig) -> Self {
        Self { registry, config }
    }

    /// Resolve which modules run, in registry order.
    ///
    /// Every module runs for `all`. Inside a single category a module runs
    /// when it was requested, or when nothing in the category was requested.
    pub fn plan(&self, selection: &ResolvedSelection) -> Vec<PlannedModule<'r>> {
        let categories: Vec<&'r CategoryDescriptor> = match &selection.category {
            CategorySelection::All => self.registry.categories().iter().collect(),
            CategorySelection::One(key) => match self.registry.category(key) {
                Some(category) => vec![category],
                None => {
                    tracing::warn!(category = key.as_str(), "Unknown category, nothing to run");
                    Vec::new()
                }
            },
        };

        let mut planned = Vec::new();
        for category in categories {
            let requested: Vec<bool> = category
                .modules()
                .iter()
                .map(|m| is_requested(m.descriptor(), selection))
                .collect();
            let any_requested = requested.iter().any(|r| *r);

            for (module, requested) in category.modules().iter().zip(requested) {
                if selection.category.is_all() || requested || !any_requested {
                    planned.push(PlannedModule {
                        category,
                        module: module.as_ref(),
                        options: module_options(module.descriptor(), selection),
                    });
                }
            }
        }

        planned
    }

    pub fn run(&self, selection: &ResolvedSelection) -> RunStream<'r> {
        let pending: VecDeque<_> = self.plan(selection).into_iter().collect();
        tracing::debug!(modules = pending.len(), "Run planned");

        RunStream {
            pending,
            current: None,
            unlock_credential: self.config.unlock_credential(),
            quiet: self.config.quiet,
            started: 0,
            failed: 0,
            on_module_start: None,
        }
    }
}

fn is_requested(descriptor: &ModuleDescriptor, selection: &ResolvedSelection) -> bool {
    if selection.is_set(&descriptor.option_dest) {
        return true;
    }

    descriptor.flag_superseded
        && descriptor
            .exposed_suboptions()
            .iter()
            .any(|sub| selection.is_set(&sub.dest))
}

fn module_options(
    descriptor: &ModuleDescriptor,
    selection: &ResolvedSelection,
) -> BTreeMap<String, OptionValue> {
    descriptor
        .exposed_suboptions()
        .iter()
        .filter_map(|sub| {
            selection
                .flag(&sub.dest)
                .map(|value| (sub.dest.clone(), value.clone()))
        })
        .collect()
}

struct ActiveModule<'r> {
    category: &'r str,
    name: &'r str,
    stream: RecordStream<'r>,
}

type StartHook<'r> = Box<dyn FnMut(&str, &str) + 'r>;

/// Lazy sequence of records across every planned module.
pub struct RunStream<'r> {
    pending: VecDeque<PlannedModule<'r>>,
    current: Option<ActiveModule<'r>>,
    unlock_credential: Option<&'r str>,
    quiet: bool,
    started: usize,
    failed: usize,
    on_module_start: Option<StartHook<'r>>,
}

impl<'r> RunStream<'r> {
    /// Call `hook(category, module)` right before each module is invoked.
    pub fn on_module_start<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&str, &str) + 'r,
    {
        self.on_module_start = Some(Box::new(hook));
        self
    }

    pub fn modules_started(&self) -> usize {
        self.started
    }

    pub fn modules_failed(&self) -> usize {
        self.failed
    }

    pub fn remaining_modules(&self) -> usize {
        self.pending.len()
    }

    fn start(&mut self, planned: PlannedModule<'r>) -> Option<ResultRecord> {
        let category: &'r str = &planned.category.key;
        let name: &'r str = &planned.module.descriptor().name;

        self.started += 1;
        tracing::info!(category, module = name, "Running module");
        if let Some(hook) = self.on_module_start.as_mut() {
            hook(category, name);
        }

        let ctx = ModuleContext {
            category,
            unlock_credential: self.unlock_credential,
            options: planned.options,
        };
        let module = planned.module;

        match contain(self.quiet, || module.run(&ctx)) {
            Ok(Ok(stream)) => {
                self.current = Some(ActiveModule {
                    category,
                    name,
                    stream,
                });
                None
            }
            Ok(Err(err)) => self.fail(category, name, describe_error(&err)),
            Err(payload) => self.fail(category, name, describe_panic(payload)),
        }
    }

    fn fail(
        &mut self,
        category: &str,
        module: &str,
        (message, detail): (String, String),
    ) -> Option<ResultRecord> {
        self.failed += 1;
        let error = CredSweepError::ModuleExecution {
            category: category.to_string(),
            module: module.to_string(),
            message,
            detail,
        };
        tracing::warn!(category, module, error = %error, "Module failed");

        if self.quiet {
            return None;
        }
        diagnostic_record(&error)
    }
}

impl<'r> Iterator for RunStream<'r> {
    type Item = ResultRecord;

    fn next(&mut self) -> Option<ResultRecord> {
        let quiet = self.quiet;
        loop {
            let step = self.current.as_mut().map(|active| {
                let outcome = contain(quiet, || active.stream.next());
                (active.category, active.name, outcome)
            });

            match step {
                Some((category, name, Ok(Some(Ok(mut record))))) => {
                    record.stamp(category, name);
                    tracing::debug!(category, module = name, "Record produced");
                    return Some(record);
                }
                Some((_, _, Ok(None))) => {
                    self.current = None;
                }
                Some((category, name, Ok(Some(Err(err))))) => {
                    self.current = None;
                    if let Some(record) = self.fail(category, name, describe_error(&err)) {
                        return Some(record);
                    }
                }
                Some((category, name, Err(payload))) => {
                    self.current = None;
                    if let Some(record) = self.fail(category, name, describe_panic(payload)) {
                        return Some(record);
                    }
                }
                None => {
                    let planned = self.pending.pop_front()?;
                    if let Some(record) = self.start(planned) {
                        return Some(record);
                    }
                }
            }
        }
    }
}

thread_local! {
    static SILENCE_PANICS: Cell<bool> = const { Cell::new(false) };
}

static QUIET_HOOK: Once = Once::new();

/// Wrap the current panic hook once so that it can be muted per thread.
fn install_quiet_hook() {
    QUIET_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if !SILENCE_PANICS.with(Cell::get) {
                previous(info);
            }
        }));
    });
}

/// Run module code, turning a panic into `Err`. In quiet mode the panic
/// message is not printed either.
fn contain<T>(quiet: bool, body: impl FnOnce() -> T) -> std::thread::Result<T> {
    if !quiet {
        return catch_unwind(AssertUnwindSafe(body));
    }

    install_quiet_hook();
    SILENCE_PANICS.with(|silenced| silenced.set(true));
    let outcome = catch_unwind(AssertUnwindSafe(body));
    SILENCE_PANICS.with(|silenced| silenced.set(false));
    outcome
}

/// Turn a module failure into the record stored in place of its results.
pub fn diagnostic_record(error: &CredSweepError) -> Option<ResultRecord> {
    match error {
        CredSweepError::ModuleExecution {
            category,
            module,
            message,
            detail,
        } => Some(ResultRecord::diagnostic(
            category.as_str(),
            module.as_str(),
            message,
            detail,
        )),
        _ => None,
    }
}

fn describe_error(err: &anyhow::Error) -> (String, String) {
    let message = err.to_string();
    let detail = format!("{:?}", err);
    if detail == message {
        (message, String::new())
    } else {
        (message, detail)
    }
}

fn describe_panic(payload: Box<dyn Any + Send>) -> (String, String) {
    let reason = if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    };
    (format!("module panicked: {}", reason), String::new())
}
