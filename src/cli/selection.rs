use crate::cli::ALL_CATEGORIES;
use crate::registry::OptionValue;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategorySelection {
    All,
    One(String),
}

impl CategorySelection {
    pub fn from_name(name: &str) -> Self {
        if name == ALL_CATEGORIES {
            CategorySelection::All
        } else {
            CategorySelection::One(name.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            CategorySelection::All => ALL_CATEGORIES,
            CategorySelection::One(key) => key,
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, CategorySelection::All)
    }
}

/// Options available regardless of the chosen subcommand.
#[derive(Clone, PartialEq, Eq)]
pub struct GlobalOptions {
    pub verbosity: u8,
    pub quiet: bool,
    pub write_normal: bool,
    pub write_json: bool,
    pub write_all: bool,
    pub output: PathBuf,
    pub password: Option<String>,
}

impl Default for GlobalOptions {
    fn default() -> Self {
        Self {
            verbosity: 0,
            quiet: false,
            write_normal: false,
            write_json: false,
            write_all: false,
            output: PathBuf::from("."),
            password: None,
        }
    }
}

impl fmt::Debug for GlobalOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlobalOptions")
            .field("verbosity", &self.verbosity)
            .field("quiet", &self.quiet)
            .field("write_normal", &self.write_normal)
            .field("write_json", &self.write_json)
            .field("write_all", &self.write_all)
            .field("output", &self.output)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Outcome of parsing argv against the composed surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSelection {
    pub category: CategorySelection,
    /// Module flags of the selected categories (always present) and the
    /// suboptions that were supplied, keyed by dest.
    pub module_flags: BTreeMap<String, OptionValue>,
    pub globals: GlobalOptions,
}

impl ResolvedSelection {
    pub fn new(category: CategorySelection) -> Self {
        Self {
            category,
            module_flags: BTreeMap::new(),
            globals: GlobalOptions::default(),
        }
    }

    pub fn with_flag<S: Into<String>>(mut self, dest: S, value: OptionValue) -> Self {
        self.module_flags.insert(dest.into(), value);
        self
    }

    pub fn with_globals(mut self, globals: GlobalOptions) -> Self {
        self.globals = globals;
        self
    }

    pub fn flag(&self, dest: &str) -> Option<&OptionValue> {
        self.module_flags.get(dest)
    }

    pub fn is_set(&self, dest: &str) -> bool {
        self.flag(dest).is_some_and(OptionValue::is_truthy)
    }
}
