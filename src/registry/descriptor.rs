use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Value type accepted by a typed suboption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Integer,
    Path,
}

/// How a declared option is expressed on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionKind {
    /// Boolean switch, no value.
    Flag,
    /// Free-form string value.
    Text,
    /// Value parsed into a specific type at parse time.
    Typed(ValueType),
}

impl OptionKind {
    pub fn takes_value(&self) -> bool {
        !matches!(self, OptionKind::Flag)
    }
}

/// A parsed option value handed to modules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Flag(bool),
    Integer(i64),
    Path(PathBuf),
    Text(String),
}

impl OptionValue {
    /// Whether this value counts as "requested" for module selection.
    pub fn is_truthy(&self) -> bool {
        match self {
            OptionValue::Flag(set) => *set,
            _ => true,
        }
    }
}

/// A module-scoped refinement option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuboptionDescriptor {
    pub flag: String,
    pub dest: String,
    pub kind: OptionKind,
    pub help: String,
    pub group_title: String,
}

impl SuboptionDescriptor {
    pub fn new<S: Into<String>>(
        flag: S,
        dest: S,
        kind: OptionKind,
        help: S,
        group_title: S,
    ) -> Self {
        Self {
            flag: flag.into(),
            dest: dest.into(),
            kind,
            help: help.into(),
            group_title: group_title.into(),
        }
    }
}

/// The CLI contract a module declares about itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDescriptor {
    pub name: String,
    pub option_flag: String,
    pub option_dest: String,
    pub help: String,
    pub suboptions: Vec<SuboptionDescriptor>,
    /// When false the suboptions are not added to the command surface.
    pub expose_suboptions: bool,
    /// When true, supplying any suboption activates the module on its own and
    /// the module's flag no longer matters.
    pub flag_superseded: bool,
}

impl ModuleDescriptor {
    /// Descriptor with the conventional `-<name>` flag and `<name>` dest.
    pub fn new<S: Into<String>>(name: S, help: S) -> Self {
        let name = name.into();
        Self {
            option_flag: format!("-{}", name),
            option_dest: name.clone(),
            name,
            help: help.into(),
            suboptions: Vec::new(),
            expose_suboptions: true,
            flag_superseded: false,
        }
    }

    pub fn with_flag<S: Into<String>>(mut self, flag: S, dest: S) -> Self {
        self.option_flag = flag.into();
        self.option_dest = dest.into();
        self
    }

    pub fn with_suboption(mut self, suboption: SuboptionDescriptor) -> Self {
        self.suboptions.push(suboption);
        self
    }

    pub fn hide_suboptions(mut self) -> Self {
        self.expose_suboptions = false;
        self
    }

    pub fn supersede_flag(mut self) -> Self {
        self.flag_superseded = true;
        self
    }

    /// Suboptions that end up on the command surface.
    pub fn exposed_suboptions(&self) -> &[SuboptionDescriptor] {
        if self.expose_suboptions {
            &self.suboptions
        } else {
            &[]
        }
    }
}

/// Strip leading dashes from a declared flag to get the bare option name.
pub fn flag_name(flag: &str) -> &str {
    flag.trim_start_matches('-')
}
