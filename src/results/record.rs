use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    #[default]
    Credential,
    /// Produced by the runner when a module fails.
    Diagnostic,
}

/// One entry produced by a module.
///
/// `category` and `module` are always present; everything else lives in the
/// open `fields` payload and is serialized inline next to them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub category: String,
    pub module: String,
    #[serde(default)]
    pub kind: RecordKind,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl ResultRecord {
    pub fn new<S: Into<String>>(category: S, module: S) -> Self {
        Self {
            category: category.into(),
            module: module.into(),
            kind: RecordKind::Credential,
            fields: Map::new(),
        }
    }

    /// A record without origin; the runner stamps category and module when
    /// the record passes through it.
    pub fn entry() -> Self {
        Self::new("", "")
    }

    pub fn diagnostic<S: Into<String>>(category: S, module: S, error: &str, detail: &str) -> Self {
        let mut record = Self::new(category, module);
        record.kind = RecordKind::Diagnostic;
        record.set("error", error);
        if !detail.is_empty() {
            record.set("detail", detail);
        }
        record
    }

    pub fn with_field<K: Into<String>, V: Into<Value>>(mut self, key: K, value: V) -> Self {
        self.set(key, value);
        self
    }

    pub fn set<K: Into<String>, V: Into<Value>>(&mut self, key: K, value: V) {
        let key = key.into();
        // The origin keys are owned by the record itself.
        if key == "category" || key == "module" || key == "kind" {
            return;
        }
        self.fields.insert(key, value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn stamp(&mut self, category: &str, module: &str) {
        self.category = category.to_string();
        self.module = module.to_string();
    }

    pub fn is_diagnostic(&self) -> bool {
        self.kind == RecordKind::Diagnostic
    }

    /// Field values rendered as `key: value` lines for human output.
    pub fn display_lines(&self) -> Vec<String> {
        self.fields
            .iter()
            .map(|(key, value)| match value {
                Value::String(s) => format!("{}: {}", key, s),
                Value::Null => format!("{}:", key),
                other => format!("{}: {}", key, other),
            })
            .collect()
    }
}
