use crate::registry::descriptor::{ModuleDescriptor, OptionValue};
use crate::results::ResultRecord;
use std::collections::BTreeMap;
use std::fmt;

/// Lazily produced records of one module invocation.
pub type RecordStream<'a> = Box<dyn Iterator<Item = anyhow::Result<ResultRecord>> + 'a>;

/// What a module receives when it is invoked.
pub struct ModuleContext<'a> {
    pub category: &'a str,
    pub unlock_credential: Option<&'a str>,
    /// Values of the module's own suboptions, keyed by dest.
    pub options: BTreeMap<String, OptionValue>,
}

impl fmt::Debug for ModuleContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleContext")
            .field("category", &self.category)
            .field(
                "unlock_credential",
                &self.unlock_credential.map(|_| "<redacted>"),
            )
            .field("options", &self.options)
            .finish()
    }
}

/// A self-describing extraction unit.
///
/// The core only relies on the declared descriptor and on the returned record
/// stream being finite.
pub trait Module {
    fn descriptor(&self) -> &ModuleDescriptor;

    fn run<'a>(&'a self, ctx: &ModuleContext<'a>) -> anyhow::Result<RecordStream<'a>>;

    fn name(&self) -> &str {
        &self.descriptor().name
    }
}

type ModuleFn = dyn for<'a> Fn(&ModuleContext<'a>) -> anyhow::Result<Vec<ResultRecord>>;

/// Module built from a descriptor and a closure.
pub struct FnModule {
    descriptor: ModuleDescriptor,
    body: Box<ModuleFn>,
}

impl FnModule {
    pub fn new<F>(descriptor: ModuleDescriptor, body: F) -> Self
    where
        F: for<'a> Fn(&ModuleContext<'a>) -> anyhow::Result<Vec<ResultRecord>> + 'static,
    {
        Self {
            descriptor,
            body: Box::new(body),
        }
    }
}

impl Module for FnModule {
    fn descriptor(&self) -> &ModuleDescriptor {
        &self.descriptor
    }

    fn run<'a>(&'a self, ctx: &ModuleContext<'a>) -> anyhow::Result<RecordStream<'a>> {
        let records = (self.body)(ctx)?;
        Ok(Box::new(records.into_iter().map(Ok)))
    }
}

impl fmt::Debug for dyn Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("name", &self.descriptor().name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fn_module_yields_records() {
        let module = FnModule::new(ModuleDescriptor::new("demo", "demo module"), |ctx| {
            Ok(vec![ResultRecord::entry()
                .with_field("has_credential", ctx.unlock_credential.is_some())])
        });

        let ctx = ModuleContext {
            category: "tests",
            unlock_credential: Some("hunter2"),
            options: BTreeMap::new(),
        };

        let records: Vec<_> = module.run(&ctx).unwrap().collect();
        assert_eq!(records.len(), 1);
        let record = records.into_iter().next().unwrap().unwrap();
        assert_eq!(record.get("has_credential"), Some(&true.into()));
        assert_eq!(module.name(), "demo");
    }

    #[test]
    fn test_context_debug_redacts_credential() {
        let ctx = ModuleContext {
            category: "tests",
            unlock_credential: Some("hunter2"),
            options: BTreeMap::new(),
        };
        let rendered = format!("{:?}", ctx);
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }
}
