//! Module catalog: categories, the modules they own and the CLI contract each
//! module declares.
//!
//! The registry is assembled once through [`RegistryBuilder`] and is read-only
//! afterwards. Registration order is preserved everywhere: it drives both the
//! help layout and the execution order.

pub mod catalog;
pub mod descriptor;
pub mod module;

#[cfg(test)]
pub(crate) mod testing;

pub use descriptor::{
    flag_name, ModuleDescriptor, OptionKind, OptionValue, SuboptionDescriptor, ValueType,
};
pub use module::{FnModule, Module, ModuleContext, RecordStream};

use crate::cli::{ALL_CATEGORIES, RESERVED_DESTS, RESERVED_FLAGS};
use crate::error::RegistryError;
use regex::Regex;
use std::collections::HashSet;

const FLAG_PATTERN: &str = r"^-{1,2}[A-Za-z][A-Za-z0-9_-]*$";
const DEST_PATTERN: &str = r"^[A-Za-z_][A-Za-z0-9_]*$";

/// A named group of modules sharing a target domain.
#[derive(Debug)]
pub struct CategoryDescriptor {
    pub key: String,
    pub display_name: String,
    modules: Vec<Box<dyn Module>>,
}

impl CategoryDescriptor {
    pub fn modules(&self) -> &[Box<dyn Module>] {
        &self.modules
    }

    pub fn module(&self, name: &str) -> Option<&dyn Module> {
        self.modules
            .iter()
            .find(|m| m.name() == name)
            .map(|m| m.as_ref())
    }
}

#[derive(Debug)]
pub struct ModuleRegistry {
    categories: Vec<CategoryDescriptor>,
}

impl ModuleRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Categories in registration order.
    pub fn categories(&self) -> &[CategoryDescriptor] {
        &self.categories
    }

    pub fn category(&self, key: &str) -> Option<&CategoryDescriptor> {
        self.categories.iter().find(|c| c.key == key)
    }

    /// Modules of one category in registration order.
    pub fn modules_of(&self, key: &str) -> Option<&[Box<dyn Module>]> {
        self.category(key).map(|c| c.modules())
    }

    pub fn module_count(&self) -> usize {
        self.categories.iter().map(|c| c.modules.len()).sum()
    }

    /// Every (category, module) pair in registry order.
    pub fn iter_modules(&self) -> impl Iterator<Item = (&CategoryDescriptor, &dyn Module)> {
        self.categories
            .iter()
            .flat_map(|c| c.modules.iter().map(move |m| (c, m.as_ref())))
    }
}

#[derive(Default)]
pub struct RegistryBuilder {
    categories: Vec<CategoryDescriptor>,
    errors: Vec<RegistryError>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn category<S: Into<String>>(mut self, key: S, display_name: S) -> Self {
        let key = key.into();
        if self.categories.iter().any(|c| c.key == key) {
            self.errors.push(RegistryError::DuplicateCategory { key });
            return self;
        }

        self.categories.push(CategoryDescriptor {
            key,
            display_name: display_name.into(),
            modules: Vec::new(),
        });
        self
    }

    pub fn register<M: Module + 'static>(mut self, category: &str, module: M) -> Self {
        match self.categories.iter_mut().find(|c| c.key == category) {
            Some(descriptor) => descriptor.modules.push(Box::new(module)),
            None => self.errors.push(RegistryError::UnknownCategory {
                key: category.to_string(),
                module: module.name().to_string(),
            }),
        }
        self
    }

    pub fn build(mut self) -> Result<ModuleRegistry, RegistryError> {
        if !self.errors.is_empty() {
            return Err(self.errors.remove(0));
        }

        let rules = DescriptorRules::new()?;
        let mut flags: HashSet<String> = RESERVED_FLAGS.iter().map(|f| f.to_string()).collect();
        let mut dests: HashSet<String> = RESERVED_DESTS.iter().map(|d| d.to_string()).collect();

        for category in &self.categories {
            if category.key.is_empty()
                || category.key == ALL_CATEGORIES
                || category.key.starts_with('-')
                || category.key.contains(char::is_whitespace)
            {
                return Err(RegistryError::InvalidDescriptor {
                    module: category.key.clone(),
                    reason: "category key must be a plain word other than 'all'".to_string(),
                });
            }

            let mut names = HashSet::new();
            for module in &category.modules {
                let descriptor = module.descriptor();
                rules.check(descriptor)?;

                if !names.insert(descriptor.name.clone()) {
                    return Err(RegistryError::DuplicateModule {
                        category: category.key.clone(),
                        name: descriptor.name.clone(),
                    });
                }

                claim(&mut flags, flag_name(&descriptor.option_flag), &descriptor.option_flag)?;
                claim(&mut dests, &descriptor.option_dest, &descriptor.option_flag)?;

                // Hidden suboptions never reach the command surface, so they
                // cannot collide there.
                for sub in descriptor.exposed_suboptions() {
                    claim(&mut flags, flag_name(&sub.flag), &sub.flag)?;
                    claim(&mut dests, &sub.dest, &sub.flag)?;
                }
            }
        }

        Ok(ModuleRegistry {
            categories: self.categories,
        })
    }
}

fn claim(seen: &mut HashSet<String>, key: &str, flag: &str) -> Result<(), RegistryError> {
    if seen.insert(key.to_string()) {
        Ok(())
    } else {
        Err(RegistryError::DuplicateOption {
            flag: flag.to_string(),
        })
    }
}

struct DescriptorRules {
    flag: Regex,
    dest: Regex,
}

impl DescriptorRules {
    fn new() -> Result<Self, RegistryError> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| RegistryError::InvalidDescriptor {
                module: String::new(),
                reason: e.to_string(),
            })
        };

        Ok(Self {
            flag: compile(FLAG_PATTERN)?,
            dest: compile(DEST_PATTERN)?,
        })
    }

    fn check(&self, descriptor: &ModuleDescriptor) -> Result<(), RegistryError> {
        let invalid = |reason: String| RegistryError::InvalidDescriptor {
            module: descriptor.name.clone(),
            reason,
        };

        if descriptor.name.trim().is_empty() {
            return Err(invalid("module name is empty".to_string()));
        }
        if !self.flag.is_match(&descriptor.option_flag) {
            return Err(invalid(format!("malformed flag '{}'", descriptor.option_flag)));
        }
        if !self.dest.is_match(&descriptor.option_dest) {
            return Err(invalid(format!("malformed dest '{}'", descriptor.option_dest)));
        }

        for sub in &descriptor.suboptions {
            if !self.flag.is_match(&sub.flag) {
                return Err(invalid(format!("malformed suboption flag '{}'", sub.flag)));
            }
            if !self.dest.is_match(&sub.dest) {
                return Err(invalid(format!("malformed suboption dest '{}'", sub.dest)));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{static_module, two_category_registry};
    use super::*;

    #[test]
    fn test_registration_order_is_preserved() {
        let registry = two_category_registry();

        let keys: Vec<_> = registry.categories().iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, vec!["browsers", "mails"]);

        let names: Vec<_> = registry
            .modules_of("browsers")
            .unwrap()
            .iter()
            .map(|m| m.name())
            .collect();
        assert_eq!(names, vec!["chromium", "firefox"]);
        assert_eq!(registry.module_count(), 4);
        assert!(registry.modules_of("missing").is_none());
    }

    #[test]
    fn test_duplicate_module_in_category() {
        let result = ModuleRegistry::builder()
            .category("browsers", "Browsers")
            .register("browsers", static_module("firefox", 1))
            .register("browsers", static_module("firefox", 2))
            .build();

        assert_eq!(
            result.unwrap_err(),
            RegistryError::DuplicateModule {
                category: "browsers".to_string(),
                name: "firefox".to_string(),
            }
        );
    }

    #[test]
    fn test_same_name_in_other_category_collides_on_flag() {
        let result = ModuleRegistry::builder()
            .category("browsers", "Browsers")
            .category("mails", "Mails")
            .register("browsers", static_module("shared", 1))
            .register("mails", static_module("shared", 1))
            .build();

        assert!(matches!(
            result.unwrap_err(),
            RegistryError::DuplicateOption { .. }
        ));
    }

    #[test]
    fn test_unknown_and_duplicate_categories() {
        let result = ModuleRegistry::builder()
            .register("nowhere", static_module("ghost", 0))
            .build();
        assert!(matches!(
            result.unwrap_err(),
            RegistryError::UnknownCategory { .. }
        ));

        let result = ModuleRegistry::builder()
            .category("wifi", "Wifi")
            .category("wifi", "Wifi again")
            .build();
        assert!(matches!(
            result.unwrap_err(),
            RegistryError::DuplicateCategory { .. }
        ));
    }

    #[test]
    fn test_reserved_names_are_rejected() {
        let result = ModuleRegistry::builder()
            .category("all", "Everything")
            .build();
        assert!(matches!(
            result.unwrap_err(),
            RegistryError::InvalidDescriptor { .. }
        ));

        let clashing = FnModule::new(
            ModuleDescriptor::new("quiet", "clashes with a global flag"),
            |_| Ok(Vec::new()),
        );
        let result = ModuleRegistry::builder()
            .category("misc", "Misc")
            .register("misc", clashing)
            .build();
        assert!(matches!(
            result.unwrap_err(),
            RegistryError::DuplicateOption { .. }
        ));
    }

    #[test]
    fn test_malformed_flag_is_rejected() {
        let module = FnModule::new(
            ModuleDescriptor::new("bad", "bad flag").with_flag("no-dash", "bad"),
            |_| Ok(Vec::new()),
        );
        let result = ModuleRegistry::builder()
            .category("misc", "Misc")
            .register("misc", module)
            .build();

        assert!(matches!(
            result.unwrap_err(),
            RegistryError::InvalidDescriptor { .. }
        ));
    }

    #[test]
    fn test_iter_modules_follows_registry_order() {
        let registry = two_category_registry();
        let pairs: Vec<_> = registry
            .iter_modules()
            .map(|(c, m)| format!("{}/{}", c.key, m.name()))
            .collect();

        assert_eq!(
            pairs,
            vec![
                "browsers/chromium",
                "browsers/firefox",
                "mails/thunderbird",
                "mails/outlook",
            ]
        );
    }
}
