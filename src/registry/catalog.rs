//! Built-in module catalog.
//!
//! The catalog only declares each module's CLI contract. Extraction backends
//! are linked in by embedders through [`Module`](super::Module); a catalog
//! entry without one reports itself as unavailable when invoked.

use super::{
    FnModule, ModuleDescriptor, ModuleRegistry, OptionKind, SuboptionDescriptor, ValueType,
};
use crate::error::RegistryError;

struct CategoryEntry {
    key: &'static str,
    title: &'static str,
    modules: fn() -> Vec<ModuleDescriptor>,
}

const CATEGORIES: &[CategoryEntry] = &[
    CategoryEntry {
        key: "browsers",
        title: "Browsers",
        modules: browsers,
    },
    CategoryEntry {
        key: "mails",
        title: "Mail clients",
        modules: mails,
    },
    CategoryEntry {
        key: "sysadmin",
        title: "Sysadmin tools",
        modules: sysadmin,
    },
    CategoryEntry {
        key: "wifi",
        title: "Wifi",
        modules: wifi,
    },
    CategoryEntry {
        key: "windows",
        title: "Windows credential stores",
        modules: windows,
    },
];

fn browsers() -> Vec<ModuleDescriptor> {
    vec![
        ModuleDescriptor::new("chromium", "Chromium based browsers"),
        ModuleDescriptor::new("firefox", "Firefox based browsers")
            .with_suboption(SuboptionDescriptor::new(
                "-firefox-profile",
                "firefox_profile",
                OptionKind::Typed(ValueType::Path),
                "only read this Firefox profile directory",
                "Firefox",
            ))
            .supersede_flag(),
    ]
}

fn mails() -> Vec<ModuleDescriptor> {
    vec![
        // The profile selector stays internal to the module.
        ModuleDescriptor::new("thunderbird", "Thunderbird")
            .with_suboption(SuboptionDescriptor::new(
                "-thunderbird-profile",
                "thunderbird_profile",
                OptionKind::Typed(ValueType::Path),
                "only read this Thunderbird profile directory",
                "Thunderbird",
            ))
            .hide_suboptions(),
        ModuleDescriptor::new("outlook", "Outlook"),
    ]
}

fn sysadmin() -> Vec<ModuleDescriptor> {
    vec![
        ModuleDescriptor::new("filezilla", "FileZilla"),
        ModuleDescriptor::new("openssh", "OpenSSH private keys").with_suboption(
            SuboptionDescriptor::new(
                "-ssh-max-keys",
                "ssh_max_keys",
                OptionKind::Typed(ValueType::Integer),
                "stop after reporting this many keys",
                "OpenSSH",
            ),
        ),
    ]
}

fn wifi() -> Vec<ModuleDescriptor> {
    vec![ModuleDescriptor::new("wifi", "Wifi profiles")]
}

fn windows() -> Vec<ModuleDescriptor> {
    vec![
        ModuleDescriptor::new("credman", "Windows credential manager"),
        ModuleDescriptor::new("vault", "Windows vault"),
    ]
}

fn unlinked(descriptor: ModuleDescriptor) -> FnModule {
    let name = descriptor.name.clone();
    FnModule::new(descriptor, move |_| {
        Err(anyhow::anyhow!(
            "no extraction backend is linked for '{}' in this build",
            name
        ))
    })
}

/// Registry holding every built-in category and module declaration.
pub fn builtin() -> Result<ModuleRegistry, RegistryError> {
    let mut builder = ModuleRegistry::builder();
    for entry in CATEGORIES {
        builder = builder.category(entry.key, entry.title);
    }

    for entry in CATEGORIES {
        for descriptor in (entry.modules)() {
            builder = builder.register(entry.key, unlinked(descriptor));
        }
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ModuleContext;
    use std::collections::BTreeMap;

    #[test]
    fn test_builtin_catalog_is_consistent() {
        let registry = builtin().unwrap();
        assert_eq!(registry.categories().len(), CATEGORIES.len());
        assert_eq!(registry.module_count(), 9);
        assert!(registry.category("wifi").is_some());
    }

    #[test]
    fn test_unlinked_module_reports_missing_backend() {
        let registry = builtin().unwrap();
        let module = registry.category("wifi").unwrap().module("wifi").unwrap();
        let ctx = ModuleContext {
            category: "wifi",
            unlock_credential: None,
            options: BTreeMap::new(),
        };

        let err = module.run(&ctx).err().unwrap();
        assert!(err.to_string().contains("no extraction backend"));
    }
}
