//! Fixture modules shared by the unit tests.

use super::{
    FnModule, ModuleDescriptor, ModuleRegistry, OptionKind, SuboptionDescriptor, ValueType,
};
use crate::results::ResultRecord;

/// Yields `count` records carrying an `index` field.
pub fn static_module(name: &str, count: usize) -> FnModule {
    FnModule::new(ModuleDescriptor::new(name, "fixture module"), move |_| {
        Ok((0..count)
            .map(|i| ResultRecord::entry().with_field("index", i as u64))
            .collect())
    })
}

/// Fails before producing anything.
pub fn failing_module(name: &str) -> FnModule {
    let owned = name.to_string();
    FnModule::new(ModuleDescriptor::new(name, "always fails"), move |_| {
        Err(anyhow::anyhow!("{} store is locked", owned))
    })
}

/// Echoes the values it was invoked with.
pub fn echo_module(descriptor: ModuleDescriptor) -> FnModule {
    FnModule::new(descriptor, |ctx| {
        let mut record = ResultRecord::entry()
            .with_field("unlock", ctx.unlock_credential.unwrap_or_default());
        for (dest, value) in &ctx.options {
            record.set(dest.clone(), serde_json::to_value(value).unwrap_or_default());
        }
        Ok(vec![record])
    })
}

pub fn firefox_descriptor() -> ModuleDescriptor {
    ModuleDescriptor::new("firefox", "Firefox saved logins")
        .with_suboption(SuboptionDescriptor::new(
            "-firefox-profile",
            "firefox_profile",
            OptionKind::Typed(ValueType::Path),
            "profile directory to read",
            "Firefox",
        ))
        .supersede_flag()
}

pub fn thunderbird_descriptor() -> ModuleDescriptor {
    ModuleDescriptor::new("thunderbird", "Thunderbird saved logins")
        .with_suboption(SuboptionDescriptor::new(
            "-tb-profile",
            "tb_profile",
            OptionKind::Typed(ValueType::Path),
            "profile directory to read",
            "Thunderbird",
        ))
        .hide_suboptions()
}

/// browsers = [chromium(1), firefox(echo)], mails = [thunderbird(echo), outlook(2)]
pub fn two_category_registry() -> ModuleRegistry {
    ModuleRegistry::builder()
        .category("browsers", "Browsers")
        .category("mails", "Mail clients")
        .register("browsers", static_module("chromium", 1))
        .register("browsers", echo_module(firefox_descriptor()))
        .register("mails", echo_module(thunderbird_descriptor()))
        .register("mails", static_module("outlook", 2))
        .build()
        .unwrap()
}
