use crate::cli::{
    normalize_args, CategorySelection, GlobalOptions, ResolvedSelection, ALL_CATEGORIES,
    GLOBAL_VALUE_OPTIONS,
};
use crate::error::{CredSweepError, Result};
use crate::registry::{
    flag_name, CategoryDescriptor, ModuleRegistry, OptionKind, OptionValue, ValueType,
};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::collections::{BTreeMap, HashSet};
use std::ffi::OsString;
use std::path::PathBuf;

const GLOBAL_HEADING: &str = "Global options";

#[derive(Debug, Clone)]
struct OptionSpec {
    dest: String,
    kind: OptionKind,
    /// Module-level flags are always reported, suboptions only when given.
    module_flag: bool,
}

#[derive(Debug, Clone)]
struct CategoryPlan {
    key: String,
    options: Vec<OptionSpec>,
}

/// The composed parser plus what is needed to read a selection back out of
/// its matches.
#[derive(Debug, Clone)]
pub struct CommandSurface {
    command: Command,
    plans: Vec<CategoryPlan>,
    value_options: HashSet<String>,
}

/// Walk the registry once and compose the full command surface.
pub fn build_surface(registry: &ModuleRegistry) -> CommandSurface {
    let mut value_options: HashSet<String> =
        GLOBAL_VALUE_OPTIONS.iter().map(|s| s.to_string()).collect();
    let mut plans = Vec::new();
    let mut category_commands = Vec::new();
    let mut all_command = Command::new(ALL_CATEGORIES).about("Run all modules");

    for category in registry.categories() {
        let (args, plan) = category_args(category, &mut value_options);

        all_command = all_command.args(args.clone());
        category_commands.push(
            Command::new(category.key.clone())
                .about(format!("Run {} modules", category.key))
                .args(args),
        );
        plans.push(plan);
    }

    let command = root_command(registry)
        .subcommand(all_command)
        .subcommands(category_commands);

    CommandSurface {
        command,
        plans,
        value_options,
    }
}

fn root_command(registry: &ModuleRegistry) -> Command {
    Command::new("credsweep")
        .version(crate::version_info())
        .about("Recover credentials stored on the local host through pluggable modules")
        .after_help(module_overview(registry))
        .disable_version_flag(true)
        .propagate_version(true)
        .subcommand_required(true)
        .subcommand_value_name("CATEGORY")
        .subcommand_help_heading("Categories")
        .arg(
            Arg::new("version")
                .long("version")
                .action(ArgAction::Version)
                .global(true)
                .help_heading(GLOBAL_HEADING)
                .help("Print version"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .action(ArgAction::Count)
                .global(true)
                .help_heading(GLOBAL_HEADING)
                .help("Increase verbosity level (-v info, -vv debug)"),
        )
        .arg(
            Arg::new("quiet")
                .long("quiet")
                .action(ArgAction::SetTrue)
                .global(true)
                .help_heading(GLOBAL_HEADING)
                .help("Quiet mode: nothing is printed to the console"),
        )
        .arg(
            Arg::new("write_normal")
                .long("oN")
                .action(ArgAction::SetTrue)
                .global(true)
                .help_heading(GLOBAL_HEADING)
                .help("Write results to a file in a readable format"),
        )
        .arg(
            Arg::new("write_json")
                .long("oJ")
                .action(ArgAction::SetTrue)
                .global(true)
                .help_heading(GLOBAL_HEADING)
                .help("Write results to a file in JSON format"),
        )
        .arg(
            Arg::new("write_all")
                .long("oA")
                .action(ArgAction::SetTrue)
                .global(true)
                .help_heading(GLOBAL_HEADING)
                .help("Write results in both formats"),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .value_name("PATH")
                .value_parser(value_parser!(PathBuf))
                .default_value(".")
                .global(true)
                .help_heading(GLOBAL_HEADING)
                .help("Destination directory for result files"),
        )
        .arg(
            Arg::new("password")
                .long("password")
                .value_name("PASSWORD")
                .global(true)
                .help_heading(GLOBAL_HEADING)
                .help("User password forwarded to modules that unlock a local secret store"),
        )
}

fn category_args(
    category: &CategoryDescriptor,
    value_options: &mut HashSet<String>,
) -> (Vec<Arg>, CategoryPlan) {
    let mut args = Vec::new();
    let mut options = Vec::new();

    for module in category.modules() {
        let descriptor = module.descriptor();

        args.push(
            Arg::new(descriptor.option_dest.clone())
                .long(flag_name(&descriptor.option_flag).to_string())
                .action(ArgAction::SetTrue)
                .help(descriptor.help.clone())
                .help_heading(category.display_name.clone()),
        );
        options.push(OptionSpec {
            dest: descriptor.option_dest.clone(),
            kind: OptionKind::Flag,
            module_flag: true,
        });

        for sub in descriptor.exposed_suboptions() {
            let name = flag_name(&sub.flag).to_string();
            if sub.kind.takes_value() {
                value_options.insert(name.clone());
            }

            args.push(suboption_arg(
                Arg::new(sub.dest.clone())
                    .long(name)
                    .help(sub.help.clone())
                    .help_heading(sub.group_title.clone()),
                sub.kind,
            ));
            options.push(OptionSpec {
                dest: sub.dest.clone(),
                kind: sub.kind,
                module_flag: false,
            });
        }
    }

    let plan = CategoryPlan {
        key: category.key.clone(),
        options,
    };
    (args, plan)
}

fn suboption_arg(arg: Arg, kind: OptionKind) -> Arg {
    match kind {
        OptionKind::Flag => arg.action(ArgAction::SetTrue),
        OptionKind::Text => arg
            .action(ArgAction::Set)
            .value_name("VALUE")
            .value_parser(value_parser!(String)),
        OptionKind::Typed(ValueType::Integer) => arg
            .action(ArgAction::Set)
            .value_name("N")
            .allow_negative_numbers(true)
            .value_parser(value_parser!(i64)),
        OptionKind::Typed(ValueType::Path) => arg
            .action(ArgAction::Set)
            .value_name("PATH")
            .value_parser(value_parser!(PathBuf)),
    }
}

fn module_overview(registry: &ModuleRegistry) -> String {
    let mut overview = String::from("MODULES:\n");
    for category in registry.categories() {
        let names: Vec<&str> = category.modules().iter().map(|m| m.name()).collect();
        overview.push_str(&format!(
            "  {:<10} {} ({})\n",
            category.key,
            category.display_name,
            names.join(", ")
        ));
    }
    overview.push_str("\nRun '<category> -h' for the options of each module.");
    overview
}

impl CommandSurface {
    /// Parse process arguments (program name first) into a selection.
    pub fn parse<I, T>(&self, args: I) -> Result<ResolvedSelection>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let argv = normalize_args(args, &self.value_options);
        let matches = self.command.clone().try_get_matches_from(argv)?;

        let (name, sub_matches) =
            matches
                .subcommand()
                .ok_or_else(|| CredSweepError::Argument {
                    message: "a category subcommand is required".to_string(),
                })?;

        let category = CategorySelection::from_name(name);
        let mut module_flags = BTreeMap::new();

        for plan in self
            .plans
            .iter()
            .filter(|p| category.is_all() || p.key == name)
        {
            for spec in &plan.options {
                if let Some(value) = read_option(sub_matches, spec) {
                    module_flags.insert(spec.dest.clone(), value);
                }
            }
        }

        Ok(ResolvedSelection {
            category,
            module_flags,
            globals: read_globals(sub_matches),
        })
    }

    pub fn command(&self) -> &Command {
        &self.command
    }

    pub fn render_help(&self) -> String {
        self.command.clone().render_help().to_string()
    }

    /// Subcommand names in display order.
    pub fn subcommand_names(&self) -> Vec<String> {
        self.command
            .get_subcommands()
            .map(|c| c.get_name().to_string())
            .collect()
    }
}

fn read_option(matches: &ArgMatches, spec: &OptionSpec) -> Option<OptionValue> {
    match spec.kind {
        OptionKind::Flag => {
            let set = matches.get_flag(&spec.dest);
            (spec.module_flag || set).then_some(OptionValue::Flag(set))
        }
        OptionKind::Text => matches
            .get_one::<String>(&spec.dest)
            .cloned()
            .map(OptionValue::Text),
        OptionKind::Typed(ValueType::Integer) => matches
            .get_one::<i64>(&spec.dest)
            .copied()
            .map(OptionValue::Integer),
        OptionKind::Typed(ValueType::Path) => matches
            .get_one::<PathBuf>(&spec.dest)
            .cloned()
            .map(OptionValue::Path),
    }
}

fn read_globals(matches: &ArgMatches) -> GlobalOptions {
    GlobalOptions {
        verbosity: matches.get_count("verbose"),
        quiet: matches.get_flag("quiet"),
        write_normal: matches.get_flag("write_normal"),
        write_json: matches.get_flag("write_json"),
        write_all: matches.get_flag("write_all"),
        output: matches
            .get_one::<PathBuf>("output")
            .cloned()
            .unwrap_or_else(|| PathBuf::from(".")),
        password: matches.get_one::<String>("password").cloned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::catalog;
    use crate::registry::testing::two_category_registry;

    fn surface() -> CommandSurface {
        build_surface(&two_category_registry())
    }

    #[test]
    fn test_one_subcommand_per_category_plus_all() {
        let registry = two_category_registry();
        let surface = build_surface(&registry);

        let names = surface.subcommand_names();
        assert_eq!(names, vec!["all", "browsers", "mails"]);
        assert_eq!(names.len(), registry.categories().len() + 1);
    }

    #[test]
    fn test_every_module_flag_appears_once_under_its_category() {
        let registry = catalog::builtin().unwrap();
        let surface = build_surface(&registry);

        for category in registry.categories() {
            let sub = surface
                .command()
                .get_subcommands()
                .find(|c| c.get_name() == category.key)
                .unwrap();

            for module in category.modules() {
                let long = flag_name(&module.descriptor().option_flag);
                let count = sub
                    .get_arguments()
                    .filter(|a| a.get_long() == Some(long))
                    .count();
                assert_eq!(count, 1, "{} under {}", long, category.key);
            }
        }
    }

    #[test]
    fn test_all_subcommand_carries_every_module_flag() {
        let registry = two_category_registry();
        let surface = build_surface(&registry);
        let all = surface
            .command()
            .get_subcommands()
            .find(|c| c.get_name() == ALL_CATEGORIES)
            .unwrap();

        for (_, module) in registry.iter_modules() {
            let long = flag_name(&module.descriptor().option_flag);
            assert!(all.get_arguments().any(|a| a.get_long() == Some(long)));
        }
    }

    #[test]
    fn test_hidden_suboptions_are_not_exposed() {
        let surface = surface();
        let err = surface
            .parse(["credsweep", "mails", "-tb-profile", "/tmp/profile"])
            .unwrap_err();
        assert!(matches!(err, CredSweepError::Argument { .. }));
    }

    #[test]
    fn test_parse_category_with_module_flag() {
        let selection = surface()
            .parse(["credsweep", "browsers", "-firefox"])
            .unwrap();

        assert_eq!(
            selection.category,
            CategorySelection::One("browsers".to_string())
        );
        assert_eq!(selection.flag("firefox"), Some(&OptionValue::Flag(true)));
        assert_eq!(selection.flag("chromium"), Some(&OptionValue::Flag(false)));
        // Other categories are not part of the selection.
        assert!(selection.flag("outlook").is_none());
    }

    #[test]
    fn test_parse_typed_suboption() {
        let selection = surface()
            .parse(["credsweep", "browsers", "-firefox-profile", "/home/u/.mozilla/p1"])
            .unwrap();

        assert_eq!(
            selection.flag("firefox_profile"),
            Some(&OptionValue::Path(PathBuf::from("/home/u/.mozilla/p1")))
        );
    }

    #[test]
    fn test_malformed_integer_is_argument_error() {
        let surface = build_surface(&catalog::builtin().unwrap());

        let err = surface
            .parse(["credsweep", "sysadmin", "-ssh-max-keys", "many"])
            .unwrap_err();
        assert!(matches!(err, CredSweepError::Argument { .. }));

        let selection = surface
            .parse(["credsweep", "sysadmin", "-ssh-max-keys", "3"])
            .unwrap();
        assert_eq!(selection.flag("ssh_max_keys"), Some(&OptionValue::Integer(3)));
    }

    #[test]
    fn test_unknown_flag_and_missing_subcommand() {
        let surface = surface();

        let err = surface.parse(["credsweep", "browsers", "-opera"]).unwrap_err();
        assert!(matches!(err, CredSweepError::Argument { .. }));

        let err = surface.parse(["credsweep", "-quiet"]).unwrap_err();
        assert!(matches!(err, CredSweepError::Argument { .. }));

        let err = surface.parse(["credsweep", "games"]).unwrap_err();
        assert!(matches!(err, CredSweepError::Argument { .. }));
    }

    #[test]
    fn test_global_options_before_and_after_subcommand() {
        let surface = surface();

        let before = surface
            .parse(["credsweep", "-vv", "-oJ", "-output", "out", "-password", "pw", "all"])
            .unwrap();
        let after = surface
            .parse(["credsweep", "all", "-vv", "-oJ", "-output", "out", "-password", "pw"])
            .unwrap();

        assert_eq!(before.globals, after.globals);
        assert_eq!(before.globals.verbosity, 2);
        assert!(before.globals.write_json);
        assert_eq!(before.globals.output, PathBuf::from("out"));
        assert_eq!(before.globals.password.as_deref(), Some("pw"));
    }

    #[test]
    fn test_default_globals() {
        let selection = surface().parse(["credsweep", "all"]).unwrap();
        assert_eq!(selection.globals, GlobalOptions::default());
        assert!(selection.category.is_all());
        // Every module flag of every category is reported for `all`.
        assert_eq!(selection.module_flags.len(), 4);
    }

    #[test]
    fn test_parsing_is_idempotent() {
        let surface = surface();
        let argv = ["credsweep", "-v", "browsers", "-chromium", "-firefox-profile", "p"];

        assert_eq!(surface.parse(argv).unwrap(), surface.parse(argv).unwrap());
    }

    #[test]
    fn test_help_and_version_requests() {
        let surface = surface();

        match surface.parse(["credsweep", "-version"]).unwrap_err() {
            CredSweepError::DisplayRequested { text } => {
                assert!(text.contains(crate::version_info()))
            }
            other => panic!("unexpected error: {:?}", other),
        }

        let nested = [
            ["credsweep", "browsers", "-version"],
            ["credsweep", "all", "--version"],
        ];
        for argv in nested {
            match surface.parse(argv).unwrap_err() {
                CredSweepError::DisplayRequested { text } => {
                    assert!(text.contains(crate::version_info()))
                }
                other => panic!("unexpected error for {:?}: {:?}", argv, other),
            }
        }

        match surface.parse(["credsweep", "browsers", "-h"]).unwrap_err() {
            CredSweepError::DisplayRequested { text } => {
                assert!(text.contains("Browsers"));
                assert!(text.contains("Firefox"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_root_help_lists_categories() {
        let help = surface().render_help();
        assert!(help.contains("browsers"));
        assert!(help.contains("Mail clients"));
        assert!(help.contains("thunderbird"));
    }
}
