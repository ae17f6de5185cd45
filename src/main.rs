use credsweep::registry::catalog;
use credsweep::ui::logging;
use credsweep::{build_surface, Console, CredSweep, CredSweepError, ProcessConfig};
use std::ffi::OsString;
use std::process;

fn main() {
    let exit_code = run(std::env::args_os());
    process::exit(exit_code);
}

fn run<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    // Assemble the catalog; a broken catalog is a packaging error
    let registry = match catalog::builtin() {
        Ok(registry) => registry,
        Err(e) => {
            print_startup_error(&e.into());
            return 1;
        }
    };

    let surface = build_surface(&registry);
    let selection = match surface.parse(args) {
        Ok(selection) => selection,
        Err(CredSweepError::DisplayRequested { text }) => {
            print!("{}", text);
            return 0;
        }
        Err(e) => {
            print_startup_error(&e);
            return 2;
        }
    };

    let resolved = match ProcessConfig::resolve(&selection.globals) {
        Ok(resolved) => resolved,
        Err(e) => {
            print_startup_error(&e);
            return 3;
        }
    };

    logging::init(resolved.config.verbosity, resolved.config.quiet);
    tracing::debug!(build = %credsweep::build_info(), "starting");

    let mut app = CredSweep::new(registry, resolved.config);
    for warning in &resolved.warnings {
        app.console().print_user_friendly_warning(warning);
    }

    app.console().banner();
    let summary = app.execute(&selection);
    tracing::debug!(
        started = summary.modules_started,
        failed = summary.modules_failed,
        "run finished"
    );

    let written = match app.persist() {
        Ok(written) => written,
        Err(e) => {
            app.handle_error(&e);
            return 3;
        }
    };

    app.console().footer(app.store(), summary.elapsed, &written);
    0
}

fn print_startup_error(error: &CredSweepError) {
    // Create a basic console for startup errors
    let console = Console::new(0, false);
    console.print_user_friendly_error(error);
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_help_and_version_exit_zero() {
        assert_eq!(run(["credsweep", "-h"]), 0);
        assert_eq!(run(["credsweep", "-version"]), 0);
        assert_eq!(run(["credsweep", "wifi", "--help"]), 0);
        assert_eq!(run(["credsweep", "browsers", "-version"]), 0);
    }

    #[test]
    fn test_argument_errors_exit_two() {
        assert_eq!(run(["credsweep", "all", "-no-such-flag"]), 2);
        assert_eq!(run(["credsweep", "no-such-category"]), 2);
        assert_eq!(run(["credsweep", "sysadmin", "-ssh-max-keys", "many"]), 2);
    }

    #[test]
    fn test_quiet_run_with_output_writes_files() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("results");
        let output_arg = output.to_string_lossy().to_string();

        let code = run([
            "credsweep",
            "wifi",
            "-quiet",
            "-oA",
            "-output",
            output_arg.as_str(),
        ]);

        assert_eq!(code, 0);
        let files: Vec<_> = std::fs::read_dir(&output).unwrap().collect();
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn test_output_file_destination_is_not_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("taken");
        std::fs::write(&file, "x").unwrap();
        let file_arg = file.to_string_lossy().to_string();

        let code = run(["credsweep", "wifi", "-oN", "-output", file_arg.as_str()]);

        assert_eq!(code, 0);
        assert_eq!(std::fs::read_to_string(&file).unwrap(), "x");
    }
}
