use crate::error::{CredSweepError, UserFriendlyError};
use crate::results::{ResultRecord, ResultStore};
use console::{style, Emoji, Term};
use std::path::PathBuf;
use std::time::Duration;

// Emojis with text fallbacks
static FOUND: Emoji = Emoji("🔑 ", "[+] ");
static CROSS: Emoji = Emoji("❌ ", "[-] ");
static INFO: Emoji = Emoji("ℹ️  ", "[i] ");
static WARNING: Emoji = Emoji("⚠️  ", "[!] ");

/// Human-facing console output.
///
/// Warnings show at every verbosity unless quiet mode is on; info needs
/// `-v`, debug and failure detail need `-vv`. Errors always print.
pub struct Console {
    use_colors: bool,
    verbose_level: u8,
    quiet: bool,
}

impl Console {
    pub fn new(verbose: u8, quiet: bool) -> Self {
        let term = Term::stdout();
        Self {
            use_colors: term.features().colors_supported() && !quiet,
            verbose_level: if quiet { 0 } else { verbose },
            quiet,
        }
    }

    pub fn banner(&self) {
        if self.quiet {
            return;
        }

        let title = format!("credsweep {}", crate::version_info());
        let rule = "|".to_string() + &"=".repeat(title.len() + 8) + "|";
        println!();
        if self.use_colors {
            println!("{}", style(&rule).dim());
            println!("    {}", style(&title).bold().cyan());
            println!("{}", style(&rule).dim());
        } else {
            println!("{}", rule);
            println!("    {}", title);
            println!("{}", rule);
        }
        println!();
    }

    pub fn category_title(&self, category: &str) {
        if self.quiet {
            return;
        }

        let line = format!("########## {} ##########", category.to_uppercase());
        if self.use_colors {
            println!("\n{}\n", style(line).bold().yellow());
        } else {
            println!("\n{}\n", line);
        }
    }

    pub fn module_title(&self, module: &str) {
        if self.should_show_message(1) {
            let line = format!("------------------- {} -------------------", module);
            if self.use_colors {
                println!("{}", style(line).cyan());
            } else {
                println!("{}", line);
            }
        }
    }

    pub fn record(&self, record: &ResultRecord) {
        if self.quiet {
            return;
        }

        if record.is_diagnostic() {
            let error = record
                .get("error")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown error");
            self.warning(&format!("{}/{}: {}", record.category, record.module, error));
            if let Some(detail) = record.get("detail").and_then(|v| v.as_str()) {
                self.debug(detail);
            }
            return;
        }

        let header = format!("{} found", record.module);
        if self.use_colors {
            println!("{}{}", FOUND, style(header).green().bold());
        } else {
            println!("{}{}", FOUND, header);
        }
        for line in record.display_lines() {
            println!("    {}", line);
        }
        println!();
    }

    pub fn error(&self, message: &str) {
        if self.use_colors {
            eprintln!("{}{}", CROSS, style(message).red().bold());
        } else {
            eprintln!("{}{}", CROSS, message);
        }
    }

    pub fn warning(&self, message: &str) {
        if self.should_show_message(0) {
            if self.use_colors {
                println!("{}{}", WARNING, style(message).yellow().bold());
            } else {
                println!("{}{}", WARNING, message);
            }
        }
    }

    pub fn info(&self, message: &str) {
        if self.should_show_message(1) {
            if self.use_colors {
                println!("{}{}", INFO, style(message).cyan());
            } else {
                println!("{}{}", INFO, message);
            }
        }
    }

    pub fn debug(&self, message: &str) {
        if self.should_show_message(2) {
            for line in message.lines() {
                if self.use_colors {
                    println!("  {}", style(line).dim());
                } else {
                    println!("  DEBUG: {}", line);
                }
            }
        }
    }

    pub fn print_user_friendly_error(&self, error: &CredSweepError) {
        self.error(&error.user_message());

        if let Some(suggestion) = error.suggestion() {
            if self.quiet {
                return;
            }
            if self.use_colors {
                eprintln!("{}{}", INFO, style(format!("Suggestion: {}", suggestion)).cyan());
            } else {
                eprintln!("Suggestion: {}", suggestion);
            }
        }
    }

    /// Same as [`print_user_friendly_error`](Self::print_user_friendly_error)
    /// but for recoverable problems, so it respects quiet mode.
    pub fn print_user_friendly_warning(&self, error: &CredSweepError) {
        self.warning(&error.user_message());
        if let Some(suggestion) = error.suggestion() {
            self.info(&suggestion);
        }
    }

    pub fn footer(&self, store: &ResultStore, elapsed: Duration, written: &[PathBuf]) {
        if self.quiet {
            return;
        }

        println!();
        let summary = format!(
            "{} credentials found, {} modules failed",
            store.credential_count(),
            store.diagnostic_count()
        );
        if self.use_colors {
            println!("{}", style(summary).bold());
        } else {
            println!("{}", summary);
        }

        for path in written {
            println!("Results written to {}", path.display());
        }
        println!("elapsed time = {}", format_duration(elapsed));
    }

    fn should_show_message(&self, min_verbose_level: u8) -> bool {
        !self.quiet && self.verbose_level >= min_verbose_level
    }
}

fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else if secs > 0 {
        format!("{}s", secs)
    } else {
        format!("{}ms", duration.as_millis())
    }
}
