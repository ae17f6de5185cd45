//! Command surface composed from the module registry.

pub mod argv;
pub mod selection;
pub mod surface;

pub use argv::normalize_args;
pub use selection::{CategorySelection, GlobalOptions, ResolvedSelection};
pub use surface::{build_surface, CommandSurface};

/// Name of the subcommand that runs every category.
pub const ALL_CATEGORIES: &str = "all";

/// Option names owned by the global surface; modules cannot declare them.
pub const RESERVED_FLAGS: &[&str] = &[
    "v", "h", "help", "version", "quiet", "oN", "oJ", "oA", "output", "password",
];

/// Argument ids owned by the global surface.
pub const RESERVED_DESTS: &[&str] = &[
    "verbose",
    "help",
    "version",
    "quiet",
    "write_normal",
    "write_json",
    "write_all",
    "output",
    "password",
];

/// Global options that take a value.
pub(crate) const GLOBAL_VALUE_OPTIONS: &[&str] = &["output", "password"];
