pub mod console;
pub mod logging;

pub use console::Console;
