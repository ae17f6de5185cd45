use thiserror::Error;

/// Errors raised while assembling the module catalog.
///
/// These are programming or packaging mistakes in module declarations and are
/// fatal at startup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Duplicate module '{name}' in category '{category}'")]
    DuplicateModule { category: String, name: String },

    #[error("Duplicate category '{key}'")]
    DuplicateCategory { key: String },

    #[error("Module '{module}' registered into unknown category '{key}'")]
    UnknownCategory { key: String, module: String },

    #[error("Option '{flag}' is declared more than once")]
    DuplicateOption { flag: String },

    #[error("Invalid descriptor for module '{module}': {reason}")]
    InvalidDescriptor { module: String, reason: String },
}

#[derive(Error, Debug)]
pub enum CredSweepError {
    #[error("Invalid arguments: {message}")]
    Argument { message: String },

    /// Help or version output requested; `text` is already rendered.
    #[error("{text}")]
    DisplayRequested { text: String },

    #[error("Module registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Module {category}/{module} failed: {message}")]
    ModuleExecution {
        category: String,
        module: String,
        message: String,
        detail: String,
    },

    #[error("Output destination is not a directory: {path}")]
    OutputDestination { path: String },

    #[error("IO operation failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub trait UserFriendlyError {
    fn user_message(&self) -> String;
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for CredSweepError {
    fn user_message(&self) -> String {
        match self {
            CredSweepError::Argument { message } => message.clone(),
            CredSweepError::Registry(err) => {
                format!("Module catalog is inconsistent: {}", err)
            }
            CredSweepError::ModuleExecution {
                category,
                module,
                message,
                ..
            } => {
                format!("{}/{} failed: {}", category, module, message)
            }
            CredSweepError::OutputDestination { path } => {
                format!("Specify a directory, not a file: {}", path)
            }
            CredSweepError::Io(err) => format!("File operation failed: {}", err),
            _ => self.to_string(),
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            CredSweepError::Argument { .. } => Some(
                "Run with -h to list the categories, or '<category> -h' to list its modules."
                    .to_string(),
            ),
            CredSweepError::Registry(_) => Some(
                "Every module name must be unique inside its category and every flag unique across the catalog."
                    .to_string(),
            ),
            CredSweepError::OutputDestination { .. } => Some(
                "Results are only shown on the console for this run. Pass an existing or new directory to -output."
                    .to_string(),
            ),
            CredSweepError::Io(_) => Some(
                "Ensure you have write permission for the output directory.".to_string(),
            ),
            _ => None,
        }
    }
}

impl From<clap::Error> for CredSweepError {
    fn from(error: clap::Error) -> Self {
        use clap::error::ErrorKind;

        match error.kind() {
            ErrorKind::DisplayHelp
            | ErrorKind::DisplayVersion
            | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                CredSweepError::DisplayRequested {
                    text: error.render().to_string(),
                }
            }
            _ => CredSweepError::Argument {
                message: error.render().to_string().trim_end().to_string(),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, CredSweepError>;
