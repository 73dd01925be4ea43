//! CLI error handling with user-facing messages.

use std::fmt;
use std::process;

use cellfix::cell::CellReportError;
use cellfix::config::ConfigFileError;
use cellfix::dataset::DatasetError;
use cellfix::online::OnlineError;
use cellfix::service::ServiceError;
use cellfix::settings::SettingsError;

/// Errors surfaced by CLI commands.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(std::io::Error),
    /// Daemon configuration could not be loaded
    Config(ConfigFileError),
    /// Location settings could not be loaded
    Settings(SettingsError),
    /// Dataset files could not be read or written
    Dataset(DatasetError),
    /// Cell report file could not be read
    CellReports(CellReportError),
    /// Online locator could not be created
    Online(OnlineError),
    /// The position service stopped answering
    Service(ServiceError),
    /// Tokio runtime or signal handler setup failed
    Runtime(String),
}

impl CliError {
    /// Print the error and exit with status 1.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Dataset(_) => {
                eprintln!();
                eprintln!("Check the [dataset] roots in your config file.");
            }
            CliError::Online(_) => {
                eprintln!();
                eprintln!("Check online.endpoint in your config file, or remove it to run offline.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(e) => write!(f, "Failed to initialize logging: {}", e),
            CliError::Config(e) => write!(f, "Configuration error: {}", e),
            CliError::Settings(e) => write!(f, "Settings error: {}", e),
            CliError::Dataset(e) => write!(f, "Dataset error: {}", e),
            CliError::CellReports(e) => write!(f, "Cell report error: {}", e),
            CliError::Online(e) => write!(f, "Online locator error: {}", e),
            CliError::Service(e) => write!(f, "Service error: {}", e),
            CliError::Runtime(msg) => write!(f, "Runtime error: {}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::LoggingInit(e) => Some(e),
            CliError::Config(e) => Some(e),
            CliError::Settings(e) => Some(e),
            CliError::Dataset(e) => Some(e),
            CliError::CellReports(e) => Some(e),
            CliError::Online(e) => Some(e),
            CliError::Service(e) => Some(e),
            CliError::Runtime(_) => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e)
    }
}

impl From<SettingsError> for CliError {
    fn from(e: SettingsError) -> Self {
        CliError::Settings(e)
    }
}

impl From<DatasetError> for CliError {
    fn from(e: DatasetError) -> Self {
        CliError::Dataset(e)
    }
}

impl From<CellReportError> for CliError {
    fn from(e: CellReportError) -> Self {
        CliError::CellReports(e)
    }
}

impl From<ServiceError> for CliError {
    fn from(e: ServiceError) -> Self {
        CliError::Service(e)
    }
}
