//! Errors surfaced by the command-line host.

use flowdeck_workflow::{CatalogError, ExecutionError, StoreError};
use rootcause::prelude::Report;
use std::fmt;

/// Any failure that ends a command.
#[derive(Debug)]
pub enum CliError {
    /// Environment configuration could not be parsed.
    Config(config::ConfigError),
    Store(Report<StoreError>),
    Catalog(Report<CatalogError>),
    Execution(Report<ExecutionError>),
    /// Output could not be encoded.
    Output(serde_json::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "invalid configuration: {e}"),
            Self::Store(e) => write!(f, "{e}"),
            Self::Catalog(e) => write!(f, "{e}"),
            Self::Execution(e) => write!(f, "{e}"),
            Self::Output(e) => write!(f, "failed to encode output: {e}"),
        }
    }
}

impl std::error::Error for CliError {}

impl From<config::ConfigError> for CliError {
    fn from(e: config::ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<Report<StoreError>> for CliError {
    fn from(e: Report<StoreError>) -> Self {
        Self::Store(e)
    }
}

impl From<Report<CatalogError>> for CliError {
    fn from(e: Report<CatalogError>) -> Self {
        Self::Catalog(e)
    }
}

impl From<Report<ExecutionError>> for CliError {
    fn from(e: Report<ExecutionError>) -> Self {
        Self::Execution(e)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::Output(e)
    }
}
