use miette::Diagnostic;
use thiserror::Error;

use crate::store::StoreError;

#[derive(Error, Diagnostic, Debug)]
pub enum CoreError {
    #[error("{store}: {message}")]
    #[diagnostic(
        code(addressbook_core::store_write_failed),
        help("The {operation} write was not retried. Check that {store} is reachable and accepts the record")
    )]
    StoreWriteFailed {
        store: String,
        operation: String,
        message: String,
        /// Outcome of undoing earlier writes of the same operation, if any were undone
        compensation: Option<String>,
        #[source]
        cause: StoreError,
    },

    #[error("{store}: {message}")]
    #[diagnostic(
        code(addressbook_core::store_read_failed),
        help("The {operation} lookup could not be completed")
    )]
    StoreReadFailed {
        store: String,
        operation: String,
        message: String,
        #[source]
        cause: StoreError,
    },

    #[error("Missing contact token")]
    #[diagnostic(
        code(addressbook_core::missing_token),
        help("{operation} needs the token of an existing contact")
    )]
    MissingToken { operation: String },

    #[error("Configuration error")]
    #[diagnostic(
        code(addressbook_core::configuration_error),
        help("Check configuration file at {config_path}")
    )]
    ConfigurationError {
        config_path: String,
        field: String,
        expected: String,
        #[source]
        cause: ConfigError,
    },

    #[error("Store initialization failed")]
    #[diagnostic(
        code(addressbook_core::store_init_failed),
        help("Failed to set up the {store} backend")
    )]
    StoreInitFailed {
        store: String,
        #[source]
        cause: StoreError,
    },
}

#[derive(Error, Diagnostic, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("TOML parse error: {0}")]
    TomlParse(String),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    pub fn write_failed(operation: impl Into<String>, cause: StoreError) -> Self {
        Self::StoreWriteFailed {
            store: cause.store().to_string(),
            operation: operation.into(),
            message: cause.message(),
            compensation: None,
            cause,
        }
    }

    pub fn read_failed(operation: impl Into<String>, cause: StoreError) -> Self {
        Self::StoreReadFailed {
            store: cause.store().to_string(),
            operation: operation.into(),
            message: cause.message(),
            cause,
        }
    }

    /// Name of the store a failure originated from, if any
    pub fn store(&self) -> Option<&str> {
        match self {
            Self::StoreWriteFailed { store, .. }
            | Self::StoreReadFailed { store, .. }
            | Self::StoreInitFailed { store, .. } => Some(store),
            _ => None,
        }
    }

    pub fn with_compensation(mut self, outcome: impl Into<String>) -> Self {
        if let Self::StoreWriteFailed { compensation, .. } = &mut self {
            *compensation = Some(outcome.into());
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use miette::Report;

    #[test]
    fn test_write_failure_carries_store_and_message() {
        let error = CoreError::write_failed(
            "create",
            StoreError::rejected("general store", "upsert-location", Some(500), "disk full"),
        );
        assert_eq!(error.store(), Some("general store"));
        assert_eq!(error.to_string(), "general store: disk full");

        let report = Report::new(error);
        let output = format!("{:?}", report);
        assert!(output.contains("store_write_failed"));
    }

    #[test]
    fn test_compensation_only_applies_to_writes() {
        let write = CoreError::write_failed(
            "create",
            StoreError::rejected("pii store", "create", None, "nope"),
        )
        .with_compensation("removed pii record");
        assert!(matches!(
            write,
            CoreError::StoreWriteFailed { compensation: Some(ref c), .. } if c == "removed pii record"
        ));

        let missing = CoreError::MissingToken {
            operation: "delete".into(),
        }
        .with_compensation("ignored");
        assert!(matches!(missing, CoreError::MissingToken { .. }));
    }
}
