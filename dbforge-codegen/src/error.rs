//! Error types for dbforge-codegen

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result type alias for dbforge-codegen operations
pub type Result<T> = std::result::Result<T, CodegenError>;

/// Errors that can occur while parsing catalogs or generating code
#[derive(Error, Debug)]
pub enum CodegenError {
    /// A catalog query or row scan failed
    #[error("parse error{}: {}", scope(.table, .column), .message)]
    Parse {
        table: Option<String>,
        column: Option<String>,
        message: String,
        #[source]
        source: Option<dbforge::Error>,
    },

    /// Rendering, validating or writing a generated artifact failed
    #[error("generate error{}{}: {}", scope(.table, &None::<String>), at_path(.path), .message)]
    Generate {
        table: Option<String>,
        path: Option<PathBuf>,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A configuration field failed validation
    #[error("configuration error on `{field}`: {message}")]
    Config { field: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn scope(table: &Option<String>, column: &Option<String>) -> String {
    match (table, column) {
        (Some(t), Some(c)) => format!(" in `{}.{}`", t, c),
        (Some(t), None) => format!(" in `{}`", t),
        (None, Some(c)) => format!(" in column `{}`", c),
        (None, None) => String::new(),
    }
}

fn at_path(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| format!(" at {}", p.display()))
        .unwrap_or_default()
}

impl CodegenError {
    /// A parse error with only a message.
    pub fn parse(message: impl Into<String>) -> Self {
        CodegenError::Parse {
            table: None,
            column: None,
            message: message.into(),
            source: None,
        }
    }

    /// A parse error scoped to one table.
    pub fn parse_table(table: &str, message: impl Into<String>) -> Self {
        CodegenError::Parse {
            table: Some(table.to_string()),
            column: None,
            message: message.into(),
            source: None,
        }
    }

    /// Wrap a driver error raised while reading the catalog.
    pub fn from_db(table: Option<&str>, message: impl Into<String>, err: dbforge::Error) -> Self {
        CodegenError::Parse {
            table: table.map(str::to_string),
            column: None,
            message: message.into(),
            source: Some(err),
        }
    }

    /// A generate error with only a message.
    pub fn generate(message: impl Into<String>) -> Self {
        CodegenError::Generate {
            table: None,
            path: None,
            message: message.into(),
            source: None,
        }
    }

    /// A generate error scoped to one table.
    pub fn generate_table(table: &str, message: impl Into<String>) -> Self {
        CodegenError::Generate {
            table: Some(table.to_string()),
            path: None,
            message: message.into(),
            source: None,
        }
    }

    /// Wrap a write failure on `path`.
    pub fn write(path: &Path, err: std::io::Error) -> Self {
        CodegenError::Generate {
            table: None,
            path: Some(path.to_path_buf()),
            message: "failed to write file".to_string(),
            source: Some(Box::new(err)),
        }
    }

    /// A field-level configuration error.
    pub fn config(field: impl Into<String>, message: impl Into<String>) -> Self {
        CodegenError::Config {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Attach a table name to a generate error that has none.
    pub fn in_table(self, name: &str) -> Self {
        match self {
            CodegenError::Generate {
                table: None,
                path,
                message,
                source,
            } => CodegenError::Generate {
                table: Some(name.to_string()),
                path,
                message,
                source,
            },
            CodegenError::Parse {
                table: None,
                column,
                message,
                source,
            } => CodegenError::Parse {
                table: Some(name.to_string()),
                column,
                message,
                source,
            },
            other => other,
        }
    }

    /// Whether the error is a cancelled or expired context rather than a data problem.
    pub fn is_cancellation(&self) -> bool {
        matches!(
            self,
            CodegenError::Parse {
                source: Some(err),
                ..
            } if err.is_cancellation()
        )
    }
}

impl From<config::ConfigError> for CodegenError {
    fn from(err: config::ConfigError) -> Self {
        CodegenError::config("config", err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_parse_error_display() {
        let err = CodegenError::Parse {
            table: Some("users".into()),
            column: Some("id".into()),
            message: "bad type".into(),
            source: None,
        };
        assert_eq!(err.to_string(), "parse error in `users.id`: bad type");
    }

    #[test]
    fn test_cause_is_preserved() {
        let err = CodegenError::from_db(Some("users"), "column query failed", dbforge::Error::Timeout);
        assert!(err.is_cancellation());
        let source = err.source().unwrap();
        assert_eq!(source.to_string(), "operation timed out");
    }

    #[test]
    fn test_write_error_keeps_path() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = CodegenError::write(Path::new("out/models/users.rs"), io).in_table("users");
        let text = err.to_string();
        assert!(text.contains("in `users`"));
        assert!(text.contains("out/models/users.rs"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_config_error_display() {
        let err = CodegenError::config("package", "must not be empty");
        assert_eq!(
            err.to_string(),
            "configuration error on `package`: must not be empty"
        );
    }
}
