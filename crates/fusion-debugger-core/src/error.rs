//! Error types for loading, resolving and displaying Fusion object trees.

use thiserror::Error;

/// Result type for debugger operations.
pub type Result<T> = std::result::Result<T, DebuggerError>;

/// Failures of the Fusion debugger, one variant per cause.
#[derive(Debug, Error)]
pub enum DebuggerError {
    #[error(
        "Could not find any prototype definition for {name}! \
         Maybe you misspelled the name or its source package is not active."
    )]
    MissingPrototypeDefinition { name: String },

    #[error("The prototype definition for {name} is invalid! Its prototype chain refers back to itself.")]
    InvalidPrototypeDefinition { name: String },

    #[error("Failed to parse fusion file at {path}! {source}")]
    FusionParseError {
        path: String,
        #[source]
        source: ParseError,
    },

    #[error("Fusion file {path} does not exist or is not readable!")]
    FusionFileUnreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("The fusion path {path} does not exist in the object tree!")]
    PathNotFound { path: String },

    #[error("Invalid configuration in {path}: {message}")]
    Config { path: String, message: String },
}

impl DebuggerError {
    /// Stable numeric identifier of the failure cause.
    pub fn code(&self) -> u64 {
        match self {
            Self::MissingPrototypeDefinition { .. } => 1564131267910,
            Self::InvalidPrototypeDefinition { .. } => 1564131470406,
            Self::FusionParseError { .. } => 1564130709438,
            Self::FusionFileUnreadable { .. } => 1564159029025,
            Self::PathNotFound { .. } => 1564160212537,
            Self::Config { .. } => 1564160389214,
        }
    }

    /// Process exit code derived from [`code`](Self::code); never zero.
    pub fn exit_code(&self) -> i32 {
        match (self.code() % 255) as i32 {
            0 => 1,
            code => code,
        }
    }
}

/// A parser failure, carrying the structured details of the offending declaration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Syntax error on line {line}, column {column}: {message}!")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("Unknown declaration given: {declaration}!")]
    UnknownDeclaration { declaration: String },

    #[error("The prototype chain of {prototype} is not a list of prototype names!")]
    InvalidPrototypeChain { prototype: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_prototype_names_the_prototype() {
        let err = DebuggerError::MissingPrototypeDefinition {
            name: "Vendor:Button".to_string(),
        };
        assert!(err.to_string().contains("Vendor:Button"));
    }

    #[test]
    fn exit_codes_are_never_zero() {
        let errors = [
            DebuggerError::MissingPrototypeDefinition { name: "A".into() },
            DebuggerError::InvalidPrototypeDefinition { name: "A".into() },
            DebuggerError::PathNotFound { path: "a.b".into() },
            DebuggerError::Config {
                path: "x.json".into(),
                message: "bad".into(),
            },
        ];
        for err in &errors {
            assert_ne!(err.exit_code(), 0);
            assert_eq!(err.exit_code() as u64, err.code() % 255);
        }
    }

    #[test]
    fn parse_error_keeps_cause() {
        let err = DebuggerError::FusionParseError {
            path: "Root.fusion.json".into(),
            source: ParseError::Syntax {
                line: 3,
                column: 7,
                message: "expected value".into(),
            },
        };
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(
            source.as_deref(),
            Some("Syntax error on line 3, column 7: expected value!")
        );
    }
}
