//! Error types for rule application, definition loading and document generation.

use std::path::PathBuf;
use thiserror::Error;

/// A catalogue entry failed while applying a rule.
///
/// Built-in entries never fail; custom entries may. The engine does not
/// catch these: the generation pass for the type fails.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("rule '{rule}' failed on property '{property}': {message}")]
    Failed {
        rule: String,
        property: String,
        message: String,
    },
}

/// Errors while loading documents or validator definitions.
#[derive(Debug, Error)]
pub enum LoadError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "remote")]
    #[error("failed to fetch {url}: {source}")]
    NetworkError {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    // Parse errors (exit code 2)
    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid validator definitions: {source}")]
    InvalidDefinitions {
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid options: {source}")]
    InvalidOptions {
        #[source]
        source: serde_json::Error,
    },

    // Definition graph errors (exit code 2)
    #[error("duplicate validator name '{name}'")]
    DuplicateValidator { name: String },

    #[error("validator '{validator}' includes unknown validator '{include}'")]
    UnknownInclude { validator: String, include: String },

    #[error("validator '{validator}' references unknown child validator '{child}'")]
    UnknownChild { validator: String, child: String },

    #[error("validator '{validator}' has a rule for '{property}' with unknown field '{field}'")]
    UnknownRuleField {
        validator: String,
        property: String,
        field: String,
    },

    #[error("include cycle: {}", chain.join(" -> "))]
    IncludeCycle { chain: Vec<String> },
}

impl LoadError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoadError::FileNotFound { .. } | LoadError::ReadError { .. } => 3,
            #[cfg(feature = "remote")]
            LoadError::NetworkError { .. } => 3,
            _ => 2,
        }
    }
}

/// Errors while applying validator rules to a whole document.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("invalid document: {message}")]
    InvalidDocument { message: String },

    #[error("schema '{type_name}' is not a valid schema object: {source}")]
    InvalidSchema {
        type_name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("generation failed for '{type_name}': {source}")]
    Rule {
        type_name: String,
        #[source]
        source: RuleError,
    },
}

impl GenerateError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            GenerateError::Load(e) => e.exit_code(),
            _ => 2,
        }
    }
}
