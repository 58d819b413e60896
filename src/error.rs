//! Error types for `conftree`
//!
//! Errors are split by category: [`SourceError`] for loading and writing,
//! [`TreeError`] for structural misuse of a tree or template, and
//! [`ValidationError`] for a configuration that does not satisfy its
//! template. [`Error`] aggregates them and maps each category to a process
//! exit code.

use thiserror::Error;

use crate::tree::ValueType;

// ============================================================================
// Exit Codes
// ============================================================================

/// Exit codes for `conftree` CLI operations.
pub struct ExitCode;

impl ExitCode {
    /// Successful execution
    pub const SUCCESS: i32 = 0;

    /// General error
    pub const ERROR: i32 = 1;

    /// Schema document or serialized data could not be parsed
    pub const CONFIG_ERROR: i32 = 2;

    /// I/O error (file not found, destination exists, store unavailable)
    pub const IO_ERROR: i32 = 3;

    /// Configuration does not satisfy its template
    pub const VALIDATION_ERROR: i32 = 4;

    /// Usage error (invalid arguments, missing required options)
    pub const USAGE_ERROR: i32 = 64;
}

// ============================================================================
// Top-Level Error
// ============================================================================

/// Top-level error type for `conftree` operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Loading or writing a configuration source failed
    #[error(transparent)]
    Source(#[from] SourceError),

    /// A tree or template was used incorrectly
    #[error(transparent)]
    Tree(#[from] TreeError),

    /// The configuration failed validation
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Returns the appropriate exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Source(_) | Self::Io(_) => ExitCode::IO_ERROR,
            Self::Tree(_) => ExitCode::ERROR,
            Self::Validation(_) => ExitCode::VALIDATION_ERROR,
            Self::Json(_) | Self::Yaml(_) => ExitCode::CONFIG_ERROR,
        }
    }

    /// Returns `true` for source errors, which callers may retry against
    /// another candidate.
    #[must_use]
    pub const fn is_source(&self) -> bool {
        matches!(self, Self::Source(_) | Self::Io(_))
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

// ============================================================================
// Source Errors
// ============================================================================

/// Failures while reading or writing a configuration source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// File is missing or cannot be opened
    #[error("File {location} does not exist or is not readable")]
    NotFound {
        /// Source identifier
        location: String,
    },

    /// Source exists but yields no configuration
    #[error("Empty configuration file {location}")]
    Empty {
        /// Source identifier
        location: String,
    },

    /// Source content could not be parsed
    #[error("parse error in {location}{}: {message}", line_suffix(.line.as_ref()))]
    Parse {
        /// Source identifier
        location: String,
        /// Line number where the error occurred (if available)
        line: Option<usize>,
        /// Error message from the parser
        message: String,
    },

    /// None of the candidate sources yielded a configuration
    #[error("Could not read configuration from any of the specified sources: {sources}")]
    Unavailable {
        /// Comma-separated list of the candidates that were tried
        sources: String,
    },

    /// A store source was requested without a store connection
    #[error("No store connection available for {location}")]
    NoStore {
        /// Source identifier
        location: String,
    },

    /// Destination is occupied and overwrite was not requested
    #[error("File {location} already exists")]
    AlreadyExists {
        /// Destination identifier
        location: String,
    },

    /// The destination format cannot represent this tree
    #[error("{reason}")]
    Unsupported {
        /// Description of the format limitation
        reason: String,
    },

    /// A store operation failed
    #[error("store error at {path}: {message}")]
    Store {
        /// Store path
        path: String,
        /// Failure description
        message: String,
    },
}

fn line_suffix(line: Option<&usize>) -> String {
    line.map_or_else(String::new, |l| format!(" at line {l}"))
}

// ============================================================================
// Structural Errors
// ============================================================================

/// Misuse of a tree or template.
#[derive(Debug, Error)]
pub enum TreeError {
    /// `delete` was called with an empty path
    #[error("No path to delete specified")]
    NoPath,

    /// An intermediate path segment does not exist
    #[error("Path {path} does not exist")]
    NotFound {
        /// Path that could not be resolved
        path: String,
    },

    /// `add` received something it cannot insert
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// What was wrong with the argument
        message: String,
    },

    /// A node was found where an attribute was expected or vice versa
    #[error("Expecting {path} to be {expected}")]
    WrongKind {
        /// Path of the offending element
        path: String,
        /// "a node" or "an attribute"
        expected: &'static str,
    },

    /// A template child name was registered twice
    #[error("Attribute or node {name} can only be added to node {node} once")]
    DuplicateTemplate {
        /// Child template name
        name: String,
        /// Parent template name
        node: String,
    },

    /// A node set template was built without element names
    #[error("Node Set template can only be initialized with a non-empty list of node names")]
    EmptyNodeSet,

    /// A node cannot become Content without a ContentNode ancestor
    #[error("Attempt to change {name} to a Content-only node with no Content Node parent")]
    NodeTypePrecondition {
        /// Name of the node being reclassified
        name: String,
    },
}

// ============================================================================
// Validation Errors
// ============================================================================

/// A configuration that does not match its template.
///
/// Every message carries the full path of the offending element.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Value could not be converted to the declared type
    #[error("Expecting {path} to be of type {expected}")]
    TypeMismatch {
        /// Attribute path
        path: String,
        /// Declared value type
        expected: ValueType,
    },

    /// Attribute validator rejected the value
    #[error("Parameter {path} failed validation for value {value}{}", detail_suffix(.detail.as_deref()))]
    AttributeFailed {
        /// Attribute path
        path: String,
        /// Rendered offending value
        value: String,
        /// Detail reported by the validator
        detail: Option<String>,
    },

    /// Mandatory attribute has no value and no default
    #[error("Mandatory parameter {path} has not been set, and has no default value")]
    MissingMandatory {
        /// Attribute path
        path: String,
    },

    /// Mandatory node ended up empty
    #[error("Mandatory node {path} is missing, with no defaults set")]
    MissingMandatoryNode {
        /// Node path
        path: String,
    },

    /// Mandatory variable node has no attributes
    #[error("Node {path} cannot be empty")]
    EmptyNode {
        /// Node path
        path: String,
    },

    /// Node validator rejected the node
    #[error("Node {path} failed validation{}", detail_suffix(.detail.as_deref()))]
    NodeFailed {
        /// Node path
        path: String,
        /// Detail reported by the validator
        detail: Option<String>,
    },

    /// A node template was declared without any child templates
    #[error("Template for node {name} has no attributes")]
    EmptyTemplate {
        /// Template name
        name: String,
    },

    /// An attribute was found where a node template applies
    #[error("Configuration object passed for validation to template {name} is not a node")]
    NotANode {
        /// Template name
        name: String,
    },

    /// A node was found where an attribute template applies
    #[error("Expecting {path} to be an attribute, found a node")]
    NotAnAttribute {
        /// Node path
        path: String,
    },

    /// The schema generator returned a template not named `root`
    #[error("Root template must be named root, got {name}")]
    RootTemplateName {
        /// Name the template actually carries
        name: String,
    },

    /// Loading and validation left the root empty
    #[error("Could not initialize configuration")]
    Uninitialized,
}

fn detail_suffix(detail: Option<&str>) -> String {
    match detail {
        Some(d) if !d.is_empty() => format!(": {d}"),
        _ => String::new(),
    }
}

// ============================================================================
// Tests
// ============================================================================
