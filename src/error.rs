//! Error types for transform evaluation and streaming

use oxigraph::model::IriParseError;
use thiserror::Error;

/// Errors raised while evaluating a node tree against a row or record
#[derive(Debug, Error)]
pub enum EvaluationError {
    /// A column reference that the row source does not know
    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    /// A `{$name}` reference to a variable missing from the binding context
    #[error("Unknown binding variable: {0}")]
    UnknownVariable(String),

    /// Unbalanced braces or empty placeholders
    #[error("Invalid template '{template}': {message}")]
    InvalidTemplate { template: String, message: String },

    /// The resolved value is not a valid IRI
    #[error("Invalid IRI '{iri}' produced by node {node}")]
    InvalidIri { node: String, iri: String },

    #[error("Invalid language tag '{tag}' on node {node}")]
    InvalidLanguage { node: String, tag: String },

    #[error("Blank datatype on literal node {0}")]
    BlankDatatype(String),
}

pub type EvaluationResult<T> = Result<T, EvaluationError>;

/// Errors raised by an output sink
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid namespace IRI: {0}")]
    Iri(#[from] IriParseError),

    #[error("Prefix '{0}' declared after the first triple")]
    LatePrefix(String),

    #[error("Sink rejected input: {0}")]
    Rejected(String),

    #[error("Sink already finished")]
    Finished,
}

pub type SinkResult<T> = Result<T, SinkError>;

/// Errors raised by the triple buffer
#[derive(Debug, Error)]
pub enum BufferError {
    #[error("Triple buffer is closed")]
    Closed,
}

/// Where in the pass a failure happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Row(usize),
    Record(usize),
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Location::Row(index) => write!(f, "row {}", index),
            Location::Record(start) => write!(f, "record starting at row {}", start),
        }
    }
}

/// Top level errors for a transform pass
#[derive(Debug, Error)]
pub enum TransformError {
    /// The sink refused a namespace declaration during start
    #[error("Exporting prefixes failed: {0}")]
    Prefixes(#[source] SinkError),

    /// Writing buffered triples to the sink failed
    #[error("Flushing statements failed: {0}")]
    Flush(#[source] SinkError),

    /// Closing the sink or the buffer at the end of the pass failed
    #[error("Closing the model failed: {0}")]
    Close(#[source] BufferError),

    /// A root node failed to evaluate
    #[error("Evaluation failed at {location} (root {root}): {source}")]
    Evaluation {
        location: Location,
        root: String,
        #[source]
        source: EvaluationError,
    },

    #[error("Triple buffer error: {0}")]
    Buffer(#[from] BufferError),

    #[error("Row source error: {0}")]
    Source(String),

    #[error("Invalid transform JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No transform in payload")]
    MissingTransform,
}

pub type TransformResult<T> = Result<T, TransformError>;
