mod binding;
mod config;
mod engine;
mod error;
mod grid;
mod node;
mod operation;
mod sink;
mod template;
mod transform;
mod vocabulary;

pub use binding::{
    BASE_IRI, BindingContext, OverlayModels, OverlayStore, ProjectId, ROW_INDEX, TransformBinder,
    TransformProvider,
};
pub use config::{DEFAULT_EXPORT_LIMIT, ErrorPolicy, ExportConfig};
pub use engine::{RdfVisitor, SkippedItem, TripleBuffer, VisitSummary, VisitorState};
pub use error::{
    BufferError, EvaluationError, EvaluationResult, Location, SinkError, SinkResult,
    TransformError, TransformResult,
};
pub use grid::{IndexedRow, Record, RecordIter, Row, RowFilter, RowIter, RowSource, Scope, Table};
pub use node::{
    EvalContext, Identity, LiteralNode, Node, NodeKind, Property, ResourceNode, TripleBatch,
    ValueSource,
};
pub use operation::{
    ChangeResult, CodeResponse, GridPreservation, History, HistoryEntry, SaveTransformOperation,
    save_transform,
};
pub use sink::{CollectingSink, RdfWriterSink, SinkEvent, TripleSink};
pub use template::{Placeholder, expand_template, validate_template};
pub use transform::Transform;
pub use vocabulary::{NamespaceMap, Vocabulary};
