pub mod buffer;
pub mod visitor;

pub use buffer::TripleBuffer;
pub use visitor::{RdfVisitor, SkippedItem, VisitSummary, VisitorState};
