use std::sync::Arc;

use crate::binding::{BindingContext, ProjectId};
use crate::config::{ErrorPolicy, ExportConfig};
use crate::engine::buffer::TripleBuffer;
use crate::error::{Location, TransformError, TransformResult};
use crate::grid::{IndexedRow, Record, RowSource, Scope};
use crate::node::EvalContext;
use crate::sink::TripleSink;
use crate::transform::Transform;

/// Lifecycle of a visitation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitorState {
    Idle,
    Started,
    Ended,
}

/// A root that failed for one row or record under [`ErrorPolicy::SkipAndCollect`].
///
/// The other roots of that row or record are still evaluated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedItem {
    pub location: Location,
    pub root: String,
    pub error: String,
}

/// Counters for one pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisitSummary {
    pub items_visited: usize,
    pub flushes: usize,
    pub triples_flushed: usize,
    pub skipped: Vec<SkippedItem>,
    pub stopped: bool,
}

/// Drives one transform pass over a row source.
///
/// With a sink, namespaces are declared once in [`start`](Self::start) and
/// buffered triples are streamed out whenever the export limit is crossed and
/// after every row or record. Without a sink (preview mode) triples stay in
/// the buffer for the caller to read.
pub struct RdfVisitor<'t, 'w> {
    transform: &'t Transform,
    writer: Option<&'w mut dyn TripleSink>,
    buffer: TripleBuffer,
    config: ExportConfig,
    project_id: ProjectId,
    state: VisitorState,
    limit_warning_emitted: bool,
    summary: VisitSummary,
    failure: Option<TransformError>,
}

impl<'t, 'w> RdfVisitor<'t, 'w> {
    /// Streaming visitor writing to `writer`
    pub fn new(
        transform: &'t Transform,
        writer: &'w mut dyn TripleSink,
        config: ExportConfig,
    ) -> Self {
        Self::with_writer(transform, Some(writer), config)
    }

    /// Visitor without a sink; the buffer keeps every triple
    pub fn preview(transform: &'t Transform, config: ExportConfig) -> Self {
        Self::with_writer(transform, None, config)
    }

    fn with_writer(
        transform: &'t Transform,
        writer: Option<&'w mut dyn TripleSink>,
        config: ExportConfig,
    ) -> Self {
        Self {
            transform,
            writer,
            buffer: TripleBuffer::new(Arc::new(transform.namespace_map())),
            config,
            project_id: 0,
            state: VisitorState::Idle,
            limit_warning_emitted: false,
            summary: VisitSummary::default(),
            failure: None,
        }
    }

    pub fn with_project(mut self, project_id: ProjectId) -> Self {
        self.project_id = project_id;
        self
    }

    pub fn transform(&self) -> &Transform {
        self.transform
    }

    pub fn buffer(&self) -> &TripleBuffer {
        &self.buffer
    }

    pub fn is_no_writer(&self) -> bool {
        self.writer.is_none()
    }

    pub fn state(&self) -> VisitorState {
        self.state
    }

    pub fn limit_warning_emitted(&self) -> bool {
        self.limit_warning_emitted
    }

    pub fn summary(&self) -> &VisitSummary {
        &self.summary
    }

    /// The error that made the last visit signal a stop
    pub fn take_failure(&mut self) -> Option<TransformError> {
        self.failure.take()
    }

    /// Visit the matching rows, or records when the source has them, at most
    /// `limit` of them. `0` falls back to the configured item limit, where
    /// `0` again means all. `end` runs on every exit path.
    pub fn build_model(
        &mut self,
        source: &dyn RowSource,
        limit: usize,
    ) -> TransformResult<VisitSummary> {
        tracing::info!(
            project = self.project_id,
            records = source.has_records(),
            "buildModel: visit matching filtered items"
        );

        let limit = if limit == 0 { self.config.item_limit } else { limit };
        let visited = self.start().and_then(|()| self.visit_all(source, limit));
        let ended = self.end();
        visited?;
        ended?;
        if let Some(failure) = self.failure.take() {
            return Err(failure);
        }

        tracing::info!(
            visited = self.summary.items_visited,
            flushed = self.summary.triples_flushed,
            skipped = self.summary.skipped.len(),
            "Visitation complete"
        );
        Ok(self.summary.clone())
    }

    fn visit_all(&mut self, source: &dyn RowSource, limit: usize) -> TransformResult<()> {
        let limit = if limit == 0 { usize::MAX } else { limit };
        if source.has_records() {
            for record in source.matching_records()?.take(limit) {
                if self.visit_record(source, &record) {
                    break;
                }
            }
        } else {
            for row in source.matching_rows()?.take(limit) {
                if self.visit_row(source, &row) {
                    break;
                }
            }
        }
        Ok(())
    }

    /// Declare the namespaces on the sink. Nothing happens in preview mode.
    pub fn start(&mut self) -> TransformResult<()> {
        tracing::debug!("Starting visitation...");
        if self.state != VisitorState::Idle {
            tracing::debug!("Visitation already started");
            return Ok(());
        }
        self.state = VisitorState::Started;

        let Some(writer) = self.writer.as_deref_mut() else {
            return Ok(());
        };
        for (prefix, namespace) in self.buffer.namespaces().iter() {
            writer.prefix(prefix, namespace).map_err(|err| {
                tracing::error!("Exporting prefixes: {}", err);
                TransformError::Prefixes(err)
            })?;
            tracing::debug!("Prefix: {}  {}", prefix, namespace);
        }
        Ok(())
    }

    /// Close the buffer. Nothing happens in preview mode so the caller can
    /// still read the triples.
    pub fn end(&mut self) -> TransformResult<()> {
        tracing::debug!("...Ending visitation");
        if self.state == VisitorState::Ended {
            return Ok(());
        }
        self.state = VisitorState::Ended;

        if self.writer.is_none() {
            return Ok(());
        }
        self.buffer.close().map_err(|err| {
            tracing::error!("Closing model: {}", err);
            TransformError::Close(err)
        })
    }

    /// Returns `true` when visitation must stop
    pub fn visit_row(&mut self, source: &dyn RowSource, row: &IndexedRow<'_>) -> bool {
        tracing::debug!("Visiting row: {}", row.index);
        self.visit_scope(source, Scope::Row(row))
    }

    /// Returns `true` when visitation must stop
    pub fn visit_record(&mut self, source: &dyn RowSource, record: &Record<'_>) -> bool {
        tracing::debug!("Visiting record: {}", record.start);
        self.visit_scope(source, Scope::Record(record))
    }

    fn visit_scope(&mut self, source: &dyn RowSource, scope: Scope<'_>) -> bool {
        self.summary.items_visited += 1;
        match self.try_visit(source, scope) {
            Ok(()) => false,
            Err(err) => {
                tracing::error!(
                    project = self.project_id,
                    "Visit issue at {}: {}",
                    scope.location(),
                    err
                );
                self.failure = Some(err);
                self.summary.stopped = true;
                true
            }
        }
    }

    fn try_visit(&mut self, source: &dyn RowSource, scope: Scope<'_>) -> TransformResult<()> {
        let transform = self.transform;
        let namespaces = self.buffer.shared_namespaces();
        let bindings = BindingContext::resolve(transform, scope);
        let ctx = EvalContext {
            bindings: &bindings,
            namespaces: &namespaces,
            source,
            scope,
        };

        for root in transform.roots() {
            let batch = match root.evaluate(&ctx) {
                Ok(batch) => batch,
                Err(err) if self.config.error_policy == ErrorPolicy::SkipAndCollect => {
                    tracing::warn!(
                        "Skipping root {} at {}: {}",
                        root.name(),
                        scope.location(),
                        err
                    );
                    self.summary.skipped.push(SkippedItem {
                        location: scope.location(),
                        root: root.name().to_string(),
                        error: err.to_string(),
                    });
                    continue;
                }
                Err(err) => {
                    return Err(TransformError::Evaluation {
                        location: scope.location(),
                        root: root.name().to_string(),
                        source: err,
                    });
                }
            };
            self.buffer.append(batch)?;

            tracing::debug!(
                "  Root: {} ({})  Model size: {}",
                root.name(),
                root.kind(),
                self.buffer.len()
            );

            // Bound memory on large passes
            if self.config.exceeds_export_limit(self.buffer.len()) {
                self.flush()?;
                if self.is_no_writer() && !self.limit_warning_emitted {
                    self.limit_warning_emitted = true;
                    tracing::warn!("Limit reached: memory may soon become exhausted!");
                }
            }
        }

        self.flush()?;
        Ok(())
    }

    /// Forward every buffered triple to the sink, then clear the buffer.
    /// Returns the number of triples written; always `0` in preview mode.
    pub fn flush(&mut self) -> TransformResult<usize> {
        let Some(writer) = self.writer.as_deref_mut() else {
            return Ok(0);
        };

        let mut written = 0;
        for triple in self.buffer.iter() {
            writer.triple(triple).map_err(|err| {
                tracing::error!("Flushing statements: {}", err);
                TransformError::Flush(err)
            })?;
            written += 1;
        }
        self.buffer.clear();

        self.summary.flushes += 1;
        self.summary.triples_flushed += written;
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{Row, Table};
    use crate::node::{LiteralNode, Node, ResourceNode, ValueSource};
    use crate::sink::CollectingSink;
    use crate::vocabulary::Vocabulary;

    fn transform() -> Transform {
        Transform::new("http://ex.org/")
            .with_namespace(Vocabulary::new("foaf", "http://xmlns.com/foaf/0.1/"))
            .with_root(Node::root(
                ResourceNode::iri("person", ValueSource::template("person/{id}")).with_property(
                    "foaf:name",
                    Node::literal(LiteralNode::new("name", ValueSource::column("name"))),
                ),
            ))
    }

    fn table(rows: usize) -> Table {
        Table::new(["id", "name"]).with_rows(
            (0..rows).map(|i| Row::from_values([format!("p{}", i), format!("Person {}", i)])),
        )
    }

    #[test]
    fn test_state_transitions() {
        let transform = transform();
        let mut sink = CollectingSink::new();
        let mut visitor = RdfVisitor::new(&transform, &mut sink, ExportConfig::default());
        assert_eq!(visitor.state(), VisitorState::Idle);

        visitor.build_model(&table(2), 0).unwrap();
        assert_eq!(visitor.state(), VisitorState::Ended);
        assert!(visitor.buffer().is_closed());
    }

    #[test]
    fn test_start_declares_prefixes_once() {
        let transform = transform();
        let mut sink = CollectingSink::new();
        {
            let mut visitor = RdfVisitor::new(&transform, &mut sink, ExportConfig::default());
            visitor.start().unwrap();
            visitor.start().unwrap();
        }
        assert_eq!(
            sink.prefixes(),
            vec![("", "http://ex.org/"), ("foaf", "http://xmlns.com/foaf/0.1/")]
        );
    }

    #[test]
    fn test_flush_empty_buffer_is_noop() {
        let transform = transform();
        let mut sink = CollectingSink::new();
        {
            let mut visitor = RdfVisitor::new(&transform, &mut sink, ExportConfig::default());
            assert_eq!(visitor.flush().unwrap(), 0);
            assert!(visitor.buffer().is_empty());
        }
        assert!(sink.triples().is_empty());
    }

    #[test]
    fn test_item_limit() {
        let transform = transform();
        let mut sink = CollectingSink::new();
        let summary = RdfVisitor::new(&transform, &mut sink, ExportConfig::default())
            .build_model(&table(10), 3)
            .unwrap();
        assert_eq!(summary.items_visited, 3);
        assert_eq!(sink.triples().len(), 3);
    }

    #[test]
    fn test_preview_keeps_triples() {
        let transform = transform();
        let mut visitor = RdfVisitor::preview(&transform, ExportConfig::default());
        let summary = visitor.build_model(&table(4), 0).unwrap();

        assert_eq!(summary.flushes, 0);
        assert_eq!(visitor.buffer().len(), 4);
        assert!(!visitor.buffer().is_closed());
        assert!(!visitor.limit_warning_emitted());
    }
}
