use std::sync::Arc;

use oxigraph::model::{Graph, Triple, TripleRef};

use crate::error::BufferError;
use crate::node::TripleBatch;
use crate::vocabulary::NamespaceMap;

// In-memory triples waiting to be flushed, plus the namespaces declared on the output.
#[derive(Debug, Clone)]
pub struct TripleBuffer {
    graph: Graph,
    namespaces: Arc<NamespaceMap>,
    closed: bool,
}

impl TripleBuffer {
    pub fn new(namespaces: Arc<NamespaceMap>) -> Self {
        Self {
            graph: Graph::new(),
            namespaces,
            closed: false,
        }
    }

    /// Prefixes to declare on the output before any triple
    pub fn namespaces(&self) -> &NamespaceMap {
        &self.namespaces
    }

    pub fn shared_namespaces(&self) -> Arc<NamespaceMap> {
        Arc::clone(&self.namespaces)
    }

    pub fn len(&self) -> usize {
        self.graph.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn contains(&self, triple: &Triple) -> bool {
        self.graph.contains(triple)
    }

    /// Add a batch, returning how many triples were not already present
    pub fn append(&mut self, batch: TripleBatch) -> Result<usize, BufferError> {
        if self.closed {
            return Err(BufferError::Closed);
        }
        let mut added = 0;
        for triple in &batch {
            if self.graph.insert(triple) {
                added += 1;
            }
        }
        Ok(added)
    }

    pub fn iter(&self) -> impl Iterator<Item = TripleRef<'_>> {
        self.graph.iter()
    }

    pub fn clear(&mut self) {
        self.graph.clear();
    }

    /// Drop every buffered triple and refuse further appends
    pub fn close(&mut self) -> Result<(), BufferError> {
        if self.closed {
            return Err(BufferError::Closed);
        }
        self.graph.clear();
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxigraph::model::{Literal, NamedNode};

    fn triple(object: &str) -> Triple {
        Triple::new(
            NamedNode::new("http://example.org/subject1").unwrap(),
            NamedNode::new("http://example.org/predicate1").unwrap(),
            Literal::new_simple_literal(object),
        )
    }

    #[test]
    fn test_triple_buffer() {
        let mut buffer = TripleBuffer::new(Arc::new(NamespaceMap::default()));

        assert_eq!(buffer.append(vec![triple("object1")]).unwrap(), 1);
        assert_eq!(buffer.len(), 1);
        assert!(buffer.contains(&triple("object1")));

        // Duplicates are not counted twice
        assert_eq!(buffer.append(vec![triple("object1"), triple("object2")]).unwrap(), 1);
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.iter().count(), 2);

        buffer.clear();
        assert_eq!(buffer.len(), 0);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_namespaces_are_shared() {
        let namespaces = Arc::new(NamespaceMap::resolve(
            "http://ex.org/",
            &[crate::vocabulary::Vocabulary::new("foaf", "http://xmlns.com/foaf/0.1/")],
        ));
        let buffer = TripleBuffer::new(Arc::clone(&namespaces));

        assert_eq!(buffer.namespaces().get("foaf"), Some("http://xmlns.com/foaf/0.1/"));
        assert_eq!(buffer.namespaces().get(""), Some("http://ex.org/"));
        assert!(Arc::ptr_eq(&buffer.shared_namespaces(), &namespaces));
    }

    #[test]
    fn test_closed_buffer_rejects_appends() {
        let mut buffer = TripleBuffer::new(Arc::new(NamespaceMap::default()));
        buffer.append(vec![triple("object1")]).unwrap();

        buffer.close().unwrap();
        assert!(buffer.is_closed());
        assert!(buffer.is_empty());
        assert!(matches!(buffer.append(vec![triple("x")]), Err(BufferError::Closed)));
        assert!(matches!(buffer.close(), Err(BufferError::Closed)));
    }
}
