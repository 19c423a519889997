//! Output sinks receiving namespace declarations and flushed triples

use std::io::Write;

use oxigraph::io::{RdfFormat, RdfSerializer, WriterQuadSerializer};
use oxigraph::model::{NamedNode, Triple, TripleRef};

use crate::error::{SinkError, SinkResult};

/// Append-only destination of a streaming pass.
///
/// All `prefix` calls happen before the first `triple` call.
pub trait TripleSink {
    fn prefix(&mut self, prefix: &str, namespace: &str) -> SinkResult<()>;

    fn triple(&mut self, triple: TripleRef<'_>) -> SinkResult<()>;
}

enum WriterState<W: Write> {
    Declaring {
        format: RdfFormat,
        prefixes: Vec<(String, String)>,
        writer: W,
    },
    Writing(WriterQuadSerializer<W>),
    Finished,
}

/// Serializes triples to a writer in any format oxigraph supports.
///
/// Prefixes are collected until the first triple arrives, at which point the
/// serializer is opened with all of them declared.
pub struct RdfWriterSink<W: Write> {
    state: WriterState<W>,
    written: usize,
}

impl<W: Write> RdfWriterSink<W> {
    pub fn new(format: RdfFormat, writer: W) -> Self {
        Self {
            state: WriterState::Declaring {
                format,
                prefixes: Vec::new(),
                writer,
            },
            written: 0,
        }
    }

    pub fn turtle(writer: W) -> Self {
        Self::new(RdfFormat::Turtle, writer)
    }

    pub fn n_triples(writer: W) -> Self {
        Self::new(RdfFormat::NTriples, writer)
    }

    /// Number of triples serialized so far
    pub fn written(&self) -> usize {
        self.written
    }

    /// Flush the serializer and hand back the writer
    pub fn finish(mut self) -> SinkResult<W> {
        self.open()?;
        match std::mem::replace(&mut self.state, WriterState::Finished) {
            WriterState::Writing(serializer) => Ok(serializer.finish()?),
            _ => Err(SinkError::Finished),
        }
    }

    fn open(&mut self) -> SinkResult<()> {
        if !matches!(self.state, WriterState::Declaring { .. }) {
            return Ok(());
        }
        let WriterState::Declaring {
            format,
            prefixes,
            writer,
        } = std::mem::replace(&mut self.state, WriterState::Finished)
        else {
            return Ok(());
        };

        let mut serializer = RdfSerializer::from_format(format);
        for (prefix, namespace) in prefixes {
            serializer = serializer.with_prefix(prefix, namespace)?;
        }
        self.state = WriterState::Writing(serializer.for_writer(writer));
        Ok(())
    }
}

impl<W: Write> TripleSink for RdfWriterSink<W> {
    fn prefix(&mut self, prefix: &str, namespace: &str) -> SinkResult<()> {
        match &mut self.state {
            WriterState::Declaring { prefixes, .. } => {
                NamedNode::new(namespace)?;
                prefixes.push((prefix.to_string(), namespace.to_string()));
                Ok(())
            }
            WriterState::Writing(_) => Err(SinkError::LatePrefix(prefix.to_string())),
            WriterState::Finished => Err(SinkError::Finished),
        }
    }

    fn triple(&mut self, triple: TripleRef<'_>) -> SinkResult<()> {
        self.open()?;
        match &mut self.state {
            WriterState::Writing(serializer) => {
                serializer.serialize_triple(triple)?;
                self.written += 1;
                Ok(())
            }
            _ => Err(SinkError::Finished),
        }
    }
}

/// Event received by a [`CollectingSink`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    Prefix { prefix: String, namespace: String },
    Triple(Triple),
}

/// Keeps every event in arrival order
#[derive(Debug, Default)]
pub struct CollectingSink {
    events: Vec<SinkEvent>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[SinkEvent] {
        &self.events
    }

    pub fn prefixes(&self) -> Vec<(&str, &str)> {
        self.events
            .iter()
            .filter_map(|event| match event {
                SinkEvent::Prefix { prefix, namespace } => {
                    Some((prefix.as_str(), namespace.as_str()))
                }
                SinkEvent::Triple(_) => None,
            })
            .collect()
    }

    pub fn triples(&self) -> Vec<&Triple> {
        self.events
            .iter()
            .filter_map(|event| match event {
                SinkEvent::Triple(triple) => Some(triple),
                SinkEvent::Prefix { .. } => None,
            })
            .collect()
    }
}

impl TripleSink for CollectingSink {
    fn prefix(&mut self, prefix: &str, namespace: &str) -> SinkResult<()> {
        self.events.push(SinkEvent::Prefix {
            prefix: prefix.to_string(),
            namespace: namespace.to_string(),
        });
        Ok(())
    }

    fn triple(&mut self, triple: TripleRef<'_>) -> SinkResult<()> {
        self.events.push(SinkEvent::Triple(triple.into_owned()));
        Ok(())
    }
}
