use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{TransformError, TransformResult};
use crate::node::Node;
use crate::vocabulary::{NamespaceMap, Vocabulary};

/// The mapping from tabular data to triples: a base IRI, the vocabularies
/// declared on the output and the ordered root nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transform {
    #[serde(rename = "baseIRI", default)]
    base_iri: String,
    #[serde(default)]
    namespaces: Vec<Vocabulary>,
    #[serde(default)]
    roots: Vec<Node>,
}

impl Transform {
    /// Key of the transform payload in serialized operations and overlays
    pub const KEY: &'static str = "RDFTransform";

    pub fn new(base_iri: impl Into<String>) -> Self {
        Self {
            base_iri: base_iri.into(),
            namespaces: Vec::new(),
            roots: Vec::new(),
        }
    }

    pub fn with_namespace(mut self, vocabulary: Vocabulary) -> Self {
        self.namespaces.push(vocabulary);
        self
    }

    pub fn with_root(mut self, root: Node) -> Self {
        self.roots.push(root);
        self
    }

    pub fn base_iri(&self) -> &str {
        &self.base_iri
    }

    pub fn namespaces(&self) -> &[Vocabulary] {
        &self.namespaces
    }

    pub fn roots(&self) -> &[Node] {
        &self.roots
    }

    pub fn namespace_map(&self) -> NamespaceMap {
        NamespaceMap::resolve(&self.base_iri, &self.namespaces)
    }

    /// Rebuild a transform from its JSON form
    pub fn from_json(value: &Value) -> TransformResult<Self> {
        Ok(Self::deserialize(value)?)
    }

    /// Read the transform stored under [`Transform::KEY`] in a JSON document.
    ///
    /// A missing, null or empty payload is not an error and yields `None`.
    pub fn from_document(document: &Value) -> TransformResult<Option<Self>> {
        match document.get(Self::KEY) {
            Some(payload) if !is_blank(payload) => Self::from_json(payload).map(Some),
            _ => Ok(None),
        }
    }

    /// Read a transform from either the payload itself or a document holding
    /// it under [`Transform::KEY`]. A blank payload is an error.
    pub fn from_payload_or_document(value: &Value) -> TransformResult<Self> {
        let payload = value.get(Self::KEY).unwrap_or(value);
        if is_blank(payload) {
            return Err(TransformError::MissingTransform);
        }
        Self::from_json(payload)
    }

    /// Parse a transform from a JSON string holding the payload itself
    pub fn from_json_str(payload: &str) -> TransformResult<Self> {
        let value: Value = serde_json::from_str(payload)?;
        if is_blank(&value) {
            return Err(TransformError::MissingTransform);
        }
        Self::from_json(&value)
    }
}

pub(crate) fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(text) => text.is_empty(),
        _ => false,
    }
}
