//! Resource node tree
//!
//! A transform's output shape is a forest of nodes. Resource nodes produce
//! subjects (IRIs or blank nodes) and own property edges; literal nodes only
//! ever appear as objects. Evaluating a root against one row or record yields
//! a [`TripleBatch`] which the caller appends to the triple buffer in one go,
//! so a failing root never leaves partial output behind.

use std::fmt;

use oxigraph::model::vocab::rdf;
use oxigraph::model::{BlankNode, Literal, NamedNode, Term, Triple};
use serde::{Deserialize, Serialize};

use crate::binding::BindingContext;
use crate::error::{EvaluationError, EvaluationResult};
use crate::grid::{IndexedRow, RowSource, Scope};
use crate::template::{Placeholder, expand_template};
use crate::vocabulary::NamespaceMap;

/// Triples produced by evaluating one root for one row or record
pub type TripleBatch = Vec<Triple>;

/// Where a node takes its value from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValueSource {
    /// Static text
    Constant(String),
    /// Cell value of the named column
    Column(String),
    /// Text with `{column}` and `{$variable}` placeholders
    Template(String),
    /// Binding context variable such as `baseIRI`
    Variable(String),
    /// Position of the row in the table
    RowIndex,
}

impl ValueSource {
    pub fn constant(value: impl Into<String>) -> Self {
        ValueSource::Constant(value.into())
    }

    pub fn column(name: impl Into<String>) -> Self {
        ValueSource::Column(name.into())
    }

    pub fn template(template: impl Into<String>) -> Self {
        ValueSource::Template(template.into())
    }

    pub fn variable(name: impl Into<String>) -> Self {
        ValueSource::Variable(name.into())
    }

    /// Distinct values over every row of the scope, in row order
    fn values(&self, ctx: &EvalContext<'_>, for_iri: bool) -> EvaluationResult<Vec<String>> {
        let mut values: Vec<String> = Vec::new();
        for indexed in ctx.scope.rows() {
            if let Some(value) = self.value(ctx, indexed, for_iri)? {
                if !values.contains(&value) {
                    values.push(value);
                }
            }
        }
        Ok(values)
    }

    fn value(
        &self,
        ctx: &EvalContext<'_>,
        indexed: &IndexedRow<'_>,
        for_iri: bool,
    ) -> EvaluationResult<Option<String>> {
        match self {
            ValueSource::Constant(value) => Ok((!value.is_empty()).then(|| value.clone())),
            ValueSource::Column(name) => Ok(ctx.cell(indexed, name)?.map(str::to_string)),
            ValueSource::Template(template) => {
                expand_template(template, for_iri, |placeholder| match placeholder {
                    Placeholder::Column(name) => {
                        Ok(ctx.cell(indexed, name)?.map(str::to_string))
                    }
                    Placeholder::Variable(name) => ctx.variable(name),
                })
            }
            ValueSource::Variable(name) => ctx.variable(name),
            ValueSource::RowIndex => Ok(Some(indexed.index.to_string())),
        }
    }
}

/// How a resource node names its subjects
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Identity {
    /// IRI computed from a value; prefixed names expand and relative
    /// values resolve against the base IRI
    Iri(ValueSource),
    /// A fresh blank node per row or record
    Blank,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceNode {
    #[serde(default)]
    pub name: String,
    pub identity: Identity,
    /// Classes emitted as `rdf:type`
    #[serde(default, rename = "types")]
    pub type_iris: Vec<String>,
    #[serde(default)]
    pub properties: Vec<Property>,
}

impl ResourceNode {
    pub fn iri(name: impl Into<String>, source: ValueSource) -> Self {
        Self {
            name: name.into(),
            identity: Identity::Iri(source),
            type_iris: Vec::new(),
            properties: Vec::new(),
        }
    }

    pub fn blank(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            identity: Identity::Blank,
            type_iris: Vec::new(),
            properties: Vec::new(),
        }
    }

    pub fn with_type(mut self, class: impl Into<String>) -> Self {
        self.type_iris.push(class.into());
        self
    }

    pub fn with_property(mut self, predicate: impl Into<String>, object: Node) -> Self {
        self.properties.push(Property {
            predicate: predicate.into(),
            object,
        });
        self
    }

    fn subjects(&self, ctx: &EvalContext<'_>) -> EvaluationResult<Vec<Resource>> {
        match &self.identity {
            Identity::Iri(source) => source
                .values(ctx, true)?
                .iter()
                .map(|value| ctx.resolve_iri(&self.name, value).map(Resource::Named))
                .collect(),
            Identity::Blank => Ok(vec![Resource::Blank(BlankNode::default())]),
        }
    }

    /// Append this node's statements and return its subjects
    fn emit(
        &self,
        ctx: &EvalContext<'_>,
        batch: &mut TripleBatch,
    ) -> EvaluationResult<Vec<Resource>> {
        let subjects = self.subjects(ctx)?;
        if subjects.is_empty() {
            return Ok(subjects);
        }

        let rdf_type = rdf::TYPE.into_owned();
        for type_iri in &self.type_iris {
            let class = ctx.resolve_iri(&self.name, type_iri)?;
            for subject in &subjects {
                batch.push(subject.triple(&rdf_type, class.clone()));
            }
        }

        for property in &self.properties {
            let predicate = ctx.resolve_iri(&self.name, &property.predicate)?;
            let objects = property.object.object_terms(ctx, batch)?;
            for subject in &subjects {
                for object in &objects {
                    batch.push(subject.triple(&predicate, object.clone()));
                }
            }
        }

        Ok(subjects)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiteralNode {
    #[serde(default)]
    pub name: String,
    pub value: ValueSource,
    #[serde(default)]
    pub datatype: Option<String>,
    /// Takes precedence over `datatype`
    #[serde(default)]
    pub language: Option<String>,
}

impl LiteralNode {
    pub fn new(name: impl Into<String>, value: ValueSource) -> Self {
        Self {
            name: name.into(),
            value,
            datatype: None,
            language: None,
        }
    }

    pub fn with_datatype(mut self, datatype: impl Into<String>) -> Self {
        self.datatype = Some(datatype.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    fn literals(&self, ctx: &EvalContext<'_>) -> EvaluationResult<Vec<Literal>> {
        let datatype = match self.datatype.as_deref() {
            Some(datatype) if datatype.trim().is_empty() => {
                return Err(EvaluationError::BlankDatatype(self.name.clone()));
            }
            Some(datatype) => Some(ctx.resolve_iri(&self.name, datatype)?),
            None => None,
        };

        self.value
            .values(ctx, false)?
            .into_iter()
            .map(|value| match (&self.language, &datatype) {
                (Some(language), _) => Literal::new_language_tagged_literal(value, language)
                    .map_err(|_| EvaluationError::InvalidLanguage {
                        node: self.name.clone(),
                        tag: language.clone(),
                    }),
                (None, Some(datatype)) => Ok(Literal::new_typed_literal(value, datatype.clone())),
                (None, None) => Ok(Literal::new_simple_literal(value)),
            })
            .collect()
    }
}

/// A predicate edge leading to a child node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    /// Full IRI, prefixed name or IRI relative to the base IRI
    pub predicate: String,
    pub object: Node,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    ResourceRoot,
    NestedResource,
    Literal,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::ResourceRoot => write!(f, "resource-root"),
            NodeKind::NestedResource => write!(f, "nested-resource"),
            NodeKind::Literal => write!(f, "literal"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "nodeType", rename_all = "kebab-case")]
pub enum Node {
    ResourceRoot(ResourceNode),
    NestedResource(ResourceNode),
    Literal(LiteralNode),
}

impl Node {
    pub fn root(node: ResourceNode) -> Self {
        Node::ResourceRoot(node)
    }

    pub fn nested(node: ResourceNode) -> Self {
        Node::NestedResource(node)
    }

    pub fn literal(node: LiteralNode) -> Self {
        Node::Literal(node)
    }

    pub fn name(&self) -> &str {
        match self {
            Node::ResourceRoot(node) | Node::NestedResource(node) => &node.name,
            Node::Literal(node) => &node.name,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Node::ResourceRoot(_) => NodeKind::ResourceRoot,
            Node::NestedResource(_) => NodeKind::NestedResource,
            Node::Literal(_) => NodeKind::Literal,
        }
    }

    /// Evaluate this node as a root for the context's scope
    pub fn evaluate(&self, ctx: &EvalContext<'_>) -> EvaluationResult<TripleBatch> {
        let mut batch = TripleBatch::new();
        match self {
            Node::ResourceRoot(node) | Node::NestedResource(node) => {
                node.emit(ctx, &mut batch)?;
            }
            Node::Literal(node) => {
                tracing::debug!("Literal node {} has no subject, nothing to emit", node.name);
            }
        }
        Ok(batch)
    }

    fn object_terms(
        &self,
        ctx: &EvalContext<'_>,
        batch: &mut TripleBatch,
    ) -> EvaluationResult<Vec<Term>> {
        match self {
            Node::ResourceRoot(node) | Node::NestedResource(node) => Ok(node
                .emit(ctx, batch)?
                .into_iter()
                .map(Term::from)
                .collect()),
            Node::Literal(node) => Ok(node.literals(ctx)?.into_iter().map(Term::from).collect()),
        }
    }
}

/// Everything a node needs to evaluate against one row or record
pub struct EvalContext<'a> {
    pub bindings: &'a BindingContext,
    pub namespaces: &'a NamespaceMap,
    pub source: &'a dyn RowSource,
    pub scope: Scope<'a>,
}

impl EvalContext<'_> {
    fn cell<'r>(
        &self,
        indexed: &IndexedRow<'r>,
        column: &str,
    ) -> EvaluationResult<Option<&'r str>> {
        let index = self
            .source
            .column_index(column)
            .ok_or_else(|| EvaluationError::UnknownColumn(column.to_string()))?;
        Ok(indexed.row.cell(index))
    }

    /// Bound value of `name`, `None` when blank
    fn variable(&self, name: &str) -> EvaluationResult<Option<String>> {
        let value = self
            .bindings
            .get(name)
            .ok_or_else(|| EvaluationError::UnknownVariable(name.to_string()))?;
        Ok((!value.trim().is_empty()).then(|| value.to_string()))
    }

    /// Expand prefixed names, keep absolute IRIs, resolve the rest against
    /// the base IRI
    fn resolve_iri(&self, node: &str, value: &str) -> EvaluationResult<NamedNode> {
        let candidate = match self.namespaces.expand(value) {
            Some(expanded) => expanded,
            None if NamedNode::new(value).is_ok() => value.to_string(),
            None => format!("{}{}", self.bindings.base_iri(), value),
        };
        NamedNode::new(candidate.as_str()).map_err(|_| EvaluationError::InvalidIri {
            node: node.to_string(),
            iri: candidate.clone(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Resource {
    Named(NamedNode),
    Blank(BlankNode),
}

impl Resource {
    fn triple(&self, predicate: &NamedNode, object: impl Into<Term>) -> Triple {
        match self {
            Resource::Named(node) => Triple::new(node.clone(), predicate.clone(), object),
            Resource::Blank(node) => Triple::new(node.clone(), predicate.clone(), object),
        }
    }
}

impl From<Resource> for Term {
    fn from(resource: Resource) -> Self {
        match resource {
            Resource::Named(node) => node.into(),
            Resource::Blank(node) => node.into(),
        }
    }
}
