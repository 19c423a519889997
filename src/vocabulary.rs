use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A prefix bound to a namespace IRI
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Vocabulary {
    pub prefix: String,
    pub namespace: String,
}

impl Vocabulary {
    pub fn new(prefix: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            namespace: namespace.into(),
        }
    }
}

/// Prefix to namespace mapping declared on every output of a pass.
///
/// Built once from a base IRI and the transform's vocabularies and never
/// changed afterwards. When the base IRI is exactly one of the vocabulary
/// namespaces, that vocabulary already covers it and no empty prefix is
/// registered; otherwise a non-empty base IRI becomes the `""` prefix.
/// Vocabularies are applied in order, so a later entry overwrites an
/// earlier one with the same prefix, including the `""` prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceMap {
    prefixes: BTreeMap<String, String>,
}

impl NamespaceMap {
    pub fn resolve<'a>(
        base_iri: &str,
        vocabularies: impl IntoIterator<Item = &'a Vocabulary> + Clone,
    ) -> Self {
        let covered = vocabularies
            .clone()
            .into_iter()
            .any(|vocab| vocab.namespace == base_iri);

        let mut prefixes = BTreeMap::new();
        if !covered && !base_iri.is_empty() {
            tracing::debug!("Using base IRI {} as default namespace", base_iri);
            prefixes.insert(String::new(), base_iri.to_string());
        } else {
            tracing::debug!("Not using base IRI as default namespace");
        }

        for vocab in vocabularies {
            prefixes.insert(vocab.prefix.clone(), vocab.namespace.clone());
        }

        Self { prefixes }
    }

    pub fn get(&self, prefix: &str) -> Option<&str> {
        self.prefixes.get(prefix).map(String::as_str)
    }

    pub fn contains_prefix(&self, prefix: &str) -> bool {
        self.prefixes.contains_key(prefix)
    }

    /// Expand `prefix:local` when `prefix` is declared
    pub fn expand(&self, name: &str) -> Option<String> {
        let (prefix, local) = name.split_once(':')?;
        if local.starts_with("//") {
            return None;
        }
        self.get(prefix)
            .map(|namespace| format!("{}{}", namespace, local))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.prefixes
            .iter()
            .map(|(prefix, namespace)| (prefix.as_str(), namespace.as_str()))
    }

    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }
}
