//! Per-row variable bindings and transform lookup

use std::collections::HashMap;
use std::sync::Arc;

use crate::grid::Scope;
use crate::transform::Transform;

/// Name of the variable holding the transform's base IRI
pub const BASE_IRI: &str = "baseIRI";
/// Name of the variable holding the first row index of the visited scope
pub const ROW_INDEX: &str = "rowIndex";

pub type ProjectId = u64;

/// Variables available to templates while one row or record is evaluated
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindingContext {
    variables: HashMap<String, String>,
}

impl BindingContext {
    /// Compute the bindings for one visit. Never cached across rows.
    pub fn resolve(transform: &Transform, scope: Scope<'_>) -> Self {
        let mut variables = HashMap::new();
        variables.insert(BASE_IRI.to_string(), transform.base_iri().to_string());
        if let Some(first) = scope.rows().first() {
            variables.insert(ROW_INDEX.to_string(), first.index.to_string());
        }
        Self { variables }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.variables.get(name).map(String::as_str)
    }

    pub fn base_iri(&self) -> &str {
        self.get(BASE_IRI).unwrap_or_default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(name.into(), value.into());
    }
}

/// Looks up the transform associated with a project
pub trait TransformProvider {
    fn get(&self, project: ProjectId) -> Option<Arc<Transform>>;
}

/// Binds the `baseIRI` variable for expression evaluation in the host.
///
/// Projects without a transform get the bindings of an empty transform, so
/// binding never fails.
pub struct TransformBinder<P> {
    provider: P,
}

impl<P: TransformProvider> TransformBinder<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn bind(&self, project: ProjectId, scope: Scope<'_>) -> BindingContext {
        let transform = self.provider.get(project).unwrap_or_else(|| {
            tracing::debug!("No transform for project {}, binding empty base IRI", project);
            Arc::new(Transform::default())
        });
        BindingContext::resolve(&transform, scope)
    }
}

/// Named models attached to one project's grid state
#[derive(Debug, Clone, Default)]
pub struct OverlayModels {
    models: HashMap<String, Arc<Transform>>,
}

impl OverlayModels {
    pub fn transform(&self) -> Option<Arc<Transform>> {
        self.models.get(Transform::KEY).cloned()
    }

    pub fn set_transform(&mut self, transform: Arc<Transform>) {
        self.models.insert(Transform::KEY.to_string(), transform);
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

/// Overlay models for every known project
#[derive(Debug, Default)]
pub struct OverlayStore {
    projects: HashMap<ProjectId, OverlayModels>,
}

impl OverlayStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, project: ProjectId, overlays: OverlayModels) {
        self.projects.insert(project, overlays);
    }

    pub fn overlays(&self, project: ProjectId) -> Option<&OverlayModels> {
        self.projects.get(&project)
    }
}

impl TransformProvider for OverlayStore {
    fn get(&self, project: ProjectId) -> Option<Arc<Transform>> {
        self.projects.get(&project).and_then(OverlayModels::transform)
    }
}

impl<T: TransformProvider + ?Sized> TransformProvider for &T {
    fn get(&self, project: ProjectId) -> Option<Arc<Transform>> {
        (**self).get(project)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{IndexedRow, Row};

    #[test]
    fn test_bindings_expose_base_iri() {
        let transform = Transform::new("http://ex.org/");
        let row = Row::from_values(["a"]);
        let indexed = IndexedRow { index: 7, row: &row };

        let bindings = BindingContext::resolve(&transform, Scope::Row(&indexed));
        assert_eq!(bindings.base_iri(), "http://ex.org/");
        assert_eq!(bindings.get(ROW_INDEX), Some("7"));
    }

    #[test]
    fn test_binder_falls_back_to_empty_transform() {
        let store = OverlayStore::new();
        let binder = TransformBinder::new(&store);
        let row = Row::default();
        let indexed = IndexedRow { index: 0, row: &row };

        let bindings = binder.bind(99, Scope::Row(&indexed));
        assert_eq!(bindings.get(BASE_IRI), Some(""));
    }

    #[test]
    fn test_binder_uses_project_transform() {
        let mut overlays = OverlayModels::default();
        overlays.set_transform(Arc::new(Transform::new("http://data.org/")));
        let mut store = OverlayStore::new();
        store.insert(1, overlays);

        let binder = TransformBinder::new(store);
        let row = Row::default();
        let indexed = IndexedRow { index: 0, row: &row };
        assert_eq!(binder.bind(1, Scope::Row(&indexed)).base_iri(), "http://data.org/");
        assert_eq!(binder.bind(2, Scope::Row(&indexed)).base_iri(), "");
    }
}
