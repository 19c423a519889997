//! Undoable "save transform" operation and the history it is recorded in

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::binding::OverlayModels;
use crate::error::TransformResult;
use crate::transform::{Transform, is_blank};

/// What an operation leaves intact in the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridPreservation {
    PreservesRows,
    PreservesRecords,
    NoRowPreservation,
}

/// Outcome of applying an operation to a project state
#[derive(Debug, Clone)]
pub struct ChangeResult {
    pub overlays: OverlayModels,
    pub preservation: GridPreservation,
}

/// Records a new transform for a project without touching its data
#[derive(Debug, Clone, Default)]
pub struct SaveTransformOperation {
    transform: Option<Arc<Transform>>,
}

impl SaveTransformOperation {
    pub const DESCRIPTION: &'static str = "Save RDF Transform";

    pub fn new(transform: Transform) -> Self {
        Self {
            transform: Some(Arc::new(transform)),
        }
    }

    pub fn description(&self) -> &'static str {
        Self::DESCRIPTION
    }

    pub fn transform(&self) -> Option<&Arc<Transform>> {
        self.transform.as_ref()
    }

    /// Rebuild a serialized operation; `None` when it carries no transform
    pub fn from_json(value: &Value) -> TransformResult<Option<Self>> {
        Ok(Transform::from_document(value)?.map(Self::new))
    }

    pub fn to_json(&self) -> TransformResult<Value> {
        let mut document = serde_json::Map::new();
        document.insert("description".into(), Value::from(Self::DESCRIPTION));
        if let Some(transform) = &self.transform {
            document.insert(Transform::KEY.into(), serde_json::to_value(transform.as_ref())?);
        }
        Ok(Value::Object(document))
    }

    /// The data is returned unchanged; only the stored transform moves
    pub fn apply(&self, overlays: &OverlayModels) -> ChangeResult {
        let mut overlays = overlays.clone();
        if let Some(transform) = &self.transform {
            overlays.set_transform(Arc::clone(transform));
        }
        ChangeResult {
            overlays,
            preservation: GridPreservation::PreservesRecords,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub id: usize,
    pub description: String,
    pub operation: SaveTransformOperation,
    pub preservation: GridPreservation,
}

/// Ordered log of applied operations for one project
#[derive(Debug, Clone, Default)]
pub struct History {
    entries: Vec<HistoryEntry>,
    overlays: OverlayModels,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `operation` and record it as the newest entry
    pub fn add_entry(&mut self, operation: SaveTransformOperation) -> &HistoryEntry {
        let result = operation.apply(&self.overlays);
        self.overlays = result.overlays;

        let id = self.entries.len();
        tracing::info!(entry = id, "{}", operation.description());
        self.entries.push(HistoryEntry {
            id,
            description: operation.description().to_string(),
            operation,
            preservation: result.preservation,
        });
        &self.entries[id]
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn overlays(&self) -> &OverlayModels {
        &self.overlays
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Status reply of a command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeResponse {
    Ok,
    Error,
}

impl CodeResponse {
    pub fn to_json(self) -> Value {
        serde_json::json!({ "code": self })
    }
}

/// Save a transform received as a JSON string into `history`
pub fn save_transform(history: &mut History, payload: Option<&str>) -> CodeResponse {
    let Some(payload) = payload else {
        tracing::error!("No transform provided");
        return CodeResponse::Error;
    };

    let value: Value = match serde_json::from_str(payload) {
        Ok(value) => value,
        Err(err) => {
            tracing::error!("Transform is not valid JSON: {}", err);
            return CodeResponse::Error;
        }
    };
    if is_blank(&value) {
        tracing::error!("Transform is empty");
        return CodeResponse::Error;
    }

    match Transform::from_json(&value) {
        Ok(transform) => {
            history.add_entry(SaveTransformOperation::new(transform));
            CodeResponse::Ok
        }
        Err(err) => {
            tracing::error!("Reconstructing transform: {}", err);
            CodeResponse::Error
        }
    }
}
