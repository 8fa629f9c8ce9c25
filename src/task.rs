// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde_json::Value;
use uuid::Uuid;

use crate::errors::SubmitError;
use crate::pipeline::GRAPH_NAME_KEY;
use crate::traits::DataMap;

/// A single unit of input flowing through one graph execution.
///
/// The id is assigned at creation and never changes; the payload is treated
/// as immutable once submitted. Tasks are independent of each other.
#[derive(Debug, Clone)]
pub struct Task {
    id: String,
    payload: DataMap,
    graph_name: Option<String>,
}

impl Task {
    pub fn new(payload: DataMap) -> Self {
        let graph_name = payload
            .get(GRAPH_NAME_KEY)
            .and_then(Value::as_str)
            .map(str::to_owned);
        Self {
            id: Uuid::new_v4().to_string(),
            payload,
            graph_name,
        }
    }

    /// Lift an arbitrary JSON value into a task.
    ///
    /// Objects become the payload as-is; any other non-null value is lifted
    /// to `{"value": <v>}`. Null is rejected without any state change: it is
    /// the reserved end-of-stream sentinel.
    pub fn from_value(value: Value) -> Result<Self, SubmitError> {
        match value {
            Value::Null => Err(SubmitError::InvalidTask(
                "null is the reserved completion sentinel".into(),
            )),
            Value::Object(map) => Ok(Self::new(map.into_iter().collect())),
            scalar => {
                let mut payload = DataMap::new();
                payload.insert("value".to_string(), scalar);
                Ok(Self::new(payload))
            }
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn payload(&self) -> &DataMap {
        &self.payload
    }

    /// Graph this task targets, when one was named in the payload or pinned
    /// at submit time.
    pub fn graph_name(&self) -> Option<&str> {
        self.graph_name.as_deref()
    }

    pub(crate) fn set_graph_name(&mut self, name: impl Into<String>) {
        self.graph_name = Some(name.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn object_payload_is_taken_as_is() {
        let task = Task::from_value(json!({"v": 41})).unwrap();
        assert_eq!(task.payload().get("v"), Some(&json!(41)));
    }

    #[test]
    fn scalar_payload_is_lifted() {
        let task = Task::from_value(json!("hello")).unwrap();
        assert_eq!(task.payload().get("value"), Some(&json!("hello")));
    }

    #[test]
    fn null_is_rejected() {
        assert!(matches!(
            Task::from_value(Value::Null),
            Err(SubmitError::InvalidTask(_))
        ));
    }

    #[test]
    fn graph_name_field_is_picked_up() {
        let task = Task::from_value(json!({"graph_name": "g1", "v": 1})).unwrap();
        assert_eq!(task.graph_name(), Some("g1"));
    }

    #[test]
    fn ids_are_unique() {
        let a = Task::from_value(json!({})).unwrap();
        let b = Task::from_value(json!({})).unwrap();
        assert_ne!(a.id(), b.id());
    }
}
