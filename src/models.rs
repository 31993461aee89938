use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field name to message, e.g. `{"title": "Title is required."}`.
pub type FieldErrors = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub due_date: String,
    pub created_at: String,
    pub updated_at: String,
    pub completed_at: Option<String>,
    pub deleted_at: Option<String>,
}

impl Todo {
    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }
}

/// Partition of live todos by completion status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TodoFilter {
    #[default]
    All,
    Active,
    Completed,
}

impl TodoFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            TodoFilter::All => "all",
            TodoFilter::Active => "active",
            TodoFilter::Completed => "completed",
        }
    }

    /// Unrecognized or missing values fall back to `All`.
    pub fn from_param(value: Option<&str>) -> Self {
        value.and_then(|v| v.parse().ok()).unwrap_or_default()
    }
}

impl FromStr for TodoFilter {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(TodoFilter::All),
            "active" => Ok(TodoFilter::Active),
            "completed" => Ok(TodoFilter::Completed),
            _ => Err(()),
        }
    }
}

impl fmt::Display for TodoFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The three user-editable fields. Create and update both replace all of them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoInput {
    pub title: String,
    pub description: String,
    pub due_date: String,
}

/// Completion is patch-like on update, unlike the text fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionUpdate {
    Unchanged,
    Complete,
    Reopen,
}

/// A create/update request body as sent by any client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoPayload {
    pub input: TodoInput,
    pub completion: CompletionUpdate,
}

impl TodoPayload {
    /// Reads a decoded JSON body. Returns `None` when the body is not an object.
    /// Fields that are missing or not strings read as empty.
    pub fn from_json(value: Value) -> Option<Self> {
        let Value::Object(map) = value else {
            return None;
        };

        let completion = match map.get("completed") {
            Some(Value::Bool(true)) => CompletionUpdate::Complete,
            Some(Value::Bool(false)) => CompletionUpdate::Reopen,
            _ if matches!(map.get("completedAt"), Some(Value::Null)) => CompletionUpdate::Reopen,
            _ => CompletionUpdate::Unchanged,
        };

        Some(TodoPayload {
            input: TodoInput {
                title: text_field(&map, "title"),
                description: text_field(&map, "description"),
                due_date: text_field(&map, "dueDate"),
            },
            completion,
        })
    }
}

fn text_field(map: &Map<String, Value>, key: &str) -> String {
    map.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or_default()
        .to_string()
}

/// Request body sent by the client on update.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateTodoRequest<'a> {
    #[serde(flatten)]
    pub input: &'a TodoInput,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

/// Success envelope: `{ "data": ... }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataResponse<T> {
    pub data: T,
}

/// Failure envelope: `{ "errors": { field: message } }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub errors: FieldErrors,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AckResponse {
    pub ok: bool,
}
