use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Task priority, 1 (urgent) through 4 (none)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Priority(u8);

impl Priority {
    pub const HIGHEST: Priority = Priority(1);
    pub const LOWEST: Priority = Priority(4);

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::LOWEST
    }
}

impl TryFrom<u8> for Priority {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if (1..=4).contains(&value) {
            Ok(Priority(value))
        } else {
            Err(format!("priority must be between 1 and 4, got {}", value))
        }
    }
}

impl From<Priority> for u8 {
    fn from(p: Priority) -> u8 {
        p.0
    }
}

/// A single task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Owning project; `None` means the task sits in the inbox
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_id: Option<String>,
    #[serde(default)]
    pub completed: bool,
    /// Set when `completed` goes false → true, cleared on true → false
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub priority: Priority,
    /// Label ids
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    /// Fields this crate does not model, written back untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Task {
    pub fn new(id: String, title: String, created_at: DateTime<Utc>) -> Self {
        Task {
            id,
            title,
            description: None,
            project_id: None,
            section_id: None,
            completed: false,
            completed_at: None,
            due_date: None,
            priority: Priority::default(),
            labels: Vec::new(),
            created_at,
            extra: Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_bounds() {
        assert!(Priority::try_from(0).is_err());
        assert!(Priority::try_from(5).is_err());
        assert_eq!(Priority::try_from(2).unwrap().value(), 2);
        assert!(serde_json::from_str::<Task>(r#"{"id":"t","title":"x","priority":9}"#).is_err());
    }

    #[test]
    fn test_deserialize_minimal_task() {
        let task: Task = serde_json::from_str(
            r#"{"id":"t1","title":"Buy milk","projectId":"p1","completedAt":"2023-01-01T10:00:00Z","completed":true}"#,
        )
        .unwrap();
        assert_eq!(task.project_id.as_deref(), Some("p1"));
        assert!(task.section_id.is_none());
        assert_eq!(task.priority, Priority::LOWEST);
        assert_eq!(
            task.completed_at.unwrap().to_rfc3339(),
            "2023-01-01T10:00:00+00:00"
        );
        let out = serde_json::to_value(&task).unwrap();
        assert_eq!(out["projectId"], "p1");
        assert!(out.get("dueDate").is_none());
    }
}
