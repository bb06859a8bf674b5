//! JSON request and response bodies.

use serde::de::{self, DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::group::{Group, GroupItem, GroupType};
use crate::model::label::Label;
use crate::model::project::Project;
use crate::model::task::Task;
use crate::ops::group_ops::{GroupPatch, NewGroup};
use crate::ops::reorder::{DragSource, DropTarget, MoveKind};
use crate::util::double_option;

/// A body that may be a single object or an array of them
#[derive(Debug, Clone)]
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

/// Picks the shape first, then parses it as that shape only, so a bad
/// field reports its own error instead of "did not match any variant".
impl<'de, T: DeserializeOwned> Deserialize<'de> for OneOrMany<T> {
    fn deserialize<D: Deserializer<'de>>(de: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(de)?;
        let parsed = if value.is_array() {
            serde_json::from_value(value).map(OneOrMany::Many)
        } else {
            serde_json::from_value(value).map(OneOrMany::One)
        };
        parsed.map_err(de::Error::custom)
    }
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => vec![item],
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

// ---------------------------------------------------------------------------
// Groups
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupsResponse {
    pub project_groups: Group,
    pub label_groups: Group,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateGroupRequest {
    #[serde(rename = "type")]
    pub kind: GroupType,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub parent_id: Option<String>,
}

impl From<CreateGroupRequest> for NewGroup {
    fn from(req: CreateGroupRequest) -> Self {
        NewGroup {
            kind: req.kind,
            name: req.name,
            description: req.description,
            color: req.color,
            parent_id: req.parent_id,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateGroupRequest {
    pub id: String,
    #[serde(default, rename = "type")]
    pub kind: Option<GroupType>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    /// `null` clears the description
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub items: Option<Vec<GroupItem>>,
}

impl From<UpdateGroupRequest> for GroupPatch {
    fn from(req: UpdateGroupRequest) -> Self {
        GroupPatch {
            id: req.id,
            kind: req.kind,
            name: req.name,
            slug: req.slug,
            description: req.description,
            color: req.color,
            items: req.items,
        }
    }
}

/// `PATCH /api/groups`: a whole-root reorder, or per-group updates
#[derive(Debug)]
pub enum PatchGroupsRequest {
    Reorder(ReorderRootRequest),
    Update(OneOrMany<UpdateGroupRequest>),
}

/// An object carrying `groups` is a root reorder; anything else is a list
/// of updates.
impl<'de> Deserialize<'de> for PatchGroupsRequest {
    fn deserialize<D: Deserializer<'de>>(de: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(de)?;
        let parsed = if value.get("groups").is_some() {
            serde_json::from_value(value).map(PatchGroupsRequest::Reorder)
        } else {
            serde_json::from_value(value).map(PatchGroupsRequest::Update)
        };
        parsed.map_err(de::Error::custom)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReorderRootRequest {
    #[serde(rename = "type")]
    pub kind: GroupType,
    pub groups: Vec<GroupItem>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteGroupRequest {
    pub id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMutationResponse {
    pub success: bool,
    pub group_ids: Vec<String>,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Projects, labels, tasks
// ---------------------------------------------------------------------------

/// `{ids: [...]}` body shared by the flat-list deletes
#[derive(Debug, Deserialize)]
pub struct IdsRequest {
    pub ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ProjectsResponse {
    pub success: bool,
    pub projects: Vec<Project>,
    pub count: usize,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectsDeletedResponse {
    pub success: bool,
    pub project_ids: Vec<String>,
    pub count: usize,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct LabelsResponse {
    pub success: bool,
    pub labels: Vec<Label>,
    pub count: usize,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelsDeletedResponse {
    pub success: bool,
    pub label_ids: Vec<String>,
    pub count: usize,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct TasksResponse {
    pub success: bool,
    pub tasks: Vec<Task>,
    pub count: usize,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TasksDeletedResponse {
    pub success: bool,
    pub task_ids: Vec<String>,
    pub count: usize,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Reorder
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub source: DragSource,
    pub target: DropTarget,
}

#[derive(Debug, Serialize)]
pub struct ReorderResponse {
    pub success: bool,
    pub moved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<MoveKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expand: Option<String>,
}

/// "1 task" / "3 tasks"
pub(crate) fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{} {}", count, noun)
    } else {
        format!("{} {}s", count, noun)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::task_ops::TaskPatch;

    #[test]
    fn test_patch_groups_body_shapes() {
        let bulk: PatchGroupsRequest =
            serde_json::from_str(r##"{"type":"label","groups":["l1",{"id":"g","name":"G","slug":"g","color":"#000","type":"label","items":[]}]}"##)
                .unwrap();
        assert!(matches!(bulk, PatchGroupsRequest::Reorder(ReorderRootRequest { kind: GroupType::Label, ref groups }) if groups.len() == 2));

        let one: PatchGroupsRequest =
            serde_json::from_str(r#"{"id":"g1","type":"project","name":"Renamed"}"#).unwrap();
        assert!(matches!(one, PatchGroupsRequest::Update(OneOrMany::One(_))));

        let many: PatchGroupsRequest =
            serde_json::from_str(r##"[{"id":"g1","color":"#fff"},{"id":"g2","name":"Two"}]"##).unwrap();
        let PatchGroupsRequest::Update(updates) = many else {
            panic!("expected updates");
        };
        assert_eq!(updates.into_vec().len(), 2);
    }

    #[test]
    fn test_batch_bodies_keep_field_errors() {
        let err = serde_json::from_str::<OneOrMany<TaskPatch>>(r#"{"id":"t1","priority":9}"#).unwrap_err();
        assert!(err.to_string().contains("priority must be between 1 and 4"), "{}", err);

        let err = serde_json::from_str::<OneOrMany<TaskPatch>>(r#"[{"id":"t1"},{"id":"t2","titel":"x"}]"#).unwrap_err();
        assert!(err.to_string().contains("unknown field `titel`"), "{}", err);

        let err = serde_json::from_str::<PatchGroupsRequest>(r#"{"id":"g","type":"folder"}"#).unwrap_err();
        assert!(err.to_string().contains("unknown variant `folder`"), "{}", err);

        let err = serde_json::from_str::<PatchGroupsRequest>(r#"{"type":"folder","groups":[]}"#).unwrap_err();
        assert!(err.to_string().contains("unknown variant `folder`"), "{}", err);
    }

    #[test]
    fn test_group_description_null_clears() {
        let req: UpdateGroupRequest = serde_json::from_str(r#"{"id":"g1","description":null}"#).unwrap();
        assert_eq!(req.description, Some(None));
        let req: UpdateGroupRequest = serde_json::from_str(r#"{"id":"g1"}"#).unwrap();
        assert_eq!(req.description, None);
    }

    #[test]
    fn test_plural() {
        assert_eq!(plural(1, "task"), "1 task");
        assert_eq!(plural(0, "task"), "0 tasks");
    }
}
