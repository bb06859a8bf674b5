//! Drag-and-drop move resolution.
//!
//! A drop is described by what was dragged ([`DragSource`]) and where it was
//! released ([`DropTarget`]). [`resolve`] turns that into a [`MovePlan`]
//! (or a no-op) without touching the document; [`apply`] performs the
//! splice. [`execute_drop`] chains both and never fails: bad drops are
//! logged and skipped.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::document::Document;
use crate::model::group::{GroupItem, GroupType};
use crate::ops::group_ops::{find_group, find_group_mut};
use crate::ops::task_ops::{self, TaskError};

/// What is being dragged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Task,
    Project,
    Label,
    Group,
}

/// An ordered list something can be dragged out of or dropped into
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Container {
    /// A group's item list
    Group { id: String },
    /// The flat `projects` or `labels` array, independent of group nesting
    Root {
        #[serde(rename = "type")]
        tree: GroupType,
    },
    /// A project section's task list
    Section {
        #[serde(rename = "projectId")]
        project_id: String,
        #[serde(rename = "sectionId")]
        section_id: String,
    },
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Container::Group { id } => write!(f, "group {}", id),
            Container::Root { tree } => write!(f, "{} root ordering", tree),
            Container::Section {
                project_id,
                section_id,
            } => write!(f, "section {}/{}", project_id, section_id),
        }
    }
}

/// Closest-edge instruction attached to a drop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Instruction {
    ReorderAbove,
    ReorderBelow,
    MakeChild,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DragSource {
    pub kind: ItemKind,
    pub id: String,
    pub container: Container,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropTarget {
    pub container: Container,
    /// The item the pointer was over, if any; without one the drop appends
    #[serde(default)]
    pub sibling_id: Option<String>,
    #[serde(default)]
    pub instruction: Option<Instruction>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MoveKind {
    ReorderWithinGroup,
    ReorderRoot,
    MoveAcrossGroups,
    ReorderWithinSection,
    MoveAcrossSections,
}

/// A fully resolved move: remove at `from_index` of `from`, insert at
/// `to_index` of `to` (the final position after removal).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovePlan {
    pub kind: MoveKind,
    pub item: ItemKind,
    pub id: String,
    pub from: Container,
    pub from_index: usize,
    pub to: Container,
    pub to_index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The drop would leave everything where it is
    NoOp,
    Move(MovePlan),
}

/// What an applied move did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveOutcome {
    pub kind: MoveKind,
    /// Group the item landed in, when that differs from where it came
    /// from. Clients expand it if it is collapsed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expand: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    Moved(MoveOutcome),
    NoOp,
    /// The drop could not be resolved or applied; nothing changed
    Ignored,
}

/// Error type for move resolution
#[derive(Debug, thiserror::Error)]
pub enum MoveError {
    #[error("unsupported drop instruction")]
    UnsupportedInstruction,
    #[error("unsupported move: {0}")]
    UnsupportedMove(String),
    #[error("container not found: {0}")]
    ContainerNotFound(String),
    #[error("{id} is not in {container}")]
    NotInContainer { id: String, container: String },
    #[error("drop target {0} not found")]
    SiblingNotFound(String),
    #[error("cannot make {0} a child of a non-group item")]
    NotAGroup(String),
    #[error("cannot move group {0} into itself or its descendants")]
    CycleRejected(String),
    #[error(transparent)]
    Task(#[from] TaskError),
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Ids listed by a container, in order.
fn container_ids(doc: &Document, container: &Container) -> Result<Vec<String>, MoveError> {
    let not_found = || MoveError::ContainerNotFound(container.to_string());
    match container {
        Container::Group { id } => {
            let group = find_group(doc, id).ok_or_else(not_found)?;
            Ok(group.items.iter().map(|i| i.id().to_string()).collect())
        }
        Container::Root { tree } => Ok(match tree {
            GroupType::Project => doc.projects.iter().map(|p| p.id.clone()).collect(),
            GroupType::Label => doc.labels.iter().map(|l| l.id.clone()).collect(),
        }),
        Container::Section {
            project_id,
            section_id,
        } => {
            let section = doc
                .project(project_id)
                .and_then(|p| p.section(section_id))
                .ok_or_else(not_found)?;
            Ok(section.items.clone())
        }
    }
}

/// Which group tree a draggable kind belongs to, if any
fn tree_of(doc: &Document, item: ItemKind, id: &str) -> Option<GroupType> {
    match item {
        ItemKind::Project => Some(GroupType::Project),
        ItemKind::Label => Some(GroupType::Label),
        ItemKind::Group => find_group(doc, id).map(|g| g.kind),
        ItemKind::Task => None,
    }
}

/// Check that `item` may live in `container`.
fn check_fits(doc: &Document, item: ItemKind, id: &str, container: &Container) -> Result<(), MoveError> {
    let unsupported = || MoveError::UnsupportedMove(format!("{:?} {} cannot go in {}", item, id, container));
    match (item, container) {
        (ItemKind::Task, Container::Section { .. }) => Ok(()),
        (ItemKind::Project, Container::Root { tree: GroupType::Project })
        | (ItemKind::Label, Container::Root { tree: GroupType::Label }) => Ok(()),
        (ItemKind::Project | ItemKind::Label | ItemKind::Group, Container::Group { id: group_id }) => {
            let group = find_group(doc, group_id)
                .ok_or_else(|| MoveError::ContainerNotFound(container.to_string()))?;
            if tree_of(doc, item, id) == Some(group.kind) {
                Ok(())
            } else {
                Err(unsupported())
            }
        }
        _ => Err(unsupported()),
    }
}

/// Work out where a drop lands, without changing the document.
pub fn resolve(doc: &Document, source: &DragSource, target: &DropTarget) -> Result<Resolution, MoveError> {
    let instruction = target.instruction.unwrap_or(Instruction::ReorderAbove);
    if instruction == Instruction::Unknown {
        return Err(MoveError::UnsupportedInstruction);
    }

    let from_ids = container_ids(doc, &source.container)?;
    let from_index = from_ids
        .iter()
        .position(|i| *i == source.id)
        .ok_or_else(|| MoveError::NotInContainer {
            id: source.id.clone(),
            container: source.container.to_string(),
        })?;

    let target_ids = container_ids(doc, &target.container)?;
    let sibling_pos = match &target.sibling_id {
        Some(sibling) => Some(
            target_ids
                .iter()
                .position(|i| i == sibling)
                .ok_or_else(|| MoveError::SiblingNotFound(sibling.clone()))?,
        ),
        None => None,
    };

    let (to, base) = match instruction {
        Instruction::MakeChild => {
            let sibling = target
                .sibling_id
                .as_ref()
                .ok_or_else(|| MoveError::UnsupportedMove("make-child needs a target item".into()))?;
            let Container::Group { id: parent_id } = &target.container else {
                return Err(MoveError::NotAGroup(sibling.clone()));
            };
            let parent = find_group(doc, parent_id)
                .ok_or_else(|| MoveError::ContainerNotFound(target.container.to_string()))?;
            let new_parent = parent
                .items
                .iter()
                .find(|i| i.id() == sibling)
                .and_then(GroupItem::as_group)
                .ok_or_else(|| MoveError::NotAGroup(sibling.clone()))?;
            (
                Container::Group {
                    id: new_parent.id.clone(),
                },
                new_parent.items.len(),
            )
        }
        Instruction::ReorderAbove | Instruction::ReorderBelow | Instruction::Unknown => {
            let base = match sibling_pos {
                Some(pos) if instruction == Instruction::ReorderBelow => pos + 1,
                Some(pos) => pos,
                None => target_ids.len(),
            };
            (target.container.clone(), base)
        }
    };

    check_fits(doc, source.kind, &source.id, &source.container)?;
    check_fits(doc, source.kind, &source.id, &to)?;
    if source.kind == ItemKind::Group
        && let Container::Group { id: dest } = &to
        && find_group(doc, &source.id).is_some_and(|g| g.contains_group(dest))
    {
        return Err(MoveError::CycleRejected(source.id.clone()));
    }

    let same = to == source.container;
    let mut to_index = base;
    if same {
        // Remove-then-insert: everything after the source shifts up by one.
        if from_index < to_index {
            to_index -= 1;
        }
        if to_index == from_index {
            return Ok(Resolution::NoOp);
        }
    }

    let kind = match (&source.container, &to, same) {
        (Container::Section { .. }, _, true) => MoveKind::ReorderWithinSection,
        (Container::Section { .. }, _, false) => MoveKind::MoveAcrossSections,
        (Container::Root { .. }, Container::Root { .. }, _) => MoveKind::ReorderRoot,
        (Container::Group { .. }, Container::Group { .. }, true) => MoveKind::ReorderWithinGroup,
        (Container::Group { .. }, Container::Group { .. }, false) => MoveKind::MoveAcrossGroups,
        (from, to, _) => {
            return Err(MoveError::UnsupportedMove(format!("{} to {}", from, to)));
        }
    };

    Ok(Resolution::Move(MovePlan {
        kind,
        item: source.kind,
        id: source.id.clone(),
        from: source.container.clone(),
        from_index,
        to,
        to_index,
    }))
}

// ---------------------------------------------------------------------------
// Application
// ---------------------------------------------------------------------------

/// Splice `plan` into the document.
pub fn apply(doc: &mut Document, plan: &MovePlan) -> Result<MoveOutcome, MoveError> {
    match (&plan.from, &plan.to) {
        (Container::Root { tree }, Container::Root { .. }) => {
            match tree {
                GroupType::Project => splice(&mut doc.projects, plan.from_index, plan.to_index),
                GroupType::Label => splice(&mut doc.labels, plan.from_index, plan.to_index),
            }
            Ok(MoveOutcome {
                kind: plan.kind,
                expand: None,
            })
        }
        (Container::Group { id: from_id }, Container::Group { id: to_id }) => {
            if find_group(doc, to_id).is_none() {
                return Err(MoveError::ContainerNotFound(plan.to.to_string()));
            }
            let source = find_group_mut(doc, from_id)
                .ok_or_else(|| MoveError::ContainerNotFound(plan.from.to_string()))?;
            if source.items.get(plan.from_index).map(GroupItem::id) != Some(plan.id.as_str()) {
                return Err(MoveError::NotInContainer {
                    id: plan.id.clone(),
                    container: plan.from.to_string(),
                });
            }
            let item = source.items.remove(plan.from_index);
            let Some(dest) = find_group_mut(doc, to_id) else {
                return Err(MoveError::ContainerNotFound(plan.to.to_string()));
            };
            let at = plan.to_index.min(dest.items.len());
            dest.items.insert(at, item);
            Ok(MoveOutcome {
                kind: plan.kind,
                expand: (from_id != to_id).then(|| to_id.clone()),
            })
        }
        (
            Container::Section { .. },
            Container::Section {
                project_id,
                section_id,
            },
        ) => {
            task_ops::place_task(doc, &plan.id, project_id, section_id, Some(plan.to_index))?;
            Ok(MoveOutcome {
                kind: plan.kind,
                expand: None,
            })
        }
        (from, to) => Err(MoveError::UnsupportedMove(format!("{} to {}", from, to))),
    }
}

fn splice<T>(items: &mut Vec<T>, from: usize, to: usize) {
    if from >= items.len() {
        return;
    }
    let item = items.remove(from);
    let at = to.min(items.len());
    items.insert(at, item);
}

/// Resolve and apply a drop. Failures are logged and reported as
/// [`DropOutcome::Ignored`]; they never propagate.
pub fn execute_drop(doc: &mut Document, source: &DragSource, target: &DropTarget) -> DropOutcome {
    let plan = match resolve(doc, source, target) {
        Ok(Resolution::Move(plan)) => plan,
        Ok(Resolution::NoOp) => {
            tracing::debug!(id = %source.id, "drop leaves item in place");
            return DropOutcome::NoOp;
        }
        Err(e) => {
            tracing::warn!(id = %source.id, error = %e, "ignoring drop");
            return DropOutcome::Ignored;
        }
    };
    match apply(doc, &plan) {
        Ok(outcome) => DropOutcome::Moved(outcome),
        Err(e) => {
            tracing::warn!(id = %source.id, error = %e, "drop failed to apply");
            DropOutcome::Ignored
        }
    }
}
