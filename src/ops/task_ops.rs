use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::model::document::Document;
use crate::model::project::{DEFAULT_SECTION_ID, Section};
use crate::model::task::{Priority, Task};
use crate::util::double_option;

/// Error type for task operations
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("task not found: {0}")]
    NotFound(String),
    #[error("project not found: {0}")]
    ProjectNotFound(String),
    #[error("section {section_id} not found in project {project_id}")]
    SectionNotFound {
        project_id: String,
        section_id: String,
    },
    #[error("task {0} has no project, so it cannot be placed in a section")]
    NoProject(String),
}

/// A partial update of one task. Absent fields are left alone.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TaskPatch {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    /// `null` clears, absent leaves alone
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub section_id: Option<String>,
    /// Final position inside the destination section
    #[serde(default)]
    pub index: Option<usize>,
    #[serde(default)]
    pub completed: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<NaiveDate>>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub labels: Option<Vec<String>>,
}

/// Fields for a new task
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub section_id: Option<String>,
    #[serde(default)]
    pub index: Option<usize>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub labels: Vec<String>,
}

/// Result of applying a [`TaskPatch`]
#[derive(Debug, Clone)]
pub struct TaskUpdate {
    pub task: Task,
    /// False when the patch left the document exactly as it was
    pub changed: bool,
}

// ---------------------------------------------------------------------------
// Placement
// ---------------------------------------------------------------------------

/// The section currently listing `task_id` inside its own project, and the
/// task's index there.
pub fn current_placement(doc: &Document, task_id: &str) -> Option<(String, String, usize)> {
    let project_id = doc.task(task_id)?.project_id.as_deref()?;
    let project = doc.project(project_id)?;
    project.sections.iter().find_map(|s| {
        s.items
            .iter()
            .position(|t| t == task_id)
            .map(|idx| (project.id.clone(), s.id.clone(), idx))
    })
}

fn section_mut<'a>(
    doc: &'a mut Document,
    project_id: &str,
    section_id: &str,
) -> Result<&'a mut Section, TaskError> {
    let project = doc
        .project_mut(project_id)
        .ok_or_else(|| TaskError::ProjectNotFound(project_id.to_string()))?;
    if section_id == DEFAULT_SECTION_ID {
        project.ensure_default_section();
    }
    project
        .section_mut(section_id)
        .ok_or_else(|| TaskError::SectionNotFound {
            project_id: project_id.to_string(),
            section_id: section_id.to_string(),
        })
}

/// Put a task into `section_id` of `project_id`.
///
/// `index` is the task's final position in that section; `None` appends.
/// Moving within the same section is remove-then-insert, so the index is
/// clamped to the list without the task. Returns false, touching nothing,
/// when the task already sits at the resolved position.
pub fn place_task(
    doc: &mut Document,
    task_id: &str,
    project_id: &str,
    section_id: &str,
    index: Option<usize>,
) -> Result<bool, TaskError> {
    if doc.task(task_id).is_none() {
        return Err(TaskError::NotFound(task_id.to_string()));
    }
    // Validate the destination before mutating anything.
    section_mut(doc, project_id, section_id)?;

    let current = current_placement(doc, task_id);
    if let Some((cur_project, cur_section, from)) = &current
        && cur_project == project_id
        && cur_section == section_id
    {
        let from = *from;
        let Some(index) = index else {
            return Ok(false);
        };
        let section = section_mut(doc, project_id, section_id)?;
        let to = index.min(section.items.len().saturating_sub(1));
        if to == from {
            return Ok(false);
        }
        let id = section.items.remove(from);
        section.items.insert(to, id);
        set_placement(doc, task_id, project_id, section_id);
        return Ok(true);
    }

    // Leave the old project (every section of it, in case of stale duplicates).
    let old_project = doc.task(task_id).and_then(|t| t.project_id.clone());
    if let Some(old) = old_project
        && let Some(project) = doc.project_mut(&old)
    {
        for section in &mut project.sections {
            section.items.retain(|t| t != task_id);
        }
    }

    let section = section_mut(doc, project_id, section_id)?;
    let at = index.map_or(section.items.len(), |i| i.min(section.items.len()));
    section.items.insert(at, task_id.to_string());
    set_placement(doc, task_id, project_id, section_id);
    Ok(true)
}

fn set_placement(doc: &mut Document, task_id: &str, project_id: &str, section_id: &str) {
    if let Some(task) = doc.task_mut(task_id) {
        task.project_id = Some(project_id.to_string());
        task.section_id = Some(section_id.to_string());
    }
}

/// Remove a task from every section of every project
fn unlist_task(doc: &mut Document, task_id: &str) {
    for project in &mut doc.projects {
        for section in &mut project.sections {
            section.items.retain(|t| t != task_id);
        }
    }
}

// ---------------------------------------------------------------------------
// Completion
// ---------------------------------------------------------------------------

/// Set `completed`, stamping `completed_at` only on an actual transition.
pub fn set_completed(task: &mut Task, completed: bool, now: DateTime<Utc>) {
    if task.completed == completed {
        return;
    }
    task.completed = completed;
    task.completed_at = if completed { Some(now) } else { None };
}

// ---------------------------------------------------------------------------
// Update / create / delete
// ---------------------------------------------------------------------------

/// Apply a patch to one task, moving it between sections/projects as needed.
pub fn apply_task_update(
    doc: &mut Document,
    patch: TaskPatch,
    now: DateTime<Utc>,
) -> Result<TaskUpdate, TaskError> {
    let before = doc
        .task(&patch.id)
        .cloned()
        .ok_or_else(|| TaskError::NotFound(patch.id.clone()))?;

    let project_changed = patch
        .project_id
        .as_ref()
        .is_some_and(|p| before.project_id.as_ref() != Some(p));
    let target_project = if project_changed {
        patch.project_id.clone()
    } else {
        before.project_id.clone()
    };
    let current = current_placement(doc, &patch.id);

    let target_section = match (&patch.section_id, project_changed) {
        (Some(section), _) => Some(section.clone()),
        (None, true) => Some(DEFAULT_SECTION_ID.to_string()),
        // A bare index reorders inside the current section.
        (None, false) if patch.index.is_some() => current.as_ref().map(|(_, s, _)| s.clone()),
        (None, false) => None,
    };

    let mut placed = false;
    if let Some(section_id) = target_section {
        let project_id = target_project.ok_or_else(|| TaskError::NoProject(patch.id.clone()))?;
        placed = place_task(doc, &patch.id, &project_id, &section_id, patch.index)?;
    }

    let task = doc
        .task_mut(&patch.id)
        .ok_or_else(|| TaskError::NotFound(patch.id.clone()))?;
    if let Some(title) = patch.title {
        task.title = title;
    }
    if let Some(description) = patch.description {
        task.description = description;
    }
    if let Some(due) = patch.due_date {
        task.due_date = due;
    }
    if let Some(priority) = patch.priority {
        task.priority = priority;
    }
    if let Some(labels) = patch.labels {
        task.labels = labels;
    }
    if let Some(completed) = patch.completed {
        set_completed(task, completed, now);
    }

    let changed = placed || *task != before;
    Ok(TaskUpdate {
        task: task.clone(),
        changed,
    })
}

/// Create a task. With a project it is listed in the given section (the
/// default section when none is given). Returns the new task.
pub fn create_task(doc: &mut Document, new: NewTask, now: DateTime<Utc>) -> Result<Task, TaskError> {
    let id = Uuid::new_v4().to_string();
    let section_id = match (&new.project_id, &new.section_id) {
        (Some(project_id), section) => {
            let section = section.clone().unwrap_or_else(|| DEFAULT_SECTION_ID.to_string());
            section_mut(doc, project_id, &section)?;
            Some(section)
        }
        (None, Some(_)) => return Err(TaskError::NoProject(id)),
        (None, None) => None,
    };

    let mut task = Task::new(id.clone(), new.title, now);
    task.description = new.description;
    task.due_date = new.due_date;
    task.priority = new.priority.unwrap_or_default();
    task.labels = new.labels;
    doc.tasks.push(task);

    if let (Some(project_id), Some(section_id)) = (&new.project_id, &section_id) {
        place_task(doc, &id, project_id, section_id, new.index)?;
    }
    doc.task(&id)
        .cloned()
        .ok_or(TaskError::NotFound(id))
}

/// Delete tasks by id and unlist them from every section. Unknown ids are
/// ignored. Returns the ids actually removed.
pub fn delete_tasks(doc: &mut Document, ids: &[String]) -> Vec<String> {
    let mut removed = Vec::new();
    for id in ids {
        if let Some(pos) = doc.tasks.iter().position(|t| &t.id == id) {
            doc.tasks.remove(pos);
            unlist_task(doc, id);
            removed.push(id.clone());
        }
    }
    removed
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
