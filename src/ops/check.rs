use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::model::document::Document;
use crate::model::group::{Group, GroupType};

/// Structured result from `td check` and `GET /api/check`
#[derive(Debug, Default, Serialize)]
pub struct CheckResult {
    pub valid: bool,
    pub errors: Vec<CheckError>,
    pub warnings: Vec<CheckWarning>,
}

/// A validation error (the document is inconsistent)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum CheckError {
    /// The same group id appears more than once, within or across trees
    #[serde(rename = "duplicate_group_id")]
    DuplicateGroupId { group_id: String, count: usize },
    /// A nested group's type differs from its parent's
    #[serde(rename = "type_mismatch")]
    TypeMismatch {
        group_id: String,
        parent_id: String,
        expected: GroupType,
        found: GroupType,
    },
    /// A task points at a project that does not exist
    #[serde(rename = "unknown_project")]
    UnknownProject { task_id: String, project_id: String },
}

/// A validation warning (stale reference, harmless to readers)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum CheckWarning {
    /// A group leaf names a project or label that no longer exists
    #[serde(rename = "dangling_leaf")]
    DanglingLeaf { group_id: String, item_id: String },
    /// A section lists a task id that does not exist
    #[serde(rename = "dangling_section_item")]
    DanglingSectionItem {
        project_id: String,
        section_id: String,
        task_id: String,
    },
    /// A task belongs to a project but no section lists it
    #[serde(rename = "unlisted_task")]
    UnlistedTask { task_id: String, project_id: String },
}

// ---------------------------------------------------------------------------
// Main check entry point
// ---------------------------------------------------------------------------

/// Validate a document. Read-only.
pub fn check_document(doc: &Document) -> CheckResult {
    let mut result = CheckResult::default();

    check_group_ids(doc, &mut result);
    for kind in GroupType::ALL {
        check_tree(doc, doc.tree(kind), &mut result);
    }
    check_tasks(doc, &mut result);

    result.valid = result.errors.is_empty();
    result
}

// ---------------------------------------------------------------------------
// Group trees
// ---------------------------------------------------------------------------

fn check_group_ids(doc: &Document, result: &mut CheckResult) {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut order = Vec::new();
    for kind in GroupType::ALL {
        doc.tree(kind).walk(&mut |g| {
            let n = counts.entry(g.id.as_str()).or_default();
            if *n == 0 {
                order.push(g.id.as_str());
            }
            *n += 1;
        });
    }
    for id in order {
        let count = counts[id];
        if count > 1 {
            result.errors.push(CheckError::DuplicateGroupId {
                group_id: id.to_string(),
                count,
            });
        }
    }
}

fn check_tree(doc: &Document, root: &Group, result: &mut CheckResult) {
    root.walk(&mut |g| {
        for sub in g.subgroups() {
            if sub.kind != g.kind {
                result.errors.push(CheckError::TypeMismatch {
                    group_id: sub.id.clone(),
                    parent_id: g.id.clone(),
                    expected: g.kind,
                    found: sub.kind,
                });
            }
        }
        for item in &g.items {
            if item.as_group().is_none() && !doc.entity_exists(g.kind, item.id()) {
                result.warnings.push(CheckWarning::DanglingLeaf {
                    group_id: g.id.clone(),
                    item_id: item.id().to_string(),
                });
            }
        }
    });
}

// ---------------------------------------------------------------------------
// Tasks and sections
// ---------------------------------------------------------------------------

fn check_tasks(doc: &Document, result: &mut CheckResult) {
    let task_ids: HashSet<&str> = doc.tasks.iter().map(|t| t.id.as_str()).collect();

    for project in &doc.projects {
        for section in &project.sections {
            for task_id in &section.items {
                if !task_ids.contains(task_id.as_str()) {
                    result.warnings.push(CheckWarning::DanglingSectionItem {
                        project_id: project.id.clone(),
                        section_id: section.id.clone(),
                        task_id: task_id.clone(),
                    });
                }
            }
        }
    }

    for task in &doc.tasks {
        let Some(project_id) = task.project_id.as_deref() else {
            continue;
        };
        match doc.project(project_id) {
            None => result.errors.push(CheckError::UnknownProject {
                task_id: task.id.clone(),
                project_id: project_id.to_string(),
            }),
            Some(project) => {
                if project.section_of_task(&task.id).is_none() {
                    result.warnings.push(CheckWarning::UnlistedTask {
                        task_id: task.id.clone(),
                        project_id: project_id.to_string(),
                    });
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
