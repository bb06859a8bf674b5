use crate::model::document::Document;
use crate::model::group::{Group, GroupItem, GroupType};
use crate::ops::check::{CheckError, CheckResult, CheckWarning};

// ---------------------------------------------------------------------------
// Group trees
// ---------------------------------------------------------------------------

/// Render one group tree as an indented outline. Groups end in `/`, leaves
/// show the entity name, and leaves naming nothing are marked `?`.
pub fn render_tree(doc: &Document, kind: GroupType) -> String {
    let mut out = String::new();
    let root = doc.tree(kind);
    out.push_str(&format!("{}/\n", root.name));
    render_items(doc, root, 1, &mut out);
    out
}

fn render_items(doc: &Document, group: &Group, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    for item in &group.items {
        match item {
            GroupItem::Group(sub) => {
                out.push_str(&format!("{}{}/\n", indent, sub.name));
                render_items(doc, sub, depth + 1, out);
            }
            GroupItem::Leaf(id) => match leaf_name(doc, group.kind, id) {
                Some(name) => out.push_str(&format!("{}{}\n", indent, name)),
                None => out.push_str(&format!("{}? {}\n", indent, id)),
            },
        }
    }
}

fn leaf_name<'a>(doc: &'a Document, kind: GroupType, id: &str) -> Option<&'a str> {
    match kind {
        GroupType::Project => doc.project(id).map(|p| p.name.as_str()),
        GroupType::Label => doc.label(id).map(|l| l.name.as_str()),
    }
}

// ---------------------------------------------------------------------------
// Check report
// ---------------------------------------------------------------------------

fn describe_error(err: &CheckError) -> String {
    match err {
        CheckError::DuplicateGroupId { group_id, count } => {
            format!("group id {} appears {} times", group_id, count)
        }
        CheckError::TypeMismatch {
            group_id,
            parent_id,
            expected,
            found,
        } => format!(
            "group {} is a {} group inside {} group {}",
            group_id, found, expected, parent_id
        ),
        CheckError::UnknownProject { task_id, project_id } => {
            format!("task {} belongs to missing project {}", task_id, project_id)
        }
    }
}

fn describe_warning(warning: &CheckWarning) -> String {
    match warning {
        CheckWarning::DanglingLeaf { group_id, item_id } => {
            format!("group {} lists missing item {}", group_id, item_id)
        }
        CheckWarning::DanglingSectionItem {
            project_id,
            section_id,
            task_id,
        } => format!(
            "section {}/{} lists missing task {}",
            project_id, section_id, task_id
        ),
        CheckWarning::UnlistedTask { task_id, project_id } => {
            format!("task {} is in no section of project {}", task_id, project_id)
        }
    }
}

/// Human-readable check report
pub fn render_check(result: &CheckResult) -> String {
    let mut out = String::new();
    if !result.errors.is_empty() {
        out.push_str("Errors:\n");
        for err in &result.errors {
            out.push_str(&format!("  {}\n", describe_error(err)));
        }
    }
    if !result.warnings.is_empty() {
        if !result.errors.is_empty() {
            out.push('\n');
        }
        out.push_str("Warnings:\n");
        for warning in &result.warnings {
            out.push_str(&format!("  {}\n", describe_warning(warning)));
        }
    }
    if result.valid {
        out.push_str("✓ data file is valid\n");
    } else {
        out.push_str("✗ data file has errors\n");
    }
    out
}
