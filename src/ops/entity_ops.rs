use serde::Deserialize;
use uuid::Uuid;

use crate::model::document::Document;
use crate::model::label::Label;
use crate::model::project::{DEFAULT_COLOR, DEFAULT_SECTION_ID, Project, Section};
use crate::util::double_option;
use crate::util::slug::unique_slug;

/// Error type for project and label operations
#[derive(Debug, thiserror::Error)]
pub enum EntityError {
    #[error("project not found: {0}")]
    ProjectNotFound(String),
    #[error("label not found: {0}")]
    LabelNotFound(String),
}

/// Anything with an id and a slug that must stay unique in its list
trait Slugged {
    fn id(&self) -> &str;
    fn slug(&self) -> &str;
}

impl Slugged for Project {
    fn id(&self) -> &str {
        &self.id
    }
    fn slug(&self) -> &str {
        &self.slug
    }
}

impl Slugged for Label {
    fn id(&self) -> &str {
        &self.id
    }
    fn slug(&self) -> &str {
        &self.slug
    }
}

fn fresh_slug<T: Slugged>(existing: &[T], name: &str, except_id: Option<&str>) -> String {
    unique_slug(name, |s| {
        existing
            .iter()
            .any(|e| e.slug() == s && Some(e.id()) != except_id)
    })
}

// ---------------------------------------------------------------------------
// Projects
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewProject {
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub sections: Vec<Section>,
}

/// Merge-patch for one project. Absent fields are left alone.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProjectPatch {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    /// Full replacement of the section list
    #[serde(default)]
    pub sections: Option<Vec<Section>>,
}

pub fn create_project(doc: &mut Document, new: NewProject) -> Project {
    let slug = new
        .slug
        .unwrap_or_else(|| fresh_slug(&doc.projects, &new.name, None));
    let mut project = Project::new(
        Uuid::new_v4().to_string(),
        new.name,
        slug,
        new.color.unwrap_or_else(|| DEFAULT_COLOR.to_string()),
    );
    project.description = new.description;
    project.sections.extend(
        new.sections
            .into_iter()
            .filter(|s| s.id != DEFAULT_SECTION_ID),
    );
    doc.projects.push(project.clone());
    project
}

pub fn update_project(doc: &mut Document, patch: ProjectPatch) -> Result<Project, EntityError> {
    if doc.project(&patch.id).is_none() {
        return Err(EntityError::ProjectNotFound(patch.id));
    }
    let slug = match (patch.slug, &patch.name) {
        (Some(slug), _) => Some(slug),
        (None, Some(name)) => Some(fresh_slug(&doc.projects, name, Some(patch.id.as_str()))),
        (None, None) => None,
    };

    let project = doc
        .project_mut(&patch.id)
        .ok_or_else(|| EntityError::ProjectNotFound(patch.id.clone()))?;
    if let Some(name) = patch.name {
        project.name = name;
    }
    if let Some(slug) = slug {
        project.slug = slug;
    }
    if let Some(color) = patch.color {
        project.color = color;
    }
    if let Some(description) = patch.description {
        project.description = description;
    }
    let sections_replaced = patch.sections.is_some();
    if let Some(sections) = patch.sections {
        project.sections = sections;
        project.ensure_default_section();
    }

    if sections_replaced {
        relist_orphans(doc, &patch.id);
    }
    doc.project(&patch.id)
        .cloned()
        .ok_or(EntityError::ProjectNotFound(patch.id))
}

/// After a section list is replaced, tasks of the project that no section
/// lists any more go to the end of the default section.
fn relist_orphans(doc: &mut Document, project_id: &str) {
    let Some(project) = doc.projects.iter_mut().find(|p| p.id == project_id) else {
        return;
    };
    for task in doc
        .tasks
        .iter_mut()
        .filter(|t| t.project_id.as_deref() == Some(project_id))
    {
        let listed = project.section_of_task(&task.id).map(|s| s.id.clone());
        match listed {
            Some(section_id) => task.section_id = Some(section_id),
            None => {
                project.ensure_default_section();
                if let Some(default) = project.section_mut(DEFAULT_SECTION_ID) {
                    default.items.push(task.id.clone());
                }
                task.section_id = Some(DEFAULT_SECTION_ID.to_string());
            }
        }
    }
}

/// Delete projects by id. Their tasks return to the inbox. Group leaves
/// naming them are left in place. Returns the ids actually removed.
pub fn delete_projects(doc: &mut Document, ids: &[String]) -> Vec<String> {
    let removed: Vec<String> = doc
        .projects
        .iter()
        .filter(|p| ids.contains(&p.id))
        .map(|p| p.id.clone())
        .collect();
    doc.projects.retain(|p| !removed.contains(&p.id));
    for task in &mut doc.tasks {
        if task.project_id.as_ref().is_some_and(|p| removed.contains(p)) {
            task.project_id = None;
            task.section_id = None;
        }
    }
    removed
}

// ---------------------------------------------------------------------------
// Labels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewLabel {
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LabelPatch {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
}

pub fn create_label(doc: &mut Document, new: NewLabel) -> Label {
    let slug = new
        .slug
        .unwrap_or_else(|| fresh_slug(&doc.labels, &new.name, None));
    let label = Label {
        id: Uuid::new_v4().to_string(),
        name: new.name,
        slug,
        color: new.color.unwrap_or_else(|| DEFAULT_COLOR.to_string()),
        description: new.description,
        extra: Default::default(),
    };
    doc.labels.push(label.clone());
    label
}

pub fn update_label(doc: &mut Document, patch: LabelPatch) -> Result<Label, EntityError> {
    if doc.label(&patch.id).is_none() {
        return Err(EntityError::LabelNotFound(patch.id));
    }
    let slug = match (patch.slug, &patch.name) {
        (Some(slug), _) => Some(slug),
        (None, Some(name)) => Some(fresh_slug(&doc.labels, name, Some(patch.id.as_str()))),
        (None, None) => None,
    };
    let label = doc
        .labels
        .iter_mut()
        .find(|l| l.id == patch.id)
        .ok_or_else(|| EntityError::LabelNotFound(patch.id.clone()))?;
    if let Some(name) = patch.name {
        label.name = name;
    }
    if let Some(slug) = slug {
        label.slug = slug;
    }
    if let Some(color) = patch.color {
        label.color = color;
    }
    if let Some(description) = patch.description {
        label.description = description;
    }
    Ok(label.clone())
}

/// Delete labels by id and strip them from every task.
pub fn delete_labels(doc: &mut Document, ids: &[String]) -> Vec<String> {
    let removed: Vec<String> = doc
        .labels
        .iter()
        .filter(|l| ids.contains(&l.id))
        .map(|l| l.id.clone())
        .collect();
    doc.labels.retain(|l| !removed.contains(&l.id));
    for task in &mut doc.tasks {
        task.labels.retain(|l| !removed.contains(l));
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::Task;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    fn named(name: &str) -> NewProject {
        NewProject {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_create_project_has_default_section_and_unique_slug() {
        let mut doc = Document::default();
        let a = create_project(&mut doc, named("Home"));
        let b = create_project(&mut doc, named("Home"));
        assert_eq!(a.slug, "home");
        assert_eq!(b.slug, "home-2");
        assert_eq!(a.sections[0].id, DEFAULT_SECTION_ID);
        assert_eq!(a.color, DEFAULT_COLOR);
        assert_eq!(doc.projects.len(), 2);
    }

    #[test]
    fn test_create_project_keeps_extra_sections_after_default() {
        let mut doc = Document::default();
        let project = create_project(
            &mut doc,
            NewProject {
                sections: vec![Section {
                    id: "later".into(),
                    name: "Later".into(),
                    color: "#000".into(),
                    items: Vec::new(),
                }],
                ..named("Work")
            },
        );
        let ids: Vec<&str> = project.sections.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec![DEFAULT_SECTION_ID, "later"]);
    }

    #[test]
    fn test_rename_project_regenerates_slug() {
        let mut doc = Document::default();
        create_project(&mut doc, named("Work"));
        let home = create_project(&mut doc, named("Home"));
        let updated = update_project(
            &mut doc,
            ProjectPatch {
                id: home.id.clone(),
                name: Some("Work".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(updated.slug, "work-2");

        let updated = update_project(
            &mut doc,
            ProjectPatch {
                id: home.id,
                name: Some("Other".into()),
                slug: Some("keep-me".into()),
                description: Some(Some("notes".into())),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(updated.slug, "keep-me");
        assert_eq!(updated.description.as_deref(), Some("notes"));
    }

    #[test]
    fn test_replacing_sections_relists_orphaned_tasks() {
        let mut doc = Document::default();
        let project = create_project(
            &mut doc,
            NewProject {
                sections: vec![Section {
                    id: "later".into(),
                    name: "Later".into(),
                    color: "#000".into(),
                    items: vec!["t1".into()],
                }],
                ..named("Work")
            },
        );
        let mut task = Task::new("t1".into(), "x".into(), Utc::now());
        task.project_id = Some(project.id.clone());
        task.section_id = Some("later".into());
        doc.tasks.push(task);

        let updated = update_project(
            &mut doc,
            ProjectPatch {
                id: project.id.clone(),
                sections: Some(Vec::new()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(updated.sections.len(), 1);
        assert_eq!(updated.sections[0].items, vec!["t1"]);
        assert_eq!(doc.task("t1").unwrap().section_id.as_deref(), Some(DEFAULT_SECTION_ID));
    }

    #[test]
    fn test_update_missing_project() {
        let mut doc = Document::default();
        let err = update_project(
            &mut doc,
            ProjectPatch {
                id: "nope".into(),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, EntityError::ProjectNotFound(_)));
    }

    #[test]
    fn test_delete_projects_sends_tasks_to_inbox() {
        let mut doc = Document::default();
        let project = create_project(&mut doc, named("Work"));
        let mut task = Task::new("t1".into(), "x".into(), Utc::now());
        task.project_id = Some(project.id.clone());
        task.section_id = Some(DEFAULT_SECTION_ID.into());
        doc.tasks.push(task);
        doc.project_groups
            .items
            .push(crate::model::group::GroupItem::Leaf(project.id.clone()));

        let removed = delete_projects(&mut doc, &[project.id.clone(), "ghost".into()]);
        assert_eq!(removed, vec![project.id.clone()]);
        assert!(doc.projects.is_empty());
        let task = doc.task("t1").unwrap();
        assert!(task.project_id.is_none());
        assert!(task.section_id.is_none());
        // Group membership is a separate concern.
        assert_eq!(doc.project_groups.items.len(), 1);
    }

    #[test]
    fn test_label_lifecycle() {
        let mut doc = Document::default();
        let urgent = create_label(
            &mut doc,
            NewLabel {
                name: "Urgent!".into(),
                ..Default::default()
            },
        );
        assert_eq!(urgent.slug, "urgent");

        let renamed = update_label(
            &mut doc,
            LabelPatch {
                id: urgent.id.clone(),
                name: Some("Now".into()),
                color: Some("#f00".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(renamed.slug, "now");
        assert_eq!(renamed.color, "#f00");

        let mut task = Task::new("t1".into(), "x".into(), Utc::now());
        task.labels = vec![urgent.id.clone(), "other".into()];
        doc.tasks.push(task);

        assert_eq!(delete_labels(&mut doc, &[urgent.id.clone()]), vec![urgent.id]);
        assert_eq!(doc.task("t1").unwrap().labels, vec!["other"]);
        assert!(matches!(
            update_label(&mut doc, LabelPatch { id: "x".into(), ..Default::default() }),
            Err(EntityError::LabelNotFound(_))
        ));
    }
}
