use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::group::{Group, GroupType};
use super::label::Label;
use super::project::{DEFAULT_COLOR, Project};
use super::task::Task;

/// Current document format version
pub const DOCUMENT_VERSION: &str = "1";

pub const PROJECTS_ROOT_ID: &str = "projects-root";
pub const LABELS_ROOT_ID: &str = "labels-root";

/// The whole dataset, as stored in the data file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(default = "project_root")]
    pub project_groups: Group,
    #[serde(default = "label_root")]
    pub label_groups: Group,
    /// Top-level keys owned by other clients (UI settings and the like)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Document {
    fn default() -> Self {
        Document {
            version: default_version(),
            tasks: Vec::new(),
            projects: Vec::new(),
            labels: Vec::new(),
            project_groups: project_root(),
            label_groups: label_root(),
            extra: Map::new(),
        }
    }
}

impl Document {
    /// The ROOT group of the given tree
    pub fn tree(&self, kind: GroupType) -> &Group {
        match kind {
            GroupType::Project => &self.project_groups,
            GroupType::Label => &self.label_groups,
        }
    }

    pub fn tree_mut(&mut self, kind: GroupType) -> &mut Group {
        match kind {
            GroupType::Project => &mut self.project_groups,
            GroupType::Label => &mut self.label_groups,
        }
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn task_mut(&mut self, id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    pub fn project(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    pub fn project_mut(&mut self, id: &str) -> Option<&mut Project> {
        self.projects.iter_mut().find(|p| p.id == id)
    }

    pub fn label(&self, id: &str) -> Option<&Label> {
        self.labels.iter().find(|l| l.id == id)
    }

    /// Whether a leaf id of the given tree type names an existing entity
    pub fn entity_exists(&self, kind: GroupType, id: &str) -> bool {
        match kind {
            GroupType::Project => self.project(id).is_some(),
            GroupType::Label => self.label(id).is_some(),
        }
    }

    /// Bring a freshly loaded document up to its invariants: every project
    /// has its default section. Returns true if anything was added.
    pub fn normalize(&mut self) -> bool {
        let mut changed = false;
        for project in &mut self.projects {
            changed |= project.ensure_default_section();
        }
        changed
    }
}

fn default_version() -> String {
    DOCUMENT_VERSION.to_string()
}

fn root_group(id: &str, name: &str, kind: GroupType) -> Group {
    Group::new(
        id.to_string(),
        name.to_string(),
        id.to_string(),
        DEFAULT_COLOR.to_string(),
        kind,
    )
}

fn project_root() -> Group {
    root_group(PROJECTS_ROOT_ID, "Projects", GroupType::Project)
}

fn label_root() -> Group {
    root_group(LABELS_ROOT_ID, "Labels", GroupType::Label)
}
