use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Well-known id of the section every project always has
pub const DEFAULT_SECTION_ID: &str = "default";

/// Color used when a project, label, group, or section is created without one
pub const DEFAULT_COLOR: &str = "#6b7280";

/// An ordered column of tasks inside a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: String,
    pub name: String,
    #[serde(default = "default_color")]
    pub color: String,
    /// Task ids, in display order
    #[serde(default)]
    pub items: Vec<String>,
}

impl Section {
    pub fn default_section() -> Self {
        Section {
            id: DEFAULT_SECTION_ID.to_string(),
            name: "Default".to_string(),
            color: DEFAULT_COLOR.to_string(),
            items: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    pub slug: String,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub sections: Vec<Section>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Project {
    /// Create a project with only the default section
    pub fn new(id: String, name: String, slug: String, color: String) -> Self {
        Project {
            id,
            name,
            slug,
            color,
            description: None,
            sections: vec![Section::default_section()],
            extra: Map::new(),
        }
    }

    pub fn section(&self, section_id: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == section_id)
    }

    pub fn section_mut(&mut self, section_id: &str) -> Option<&mut Section> {
        self.sections.iter_mut().find(|s| s.id == section_id)
    }

    /// Ensure the default section exists, creating it at the front if missing.
    /// Returns true if it had to be synthesized.
    pub fn ensure_default_section(&mut self) -> bool {
        if self.section(DEFAULT_SECTION_ID).is_some() {
            return false;
        }
        self.sections.insert(0, Section::default_section());
        true
    }

    /// Find the section whose items contain `task_id`
    pub fn section_of_task(&self, task_id: &str) -> Option<&Section> {
        self.sections
            .iter()
            .find(|s| s.items.iter().any(|t| t == task_id))
    }
}

pub(crate) fn default_color() -> String {
    DEFAULT_COLOR.to_string()
}
