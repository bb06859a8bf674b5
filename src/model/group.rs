use serde::{Deserialize, Serialize};

/// Which tree a group lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupType {
    Project,
    Label,
}

impl GroupType {
    pub fn as_str(self) -> &'static str {
        match self {
            GroupType::Project => "project",
            GroupType::Label => "label",
        }
    }

    /// Both tree types, in lookup order (projects first)
    pub const ALL: [GroupType; 2] = [GroupType::Project, GroupType::Label];
}

impl std::fmt::Display for GroupType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An entry in a group's item list: either a bare project/label id or a
/// nested group of the same type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GroupItem {
    Leaf(String),
    Group(Group),
}

impl GroupItem {
    /// The id of the leaf or nested group
    pub fn id(&self) -> &str {
        match self {
            GroupItem::Leaf(id) => id,
            GroupItem::Group(g) => &g.id,
        }
    }

    pub fn as_group(&self) -> Option<&Group> {
        match self {
            GroupItem::Group(g) => Some(g),
            GroupItem::Leaf(_) => None,
        }
    }
}

/// A folder of projects or labels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: GroupType,
    #[serde(default)]
    pub items: Vec<GroupItem>,
}

impl Group {
    /// Build an empty group with no description
    pub fn new(id: String, name: String, slug: String, color: String, kind: GroupType) -> Self {
        Group {
            id,
            name,
            slug,
            color,
            description: None,
            kind,
            items: Vec::new(),
        }
    }

    /// Position of an item (leaf or nested group) among this group's direct items
    pub fn position_of(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|item| item.id() == id)
    }

    /// Direct nested groups
    pub fn subgroups(&self) -> impl Iterator<Item = &Group> {
        self.items.iter().filter_map(GroupItem::as_group)
    }

    /// Visit this group and every nested group, depth-first, pre-order
    pub fn walk<'a>(&'a self, f: &mut dyn FnMut(&'a Group)) {
        f(self);
        for sub in self.subgroups() {
            sub.walk(f);
        }
    }

    /// Visit every leaf id in this group and its descendants
    pub fn walk_leaves<'a>(&'a self, f: &mut dyn FnMut(&'a str)) {
        for item in &self.items {
            match item {
                GroupItem::Leaf(id) => f(id),
                GroupItem::Group(g) => g.walk_leaves(f),
            }
        }
    }

    /// Whether `id` names this group or one of its descendants
    pub fn contains_group(&self, id: &str) -> bool {
        let mut found = false;
        self.walk(&mut |g| {
            if g.id == id {
                found = true;
            }
        });
        found
    }
}
