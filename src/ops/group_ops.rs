use uuid::Uuid;

use crate::model::document::Document;
use crate::model::group::{Group, GroupItem, GroupType};
use crate::model::project::DEFAULT_COLOR;
use crate::util::slug::unique_slug;

/// Error type for group tree operations
#[derive(Debug, thiserror::Error)]
pub enum GroupError {
    #[error("group not found: {0}")]
    NotFound(String),
    #[error("parent group not found: {0}")]
    ParentNotFound(String),
    #[error("type mismatch: expected a {expected} group, found {found}")]
    TypeMismatch {
        expected: GroupType,
        found: GroupType,
    },
}

/// Where a group sits: the group itself, which tree holds it, and its parent
/// (`None` for a ROOT group).
#[derive(Debug, Clone, Copy)]
pub struct GroupLocation<'a> {
    pub group: &'a Group,
    pub tree: GroupType,
    pub parent: Option<&'a Group>,
}

impl GroupLocation<'_> {
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// Fields for a new group
#[derive(Debug, Clone)]
pub struct NewGroup {
    pub kind: GroupType,
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub parent_id: Option<String>,
}

/// A partial update of one group. `None` fields are left alone.
#[derive(Debug, Clone, Default)]
pub struct GroupPatch {
    pub id: String,
    pub kind: Option<GroupType>,
    pub name: Option<String>,
    pub slug: Option<String>,
    /// `Some(None)` clears the description
    pub description: Option<Option<String>>,
    pub color: Option<String>,
    pub items: Option<Vec<GroupItem>>,
}

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

/// Depth-first search for a group id, projects tree first, then labels.
pub fn find_group_in_trees<'a>(doc: &'a Document, id: &str) -> Option<GroupLocation<'a>> {
    GroupType::ALL.into_iter().find_map(|tree| {
        locate(doc.tree(tree), id, None).map(|(group, parent)| GroupLocation {
            group,
            tree,
            parent,
        })
    })
}

pub fn find_group<'a>(doc: &'a Document, id: &str) -> Option<&'a Group> {
    find_group_in_trees(doc, id).map(|loc| loc.group)
}

/// Mutable lookup with the same search order as [`find_group_in_trees`].
pub fn find_group_mut<'a>(doc: &'a mut Document, id: &str) -> Option<&'a mut Group> {
    let tree = find_group_in_trees(doc, id)?.tree;
    find_in_tree_mut(doc.tree_mut(tree), id)
}

fn locate<'a>(
    group: &'a Group,
    id: &str,
    parent: Option<&'a Group>,
) -> Option<(&'a Group, Option<&'a Group>)> {
    if group.id == id {
        return Some((group, parent));
    }
    group.subgroups().find_map(|sub| locate(sub, id, Some(group)))
}

pub(crate) fn find_in_tree_mut<'a>(group: &'a mut Group, id: &str) -> Option<&'a mut Group> {
    if group.id == id {
        return Some(group);
    }
    for item in group.items.iter_mut() {
        if let GroupItem::Group(sub) = item
            && let Some(found) = find_in_tree_mut(sub, id)
        {
            return Some(found);
        }
    }
    None
}

/// Remove the group `id` from wherever it is nested below `group`.
fn remove_from_tree(group: &mut Group, id: &str) -> Option<Group> {
    if let Some(idx) = group
        .items
        .iter()
        .position(|item| matches!(item, GroupItem::Group(g) if g.id == id))
    {
        return match group.items.remove(idx) {
            GroupItem::Group(g) => Some(g),
            GroupItem::Leaf(_) => None,
        };
    }
    for item in group.items.iter_mut() {
        if let GroupItem::Group(sub) = item
            && let Some(removed) = remove_from_tree(sub, id)
        {
            return Some(removed);
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

/// Check that every nested group in `items` (recursively) is of `kind`.
pub fn validate_items(kind: GroupType, items: &[GroupItem]) -> Result<(), GroupError> {
    for item in items {
        if let GroupItem::Group(g) = item {
            if g.kind != kind {
                return Err(GroupError::TypeMismatch {
                    expected: kind,
                    found: g.kind,
                });
            }
            validate_items(kind, &g.items)?;
        }
    }
    Ok(())
}

/// Whether some group in the tree other than `except_id` already uses `slug`.
fn slug_taken(root: &Group, slug: &str, except_id: Option<&str>) -> bool {
    let mut taken = false;
    root.walk(&mut |g| {
        if g.slug == slug && Some(g.id.as_str()) != except_id {
            taken = true;
        }
    });
    taken
}

// ---------------------------------------------------------------------------
// Mutations
// ---------------------------------------------------------------------------

/// Create a group under `parent_id`, or under the ROOT of its tree when no
/// parent is given. Returns the new group's id.
pub fn create_group(doc: &mut Document, new: NewGroup) -> Result<String, GroupError> {
    let parent_id = match &new.parent_id {
        None => doc.tree(new.kind).id.clone(),
        Some(pid) => {
            let loc = find_group_in_trees(doc, pid)
                .ok_or_else(|| GroupError::ParentNotFound(pid.clone()))?;
            if loc.tree != new.kind || loc.group.kind != new.kind {
                return Err(GroupError::TypeMismatch {
                    expected: new.kind,
                    found: loc.group.kind,
                });
            }
            pid.clone()
        }
    };

    let root = doc.tree(new.kind);
    let slug = unique_slug(&new.name, |s| slug_taken(root, s, None));
    let id = Uuid::new_v4().to_string();
    let mut group = Group::new(
        id.clone(),
        new.name,
        slug,
        new.color.unwrap_or_else(|| DEFAULT_COLOR.to_string()),
        new.kind,
    );
    group.description = new.description;

    let parent = find_in_tree_mut(doc.tree_mut(new.kind), &parent_id)
        .ok_or_else(|| GroupError::ParentNotFound(parent_id.clone()))?;
    parent.items.push(GroupItem::Group(group));
    Ok(id)
}

/// Apply a partial update to an existing group.
pub fn update_group(doc: &mut Document, patch: GroupPatch) -> Result<(), GroupError> {
    let loc = find_group_in_trees(doc, &patch.id)
        .ok_or_else(|| GroupError::NotFound(patch.id.clone()))?;
    let tree = loc.tree;
    if let Some(kind) = patch.kind
        && kind != loc.group.kind
    {
        return Err(GroupError::TypeMismatch {
            expected: kind,
            found: loc.group.kind,
        });
    }
    if let Some(items) = &patch.items {
        validate_items(loc.group.kind, items)?;
    }

    // An explicit slug wins; a rename without one regenerates it.
    let slug = match (&patch.slug, &patch.name) {
        (Some(slug), _) => Some(slug.clone()),
        (None, Some(name)) => {
            let root = doc.tree(tree);
            Some(unique_slug(name, |s| slug_taken(root, s, Some(patch.id.as_str()))))
        }
        (None, None) => None,
    };

    let group = find_in_tree_mut(doc.tree_mut(tree), &patch.id)
        .ok_or_else(|| GroupError::NotFound(patch.id.clone()))?;
    if let Some(name) = patch.name {
        group.name = name;
    }
    if let Some(slug) = slug {
        group.slug = slug;
    }
    if let Some(description) = patch.description {
        group.description = description;
    }
    if let Some(color) = patch.color {
        group.color = color;
    }
    if let Some(items) = patch.items {
        group.items = items;
    }
    Ok(())
}

/// Replace the ROOT group's items wholesale (top-level reorder).
pub fn bulk_replace_items(
    doc: &mut Document,
    kind: GroupType,
    items: Vec<GroupItem>,
) -> Result<(), GroupError> {
    validate_items(kind, &items)?;
    doc.tree_mut(kind).items = items;
    Ok(())
}

/// Delete a non-root group.
///
/// Leaf ids directly inside the group move to the end of its tree's ROOT.
/// Nested subgroups are dropped together with everything below them.
/// Returns false, changing nothing, for ROOT groups and unknown ids.
pub fn delete_group(doc: &mut Document, id: &str) -> bool {
    let Some(loc) = find_group_in_trees(doc, id) else {
        return false;
    };
    if loc.is_root() {
        tracing::warn!(group_id = id, tree = %loc.tree, "refusing to delete root group");
        return false;
    }
    let tree = loc.tree;

    let Some(removed) = remove_from_tree(doc.tree_mut(tree), id) else {
        return false;
    };

    let root = doc.tree_mut(tree);
    for item in removed.items {
        if let GroupItem::Leaf(leaf) = item
            && root.position_of(&leaf).is_none()
        {
            root.items.push(GroupItem::Leaf(leaf));
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::document::{LABELS_ROOT_ID, PROJECTS_ROOT_ID};
    use pretty_assertions::assert_eq;

    fn new_group(kind: GroupType, name: &str, parent: Option<&str>) -> NewGroup {
        NewGroup {
            kind,
            name: name.to_string(),
            description: None,
            color: None,
            parent_id: parent.map(str::to_string),
        }
    }

    fn leaf(id: &str) -> GroupItem {
        GroupItem::Leaf(id.to_string())
    }

    #[test]
    fn test_create_at_root_and_find() {
        let mut doc = Document::default();
        let id = create_group(&mut doc, new_group(GroupType::Project, "Work", None)).unwrap();

        let loc = find_group_in_trees(&doc, &id).unwrap();
        assert_eq!(loc.group.id, id);
        assert_eq!(loc.group.slug, "work");
        assert_eq!(loc.group.color, DEFAULT_COLOR);
        assert_eq!(loc.tree, GroupType::Project);
        assert_eq!(loc.parent.map(|p| p.id.as_str()), Some(PROJECTS_ROOT_ID));
    }

    #[test]
    fn test_create_nested_under_parent() {
        let mut doc = Document::default();
        let work = create_group(&mut doc, new_group(GroupType::Project, "Work", None)).unwrap();
        let sub = create_group(&mut doc, new_group(GroupType::Project, "Sub", Some(&work))).unwrap();

        let loc = find_group_in_trees(&doc, &sub).unwrap();
        assert_eq!(loc.parent.map(|p| p.id.clone()), Some(work.clone()));
        assert_eq!(find_group(&doc, &work).unwrap().items.len(), 1);
    }

    #[test]
    fn test_create_with_missing_parent() {
        let mut doc = Document::default();
        let err = create_group(&mut doc, new_group(GroupType::Project, "X", Some("nope"))).unwrap_err();
        assert!(matches!(err, GroupError::ParentNotFound(id) if id == "nope"));
    }

    #[test]
    fn test_create_under_parent_of_other_type() {
        let mut doc = Document::default();
        let tags = create_group(&mut doc, new_group(GroupType::Label, "Tags", None)).unwrap();
        let err = create_group(&mut doc, new_group(GroupType::Project, "X", Some(&tags))).unwrap_err();
        assert!(matches!(
            err,
            GroupError::TypeMismatch {
                expected: GroupType::Project,
                found: GroupType::Label
            }
        ));
    }

    #[test]
    fn test_create_slug_unique_within_tree_only() {
        let mut doc = Document::default();
        let a = create_group(&mut doc, new_group(GroupType::Project, "Work", None)).unwrap();
        let b = create_group(&mut doc, new_group(GroupType::Project, "Work", Some(&a))).unwrap();
        let c = create_group(&mut doc, new_group(GroupType::Label, "Work", None)).unwrap();
        assert_eq!(find_group(&doc, &b).unwrap().slug, "work-2");
        assert_eq!(find_group(&doc, &c).unwrap().slug, "work");
    }

    #[test]
    fn test_rename_regenerates_collision_free_slug() {
        let mut doc = Document::default();
        create_group(&mut doc, new_group(GroupType::Project, "Home", None)).unwrap();
        let work = create_group(&mut doc, new_group(GroupType::Project, "Work", None)).unwrap();

        update_group(
            &mut doc,
            GroupPatch {
                id: work.clone(),
                name: Some("Home".into()),
                ..Default::default()
            },
        )
        .unwrap();
        let group = find_group(&doc, &work).unwrap();
        assert_eq!(group.name, "Home");
        assert_eq!(group.slug, "home-2");
    }

    #[test]
    fn test_rename_keeps_own_slug_when_unchanged() {
        let mut doc = Document::default();
        let work = create_group(&mut doc, new_group(GroupType::Project, "Work", None)).unwrap();
        update_group(
            &mut doc,
            GroupPatch {
                id: work.clone(),
                name: Some("work".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(find_group(&doc, &work).unwrap().slug, "work");
    }

    #[test]
    fn test_explicit_slug_is_verbatim() {
        let mut doc = Document::default();
        let work = create_group(&mut doc, new_group(GroupType::Project, "Work", None)).unwrap();
        update_group(
            &mut doc,
            GroupPatch {
                id: work.clone(),
                name: Some("Job".into()),
                slug: Some("my-custom".into()),
                color: Some("#ff0000".into()),
                ..Default::default()
            },
        )
        .unwrap();
        let group = find_group(&doc, &work).unwrap();
        assert_eq!(group.slug, "my-custom");
        assert_eq!(group.color, "#ff0000");
    }

    #[test]
    fn test_description_set_and_clear() {
        let mut doc = Document::default();
        let work = create_group(&mut doc, new_group(GroupType::Project, "Work", None)).unwrap();
        let set = |description: Option<&str>| GroupPatch {
            id: work.clone(),
            description: Some(description.map(str::to_string)),
            ..Default::default()
        };

        update_group(&mut doc, set(Some("day job"))).unwrap();
        assert_eq!(find_group(&doc, &work).unwrap().description.as_deref(), Some("day job"));

        update_group(
            &mut doc,
            GroupPatch {
                id: work.clone(),
                color: Some("#123456".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(find_group(&doc, &work).unwrap().description.as_deref(), Some("day job"));

        update_group(&mut doc, set(None)).unwrap();
        assert!(find_group(&doc, &work).unwrap().description.is_none());
    }

    #[test]
    fn test_update_errors() {
        let mut doc = Document::default();
        let work = create_group(&mut doc, new_group(GroupType::Project, "Work", None)).unwrap();

        let err = update_group(
            &mut doc,
            GroupPatch {
                id: "missing".into(),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, GroupError::NotFound(_)));

        let err = update_group(
            &mut doc,
            GroupPatch {
                id: work.clone(),
                kind: Some(GroupType::Label),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, GroupError::TypeMismatch { .. }));

        let label_group = Group::new("lg".into(), "L".into(), "l".into(), "#0".into(), GroupType::Label);
        let err = update_group(
            &mut doc,
            GroupPatch {
                id: work,
                items: Some(vec![GroupItem::Group(label_group)]),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, GroupError::TypeMismatch { .. }));
    }

    #[test]
    fn test_bulk_replace_root_items() {
        let mut doc = Document::default();
        bulk_replace_items(&mut doc, GroupType::Label, vec![leaf("l2"), leaf("l1")]).unwrap();
        assert_eq!(doc.label_groups.items, vec![leaf("l2"), leaf("l1")]);

        let project_group = Group::new("pg".into(), "P".into(), "p".into(), "#0".into(), GroupType::Project);
        let err =
            bulk_replace_items(&mut doc, GroupType::Label, vec![GroupItem::Group(project_group)])
                .unwrap_err();
        assert!(matches!(err, GroupError::TypeMismatch { .. }));
        assert_eq!(doc.label_groups.items.len(), 2);
    }

    #[test]
    fn test_delete_hoists_direct_leaves_to_root() {
        let mut doc = Document::default();
        doc.project_groups.items.push(leaf("p0"));
        let work = create_group(&mut doc, new_group(GroupType::Project, "Work", None)).unwrap();
        update_group(
            &mut doc,
            GroupPatch {
                id: work.clone(),
                items: Some(vec![leaf("p1"), leaf("p2")]),
                ..Default::default()
            },
        )
        .unwrap();

        assert!(delete_group(&mut doc, &work));
        assert!(find_group_in_trees(&doc, &work).is_none());
        assert_eq!(doc.project_groups.items, vec![leaf("p0"), leaf("p1"), leaf("p2")]);
    }

    #[test]
    fn test_delete_discards_nested_subgroups_and_their_leaves() {
        let mut doc = Document::default();
        let work = create_group(&mut doc, new_group(GroupType::Project, "Work", None)).unwrap();
        let sub = create_group(&mut doc, new_group(GroupType::Project, "Sub", Some(&work))).unwrap();
        find_group_mut(&mut doc, &sub).unwrap().items.push(leaf("deep"));
        find_group_mut(&mut doc, &work).unwrap().items.push(leaf("direct"));

        assert!(delete_group(&mut doc, &work));
        assert!(find_group(&doc, &sub).is_none());
        assert_eq!(doc.project_groups.items, vec![leaf("direct")]);
    }

    #[test]
    fn test_delete_nested_group_hoists_to_root_not_parent() {
        let mut doc = Document::default();
        let work = create_group(&mut doc, new_group(GroupType::Label, "Work", None)).unwrap();
        let sub = create_group(&mut doc, new_group(GroupType::Label, "Sub", Some(&work))).unwrap();
        find_group_mut(&mut doc, &sub).unwrap().items.push(leaf("l1"));

        assert!(delete_group(&mut doc, &sub));
        assert!(find_group(&doc, &work).unwrap().items.is_empty());
        assert_eq!(doc.label_groups.items.last(), Some(&leaf("l1")));
    }

    #[test]
    fn test_delete_root_refused() {
        let mut doc = Document::default();
        assert!(!delete_group(&mut doc, PROJECTS_ROOT_ID));
        assert!(!delete_group(&mut doc, LABELS_ROOT_ID));
        assert!(find_group_in_trees(&doc, PROJECTS_ROOT_ID).unwrap().is_root());
        assert!(find_group_in_trees(&doc, LABELS_ROOT_ID).is_some());
    }

    #[test]
    fn test_delete_unknown_is_noop() {
        let mut doc = Document::default();
        let before = doc.clone();
        assert!(!delete_group(&mut doc, "nope"));
        assert_eq!(doc, before);
    }

    #[test]
    fn test_projects_tree_searched_first() {
        let mut doc = Document::default();
        let shared = Group::new("dup".into(), "P".into(), "p".into(), "#0".into(), GroupType::Project);
        doc.project_groups.items.push(GroupItem::Group(shared));
        let shared = Group::new("dup".into(), "L".into(), "l".into(), "#0".into(), GroupType::Label);
        doc.label_groups.items.push(GroupItem::Group(shared));

        assert_eq!(find_group_in_trees(&doc, "dup").unwrap().tree, GroupType::Project);
        assert!(delete_group(&mut doc, "dup"));
        assert_eq!(find_group_in_trees(&doc, "dup").unwrap().tree, GroupType::Label);
    }
}
