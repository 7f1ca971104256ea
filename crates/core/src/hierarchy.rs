//! In-memory page hierarchy walks.
//!
//! Pages reference their parent by id; the slug repeats the same structure
//! as a string. [`PageGraph`] walks the id graph iteratively with a visited
//! set, so corrupted data (cycles, dangling parents) can never recurse
//! without bound. The repository layer runs the same walks as recursive
//! CTEs; this module serves tree rendering, delete ordering and the
//! slug/parent consistency check.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::Serialize;

use crate::slug;
use crate::types::DbId;

/// The minimal view of a page needed for hierarchy walks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageNode {
    pub id: DbId,
    pub parent_id: Option<DbId>,
    pub slug: String,
    pub title: String,
}

/// A nested navigation tree entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeNode {
    pub id: DbId,
    pub slug: String,
    pub title: String,
    pub children: Vec<TreeNode>,
}

/// A disagreement between a page's slug and its live parent chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HierarchyViolation {
    /// A root-level slug whose page still points at a parent.
    UnexpectedParent { id: DbId, slug: String },
    /// A hierarchical slug whose page has no parent.
    MissingParent { id: DbId, slug: String },
    /// `parent_id` points at a page that does not exist.
    DanglingParent { id: DbId, parent_id: DbId },
    /// The parent's slug is not the slug's own prefix.
    ParentSlugMismatch {
        id: DbId,
        slug: String,
        parent_slug: String,
    },
    /// Following parents from this page loops back on itself.
    Cycle { id: DbId },
}

/// Adjacency view over a set of pages.
#[derive(Debug, Default)]
pub struct PageGraph {
    nodes: HashMap<DbId, PageNode>,
    children: HashMap<DbId, Vec<DbId>>,
}

impl PageGraph {
    pub fn new(nodes: impl IntoIterator<Item = PageNode>) -> Self {
        let nodes: HashMap<DbId, PageNode> = nodes.into_iter().map(|n| (n.id, n)).collect();
        let mut children: HashMap<DbId, Vec<DbId>> = HashMap::new();
        for node in nodes.values() {
            if let Some(parent) = node.parent_id {
                children.entry(parent).or_default().push(node.id);
            }
        }
        for ids in children.values_mut() {
            ids.sort_unstable();
        }
        Self { nodes, children }
    }

    pub fn get(&self, id: DbId) -> Option<&PageNode> {
        self.nodes.get(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Every transitive child of `id`, breadth-first. Never includes `id`.
    pub fn descendants_of(&self, id: DbId) -> Vec<DbId> {
        let mut visited = HashSet::from([id]);
        let mut queue = VecDeque::from([id]);
        let mut out = Vec::new();
        while let Some(current) = queue.pop_front() {
            for &child in self.children.get(&current).into_iter().flatten() {
                if visited.insert(child) {
                    out.push(child);
                    queue.push_back(child);
                }
            }
        }
        out
    }

    /// `id` plus all its descendants, ordered so every child precedes its
    /// parent. This is the order a multi-page delete expects.
    pub fn delete_order(&self, id: DbId) -> Vec<DbId> {
        let mut order = self.descendants_of(id);
        order.reverse();
        order.push(id);
        order
    }

    /// Ancestor chain from the root down to `id`, inclusive.
    ///
    /// Stops early on a cycle or a dangling parent reference.
    pub fn path_to(&self, id: DbId) -> Vec<&PageNode> {
        let mut visited = HashSet::new();
        let mut chain = Vec::new();
        let mut cursor = self.nodes.get(&id);
        while let Some(node) = cursor {
            if !visited.insert(node.id) {
                break;
            }
            chain.push(node);
            cursor = node.parent_id.and_then(|p| self.nodes.get(&p));
        }
        chain.reverse();
        chain
    }

    /// Verify that every page's slug agrees with its parent pointer.
    ///
    /// Checking each page against its immediate parent is sufficient: by
    /// induction the whole ancestor chain then matches the slug segments.
    pub fn check_consistency(&self) -> Vec<HierarchyViolation> {
        let mut violations = Vec::new();
        let mut ids: Vec<DbId> = self.nodes.keys().copied().collect();
        ids.sort_unstable();

        for id in ids {
            let node = &self.nodes[&id];
            match (slug::parent_slug(&node.slug), node.parent_id) {
                (None, Some(_)) => violations.push(HierarchyViolation::UnexpectedParent {
                    id,
                    slug: node.slug.clone(),
                }),
                (Some(_), None) => violations.push(HierarchyViolation::MissingParent {
                    id,
                    slug: node.slug.clone(),
                }),
                (Some(expected), Some(parent_id)) => match self.nodes.get(&parent_id) {
                    None => {
                        violations.push(HierarchyViolation::DanglingParent { id, parent_id })
                    }
                    Some(parent) if !parent.slug.eq_ignore_ascii_case(expected) => {
                        violations.push(HierarchyViolation::ParentSlugMismatch {
                            id,
                            slug: node.slug.clone(),
                            parent_slug: parent.slug.clone(),
                        })
                    }
                    Some(_) => {}
                },
                (None, None) => {}
            }
            if self.has_cycle_from(id) {
                violations.push(HierarchyViolation::Cycle { id });
            }
        }
        violations
    }

    fn has_cycle_from(&self, id: DbId) -> bool {
        let mut visited = HashSet::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if !visited.insert(current) {
                return true;
            }
            cursor = self.nodes.get(&current).and_then(|n| n.parent_id);
        }
        false
    }

    /// Build the navigation tree. Pages whose parent is absent from the
    /// graph are treated as roots; siblings are ordered by title.
    pub fn tree(&self) -> Vec<TreeNode> {
        let mut roots: Vec<DbId> = self
            .nodes
            .values()
            .filter(|n| n.parent_id.is_none_or(|p| !self.nodes.contains_key(&p)))
            .map(|n| n.id)
            .collect();
        roots.sort_unstable();

        // Breadth-first order guarantees every child appears after its parent,
        // so building in reverse completes children before their parent.
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut visited = HashSet::new();
        for &root in &roots {
            if visited.insert(root) {
                order.push(root);
                order.extend(
                    self.descendants_of(root)
                        .into_iter()
                        .filter(|id| visited.insert(*id)),
                );
            }
        }

        let mut built: HashMap<DbId, TreeNode> = HashMap::new();
        for &id in order.iter().rev() {
            let node = &self.nodes[&id];
            let mut children: Vec<TreeNode> = self
                .children
                .get(&id)
                .into_iter()
                .flatten()
                .filter_map(|child| built.remove(child))
                .collect();
            children.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
            built.insert(
                id,
                TreeNode {
                    id,
                    slug: node.slug.clone(),
                    title: node.title.clone(),
                    children,
                },
            );
        }

        let mut tree: Vec<TreeNode> = roots.iter().filter_map(|id| built.remove(id)).collect();
        tree.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        tree
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
