//! Hierarchy resolution for self-referencing tables (categories, menus).
//!
//! Rows are loaded once per request and indexed by parent id; subtrees are then
//! materialized recursively from that index. A visited set stops traversal on
//! cyclic parent chains instead of recursing forever.

use std::collections::{HashMap, HashSet};

use tracing::error;
use uuid::Uuid;

use crate::entities::{category, menu};
use crate::errors::ServiceError;

pub const CYCLE_MESSAGE: &str = "cycle detected in hierarchy";

/// A row that points at an optional parent row of the same table.
pub trait TreeNode {
    fn node_id(&self) -> Uuid;
    fn parent_id(&self) -> Option<Uuid>;
}

impl TreeNode for category::Model {
    fn node_id(&self) -> Uuid {
        self.id
    }

    fn parent_id(&self) -> Option<Uuid> {
        self.parent_id
    }
}

impl TreeNode for menu::Model {
    fn node_id(&self) -> Uuid {
        self.id
    }

    fn parent_id(&self) -> Option<Uuid> {
        self.parent_id
    }
}

/// Parent-indexed adjacency over a flat set of rows. Children keep the order
/// in which they were loaded.
pub struct Forest<'a, T> {
    by_id: HashMap<Uuid, &'a T>,
    children: HashMap<Option<Uuid>, Vec<&'a T>>,
}

impl<'a, T: TreeNode> Forest<'a, T> {
    pub fn new(rows: &'a [T]) -> Self {
        let mut by_id = HashMap::with_capacity(rows.len());
        let mut children: HashMap<Option<Uuid>, Vec<&'a T>> = HashMap::new();
        for row in rows {
            by_id.insert(row.node_id(), row);
            children.entry(row.parent_id()).or_default().push(row);
        }
        Self { by_id, children }
    }

    pub fn get(&self, id: Uuid) -> Option<&'a T> {
        self.by_id.get(&id).copied()
    }

    /// Direct children of `parent`; `None` selects the roots.
    pub fn children_of(&self, parent: Option<Uuid>) -> &[&'a T] {
        self.children
            .get(&parent)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Resolves every descendant of `parent` into nested nodes.
    ///
    /// Returns `Ok(None)` when `parent` has no children; that is a terminal
    /// state, not an error.
    pub fn resolve_subtree<N, F>(
        &self,
        parent: Option<Uuid>,
        build: &F,
    ) -> Result<Option<Vec<N>>, ServiceError>
    where
        F: Fn(&T, Option<Vec<N>>) -> N,
    {
        let mut visited = HashSet::new();
        if let Some(id) = parent {
            visited.insert(id);
        }
        self.resolve(parent, build, &mut visited)
    }

    /// Builds `row` together with its resolved subtree.
    pub fn materialize<N, F>(&self, row: &T, build: &F) -> Result<N, ServiceError>
    where
        F: Fn(&T, Option<Vec<N>>) -> N,
    {
        let subtree = self.resolve_subtree(Some(row.node_id()), build)?;
        Ok(build(row, subtree))
    }

    fn resolve<N, F>(
        &self,
        parent: Option<Uuid>,
        build: &F,
        visited: &mut HashSet<Uuid>,
    ) -> Result<Option<Vec<N>>, ServiceError>
    where
        F: Fn(&T, Option<Vec<N>>) -> N,
    {
        let children = self.children_of(parent);
        if children.is_empty() {
            return Ok(None);
        }

        let mut nodes = Vec::with_capacity(children.len());
        for child in children {
            let id = child.node_id();
            if !visited.insert(id) {
                error!(node_id = %id, "Cycle detected while resolving hierarchy");
                return Err(ServiceError::Internal(CYCLE_MESSAGE.to_string()));
            }
            let subtree = self.resolve(Some(id), build, visited)?;
            nodes.push(build(child, subtree));
        }
        Ok(Some(nodes))
    }

    /// True when `candidate` is `node` itself or sits below it, i.e. making
    /// `candidate` the parent of `node` would close a loop.
    pub fn is_self_or_descendant(&self, node: Uuid, candidate: Uuid) -> bool {
        let mut seen = HashSet::new();
        let mut cursor = Some(candidate);
        while let Some(id) = cursor {
            if id == node {
                return true;
            }
            if !seen.insert(id) {
                // pre-existing loop that does not pass through `node`
                return false;
            }
            cursor = self.get(id).and_then(|row| row.parent_id());
        }
        false
    }
}
