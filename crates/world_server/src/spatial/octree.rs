//! Point-located octree with arena-stored nodes.
//!
//! Nodes live in a single `Vec` and refer to each other by index, so a
//! [`NodeHandle`] stays valid for the lifetime of the tree (until
//! [`Octree::clear`]). A leaf holds one distinct point together with every
//! element inserted at exactly that point; inserting a second distinct point
//! splits the leaf into eight octants. Empty siblings are never merged, so the
//! node count only grows between clears.

use super::bounds::Bounds;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Subdivision stops at this depth; deeper leaves may hold several distinct
/// points. At the default world size this is far below float resolution of
/// any meaningful position.
pub const MAX_DEPTH: u32 = 48;

/// Reference to the leaf that owned an element when it was added.
///
/// The leaf may have been subdivided since; removal through a handle searches
/// the handle's whole subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeHandle(usize);

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OctreeError {
    #[error("Point ({0}, {1}, {2}) lies outside the octree bounds")]
    OutOfBounds(f64, f64, f64),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OctreeStats {
    pub nodes: usize,
    pub leaves: usize,
    pub elements: usize,
    pub max_depth: u32,
}

#[derive(Debug, Clone)]
struct Node<T> {
    bounds: Bounds,
    depth: u32,
    children: Option<[usize; 8]>,
    entries: Vec<([f64; 3], T)>,
}

impl<T> Node<T> {
    fn leaf(bounds: Bounds, depth: u32) -> Self {
        Self {
            bounds,
            depth,
            children: None,
            entries: Vec::new(),
        }
    }

    fn point(&self) -> Option<[f64; 3]> {
        self.entries.first().map(|(p, _)| *p)
    }
}

/// Spatial index over elements of type `T`, compared by equality for removal.
#[derive(Debug, Clone)]
pub struct Octree<T> {
    nodes: Vec<Node<T>>,
    len: usize,
}

impl<T: Clone + PartialEq> Octree<T> {
    /// Creates an empty tree covering `bounds`.
    pub fn new(bounds: Bounds) -> Self {
        Self {
            nodes: vec![Node::leaf(bounds, 0)],
            len: 0,
        }
    }

    pub fn bounds(&self) -> Bounds {
        self.nodes[0].bounds
    }

    /// Number of elements currently stored.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Inserts `element` at `point`.
    ///
    /// # Returns
    ///
    /// A handle to the leaf now owning the element, or an error when the point
    /// is outside the root box.
    pub fn add(&mut self, element: T, point: [f64; 3]) -> Result<NodeHandle, OctreeError> {
        if !self.nodes[0].bounds.contains_point(&point) {
            return Err(OctreeError::OutOfBounds(point[0], point[1], point[2]));
        }

        let leaf = self.insert_from(0, point, element);
        self.len += 1;
        Ok(NodeHandle(leaf))
    }

    fn insert_from(&mut self, start: usize, point: [f64; 3], element: T) -> usize {
        let mut index = self.descend(start, &point);

        loop {
            let node = &self.nodes[index];
            match node.point() {
                Some(existing) if existing != point && node.depth < MAX_DEPTH => {
                    self.subdivide(index);
                    index = self.descend(index, &point);
                }
                _ => {
                    self.nodes[index].entries.push((point, element));
                    return index;
                }
            }
        }
    }

    /// Walks branches down to the leaf whose box receives `point`.
    ///
    /// Octants share faces; the first child containing the point wins, which
    /// keeps insertion and exact lookup consistent.
    fn descend(&self, mut index: usize, point: &[f64; 3]) -> usize {
        while let Some(children) = self.nodes[index].children {
            match children
                .iter()
                .copied()
                .find(|&c| self.nodes[c].bounds.contains_point(point))
            {
                Some(child) => index = child,
                None => break,
            }
        }
        index
    }

    fn subdivide(&mut self, index: usize) {
        let depth = self.nodes[index].depth + 1;
        let octants = self.nodes[index].bounds.octants();
        let first = self.nodes.len();
        for bounds in octants {
            self.nodes.push(Node::leaf(bounds, depth));
        }
        let children: [usize; 8] = std::array::from_fn(|i| first + i);

        let entries = std::mem::take(&mut self.nodes[index].entries);
        self.nodes[index].children = Some(children);
        trace!("Octree node {} subdivided at depth {}", index, depth - 1);

        // All entries of a non-limit leaf share one point, so they land in one child
        for (point, element) in entries {
            let leaf = self.descend(index, &point);
            self.nodes[leaf].entries.push((point, element));
        }
    }

    /// Elements inserted at exactly `point`.
    pub fn elements_at(&self, point: [f64; 3]) -> Vec<T> {
        if !self.nodes[0].bounds.contains_point(&point) {
            return Vec::new();
        }
        let leaf = self.descend(0, &point);
        self.nodes[leaf]
            .entries
            .iter()
            .filter(|(p, _)| *p == point)
            .map(|(_, e)| e.clone())
            .collect()
    }

    /// Elements whose point lies inside `query` (inclusive).
    pub fn elements_in(&self, query: &Bounds) -> Vec<T> {
        let mut out = Vec::new();
        self.collect_in(0, query, &mut out);
        out
    }

    fn collect_in(&self, index: usize, query: &Bounds, out: &mut Vec<T>) {
        let node = &self.nodes[index];
        match node.children {
            Some(children) => {
                for child in children {
                    let child_bounds = &self.nodes[child].bounds;
                    if query.contains(child_bounds) {
                        self.collect_all(child, out);
                    } else if child_bounds.intersects(query) {
                        self.collect_in(child, query, out);
                    }
                }
            }
            None => out.extend(
                node.entries
                    .iter()
                    .filter(|(p, _)| query.contains_point(p))
                    .map(|(_, e)| e.clone()),
            ),
        }
    }

    fn collect_all(&self, index: usize, out: &mut Vec<T>) {
        let node = &self.nodes[index];
        match node.children {
            Some(children) => {
                for child in children {
                    self.collect_all(child, out);
                }
            }
            None => out.extend(node.entries.iter().map(|(_, e)| e.clone())),
        }
    }

    /// Removes the first entry equal to `element`.
    ///
    /// The search is confined to the subtree under `handle` when given, and
    /// starts at the root otherwise.
    ///
    /// # Returns
    ///
    /// Whether an element was removed.
    pub fn remove(&mut self, element: &T, handle: Option<NodeHandle>) -> bool {
        let start = match handle {
            Some(NodeHandle(index)) if index < self.nodes.len() => index,
            Some(_) => return false,
            None => 0,
        };

        let removed = self.remove_from(start, element);
        if removed {
            self.len -= 1;
        }
        removed
    }

    fn remove_from(&mut self, index: usize, element: &T) -> bool {
        if let Some(children) = self.nodes[index].children {
            return children.iter().any(|&c| self.remove_from(c, element));
        }

        let entries = &mut self.nodes[index].entries;
        match entries.iter().position(|(_, e)| e == element) {
            Some(pos) => {
                entries.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Drops every node and element, keeping the root box. Outstanding
    /// handles become meaningless.
    pub fn clear(&mut self) {
        let bounds = self.bounds();
        self.nodes.clear();
        self.nodes.push(Node::leaf(bounds, 0));
        self.len = 0;
    }

    pub fn stats(&self) -> OctreeStats {
        OctreeStats {
            nodes: self.nodes.len(),
            leaves: self.nodes.iter().filter(|n| n.children.is_none()).count(),
            elements: self.len,
            max_depth: self.nodes.iter().map(|n| n.depth).max().unwrap_or(0),
        }
    }
}
