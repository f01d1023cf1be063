//! Quadtree over rectangle bounds, used to cull chunks against a view.
//!
//! Items live in the deepest node whose bounds fully contain them; an item
//! straddling a split stays with the parent. Queries can return items whose
//! bounds only touch the node, so callers re-test when they need exactness.

use bevy::prelude::*;

use super::coords::{rect_contains, rects_overlap};

/// Items a node holds before it splits.
pub const NODE_CAPACITY: usize = 8;

/// Deepest level a node may split to.
pub const MAX_DEPTH: u32 = 6;

#[derive(Clone, Debug)]
struct Node<K> {
    bounds: IRect,
    depth: u32,
    items: Vec<(K, IRect)>,
    children: Option<Box<[Node<K>; 4]>>,
}

impl<K: Copy> Node<K> {
    fn new(bounds: IRect, depth: u32) -> Self {
        Self {
            bounds,
            depth,
            items: Vec::new(),
            children: None,
        }
    }

    fn insert(&mut self, key: K, bounds: IRect) {
        if let Some(children) = self.children.as_mut() {
            if let Some(child) = children
                .iter_mut()
                .find(|c| rect_contains(&c.bounds, &bounds))
            {
                child.insert(key, bounds);
                return;
            }
            self.items.push((key, bounds));
            return;
        }

        self.items.push((key, bounds));
        if self.items.len() > NODE_CAPACITY && self.depth < MAX_DEPTH && self.can_split() {
            self.split();
        }
    }

    fn can_split(&self) -> bool {
        self.bounds.width() >= 2 && self.bounds.height() >= 2
    }

    fn split(&mut self) {
        let min = self.bounds.min;
        let max = self.bounds.max;
        let mid = (min + max) / 2;
        let depth = self.depth + 1;

        let children = Box::new([
            Node::new(IRect::from_corners(min, mid), depth),
            Node::new(IRect::from_corners(IVec2::new(mid.x, min.y), IVec2::new(max.x, mid.y)), depth),
            Node::new(IRect::from_corners(IVec2::new(min.x, mid.y), IVec2::new(mid.x, max.y)), depth),
            Node::new(IRect::from_corners(mid, max), depth),
        ]);
        self.children = Some(children);

        let items = std::mem::take(&mut self.items);
        for (key, bounds) in items {
            self.insert(key, bounds);
        }
    }

    fn query(&self, rect: &IRect, out: &mut Vec<K>) {
        if !rects_overlap(&self.bounds, rect) && self.depth > 0 {
            return;
        }
        out.extend(
            self.items
                .iter()
                .filter(|(_, b)| rects_overlap(b, rect))
                .map(|(k, _)| *k),
        );
        if let Some(children) = &self.children {
            for child in children.iter() {
                child.query(rect, out);
            }
        }
    }

    fn count(&self) -> usize {
        self.items.len()
            + self
                .children
                .as_ref()
                .map_or(0, |c| c.iter().map(Node::count).sum())
    }
}

/// Spatial index keyed by `K`.
#[derive(Clone, Debug)]
pub struct QuadTree<K> {
    root: Node<K>,
}

impl<K: Copy> QuadTree<K> {
    /// Empty tree covering `bounds`. Items outside the bounds still insert;
    /// they simply stay at the root.
    pub fn new(bounds: IRect) -> Self {
        Self {
            root: Node::new(bounds, 0),
        }
    }

    pub fn bounds(&self) -> IRect {
        self.root.bounds
    }

    pub fn insert(&mut self, key: K, bounds: IRect) {
        self.root.insert(key, bounds);
    }

    /// Append every item whose bounds overlap `rect` to `out`.
    pub fn query(&self, rect: IRect, out: &mut Vec<K>) {
        self.root.query(&rect, out);
    }

    pub fn len(&self) -> usize {
        self.root.count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
