//! Bounding Volume Hierarchy (BVH) acceleration structure.
//!
//! A binary tree stored as a flat node arena. Leaves refer to items by
//! index, so the same structure serves the scene level (objects) and the
//! mesh level (triangles).

use crate::hittable::{nearer, HitDistance};
use lucent_math::{Aabb, Interval, Ray};

/// Index of a node in [`Bvh::nodes`].
pub type NodeId = u32;

/// BVH node - either a branch with two children or a leaf with one item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BvhNode {
    /// Internal node; its box is the union of both children's boxes.
    Branch {
        left: NodeId,
        right: NodeId,
        bbox: Aabb,
    },
    /// Leaf wrapping a single item.
    Leaf { item: u32, bbox: Aabb },
}

impl BvhNode {
    pub fn bbox(&self) -> &Aabb {
        match self {
            BvhNode::Branch { bbox, .. } | BvhNode::Leaf { bbox, .. } => bbox,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Bvh {
    nodes: Vec<BvhNode>,
    root: Option<NodeId>,
}

impl Bvh {
    /// Build a BVH over items whose bounds are `boxes[i]`.
    ///
    /// Median split: sort by `min + max` along the current axis, halve the
    /// list, recurse with the next axis. A single item becomes a bare leaf.
    pub fn build(boxes: &[Aabb]) -> Self {
        let mut bvh = Bvh {
            nodes: Vec::with_capacity(boxes.len().saturating_mul(2)),
            root: None,
        };
        let mut items: Vec<u32> = (0..boxes.len() as u32).collect();
        bvh.root = bvh.construct(&mut items, boxes, 0);
        bvh
    }

    fn construct(&mut self, items: &mut [u32], boxes: &[Aabb], axis: usize) -> Option<NodeId> {
        match items {
            [] => None,
            [item] => Some(self.push(BvhNode::Leaf {
                item: *item,
                bbox: boxes[*item as usize],
            })),
            _ => {
                items.sort_unstable_by(|&a, &b| {
                    boxes[a as usize]
                        .axis_sum(axis)
                        .total_cmp(&boxes[b as usize].axis_sum(axis))
                });

                let mid = items.len() / 2;
                let (left_items, right_items) = items.split_at_mut(mid);
                let next_axis = (axis + 1) % 3;
                let left = self.construct(left_items, boxes, next_axis);
                let right = self.construct(right_items, boxes, next_axis);

                // Both halves hold at least one item once the list has two.
                match (left, right) {
                    (Some(left), Some(right)) => {
                        let bbox = Aabb::surrounding(
                            self.node(left).bbox(),
                            self.node(right).bbox(),
                        );
                        Some(self.push(BvhNode::Branch { left, right, bbox }))
                    }
                    (single, None) | (None, single) => single,
                }
            }
        }
    }

    fn push(&mut self, node: BvhNode) -> NodeId {
        self.nodes.push(node);
        (self.nodes.len() - 1) as NodeId
    }

    fn node(&self, id: NodeId) -> &BvhNode {
        &self.nodes[id as usize]
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, BvhNode::Leaf { .. }))
            .count()
    }

    /// Bounds of the whole tree, empty when there are no items.
    pub fn bounds(&self) -> Aabb {
        self.root
            .map(|root| *self.node(root).bbox())
            .unwrap_or(Aabb::EMPTY)
    }

    /// Number of nodes on the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        fn depth_of(bvh: &Bvh, id: NodeId) -> usize {
            match bvh.node(id) {
                BvhNode::Leaf { .. } => 1,
                BvhNode::Branch { left, right, .. } => {
                    1 + depth_of(bvh, *left).max(depth_of(bvh, *right))
                }
            }
        }
        self.root.map(|root| depth_of(self, root)).unwrap_or(0)
    }

    /// Traverse the tree and test every leaf whose boxes the ray crosses.
    ///
    /// `leaf` is called with the item index and the query range and returns
    /// the item's hit, if any. Both children of a branch are always visited
    /// and the nearer result wins. With `any_hit` the traversal stops at the
    /// first hit instead.
    pub fn intersect<H, F>(
        &self,
        ray: &Ray,
        ray_t: Interval,
        any_hit: bool,
        leaf: &mut F,
    ) -> Option<H>
    where
        H: HitDistance,
        F: FnMut(usize, Interval) -> Option<H>,
    {
        let root = self.root?;
        self.visit(root, ray, ray_t, any_hit, leaf)
    }

    fn visit<H, F>(
        &self,
        id: NodeId,
        ray: &Ray,
        ray_t: Interval,
        any_hit: bool,
        leaf: &mut F,
    ) -> Option<H>
    where
        H: HitDistance,
        F: FnMut(usize, Interval) -> Option<H>,
    {
        match self.node(id) {
            BvhNode::Leaf { item, bbox } => {
                if !bbox.hit(ray, ray_t) {
                    return None;
                }
                leaf(*item as usize, ray_t)
            }
            BvhNode::Branch { left, right, bbox } => {
                if !bbox.hit(ray, ray_t) {
                    return None;
                }

                let hit_left = self.visit(*left, ray, ray_t, any_hit, leaf);
                if any_hit && hit_left.is_some() {
                    return hit_left;
                }
                let hit_right = self.visit(*right, ray, ray_t, any_hit, leaf);
                nearer(hit_left, hit_right)
            }
        }
    }
}
