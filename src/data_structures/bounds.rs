//! Axis-aligned bounds and asset recentering.
//!
//! Loaded assets rarely have their visual center at their authored origin.
//! [`recenter_offset`] computes the translation that re-homes a subtree so
//! its bounding-box center lands on the origin of the subtree's parent,
//! which is what makes pivot-based orbiting feel centered.

use cgmath::{EuclideanSpace, Point3, Transform as _};

use crate::data_structures::{
    scene_graph::{NodeKind, SceneNode},
    transform::Transform,
};

/// An axis-aligned min/max pair.
///
/// Derived data: recompute on demand, never cache across mutations of the
/// subtree it came from.
#[derive(Clone, Debug, PartialEq)]
pub struct Aabb {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl Aabb {
    /// The empty box. Growing it by any point yields that point.
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f32::INFINITY, f32::INFINITY, f32::INFINITY),
            max: Point3::new(f32::NEG_INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x
    }

    /// Extend the box to contain `point`.
    pub fn grow(&mut self, point: Point3<f32>) {
        self.min.x = self.min.x.min(point.x);
        self.min.y = self.min.y.min(point.y);
        self.min.z = self.min.z.min(point.z);
        self.max.x = self.max.x.max(point.x);
        self.max.y = self.max.y.max(point.y);
        self.max.z = self.max.z.max(point.z);
    }

    pub fn union(mut self, other: &Aabb) -> Self {
        if !other.is_empty() {
            self.grow(other.min);
            self.grow(other.max);
        }
        self
    }

    pub fn center(&self) -> Point3<f32> {
        Point3::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
            (self.min.z + self.max.z) / 2.0,
        )
    }

    pub fn size(&self) -> cgmath::Vector3<f32> {
        if self.is_empty() {
            return cgmath::Vector3::new(0.0, 0.0, 0.0);
        }
        self.max - self.min
    }
}

/// Union bounding box of a subtree, measured in the space of `parent`.
///
/// Walks every mesh vertex through the accumulated transform chain. Sprites
/// are excluded: a camera-facing glow has no stable extent and would skew
/// centering.
pub fn subtree_bounds(node: &SceneNode, parent: &Transform) -> Aabb {
    let world = parent * &node.transform;
    let mut bounds = Aabb::empty();
    if let NodeKind::Mesh(mesh) = node.kind() {
        let matrix = world.to_matrix();
        for primitive in &mesh.primitives {
            for vertex in &primitive.vertices {
                bounds.grow(matrix.transform_point(Point3::from(vertex.position)));
            }
        }
    }
    for child in &node.children {
        bounds = bounds.union(&subtree_bounds(child, &world));
    }
    bounds
}

/// The translation that recenters `root` on its parent's origin.
///
/// Applying the returned offset to `root`'s position moves the subtree's
/// bounding-box center onto the parent origin. A subtree without renderable
/// geometry degenerates to a zero-size box at the root's current position,
/// so the offset is simply the negated position; callers need no special
/// casing.
pub fn recenter_offset(root: &SceneNode) -> cgmath::Vector3<f32> {
    let bounds = subtree_bounds(root, &Transform::default());
    if bounds.is_empty() {
        return -root.transform.position;
    }
    -bounds.center().to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_structures::{
        model::{Material, Primitive},
        scene_graph::{MeshData, SceneNode},
    };

    fn mesh_node(name: &str, positions: &[[f32; 3]]) -> SceneNode {
        SceneNode::mesh(
            name,
            MeshData::new(
                vec![Primitive::from_positions(name, positions)],
                vec![Material::solid(name, [1.0, 1.0, 1.0, 1.0])],
            ),
        )
    }

    #[test]
    fn grow_from_empty_yields_a_point_box() {
        let mut bounds = Aabb::empty();
        assert!(bounds.is_empty());
        bounds.grow(Point3::new(1.0, 2.0, 3.0));
        assert!(!bounds.is_empty());
        assert_eq!(bounds.min, bounds.max);
        assert_eq!(bounds.center(), Point3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn known_box_yields_negated_center() {
        // Bounding box [-2,-1,-3]..[4,3,1], center (1,1,1)
        let node = mesh_node("box", &[[-2.0, -1.0, -3.0], [4.0, 3.0, 1.0]]);
        let offset = recenter_offset(&node);
        assert_eq!(offset, cgmath::Vector3::new(-1.0, -1.0, -1.0));
    }

    #[test]
    fn empty_subtree_negates_the_root_position() {
        let mut node = SceneNode::group("empty");
        node.transform.position = cgmath::Vector3::new(3.0, -2.0, 7.0);
        let offset = recenter_offset(&node);
        assert!(offset.x.is_finite() && offset.y.is_finite() && offset.z.is_finite());
        assert_eq!(offset, cgmath::Vector3::new(-3.0, 2.0, -7.0));
    }

    #[test]
    fn nested_transforms_are_accumulated() {
        // Child geometry spans [0,0,0]..[2,2,2] locally; the child node is
        // offset by (1,0,0), so the subtree box is [1,0,0]..[3,2,2].
        let mut child = mesh_node("child", &[[0.0, 0.0, 0.0], [2.0, 2.0, 2.0]]);
        child.transform.position = cgmath::Vector3::new(1.0, 0.0, 0.0);
        let mut root = SceneNode::group("root");
        root.add_child(child);

        let bounds = subtree_bounds(&root, &Transform::default());
        assert_eq!(bounds.min, Point3::new(1.0, 0.0, 0.0));
        assert_eq!(bounds.max, Point3::new(3.0, 2.0, 2.0));
        assert_eq!(recenter_offset(&root), cgmath::Vector3::new(-2.0, -1.0, -1.0));
    }
}
