//! Geometry payloads
//!
//! A payload is the shareable datablock behind mesh, curve, surface, text
//! and armature objects: a named set of points (vertices or bone rest
//! positions). The rotation bake transforms these points in place, which is
//! why shared payloads must be made single-user first.

use crate::foundation::math::{Mat4, Point3};

/// Shareable geometry datablock
#[derive(Debug, Clone)]
pub struct GeometryPayload {
    pub(crate) name: String,
    pub(crate) points: Vec<Point3>,
    pub(crate) fake_user: bool,
}

impl GeometryPayload {
    pub(crate) fn new(name: String, points: Vec<Point3>) -> Self {
        Self {
            name,
            points,
            fake_user: false,
        }
    }

    /// Payload name, unique within the scene
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Vertex or bone rest positions
    pub fn points(&self) -> &[Point3] {
        &self.points
    }

    /// Whether a fake user pins this payload against garbage collection
    ///
    /// A fake user raises the reference count without being an actual
    /// referencing object.
    pub fn has_fake_user(&self) -> bool {
        self.fake_user
    }

    /// Transform every point in place
    pub(crate) fn transform_points(&mut self, matrix: &Mat4) {
        for point in &mut self.points {
            *point = matrix.transform_point(point);
        }
    }
}
