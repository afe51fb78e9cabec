//! Hierarchy rotation rewrite
//!
//! Unity reconstructs a -90 degree X rotation on every imported FBX root
//! unless the file's transforms already account for the up-axis change.
//! The rewrite walks each hierarchy top-down and re-bakes every view-layer
//! member: the parent-inverse correction is folded away, the local
//! transform is temporarily replaced with a -90 degree X rotation which is
//! baked into the payload points, and the saved local transform comes back
//! with a +90 degree X rotation appended. Net effect per member: payload
//! points carry the -90, the transform carries the +90, and the object's
//! world placement changes only by the trailing +90 Unity expects.
//!
//! Children are visited whether or not their parent was rewritten, so a
//! non-member in the middle of a hierarchy is stepped over without being
//! touched. The pass expects visibility to have been unified first;
//! members are assumed selectable.

use crate::foundation::math::{constants::HALF_PI, Mat4, Mat4Ext};
use crate::scene::{NodeKey, Scene, SceneError};

/// Top-down rewrite of one hierarchy
pub(crate) fn fix_hierarchy(scene: &mut Scene, root: NodeKey) -> Result<(), SceneError> {
    fix_object(scene, root)
}

fn fix_object(scene: &mut Scene, key: NodeKey) -> Result<(), SceneError> {
    if scene.in_view_layer(key)? {
        log::debug!("Rewriting rotation for '{}'", scene.node(key)?.name());
        scene.reset_parent_inverse(key)?;
        let original = scene.local_matrix(key)?;
        scene.set_local_matrix(key, Mat4::rotation_x(-HALF_PI))?;
        scene.select_only(key)?;
        scene.apply_rotation_to_selected()?;
        scene.set_local_matrix(key, original * Mat4::rotation_x(HALF_PI))?;
    }
    let children = scene.node(key)?.children().to_vec();
    for child in children {
        fix_object(scene, child)?;
    }
    Ok(())
}

/// Parentless objects of the kinds the rewrite starts from, in creation
/// order
pub(crate) fn hierarchy_roots(scene: &Scene) -> Vec<NodeKey> {
    scene
        .objects()
        .filter(|&key| {
            scene
                .node(key)
                .is_ok_and(|n| n.parent().is_none() && n.kind().is_exportable_root())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{utils::deg_to_rad, Point3, Vec3};
    use crate::scene::ObjectKind;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-5;

    fn translation(x: f32, y: f32, z: f32) -> Mat4 {
        Mat4::new_translation(&Vec3::new(x, y, z))
    }

    #[test]
    fn test_fixed_members_gain_trailing_up_axis_rotation() {
        let mut scene = Scene::new();
        let root = scene.add_object("Root", ObjectKind::Empty);
        let mid = scene.add_object("Mid", ObjectKind::Mesh);
        let leaf = scene.add_object("Leaf", ObjectKind::Mesh);
        let payload = scene.add_payload(
            "MidMesh",
            vec![Point3::new(1.0, 0.5, 0.25), Point3::new(-0.5, 2.0, 1.0)],
        );
        scene.assign_payload(mid, Some(payload)).unwrap();

        scene
            .set_basis(root, translation(0.0, 1.0, 0.0) * Mat4::rotation_z(deg_to_rad(30.0)))
            .unwrap();
        scene
            .set_basis(
                mid,
                translation(2.0, 0.0, 1.0)
                    * Mat4::rotation_x(deg_to_rad(20.0))
                    * Mat4::new_scaling(2.0),
            )
            .unwrap();
        scene
            .set_basis(leaf, translation(0.0, 3.0, 0.0) * Mat4::rotation_y(deg_to_rad(45.0)))
            .unwrap();
        scene.set_parent_keep_transform(mid, root).unwrap();
        scene.set_parent_keep_transform(leaf, mid).unwrap();
        scene.update();

        let worlds_before = [
            scene.world_matrix(root).unwrap(),
            scene.world_matrix(mid).unwrap(),
            scene.world_matrix(leaf).unwrap(),
        ];
        let placed_before: Vec<Point3> = scene
            .payload(payload)
            .unwrap()
            .points()
            .iter()
            .map(|p| worlds_before[1].transform_point(p))
            .collect();

        assert_eq!(hierarchy_roots(&scene), vec![root]);
        fix_hierarchy(&mut scene, root).unwrap();
        scene.update();

        let trailing = Mat4::rotation_x(HALF_PI);
        for (key, before) in [root, mid, leaf].into_iter().zip(worlds_before) {
            assert_relative_eq!(
                scene.world_matrix(key).unwrap(),
                before * trailing,
                epsilon = EPSILON
            );
            assert_relative_eq!(
                scene.parent_inverse(key).unwrap(),
                Mat4::identity(),
                epsilon = EPSILON
            );
        }

        // Payload points moved opposite to the transform change, so their
        // world placement is untouched
        let world_mid = scene.world_matrix(mid).unwrap();
        for (point, before) in scene.payload(payload).unwrap().points().iter().zip(&placed_before) {
            assert_relative_eq!(world_mid.transform_point(point), *before, epsilon = EPSILON);
        }
    }

    #[test]
    fn test_non_member_gap_is_stepped_over() {
        let mut scene = Scene::new();
        let excluded = scene.add_collection("Excluded", scene.root_collection()).unwrap();
        scene.set_collection_excluded(excluded, true).unwrap();

        let root = scene.add_object("Root", ObjectKind::Empty);
        let gap = scene.add_object_in("Gap", ObjectKind::Mesh, excluded).unwrap();
        let leaf = scene.add_object("Leaf", ObjectKind::Mesh);
        let gap_payload = scene.add_payload("GapMesh", vec![Point3::new(0.0, 1.0, 0.0)]);
        scene.assign_payload(gap, Some(gap_payload)).unwrap();

        scene
            .set_basis(root, translation(1.0, 0.0, 0.0) * Mat4::rotation_y(deg_to_rad(15.0)))
            .unwrap();
        scene
            .set_basis(gap, translation(0.0, 2.0, 0.0) * Mat4::rotation_x(deg_to_rad(40.0)))
            .unwrap();
        scene.set_basis(leaf, translation(0.0, 0.0, 3.0)).unwrap();
        scene.set_parent_keep_transform(gap, root).unwrap();
        scene.set_parent_keep_transform(leaf, gap).unwrap();
        scene.update();

        let gap_basis_before = scene.basis(gap).unwrap();
        let gap_world_before = scene.world_matrix(gap).unwrap();
        let leaf_world_before = scene.world_matrix(leaf).unwrap();

        fix_hierarchy(&mut scene, root).unwrap();
        scene.update();

        // The gap keeps its authored channels and geometry
        assert_eq!(scene.basis(gap).unwrap(), gap_basis_before);
        assert_eq!(
            scene.payload(gap_payload).unwrap().points()[0],
            Point3::new(0.0, 1.0, 0.0)
        );
        // and its world placement, exactly: the compensation it received
        // cancels the rotation its parent gained
        assert_relative_eq!(
            scene.world_matrix(gap).unwrap(),
            gap_world_before,
            epsilon = EPSILON
        );

        // Members on both sides of the gap are rewritten
        let trailing = Mat4::rotation_x(HALF_PI);
        assert_relative_eq!(
            scene.world_matrix(leaf).unwrap(),
            leaf_world_before * trailing,
            epsilon = EPSILON
        );
        assert_relative_eq!(
            scene.parent_inverse(leaf).unwrap(),
            Mat4::identity(),
            epsilon = EPSILON
        );
    }

    #[test]
    fn test_hierarchy_roots_filter() {
        let mut scene = Scene::new();
        let empty = scene.add_object("Empty", ObjectKind::Empty);
        let mesh = scene.add_object("Mesh", ObjectKind::Mesh);
        let child = scene.add_object("Child", ObjectKind::Mesh);
        scene.set_parent(child, mesh).unwrap();
        scene.add_object("Camera", ObjectKind::Camera);
        scene.add_object("Light", ObjectKind::Light);
        let curve = scene.add_object("Curve", ObjectKind::Curve);

        assert_eq!(hierarchy_roots(&scene), vec![empty, mesh, curve]);
    }
}
