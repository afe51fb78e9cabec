//! Export driver
//!
//! Runs the whole preparation sequence around a scene snapshot: unify
//! visibility, split shared payloads, collapse modifier stacks, rewrite
//! every hierarchy for the up-axis change, restore what the file should
//! not see as edited, then hand the scene to the serializer. The snapshot
//! is rolled back unconditionally afterwards, so the authored scene
//! survives both success and failure unchanged.
//!
//! Failures never escape: they are logged and the run still reports
//! completion. A missing output file plus the logged message is the only
//! failure signal, mirroring how the operator behaves inside its host.

use crate::export::options::ExportOptions;
use crate::export::serializer::{FbxSerializer, SerializeError};
use crate::export::{modifiers, restore, rewrite, uniquify, visibility, RestorationRecord};
use crate::scene::{InteractionMode, Scene, SceneError};
use std::path::Path;
use thiserror::Error;

/// Marker that an export run finished, successfully or not
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completed;

/// Aggregate failure inside the protected region
///
/// Never returned to callers; the driver logs it and rolls back.
#[derive(Error, Debug)]
pub enum ExportError {
    /// A scene operation failed
    #[error(transparent)]
    Scene(#[from] SceneError),

    /// The serializer failed
    #[error(transparent)]
    Serialize(#[from] SerializeError),
}

/// Prepare the scene and export it for Unity
///
/// The one caller-facing entry point. Caller-supplied options win over the
/// driver's single built-in default, the Unity unit-scale handling. The
/// scene is exactly as authored when this returns.
pub fn export_unity_fbx<S: FbxSerializer>(
    scene: &mut Scene,
    serializer: &mut S,
    filepath: impl AsRef<Path>,
    options: &ExportOptions,
) -> Completed {
    log::info!("Preparing 3D model for Unity...");
    let snapshot = scene.snapshot();
    let result = run_pipeline(scene, serializer, filepath.as_ref(), options);
    scene.rollback(&snapshot);
    match result {
        Ok(()) => log::info!("FBX file for Unity saved."),
        Err(error) => {
            log::error!("{}", error);
            log::info!("File not saved.");
        }
    }
    Completed
}

fn run_pipeline<S: FbxSerializer>(
    scene: &mut Scene,
    serializer: &mut S,
    filepath: &Path,
    options: &ExportOptions,
) -> Result<(), ExportError> {
    let mut record = RestorationRecord::new();
    record.selection = scene.selected_objects();
    scene.set_mode(InteractionMode::Object);
    scene.update();

    visibility::unify(scene, &mut record)?;
    uniquify::uniquify(scene, &mut record)?;
    modifiers::bake_all(scene)?;
    let roots = rewrite::hierarchy_roots(scene);
    log::debug!("Rewriting {} hierarchies", roots.len());
    for root in roots {
        rewrite::fix_hierarchy(scene, root)?;
    }
    restore::restore(scene, &record)?;

    let params = options.resolve(filepath);
    serializer.export(scene, &params)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::options::ApplyScaleMode;
    use crate::export::FbxExportParams;
    use crate::foundation::math::{constants::HALF_PI, utils::deg_to_rad, Mat4, Mat4Ext, Point3, Vec3};
    use crate::scene::{Modifier, ModifierKind, ObjectKind};
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-5;

    struct RecordedObject {
        name: String,
        payload: Option<String>,
        world: Mat4,
        hidden: bool,
        selected: bool,
    }

    #[derive(Default)]
    struct RecordingSerializer {
        calls: usize,
        params: Option<FbxExportParams>,
        objects: Vec<RecordedObject>,
    }

    impl FbxSerializer for RecordingSerializer {
        fn export(&mut self, scene: &Scene, params: &FbxExportParams) -> Result<(), SerializeError> {
            self.calls += 1;
            self.params = Some(params.clone());
            self.objects.clear();
            for key in scene.objects() {
                let node = scene
                    .node(key)
                    .map_err(|e| SerializeError::Unsupported(e.to_string()))?;
                let payload = match node.payload() {
                    Some(p) => Some(
                        scene
                            .payload(p)
                            .map_err(|e| SerializeError::Unsupported(e.to_string()))?
                            .name()
                            .to_owned(),
                    ),
                    None => None,
                };
                self.objects.push(RecordedObject {
                    name: node.name().to_owned(),
                    payload,
                    world: node.world_matrix(),
                    hidden: node.is_hidden(),
                    selected: node.is_selected(),
                });
            }
            Ok(())
        }
    }

    impl RecordingSerializer {
        fn recorded(&self, name: &str) -> &RecordedObject {
            self.objects
                .iter()
                .find(|o| o.name == name)
                .unwrap_or_else(|| panic!("no recorded object named {}", name))
        }
    }

    struct FailingSerializer;

    impl FbxSerializer for FailingSerializer {
        fn export(&mut self, _: &Scene, _: &FbxExportParams) -> Result<(), SerializeError> {
            Err(SerializeError::Unsupported(String::from("injected failure")))
        }
    }

    fn translation(x: f32, y: f32, z: f32) -> Mat4 {
        Mat4::new_translation(&Vec3::new(x, y, z))
    }

    fn scene_fingerprint(scene: &Scene) -> Vec<String> {
        let mut lines = Vec::new();
        for key in scene.objects() {
            let node = scene.node(key).unwrap();
            let payload = node.payload().map(|p| {
                let payload = scene.payload(p).unwrap();
                format!("{} {:?}", payload.name(), payload.points())
            });
            lines.push(format!(
                "{} basis={:?} pi={:?} world={:?} payload={:?} flags={}{}{} mods={}",
                node.name(),
                node.basis(),
                node.parent_inverse(),
                node.world_matrix(),
                payload,
                u8::from(node.is_hidden()),
                u8::from(node.is_disabled()),
                u8::from(node.is_selected()),
                node.modifiers().len(),
            ));
        }
        lines
    }

    fn build_authored_scene(scene: &mut Scene) -> (crate::scene::NodeKey, crate::scene::NodeKey) {
        let root = scene.add_object("Root", ObjectKind::Empty);
        let child = scene.add_object("Child", ObjectKind::Mesh);
        let payload = scene.add_payload("ChildMesh", vec![Point3::new(1.0, 0.0, 0.5)]);
        scene.assign_payload(child, Some(payload)).unwrap();
        scene
            .set_basis(root, translation(0.0, 2.0, 0.0) * Mat4::rotation_z(deg_to_rad(25.0)))
            .unwrap();
        scene.set_basis(child, translation(1.0, 0.0, 1.0)).unwrap();
        scene.set_parent_keep_transform(child, root).unwrap();
        scene.update();
        (root, child)
    }

    #[test]
    fn test_export_restores_scene_and_reports_completion() {
        let mut scene = Scene::new();
        let (_, child) = build_authored_scene(&mut scene);
        let hidden = scene.add_object("Hidden", ObjectKind::Mesh);
        scene.set_hidden(hidden, true).unwrap();
        scene.set_selected(child, true).unwrap();
        scene.update();
        let before = scene_fingerprint(&scene);

        let mut serializer = RecordingSerializer::default();
        let completed = export_unity_fbx(&mut scene, &mut serializer, "/tmp/out.fbx", &ExportOptions::default());

        assert_eq!(completed, Completed);
        assert_eq!(serializer.calls, 1);
        assert_eq!(scene_fingerprint(&scene), before);
    }

    #[test]
    fn test_export_failure_rolls_back_bit_identical() {
        let mut scene = Scene::new();
        build_authored_scene(&mut scene);
        let disabled = scene.add_object("Disabled", ObjectKind::Mesh);
        scene.set_disabled(disabled, true).unwrap();
        scene.update();
        let before = scene_fingerprint(&scene);
        let mode_before = scene.mode();

        let mut serializer = FailingSerializer;
        let completed = export_unity_fbx(&mut scene, &mut serializer, "/tmp/out.fbx", &ExportOptions::default());

        assert_eq!(completed, Completed);
        assert_eq!(scene_fingerprint(&scene), before);
        assert_eq!(scene.mode(), mode_before);
    }

    #[test]
    fn test_serializer_sees_rewritten_and_restored_scene() {
        let mut scene = Scene::new();
        let (root, child) = build_authored_scene(&mut scene);
        let hidden = scene.add_object("Hidden", ObjectKind::Mesh);
        scene.set_hidden(hidden, true).unwrap();
        scene.set_selected(child, true).unwrap();
        scene.update();
        let root_world = scene.world_matrix(root).unwrap();
        let child_world = scene.world_matrix(child).unwrap();

        let mut serializer = RecordingSerializer::default();
        export_unity_fbx(&mut scene, &mut serializer, "/tmp/out.fbx", &ExportOptions::default());

        // Transforms carry the trailing up-axis rotation when serialized
        let trailing = Mat4::rotation_x(HALF_PI);
        assert_relative_eq!(
            serializer.recorded("Root").world,
            root_world * trailing,
            epsilon = EPSILON
        );
        assert_relative_eq!(
            serializer.recorded("Child").world,
            child_world * trailing,
            epsilon = EPSILON
        );

        // Visibility and selection were already restored when the
        // serializer ran
        assert!(serializer.recorded("Hidden").hidden);
        assert!(serializer.recorded("Child").selected);
        assert!(!serializer.recorded("Root").selected);
    }

    #[test]
    fn test_safe_payload_split_is_remerged_for_serialization() {
        let mut scene = Scene::new();
        let a = scene.add_object("A", ObjectKind::Mesh);
        let b = scene.add_object("B", ObjectKind::Mesh);
        let payload = scene.add_payload("Shared", vec![Point3::new(0.5, 0.5, 0.0)]);
        scene.assign_payload(a, Some(payload)).unwrap();
        scene.assign_payload(b, Some(payload)).unwrap();
        scene.update();

        let mut serializer = RecordingSerializer::default();
        export_unity_fbx(&mut scene, &mut serializer, "/tmp/out.fbx", &ExportOptions::default());

        assert_eq!(serializer.recorded("A").payload.as_deref(), Some("Shared"));
        assert_eq!(serializer.recorded("B").payload.as_deref(), Some("Shared"));
    }

    #[test]
    fn test_modifier_split_stays_split_for_serialization() {
        let mut scene = Scene::new();
        let a = scene.add_object("A", ObjectKind::Mesh);
        let b = scene.add_object("B", ObjectKind::Mesh);
        let payload = scene.add_payload("Shared", vec![Point3::new(0.5, 0.5, 0.0)]);
        scene.assign_payload(a, Some(payload)).unwrap();
        scene.assign_payload(b, Some(payload)).unwrap();
        scene
            .add_modifier(b, Modifier::new("Subdivision", ModifierKind::Subdivision))
            .unwrap();
        scene.update();

        let mut serializer = RecordingSerializer::default();
        export_unity_fbx(&mut scene, &mut serializer, "/tmp/out.fbx", &ExportOptions::default());

        let payload_a = serializer.recorded("A").payload.clone();
        let payload_b = serializer.recorded("B").payload.clone();
        assert_eq!(payload_a.as_deref(), Some("Shared.001"));
        assert_eq!(payload_b.as_deref(), Some("Shared"));
    }

    #[test]
    fn test_option_overlay_reaches_serializer() {
        let mut scene = Scene::new();
        build_authored_scene(&mut scene);

        let mut serializer = RecordingSerializer::default();
        export_unity_fbx(&mut scene, &mut serializer, "/tmp/out.fbx", &ExportOptions::default());
        let params = serializer.params.clone().unwrap();
        assert_eq!(params.apply_scale_options, ApplyScaleMode::ScaleUnits);
        assert_eq!(params.filepath, std::path::PathBuf::from("/tmp/out.fbx"));

        let options = ExportOptions {
            apply_scale_options: Some(ApplyScaleMode::ScaleAll),
            ..ExportOptions::default()
        };
        export_unity_fbx(&mut scene, &mut serializer, "/tmp/out.fbx", &options);
        let params = serializer.params.clone().unwrap();
        assert_eq!(params.apply_scale_options, ApplyScaleMode::ScaleAll);
    }

    #[test]
    fn test_export_normalizes_interaction_mode() {
        let mut scene = Scene::new();
        build_authored_scene(&mut scene);
        scene.set_mode(InteractionMode::Edit);

        let mut serializer = RecordingSerializer::default();
        export_unity_fbx(&mut scene, &mut serializer, "/tmp/out.fbx", &ExportOptions::default());

        // The pipeline ran in object mode; rollback brings edit mode back
        assert_eq!(serializer.calls, 1);
        assert_eq!(scene.mode(), InteractionMode::Edit);
    }
}
