//! Unity export demo application
//!
//! Builds a small authored scene with the situations the pipeline exists
//! for: keep-transform parenting, shared geometry, a hidden backdrop, an
//! excluded reference collection and a modifier stack. Exports it through
//! a manifest serializer that writes one line per object, then shows that
//! the authored scene came back untouched.

use std::error::Error;
use std::fmt::Write as _;

use unity_fbx::prelude::*;

/// Writes a text manifest describing what a real FBX writer would see
struct ManifestSerializer;

impl FbxSerializer for ManifestSerializer {
    fn export(&mut self, scene: &Scene, params: &FbxExportParams) -> Result<(), SerializeError> {
        let mut manifest = String::new();
        let _ = writeln!(manifest, "# Unity FBX manifest");
        let _ = writeln!(manifest, "# scale handling: {:?}", params.apply_scale_options);
        for key in scene.objects() {
            let node = scene
                .node(key)
                .map_err(|e| SerializeError::Unsupported(e.to_string()))?;
            let exportable = scene
                .in_view_layer(key)
                .map_err(|e| SerializeError::Unsupported(e.to_string()))?;
            if !exportable || node.is_hidden() || node.is_disabled() {
                continue;
            }
            let position = node.world_matrix().transform_point(&Point3::origin());
            let _ = writeln!(
                manifest,
                "object {} kind={:?} position=({:.3}, {:.3}, {:.3})",
                node.name(),
                node.kind(),
                position.x,
                position.y,
                position.z
            );
        }
        std::fs::write(&params.filepath, manifest)?;
        Ok(())
    }
}

fn build_scene() -> Result<Scene, SceneError> {
    let mut scene = Scene::new();

    // A rig with keep-transform parenting, the case that produces
    // non-trivial parent-inverse corrections
    let rig = scene.add_object("Rig", ObjectKind::Empty);
    scene.set_basis(
        rig,
        Mat4::new_translation(&Vec3::new(0.0, 1.0, 0.0)) * Mat4::rotation_z(0.4),
    )?;
    let body = scene.add_object("Body", ObjectKind::Mesh);
    let body_mesh = scene.add_payload(
        "BodyMesh",
        vec![
            Point3::new(1.0, 1.0, 1.0),
            Point3::new(-1.0, 1.0, 1.0),
            Point3::new(1.0, -1.0, 1.0),
            Point3::new(1.0, 1.0, -1.0),
        ],
    );
    scene.assign_payload(body, Some(body_mesh))?;
    scene.set_basis(body, Mat4::new_translation(&Vec3::new(2.0, 0.0, 0.0)))?;
    scene.set_parent_keep_transform(body, rig)?;

    let antenna = scene.add_object("Antenna", ObjectKind::Curve);
    let antenna_profile = scene.add_payload("AntennaProfile", vec![Point3::new(0.0, 0.0, 1.0)]);
    scene.assign_payload(antenna, Some(antenna_profile))?;
    scene.set_basis(antenna, Mat4::new_translation(&Vec3::new(0.0, 0.0, 1.5)))?;
    scene.set_parent_keep_transform(antenna, body)?;
    scene.add_modifier(antenna, Modifier::new("Bevel", ModifierKind::Bevel))?;

    // Two crates sharing one mesh, split for processing and re-merged for
    // the file
    let crate_mesh = scene.add_payload(
        "CrateMesh",
        vec![Point3::new(0.5, 0.5, 0.5), Point3::new(-0.5, 0.5, 0.5)],
    );
    for (name, x) in [("CrateA", -3.0), ("CrateB", 3.0)] {
        let crate_object = scene.add_object(name, ObjectKind::Mesh);
        scene.assign_payload(crate_object, Some(crate_mesh))?;
        scene.set_basis(crate_object, Mat4::new_translation(&Vec3::new(x, 0.0, 0.0)))?;
    }

    // A skinned character keeps its armature modifier through the bake
    let hero = scene.add_object("Hero", ObjectKind::Mesh);
    let hero_mesh = scene.add_payload("HeroMesh", vec![Point3::new(0.0, 2.0, 0.0)]);
    scene.assign_payload(hero, Some(hero_mesh))?;
    scene.add_modifier(hero, Modifier::new("Armature", ModifierKind::Armature))?;

    // Hidden set dressing still gets rewritten, then re-hidden
    let dressing = scene.add_collection("Dressing", scene.root_collection())?;
    let backdrop = scene.add_object_in("Backdrop", ObjectKind::Mesh, dressing)?;
    let backdrop_mesh = scene.add_payload("BackdropMesh", vec![Point3::new(0.0, 0.0, -5.0)]);
    scene.assign_payload(backdrop, Some(backdrop_mesh))?;
    scene.set_collection_hidden(dressing, true)?;

    // Excluded reference material never exports
    let reference = scene.add_collection("Reference", scene.root_collection())?;
    scene.add_object_in("RefBoard", ObjectKind::Mesh, reference)?;
    scene.set_collection_excluded(reference, true)?;

    scene.update();
    Ok(scene)
}

fn main() -> Result<(), Box<dyn Error>> {
    unity_fbx::foundation::logging::init();

    let mut scene = build_scene()?;
    log::info!("Authored scene with {} objects", scene.object_count());

    // Persist the options as a preset and run with the loaded copy
    let preset_path = std::env::temp_dir().join("unity_export_options.ron");
    let options = ExportOptions {
        use_triangles: true,
        ..ExportOptions::default()
    };
    options.save_to_file(preset_path.to_str().ok_or("preset path is not valid UTF-8")?)?;
    let loaded = ExportOptions::load_from_file(preset_path.to_str().ok_or("preset path is not valid UTF-8")?)?;
    log::info!("Loaded export preset from {}", preset_path.display());

    let body = scene.find_object("Body").ok_or("missing Body object")?;
    let world_before = scene.world_matrix(body)?;

    let manifest_path = std::env::temp_dir().join("unity_export_demo.manifest");
    let mut serializer = ManifestSerializer;
    export_unity_fbx(&mut scene, &mut serializer, &manifest_path, &loaded);

    // Rollback left the authored transforms in place
    let world_after = scene.world_matrix(body)?;
    log::info!(
        "Body world position before export: {:?}, after: {:?}",
        world_before.transform_point(&Point3::origin()),
        world_after.transform_point(&Point3::origin())
    );

    let manifest = std::fs::read_to_string(&manifest_path)?;
    log::info!("Manifest written to {}:", manifest_path.display());
    for line in manifest.lines() {
        log::info!("  {}", line);
    }

    Ok(())
}
