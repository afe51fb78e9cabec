//! # Unity FBX
//!
//! Scene-graph preparation pipeline for exporting 3D hierarchies to Unity's
//! coordinate and scaling conventions.
//!
//! Unity expects Y-up content with rotations that survive a 90-degree
//! up-axis change. This crate rewrites every exportable hierarchy so the
//! corrective rotation is baked into the geometry while each object's
//! world-space placement is preserved, invokes a destination serializer,
//! and then rolls the scene back to its authored state.
//!
//! ## Features
//!
//! - **Transform Rewriter**: recursive per-hierarchy rotation re-bake
//! - **Visibility Unifier**: temporarily shows hidden content so host
//!   operators take effect
//! - **Datablock Uniquifier**: splits shared geometry for processing and
//!   re-shares it afterwards
//! - **Modifier Baker**: collapses modifier stacks, skipping armature
//!   deformed objects
//! - **Snapshot Rollback**: the authored scene is restored whether or not
//!   the serializer succeeds
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use unity_fbx::prelude::*;
//!
//! struct NullSerializer;
//!
//! impl FbxSerializer for NullSerializer {
//!     fn export(&mut self, _scene: &Scene, params: &FbxExportParams) -> Result<(), SerializeError> {
//!         std::fs::write(&params.filepath, b"fbx")?;
//!         Ok(())
//!     }
//! }
//!
//! let mut scene = Scene::new();
//! let cube = scene.add_object("Cube", ObjectKind::Mesh);
//! let payload = scene.add_payload("CubeMesh", vec![Point3::new(1.0, 1.0, 1.0)]);
//! scene.assign_payload(cube, Some(payload)).unwrap();
//! scene.update();
//!
//! let mut serializer = NullSerializer;
//! export_unity_fbx(&mut scene, &mut serializer, "model.fbx", &ExportOptions::default());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod export;
pub mod foundation;
pub mod scene;

pub use export::{
    export_unity_fbx, Completed, ExportError, ExportOptions, FbxExportParams, FbxSerializer,
    SerializeError,
};
pub use scene::{InteractionMode, ObjectKind, Scene, SceneError};

/// Common imports for pipeline users
pub mod prelude {
    pub use crate::{
        config::Preset,
        export::{
            export_unity_fbx, ApplyScaleMode, Completed, ExportError, ExportOptions,
            FbxExportParams, FbxSerializer, ObjectTypes, RestorationRecord, SerializeError,
        },
        foundation::math::{Mat4, Mat4Ext, Point3, Quat, Vec3},
        scene::{
            Collection, CollectionKey, GeometryPayload, InteractionMode, Modifier, ModifierKind,
            NodeKey, ObjectKind, PayloadKey, Scene, SceneError, SceneNode, SceneSnapshot,
        },
    };
}
