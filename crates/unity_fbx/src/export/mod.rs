//! Unity export pipeline
//!
//! The passes run in a fixed order driven by [`export_unity_fbx`]:
//! visibility unification, shared-payload splitting, modifier baking, the
//! per-hierarchy rotation rewrite, restoration, then serialization, all
//! inside a snapshot that is rolled back unconditionally.

pub mod context;
pub mod options;
pub mod serializer;

mod driver;
mod modifiers;
mod restore;
mod rewrite;
mod uniquify;
mod visibility;

pub use context::RestorationRecord;
pub use driver::{export_unity_fbx, Completed, ExportError};
pub use options::{
    ApplyScaleMode, ArmatureNodeType, BatchMode, BoneAxis, ExportOptions, FbxExportParams,
    ObjectTypes, PathMode, SmoothingMode, VertexColorMode,
};
pub use serializer::{FbxSerializer, SerializeError};
