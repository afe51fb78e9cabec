//! Export option surface and resolved parameters
//!
//! [`ExportOptions`] mirrors the operator panel: every toggle a user can
//! reach, with the panel's defaults. Options are a [`Preset`], so they can
//! be saved to and loaded from TOML or RON files. [`ExportOptions::resolve`]
//! turns options plus an output path into the [`FbxExportParams`] handed to
//! the serializer, filling in the scale handling the Unity profile wants
//! when the user left it unset.

use crate::config::Preset;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::path::PathBuf;

bitflags::bitflags! {
    /// Object kinds included in the export
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ObjectTypes: u8 {
        /// Transform-only placeholders
        const EMPTY = 1 << 0;
        /// Cameras
        const CAMERA = 1 << 1;
        /// Lights
        const LIGHT = 1 << 2;
        /// Armatures
        const ARMATURE = 1 << 3;
        /// Meshes
        const MESH = 1 << 4;
        /// Everything else that can carry geometry
        const OTHER = 1 << 5;
    }
}

impl Default for ObjectTypes {
    fn default() -> Self {
        Self::all()
    }
}

// Flag names over raw bits keeps presets readable and stable across
// releases.
impl Serialize for ObjectTypes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut text = String::new();
        bitflags::parser::to_writer(self, &mut text).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&text)
    }
}

impl<'de> Deserialize<'de> for ObjectTypes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        bitflags::parser::from_str(&text).map_err(serde::de::Error::custom)
    }
}

/// How geometry normals are smoothed on export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SmoothingMode {
    /// Export vertex normals only
    #[default]
    Off,
    /// Write face smoothing groups
    Face,
    /// Write edge smoothing
    Edge,
}

/// Color space applied to exported vertex colors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VertexColorMode {
    /// Do not export vertex colors
    None,
    /// Gamma-corrected values
    #[default]
    Srgb,
    /// Scene-linear values
    Linear,
}

/// FBX node type used for armature roots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ArmatureNodeType {
    /// Null node
    #[default]
    Null,
    /// Root node
    Root,
    /// Limb node
    LimbNode,
}

/// Axis choice for bone orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoneAxis {
    /// Positive X
    X,
    /// Positive Y
    Y,
    /// Positive Z
    Z,
    /// Negative X
    NegX,
    /// Negative Y
    NegY,
    /// Negative Z
    NegZ,
}

/// How file paths inside the export are written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PathMode {
    /// Match the source path style
    #[default]
    Auto,
    /// Always absolute
    Absolute,
    /// Always relative to the export file
    Relative,
    /// Match paths exactly
    Match,
    /// File names only
    Strip,
    /// Copy referenced files next to the export
    Copy,
}

/// Batch export granularity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BatchMode {
    /// Single file
    #[default]
    Off,
    /// One file per scene
    Scene,
    /// One file per collection
    Collection,
    /// One file per scene collection
    SceneCollection,
    /// One file per collection of the active scene
    ActiveSceneCollection,
}

/// How the unit and global scale are folded into the file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplyScaleMode {
    /// Keep both scales in the file header
    ScaleNone,
    /// Fold the unit scale into the data, the Unity-compatible choice
    ScaleUnits,
    /// Fold the custom scale into the data
    ScaleCustom,
    /// Fold both scales into the data
    ScaleAll,
}

/// Operator panel options for a Unity FBX export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// Export only the selected objects
    pub use_selection: bool,

    /// Export only visible objects
    pub use_visible: bool,

    /// Export only the active collection
    pub use_active_collection: bool,

    /// Uniform scale applied to everything
    pub global_scale: f32,

    /// Fold the scene's unit scale into the export
    pub apply_unit_scale: bool,

    /// Scale handling override; left unset, the exporter picks the
    /// Unity-compatible handling at resolve time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apply_scale_options: Option<ApplyScaleMode>,

    /// Write the axis conversion into object transforms
    pub use_space_transform: bool,

    /// Object kinds to include
    pub object_types: ObjectTypes,

    /// Evaluate modifier stacks on export
    pub use_mesh_modifiers: bool,

    /// Use render-visibility rather than viewport-visibility for modifiers
    pub use_mesh_modifiers_render: bool,

    /// Normal smoothing written to the file
    pub mesh_smooth_type: SmoothingMode,

    /// Vertex color export mode
    pub colors_type: VertexColorMode,

    /// Put the active color layer first
    pub prioritize_active_color: bool,

    /// Keep subdivision surfaces as FBX subdivision data
    pub use_subsurf: bool,

    /// Export loose edges
    pub use_mesh_edges: bool,

    /// Export custom properties
    pub use_custom_props: bool,

    /// Only export deforming bones
    pub use_armature_deform_only: bool,

    /// Append a bone to the tip of each chain
    pub add_leaf_bones: bool,

    /// FBX node type for armature roots
    pub armature_nodetype: ArmatureNodeType,

    /// Main bone axis
    pub primary_bone_axis: BoneAxis,

    /// Secondary bone axis
    pub secondary_bone_axis: BoneAxis,

    /// Export tangent space data
    pub use_tspace: bool,

    /// Triangulate on export
    pub use_triangles: bool,

    /// Path style for referenced files
    pub path_mode: PathMode,

    /// Embed textures in the file
    pub embed_textures: bool,

    /// Batch export granularity
    pub batch_mode: BatchMode,

    /// Give each batch file its own directory
    pub use_batch_own_dir: bool,

    /// Write scene metadata
    pub use_metadata: bool,

    /// Export baked keyframe animation
    pub bake_anim: bool,

    /// Key every bone, deforming or not
    pub bake_anim_use_all_bones: bool,

    /// Bake NLA strips to separate takes
    pub bake_anim_use_nla_strips: bool,

    /// Bake every action to a separate take
    pub bake_anim_use_all_actions: bool,

    /// Always key the first and last frame
    pub bake_anim_force_startend_keying: bool,

    /// Frames between baked keys
    pub bake_anim_step: f32,

    /// Keyframe simplification factor, zero disables
    pub bake_anim_simplify_factor: f32,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            use_selection: false,
            use_visible: false,
            use_active_collection: false,
            global_scale: 1.0,
            apply_unit_scale: true,
            apply_scale_options: None,
            use_space_transform: true,
            object_types: ObjectTypes::all(),
            use_mesh_modifiers: true,
            use_mesh_modifiers_render: true,
            mesh_smooth_type: SmoothingMode::Off,
            colors_type: VertexColorMode::Srgb,
            prioritize_active_color: false,
            use_subsurf: false,
            use_mesh_edges: false,
            use_custom_props: false,
            use_armature_deform_only: false,
            add_leaf_bones: false,
            armature_nodetype: ArmatureNodeType::Null,
            primary_bone_axis: BoneAxis::Y,
            secondary_bone_axis: BoneAxis::X,
            use_tspace: false,
            use_triangles: false,
            path_mode: PathMode::Auto,
            embed_textures: false,
            batch_mode: BatchMode::Off,
            use_batch_own_dir: true,
            use_metadata: true,
            bake_anim: true,
            bake_anim_use_all_bones: true,
            bake_anim_use_nla_strips: true,
            bake_anim_use_all_actions: true,
            bake_anim_force_startend_keying: true,
            bake_anim_step: 1.0,
            bake_anim_simplify_factor: 1.0,
        }
    }
}

impl Preset for ExportOptions {}

impl ExportOptions {
    /// Resolve options against an output path
    ///
    /// An unset scale handling becomes [`ApplyScaleMode::ScaleUnits`], which
    /// keeps Unity's import scale factor at one.
    pub fn resolve(&self, filepath: impl Into<PathBuf>) -> FbxExportParams {
        FbxExportParams {
            filepath: filepath.into(),
            apply_scale_options: self
                .apply_scale_options
                .unwrap_or(ApplyScaleMode::ScaleUnits),
            options: self.clone(),
        }
    }
}

/// Fully resolved parameters handed to the serializer
#[derive(Debug, Clone, PartialEq)]
pub struct FbxExportParams {
    /// Output file path
    pub filepath: PathBuf,

    /// Resolved scale handling, never unset
    pub apply_scale_options: ApplyScaleMode,

    /// The options the export ran with
    pub options: ExportOptions,
}
