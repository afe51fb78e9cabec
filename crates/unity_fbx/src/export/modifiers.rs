//! Modifier baking pass
//!
//! Collapses modifier stacks into plain mesh payloads so the rotation
//! rewrite operates on final geometry. Objects carrying an enabled armature
//! modifier are left alone: collapsing would freeze the current pose into
//! the mesh and break skinning downstream.

use crate::scene::{ModifierKind, NodeKey, Scene, SceneError};

/// Convert every eligible view-layer object to a mesh
pub(crate) fn bake_all(scene: &mut Scene) -> Result<usize, SceneError> {
    scene.clear_selection();
    let keys: Vec<NodeKey> = scene.objects().collect();
    for key in keys {
        if !scene.in_view_layer(key)? {
            continue;
        }
        if scene.node(key)?.has_enabled_modifier(ModifierKind::Armature) {
            continue;
        }
        scene.set_selected(key, true)?;
    }
    let converted = scene.convert_selected_to_mesh()?;
    log::debug!("Collapsed modifier stacks on {} objects", converted);
    Ok(converted)
}
