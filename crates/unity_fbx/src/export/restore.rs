//! Restoration pass
//!
//! Puts back everything the preparation passes changed that the exported
//! file should not reflect as a permanent scene edit: re-merges the payload
//! splits recorded as safe, re-hides and re-disables what was revealed, and
//! brings back the user's selection. Runs before serialization, so the
//! written file sees original sharing and visibility while the rotation
//! rewrite stays in place.

use crate::export::RestorationRecord;
use crate::scene::{Scene, SceneError};

/// Replay a run's restoration record
pub(crate) fn restore(scene: &mut Scene, record: &RestorationRecord) -> Result<(), SceneError> {
    for (name, &payload) in &record.shared_payloads {
        let node = scene.find_object(name).ok_or(SceneError::UnknownObject)?;
        scene.assign_payload(node, Some(payload))?;
    }
    scene.update();
    for &key in &record.hidden_objects {
        scene.set_hidden(key, true)?;
    }
    for &key in &record.disabled_objects {
        scene.set_disabled(key, true)?;
    }
    for &key in &record.hidden_collections {
        scene.set_collection_hidden(key, true)?;
    }
    for &key in &record.disabled_collections {
        scene.set_collection_disabled(key, true)?;
    }
    scene.clear_selection();
    for &key in &record.selection {
        scene.set_selected(key, true)?;
    }
    Ok(())
}
